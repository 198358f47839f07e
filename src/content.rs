use serde::de::DeserializeOwned;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;
use std::fmt;

pub const MAX_JOKES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Recipe,
    JokeSet,
    Fact,
}

impl ContentKind {
    /// Prefix used for output files and API routes.
    pub fn plural(&self) -> &'static str {
        match self {
            ContentKind::Recipe => "recipes",
            ContentKind::JokeSet => "jokes",
            ContentKind::Fact => "facts",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ContentKind::Recipe => write!(f, "recipe"),
            ContentKind::JokeSet => write!(f, "joke-set"),
            ContentKind::Fact => write!(f, "fact"),
        }
    }
}

/// One prompt to issue. Built per call and dropped once answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub date_label: String,
    pub category: String,
    pub kind: ContentKind,
}

impl GenerationRequest {
    pub fn recipe(date_label: &str, category: &str) -> Self {
        Self {
            date_label: date_label.to_string(),
            category: category.to_string(),
            kind: ContentKind::Recipe,
        }
    }

    pub fn jokes(date_label: &str) -> Self {
        Self {
            date_label: date_label.to_string(),
            category: String::new(),
            kind: ContentKind::JokeSet,
        }
    }

    pub fn fact(date_label: &str, category: &str) -> Self {
        Self {
            date_label: date_label.to_string(),
            category: category.to_string(),
            kind: ContentKind::Fact,
        }
    }
}

/// A number where the model was asked for one, or whatever text it wrote instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Quantity {
    Number(Number),
    Text(String),
}

impl Quantity {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Quantity::Number(n) => n.as_f64(),
            Quantity::Text(s) => s.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    #[serde(default)]
    pub amount: Option<Quantity>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Models return instructions either as a list of steps or as one block of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Instructions {
    Steps(Vec<String>),
    Text(String),
}

impl Instructions {
    pub fn steps(&self) -> Vec<&str> {
        match self {
            Instructions::Steps(steps) => steps.iter().map(String::as_str).collect(),
            Instructions::Text(text) => vec![text.as_str()],
        }
    }
}

/// Typed view of a recipe. Output is written from the record's JSON value, not from this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub ingredients: BTreeMap<String, Ingredient>,
    pub instructions: Instructions,
    #[serde(default)]
    pub cook_time: Option<String>,
    #[serde(default)]
    pub serving_size: Option<Quantity>,
    #[serde(default)]
    pub category: Option<String>,
    /// Anything else the model decided to include.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fact {
    pub fact: String,
    pub source: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JokeSet(pub Vec<String>);

impl JokeSet {
    pub fn jokes(&self) -> &[String] {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPlaceholder {
    pub error: String,
    pub raw: String,
}

/// Outcome of parsing one model response.
///
/// Parsed records always serialize as the JSON the model wrote, key order and
/// unknown fields included; `typed` is only a read view over that value.
/// Valid JSON that does not fit `T` is kept as `Loose`, and only text that is
/// not JSON at all becomes `Invalid`.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentRecord<T> {
    Typed { value: Value, typed: T },
    Loose(Value),
    Invalid(ErrorPlaceholder),
}

impl<T: DeserializeOwned> ContentRecord<T> {
    /// Parses already-normalized text.
    pub fn parse(normalized: &str) -> Self {
        let value: Value = match serde_json::from_str(normalized) {
            Ok(value) => value,
            Err(_) => {
                return ContentRecord::Invalid(ErrorPlaceholder {
                    error: "Invalid JSON".to_string(),
                    raw: normalized.to_string(),
                });
            }
        };
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Self {
        match T::deserialize(&value) {
            Ok(typed) => ContentRecord::Typed { value, typed },
            Err(_) => ContentRecord::Loose(value),
        }
    }
}

impl<T> ContentRecord<T> {
    pub fn typed(&self) -> Option<&T> {
        match self {
            ContentRecord::Typed { typed, .. } => Some(typed),
            _ => None,
        }
    }

    /// The model's JSON, if it parsed at all.
    pub fn value(&self) -> Option<&Value> {
        match self {
            ContentRecord::Typed { value, .. } | ContentRecord::Loose(value) => Some(value),
            ContentRecord::Invalid(_) => None,
        }
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, ContentRecord::Invalid(_))
    }
}

impl<T> Serialize for ContentRecord<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ContentRecord::Typed { value, .. } | ContentRecord::Loose(value) => {
                value.serialize(serializer)
            }
            ContentRecord::Invalid(placeholder) => placeholder.serialize(serializer),
        }
    }
}

impl ContentRecord<JokeSet> {
    /// Keeps at most [`MAX_JOKES`] entries.
    pub fn capped(self) -> Self {
        match self {
            ContentRecord::Typed { mut value, typed: JokeSet(mut jokes) } => {
                jokes.truncate(MAX_JOKES);
                if let Value::Array(items) = &mut value {
                    items.truncate(MAX_JOKES);
                }
                ContentRecord::Typed {
                    value,
                    typed: JokeSet(jokes),
                }
            }
            other => other,
        }
    }
}

/// Category-keyed records in insertion order, serialized as a JSON object.
#[derive(Debug, Clone, PartialEq)]
pub struct ByCategory<T>(pub Vec<(String, T)>);

impl<T> Default for ByCategory<T> {
    fn default() -> Self {
        ByCategory(Vec::new())
    }
}

impl<T> ByCategory<T> {
    pub fn insert(&mut self, category: &str, record: T) {
        self.0.push((category.to_string(), record));
    }

    pub fn get(&self, category: &str) -> Option<&T> {
        self.0.iter().find(|(c, _)| c == category).map(|(_, r)| r)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.0.iter().map(|(c, r)| (c.as_str(), r))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<T: Serialize> Serialize for ByCategory<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (category, record) in &self.0 {
            map.serialize_entry(category, record)?;
        }
        map.end()
    }
}
