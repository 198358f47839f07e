//! Day-by-day generation loop.
//!
//! Walks backward from today, requests every recipe category, one joke set and
//! every fact category per date, and writes one JSON file per content kind.

use chrono::{Days, NaiveDate, Utc};
use serde::Serialize;
use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::content::{ByCategory, ContentKind, ContentRecord, Fact, JokeSet, Recipe};
use crate::llm_utils::{LlmError, TextGenerator};
use crate::requester::ContentRequester;

pub const RECIPE_CATEGORIES: [&str; 6] = [
    "default",
    "veganism",
    "vegetarianism",
    "lactose_intolerance",
    "gluten_intolerance",
    "kosher",
];

pub const FACT_CATEGORIES: [&str; 5] = [
    "mathematics",
    "physics",
    "biology",
    "computer science",
    "chemistry",
];

pub const DEFAULT_PAUSE: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("generation failed: {0}")]
    Generation(#[from] LlmError),
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
}

/// How the driver waits between dates.
pub trait Pacer {
    fn pause(&self) -> impl Future<Output = ()>;
}

/// Sleeps a fixed interval to stay under the generation service's rate limit.
#[derive(Debug, Clone, Copy)]
pub struct FixedPause(pub Duration);

impl Pacer for FixedPause {
    async fn pause(&self) {
        info!(secs = self.0.as_secs(), "pausing before next date");
        tokio::time::sleep(self.0).await;
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoPause;

impl Pacer for NoPause {
    async fn pause(&self) {}
}

/// "March 05" style label used in prompts and file names.
pub fn date_label(date: NaiveDate) -> String {
    date.format("%B %d").to_string()
}

/// `days` dates ending today, newest first. Stops early at chrono's minimum date.
pub fn dates_back_from(today: NaiveDate, days: u32) -> Vec<NaiveDate> {
    (0..days)
        .map_while(|offset| today.checked_sub_days(Days::new(u64::from(offset))))
        .collect()
}

/// Everything generated for one date.
#[derive(Debug, Clone)]
pub struct DailyBatch {
    pub date: NaiveDate,
    pub label: String,
    pub recipes: ByCategory<ContentRecord<Recipe>>,
    pub jokes: ContentRecord<JokeSet>,
    pub facts: ByCategory<ContentRecord<Fact>>,
}

impl DailyBatch {
    pub fn file_name(&self, kind: ContentKind) -> String {
        format!("{}_{}.json", kind.plural(), self.label)
    }

    /// Count of records that came back as invalid JSON.
    pub fn invalid_count(&self) -> usize {
        let recipes = self.recipes.iter().filter(|(_, r)| r.is_invalid()).count();
        let facts = self.facts.iter().filter(|(_, r)| r.is_invalid()).count();
        recipes + facts + usize::from(self.jokes.is_invalid())
    }

    /// Writes the three per-kind files into `dir`, returning their paths.
    pub fn write_to(&self, dir: &Path) -> Result<Vec<PathBuf>, BatchError> {
        fs::create_dir_all(dir).map_err(|source| BatchError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        Ok(vec![
            write_json(&dir.join(self.file_name(ContentKind::Recipe)), &self.recipes)?,
            write_json(&dir.join(self.file_name(ContentKind::JokeSet)), &self.jokes)?,
            write_json(&dir.join(self.file_name(ContentKind::Fact)), &self.facts)?,
        ])
    }
}

/// Pretty-printed with two-space indentation, non-ASCII left as is.
fn write_json<T: Serialize>(path: &Path, data: &T) -> Result<PathBuf, BatchError> {
    let json = serde_json::to_string_pretty(data)?;
    fs::write(path, json).map_err(|source| BatchError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "wrote output file");
    Ok(path.to_path_buf())
}

pub struct BatchDriver<G, P> {
    requester: ContentRequester<G>,
    pacer: P,
    output_dir: PathBuf,
    recipe_categories: Vec<String>,
    fact_categories: Vec<String>,
}

impl<G: TextGenerator, P: Pacer> BatchDriver<G, P> {
    pub fn new(requester: ContentRequester<G>, pacer: P, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            requester,
            pacer,
            output_dir: output_dir.into(),
            recipe_categories: RECIPE_CATEGORIES.iter().map(|c| c.to_string()).collect(),
            fact_categories: FACT_CATEGORIES.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn with_categories<R, F>(mut self, recipes: R, facts: F) -> Self
    where
        R: IntoIterator,
        R::Item: Into<String>,
        F: IntoIterator,
        F::Item: Into<String>,
    {
        self.recipe_categories = recipes.into_iter().map(Into::into).collect();
        self.fact_categories = facts.into_iter().map(Into::into).collect();
        self
    }

    pub fn requester(&self) -> &ContentRequester<G> {
        &self.requester
    }

    /// Generates and writes `days` dates ending today (UTC).
    pub async fn run(&self, days: u32) -> Result<Vec<DailyBatch>, BatchError> {
        self.run_from(Utc::now().date_naive(), days).await
    }

    /// Stops at the first transport error; files already written stay on disk.
    pub async fn run_from(&self, today: NaiveDate, days: u32) -> Result<Vec<DailyBatch>, BatchError> {
        let dates = dates_back_from(today, days);
        let mut batches = Vec::with_capacity(dates.len());

        for (i, date) in dates.iter().enumerate() {
            if i > 0 {
                self.pacer.pause().await;
            }

            let batch = self.generate_day(*date).await?;
            let paths = batch.write_to(&self.output_dir)?;
            info!(
                date = %batch.label,
                files = paths.len(),
                invalid = batch.invalid_count(),
                "saved daily content"
            );
            batches.push(batch);
        }

        Ok(batches)
    }

    pub async fn generate_day(&self, date: NaiveDate) -> Result<DailyBatch, BatchError> {
        let label = date_label(date);

        let mut recipes = ByCategory::default();
        for category in &self.recipe_categories {
            info!(category = %category, date = %label, "generating recipe");
            let generated = self.requester.recipe(&label, category).await?;
            recipes.insert(category, generated.record);
        }

        info!(date = %label, "generating jokes");
        let jokes = self.requester.jokes(&label).await?.record;

        let mut facts = ByCategory::default();
        for category in &self.fact_categories {
            info!(category = %category, date = %label, "generating fact");
            let generated = self.requester.fact(&label, category).await?;
            facts.insert(category, generated.record);
        }

        Ok(DailyBatch {
            date,
            label,
            recipes,
            jokes,
            facts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::requester::tests::ScriptedGenerator;
    use serde_json::Value;
    use std::cell::Cell;

    fn march_5() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 5).unwrap()
    }

    fn read_json(path: &Path) -> Value {
        serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
    }

    #[derive(Default)]
    struct CountingPause {
        calls: Cell<usize>,
    }

    impl Pacer for CountingPause {
        async fn pause(&self) {
            self.calls.set(self.calls.get() + 1);
        }
    }

    #[test]
    fn test_date_label_format() {
        assert_eq!(date_label(march_5()), "March 05");
    }

    #[test]
    fn test_dates_walk_backward_including_today() {
        let dates = dates_back_from(march_5(), 3);
        assert_eq!(
            dates,
            vec![
                march_5(),
                NaiveDate::from_ymd_opt(2025, 3, 4).unwrap(),
                NaiveDate::from_ymd_opt(2025, 3, 3).unwrap(),
            ]
        );
        assert!(dates_back_from(march_5(), 0).is_empty());
    }

    #[test]
    fn test_date_walk_stops_at_calendar_floor() {
        let dates = dates_back_from(NaiveDate::MIN, 5);
        assert_eq!(dates, vec![NaiveDate::MIN]);

        let near_floor = NaiveDate::MIN.checked_add_days(Days::new(2)).unwrap();
        let dates = dates_back_from(near_floor, 1_000_000);
        assert_eq!(dates.len(), 3);
        assert_eq!(dates.last(), Some(&NaiveDate::MIN));
    }

    #[tokio::test]
    async fn test_mixed_responses_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("daily_outputs");
        let generator = ScriptedGenerator::new([
            r#"{"title": "Lentil Stew", "description": "Warm for March", "ingredients": {"lentils": {"amount": 1, "unit": "cup"}}, "instructions": ["Simmer."], "cook_time": "30 minutes", "serving_size": 2, "category": "default"}"#,
            "```json\n{\"title\": \"Crêpes\", \"ingredients\": {\"milk\": {\"amount\": 1/2, \"unit\": \"cup\"}}, \"instructions\": [\"Whisk.\", \"Fry.\"], \"category\": \"veganism\"}\n```",
            "Why did the chicken cross the road? I forgot the JSON.",
            r#"{"fact": "Pi Day is in March.", "source": "Encyclopaedia"}"#,
        ]);
        let driver = BatchDriver::new(ContentRequester::new(generator), NoPause, &out)
            .with_categories(["default", "veganism"], ["mathematics"]);

        let batches = driver.run_from(march_5(), 1).await.unwrap();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].invalid_count(), 1);

        let recipes = read_json(&out.join("recipes_March 05.json"));
        assert_eq!(recipes["default"]["title"], "Lentil Stew");
        assert_eq!(recipes["veganism"]["ingredients"]["milk"]["amount"], 0.5);

        let jokes = read_json(&out.join("jokes_March 05.json"));
        assert_eq!(jokes["error"], "Invalid JSON");
        assert_eq!(
            jokes["raw"],
            "Why did the chicken cross the road? I forgot the JSON."
        );

        let facts = read_json(&out.join("facts_March 05.json"));
        assert_eq!(facts["mathematics"]["source"], "Encyclopaedia");
    }

    #[tokio::test]
    async fn test_output_is_pretty_and_keeps_unicode() {
        let dir = tempfile::tempdir().unwrap();
        let generator = ScriptedGenerator::new([
            r#"{"title": "Crème brûlée", "instructions": "Torch the sugar."}"#,
            r#"["one"]"#,
        ]);
        let driver = BatchDriver::new(ContentRequester::new(generator), NoPause, dir.path())
            .with_categories(["default"], Vec::<String>::new());

        driver.run_from(march_5(), 1).await.unwrap();

        let text = fs::read_to_string(dir.path().join("recipes_March 05.json")).unwrap();
        assert!(text.contains("Crème brûlée"));
        assert!(text.starts_with("{\n  \"default\": {\n    \"title\""));
        let facts = fs::read_to_string(dir.path().join("facts_March 05.json")).unwrap();
        assert_eq!(facts, "{}");
    }

    #[tokio::test]
    async fn test_zero_days_generates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("daily_outputs");
        let driver = BatchDriver::new(ContentRequester::new(ScriptedGenerator::default()), NoPause, &out);

        let batches = driver.run_from(march_5(), 0).await.unwrap();
        assert!(batches.is_empty());
        assert_eq!(driver.requester().generator().prompt_count(), 0);
        assert!(!out.exists());
    }

    #[tokio::test]
    async fn test_pauses_only_between_dates() {
        let dir = tempfile::tempdir().unwrap();
        let generator = ScriptedGenerator::new(["[]", "[]", "[]"]);
        let driver = BatchDriver::new(ContentRequester::new(generator), CountingPause::default(), dir.path())
            .with_categories(Vec::<String>::new(), Vec::<String>::new());

        let batches = driver.run_from(march_5(), 3).await.unwrap();
        assert_eq!(batches.len(), 3);
        assert_eq!(driver.pacer.calls.get(), 2);
        assert!(dir.path().join("jokes_March 03.json").exists());
    }

    #[tokio::test]
    async fn test_transport_failure_aborts_remaining_days() {
        let dir = tempfile::tempdir().unwrap();
        let generator = ScriptedGenerator::new(["[\"first day\"]"]);
        generator.push_failure("quota exceeded");
        let driver = BatchDriver::new(ContentRequester::new(generator), NoPause, dir.path())
            .with_categories(Vec::<String>::new(), Vec::<String>::new());

        let result = driver.run_from(march_5(), 3).await;
        assert!(matches!(result, Err(BatchError::Generation(LlmError::ApiError(_)))));
        assert!(dir.path().join("jokes_March 05.json").exists());
        assert!(!dir.path().join("jokes_March 04.json").exists());
    }
}
