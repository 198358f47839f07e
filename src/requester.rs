use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::content::{ContentRecord, Fact, GenerationRequest, JokeSet, Recipe};
use crate::llm_utils::{LlmError, TextGenerator};
use crate::normalizer::extract_json_block;
use crate::prompts::prompt_for;

/// Normalized model text together with its best-effort parse.
#[derive(Debug, Clone)]
pub struct Generated<T> {
    pub text: String,
    pub record: ContentRecord<T>,
}

/// Turns generation requests into parsed records. One call per request, no retries.
pub struct ContentRequester<G> {
    generator: G,
}

impl<G: TextGenerator> ContentRequester<G> {
    pub fn new(generator: G) -> Self {
        Self { generator }
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Only transport failures are returned as errors; unparseable text
    /// comes back as an `Invalid` record.
    pub async fn request<T: DeserializeOwned>(
        &self,
        request: &GenerationRequest,
    ) -> Result<Generated<T>, LlmError> {
        debug!(
            kind = %request.kind,
            category = %request.category,
            date = %request.date_label,
            "requesting content"
        );

        let raw = self.generator.generate(&prompt_for(request)).await?;
        let text = extract_json_block(raw.trim());
        let record = ContentRecord::parse(&text);

        if record.is_invalid() {
            warn!(kind = %request.kind, category = %request.category, "model returned invalid JSON");
        }

        Ok(Generated { text, record })
    }

    pub async fn recipe(
        &self,
        date_label: &str,
        category: &str,
    ) -> Result<Generated<Recipe>, LlmError> {
        self.request(&GenerationRequest::recipe(date_label, category)).await
    }

    pub async fn jokes(&self, date_label: &str) -> Result<Generated<JokeSet>, LlmError> {
        let generated: Generated<JokeSet> =
            self.request(&GenerationRequest::jokes(date_label)).await?;
        Ok(Generated {
            text: generated.text,
            record: generated.record.capped(),
        })
    }

    pub async fn fact(
        &self,
        date_label: &str,
        category: &str,
    ) -> Result<Generated<Fact>, LlmError> {
        self.request(&GenerationRequest::fact(date_label, category)).await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned responses in order and records every prompt it saw.
    #[derive(Default)]
    pub(crate) struct ScriptedGenerator {
        responses: Mutex<VecDeque<Result<String, String>>>,
        pub(crate) prompts: Mutex<Vec<String>>,
    }

    impl ScriptedGenerator {
        pub(crate) fn new<I, S>(responses: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            Self {
                responses: Mutex::new(responses.into_iter().map(|s| Ok(s.into())).collect()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn push_failure(&self, message: &str) {
            self.responses
                .lock()
                .unwrap()
                .push_back(Err(message.to_string()));
        }

        pub(crate) fn prompt_count(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    impl TextGenerator for ScriptedGenerator {
        async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            match self.responses.lock().unwrap().pop_front() {
                Some(Ok(text)) => Ok(text),
                Some(Err(message)) => Err(LlmError::ApiError(message)),
                None => Err(LlmError::InvalidResponse),
            }
        }
    }

    #[tokio::test]
    async fn test_fenced_recipe_with_fraction() {
        let requester = ContentRequester::new(ScriptedGenerator::new([
            "```json\n{\"title\": \"Oat Bake\", \"ingredients\": {\"oats\": {\"amount\": 1/2, \"unit\": \"cup\"}}, \"instructions\": \"Bake it.\"}\n```",
        ]));

        let generated = requester.recipe("March 05", "veganism").await.unwrap();
        let recipe = generated.record.typed().unwrap();
        assert_eq!(recipe.ingredients["oats"].amount.as_ref().unwrap().as_f64(), Some(0.5));
        assert!(!generated.text.contains("```"));

        let prompts = requester.generator().prompts.lock().unwrap();
        assert!(prompts[0].contains("March 05"));
        assert!(prompts[0].contains("veganism"));
    }

    #[tokio::test]
    async fn test_garbage_is_contained() {
        let requester = ContentRequester::new(ScriptedGenerator::new(["Here are your facts!"]));
        let generated = requester.fact("March 05", "physics").await.unwrap();
        match generated.record {
            ContentRecord::Invalid(placeholder) => {
                assert_eq!(placeholder.error, "Invalid JSON");
                assert_eq!(placeholder.raw, "Here are your facts!");
            }
            other => panic!("expected placeholder, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_jokes_are_capped() {
        let requester = ContentRequester::new(ScriptedGenerator::new([r#"["a", "b", "c", "d"]"#]));
        let generated = requester.jokes("March 05").await.unwrap();
        assert_eq!(generated.record.typed().unwrap().jokes().len(), 3);
    }

    #[tokio::test]
    async fn test_transport_error_propagates_without_retry() {
        let generator = ScriptedGenerator::default();
        generator.push_failure("HTTP 503");
        let requester = ContentRequester::new(generator);

        let result = requester.fact("March 05", "biology").await;
        assert!(matches!(result, Err(LlmError::ApiError(_))));
        assert_eq!(requester.generator().prompt_count(), 1);
    }
}
