use crate::content::{ContentKind, GenerationRequest};

pub fn recipe_prompt(date_label: &str, category: &str) -> String {
    format!(
        "Generate a concise, date-relevant recipe for {date_label} in JSON format with these fields:
{{
  \"title\": \"<recipe title>\",
  \"description\": \"<short description related to the recipe and the date>\",
  \"ingredients\": {{
    \"<ingredient>\": {{
      \"amount\": <number>,
      \"unit\": \"<unit like cup, tsp, g>\"
    }}
  }},
  \"instructions\": [\"Step 1...\", \"Step 2...\", \"...\"],
  \"cook_time\": \"<time in minutes or hours>\",
  \"serving_size\": <number>,
  \"category\": \"{category}\"
}}

Make the recipe contextually relevant to the day and month ({date_label}) by considering seasonal ingredients, cultural events, weather patterns, or historical facts tied to this date.

Ensure the entire JSON does not exceed 2000 characters. Keep instructions and ingredients concise but complete. Use readable cooking units."
    )
}

pub fn jokes_prompt(date_label: &str) -> String {
    format!(
        "Generate 3 separate jokes in JSON format as a list. Each joke must be under 500 characters. The jokes may optionally relate to today ({date_label}), but it's not required.

Format:
[\"joke1\", \"joke2\", \"joke3\"]"
    )
}

pub fn fact_prompt(date_label: &str, category: &str) -> String {
    format!(
        "Generate one date-relevant fact for {date_label} in the category '{category}' in the following JSON format:
{{
  \"fact\": \"<educational and factual statement (≤ 1000 characters)>\",
  \"source\": \"<cite a reliable and concise source (≤ 200 characters)>\"
}}

The fact must be historically or contextually related to the current date and its relevance should be explained within the fact itself."
    )
}

pub fn prompt_for(request: &GenerationRequest) -> String {
    match request.kind {
        ContentKind::Recipe => recipe_prompt(&request.date_label, &request.category),
        ContentKind::JokeSet => jokes_prompt(&request.date_label),
        ContentKind::Fact => fact_prompt(&request.date_label, &request.category),
    }
}
