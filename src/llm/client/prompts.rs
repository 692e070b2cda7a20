//! Default LLM prompts for sentence classification.

/// Default prompt for classifying a numbered batch of sentences.
///
/// Placeholders: `{num_sentences}`, `{categories}`, `{sentences}`, `{example}`.
pub const DEFAULT_BATCH_PROMPT: &str = r#"You are a scientist and research paper annotator.
Your task is to label each sentence in the provided numbered list based on its content and contextual meaning within the batch.

Possible categories (aligned with highlight colors):
{categories}

Analyze the following {num_sentences} sentences:
{sentences}

Return a **valid JSON list** with one entry per sentence.
Each entry must include:
  - "category": one of the exact labels above only.
  - "justification": a short explanation (1-2 sentences) for why that category was chosen

Example format:
{example}
"#;
