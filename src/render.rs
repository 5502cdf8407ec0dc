//! Prompt text for the answer generator.

use crate::schema::{Question, QuestionKind, Section};

/// Fixed instructions sent ahead of the rendered questions.
pub const INSTRUCTIONS: &[&str] = &[
    "You are a form-filling assistant. Fill out the following form questions with realistic, reasonable answers.",
    "IMPORTANT: Create DIVERSE responses. Vary your choices across ALL questions.",
    "Instructions:",
    "- For multiple choice questions, RANDOMLY select ONE option - distribute choices evenly across all options",
    "- For checkbox questions, answer with a JSON array of the selected options",
    "- For linear scale questions, vary across the whole range, don't cluster around middle values",
    "- For short answer questions, provide varied, realistic responses",
    "- Answer ALL questions in order",
    "- Return answers as a JSON array in the EXACT same order as the questions",
    "- Use empty string \"\" only if a question is optional and you cannot provide an answer",
    "- Do NOT use null or None - use actual values",
    "- For date format use: {\"year\": YYYY, \"month\": MM, \"day\": DD}",
    "- For time format use: {\"hour\": HH, \"minute\": MM}",
    "",
    "CRITICAL: Make each response UNIQUE and DIFFERENT. Spread answers across the full range of options.",
];

const CLOSING: &str = "Answer all questions above as a single JSON array.";

/// Render one text block per question, separated by blank lines.
pub fn render_questions(sections: &[Section]) -> String {
    sections
        .iter()
        .flat_map(|section| {
            section
                .questions
                .iter()
                .map(move |question| render_question(section, question))
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn render_question(section: &Section, question: &Question) -> String {
    let mut lines = vec![
        format!("Question: {}", section.title),
        format!("Type: {}", section.kind.label()),
        format!("Required: {}", question.required.label()),
    ];

    match section.kind {
        kind if kind.is_choice() => {
            lines.push(format!("Options: {}", list(&question.options)));
        }
        QuestionKind::LinearScale => {
            lines.push(format!("Options: {}", list(&question.options)));
            lines.push(format!("Minimum: {}", bound(question.min)));
            lines.push(format!("Maximum: {}", bound(question.max)));
        }
        QuestionKind::Grid => {
            lines.push(format!("Rows: {}", list(&question.columns)));
            if let Some(selection) = question.selection {
                lines.push(format!("Selection: {}", selection.label()));
            }
            lines.push(format!("Options: {}", list(&question.options)));
        }
        _ => {}
    }
    lines.join("\n")
}

/// Full prompt for one fill cycle. Cycles after the first get a line asking
/// for answers that differ from earlier ones.
pub fn build_prompt(rendered_questions: &str, variation: usize) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(INSTRUCTIONS.len() + 3);
    if variation > 0 {
        parts.push(format!(
            "Response variation #{variation}: Give unique, different answers from previous responses."
        ));
    }
    parts.extend(INSTRUCTIONS.iter().map(|line| line.to_string()));
    parts.push(String::new());
    parts.push(rendered_questions.to_string());
    parts.push(CLOSING.to_string());
    parts.join("\n")
}

fn list(items: &[String]) -> String {
    serde_json::to_string(items).unwrap_or_default()
}

fn bound(value: Option<i64>) -> String {
    value.map_or_else(|| "?".to_string(), |v| v.to_string())
}
