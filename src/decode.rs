//! Decoder for the positional question array a form page embeds.
//!
//! The page carries `FB_PUBLIC_LOAD_DATA_ = [...];`, a nested array where
//! meaning is encoded by position only. Every index into that structure
//! lives in this module; the rest of the crate sees [`Section`]s.

use serde::de::IgnoredAny;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::schema::{GridSelection, Question, QuestionKind, Requirement, Section};

/// Variable name the form page assigns its schema array to.
pub const MARKER: &str = "FB_PUBLIC_LOAD_DATA_";

// Section slots.
const SECTION_TITLE: usize = 1;
const SECTION_KIND: usize = 3;
const SECTION_QUESTIONS: usize = 4;

// Question slots.
const QUESTION_ENTRY_ID: usize = 0;
const QUESTION_OPTIONS: usize = 1;
const QUESTION_REQUIRED: usize = 2;
const QUESTION_RANGE: usize = 3;
const QUESTION_GRID_MODE: usize = 11;

/// Isolate the JSON array literal assigned to [`MARKER`] inside an HTML page.
///
/// Only the first JSON value after the `=` is taken, so a `;` inside a
/// question title does not cut the payload short.
pub fn extract_payload(html: &str) -> Result<&str> {
    let start = html.find(MARKER).ok_or(Error::MarkerNotFound(MARKER))?;
    let after_marker = &html[start + MARKER.len()..];
    let eq = after_marker
        .find('=')
        .ok_or(Error::MarkerNotFound(MARKER))?;
    let payload = after_marker[eq + 1..].trim_start();

    let mut stream = serde_json::Deserializer::from_str(payload).into_iter::<IgnoredAny>();
    match stream.next() {
        Some(Ok(_)) => Ok(&payload[..stream.byte_offset()]),
        Some(Err(e)) => Err(Error::ParseError(format!(
            "value assigned to {MARKER} is not JSON: {e}"
        ))),
        None => Err(Error::ParseError(format!("{MARKER} has no value"))),
    }
}

/// Extract and decode the schema embedded in a form page.
pub fn decode_html(html: &str) -> Result<Vec<Section>> {
    decode_payload(extract_payload(html)?)
}

/// Decode the raw schema array into sections.
///
/// Sections without question data are dropped. Any structural mismatch in a
/// materialized section aborts the whole decode.
pub fn decode_payload(payload: &str) -> Result<Vec<Section>> {
    let root: Value = serde_json::from_str(payload)
        .map_err(|e| Error::ParseError(format!("payload is not valid JSON: {e}")))?;

    let form = slot(&root, 1, "root")?;
    let raw_sections = array(slot(form, 1, "root[1]")?, "root[1][1]")?;

    let mut sections = Vec::new();
    for (idx, raw) in raw_sections.iter().enumerate() {
        let path = format!("sections[{idx}]");
        if let Some(section) = decode_section(raw, &path)? {
            sections.push(section);
        }
    }
    tracing::debug!(
        raw = raw_sections.len(),
        kept = sections.len(),
        "decoded form sections"
    );
    Ok(sections)
}

fn decode_section(raw: &Value, path: &str) -> Result<Option<Section>> {
    let fields = array(raw, path)?;
    let raw_questions = match fields.get(SECTION_QUESTIONS) {
        Some(Value::Array(items)) if !items.is_empty() => items,
        Some(Value::Null) | None => return Ok(None),
        Some(Value::Array(_)) => return Ok(None),
        Some(other) => {
            return Err(Error::ParseError(format!(
                "{path}[{SECTION_QUESTIONS}]: expected question list, found {}",
                type_name(other)
            )))
        }
    };

    let title = optional_text(slot(raw, SECTION_TITLE, path)?, &format!("{path}[{SECTION_TITLE}]"))?;
    let kind_path = format!("{path}[{SECTION_KIND}]");
    let code = integer(slot(raw, SECTION_KIND, path)?, &kind_path)?;
    let kind = QuestionKind::from_code(code)
        .ok_or_else(|| Error::ParseError(format!("{kind_path}: unknown question kind {code}")))?;

    let questions = raw_questions
        .iter()
        .enumerate()
        .map(|(idx, q)| decode_question(q, kind, &format!("{path}.questions[{idx}]")))
        .collect::<Result<Vec<_>>>()?;

    Ok(Some(Section {
        title,
        kind,
        questions,
    }))
}

fn decode_question(raw: &Value, kind: QuestionKind, path: &str) -> Result<Question> {
    array(raw, path)?;

    let entry_path = format!("{path}[{QUESTION_ENTRY_ID}]");
    let entry_id = slot(raw, QUESTION_ENTRY_ID, path)?
        .as_u64()
        .ok_or_else(|| Error::ParseError(format!("{entry_path}: entry id is not an unsigned integer")))?;

    let required_path = format!("{path}[{QUESTION_REQUIRED}]");
    let required = match slot(raw, QUESTION_REQUIRED, path)? {
        Value::Null => Requirement::Optional,
        value => {
            let code = integer(value, &required_path)?;
            Requirement::from_code(code).ok_or_else(|| {
                Error::ParseError(format!("{required_path}: unknown required code {code}"))
            })?
        }
    };

    let mut question = Question::new(entry_id, required);
    match kind {
        k if k.is_choice() => {
            question.options = options(raw, path)?;
        }
        QuestionKind::LinearScale => {
            question.options = options(raw, path)?;
            let range_path = format!("{path}[{QUESTION_RANGE}]");
            let range = slot(raw, QUESTION_RANGE, path)?;
            // Bounds may be numbers, numeric strings or end labels; labels
            // fall back to the numeric option labels.
            question.min = scale_bound(slot(range, 0, &range_path)?)
                .or_else(|| question.options.first().and_then(|o| o.trim().parse().ok()));
            question.max = scale_bound(slot(range, 1, &range_path)?)
                .or_else(|| question.options.last().and_then(|o| o.trim().parse().ok()));
        }
        QuestionKind::Grid => {
            let mode_path = format!("{path}[{QUESTION_GRID_MODE}]");
            let mode = slot(raw, QUESTION_GRID_MODE, path)?;
            let code = integer(slot(mode, 0, &mode_path)?, &format!("{mode_path}[0]"))?;
            question.selection = Some(GridSelection::from_code(code).ok_or_else(|| {
                Error::ParseError(format!("{mode_path}[0]: unknown grid selection code {code}"))
            })?);

            let rows_path = format!("{path}[{QUESTION_RANGE}]");
            let rows = slot(slot(raw, QUESTION_RANGE, path)?, 0, &rows_path)?;
            question.columns = labels(rows, &format!("{rows_path}[0]"))?;
            question.options = options(raw, path)?;
        }
        _ => {}
    }
    Ok(question)
}

/// Option labels: a list of arrays whose first element is the label.
fn options(raw: &Value, path: &str) -> Result<Vec<String>> {
    let list_path = format!("{path}[{QUESTION_OPTIONS}]");
    array(slot(raw, QUESTION_OPTIONS, path)?, &list_path)?
        .iter()
        .enumerate()
        .map(|(idx, option)| {
            let option_path = format!("{list_path}[{idx}]");
            optional_text(slot(option, 0, &option_path)?, &format!("{option_path}[0]"))
        })
        .collect()
}

/// Grid row labels come either as a single string or a list of strings.
fn labels(value: &Value, path: &str) -> Result<Vec<String>> {
    match value {
        Value::String(label) => Ok(vec![label.clone()]),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(idx, item)| optional_text(item, &format!("{path}[{idx}]")))
            .collect(),
        other => Err(Error::ParseError(format!(
            "{path}: expected label or label list, found {}",
            type_name(other)
        ))),
    }
}

fn slot<'a>(value: &'a Value, idx: usize, path: &str) -> Result<&'a Value> {
    array(value, path)?
        .get(idx)
        .ok_or_else(|| Error::ParseError(format!("{path}: missing element [{idx}]")))
}

fn array<'a>(value: &'a Value, path: &str) -> Result<&'a Vec<Value>> {
    value.as_array().ok_or_else(|| {
        Error::ParseError(format!("{path}: expected array, found {}", type_name(value)))
    })
}

fn integer(value: &Value, path: &str) -> Result<i64> {
    value.as_i64().ok_or_else(|| {
        Error::ParseError(format!("{path}: expected integer, found {}", type_name(value)))
    })
}

fn scale_bound(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn optional_text(value: &Value, path: &str) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Null => Ok(String::new()),
        other => Err(Error::ParseError(format!(
            "{path}: expected text, found {}",
            type_name(other)
        ))),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
