//! Typed question model shared by the decoder, renderer, binder and encoder.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Question type, indexed by the numeric code the form embeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    ShortAnswer,
    Paragraph,
    MultipleChoice,
    Dropdown,
    Checkboxes,
    LinearScale,
    Title,
    Grid,
    PageBreak,
    Date,
    Time,
    Image,
    Reserved,
    FileUpload,
}

impl QuestionKind {
    /// All kinds in code order; `ALL[code]` is the kind for `code`.
    pub const ALL: [QuestionKind; 14] = [
        QuestionKind::ShortAnswer,
        QuestionKind::Paragraph,
        QuestionKind::MultipleChoice,
        QuestionKind::Dropdown,
        QuestionKind::Checkboxes,
        QuestionKind::LinearScale,
        QuestionKind::Title,
        QuestionKind::Grid,
        QuestionKind::PageBreak,
        QuestionKind::Date,
        QuestionKind::Time,
        QuestionKind::Image,
        QuestionKind::Reserved,
        QuestionKind::FileUpload,
    ];

    pub fn from_code(code: i64) -> Option<Self> {
        usize::try_from(code)
            .ok()
            .and_then(|idx| Self::ALL.get(idx).copied())
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    /// Human-readable label used in generator prompts.
    pub fn label(self) -> &'static str {
        match self {
            QuestionKind::ShortAnswer => "Short answer",
            QuestionKind::Paragraph => "Paragraph",
            QuestionKind::MultipleChoice => "Multiple choice",
            QuestionKind::Dropdown => "Dropdown",
            QuestionKind::Checkboxes => "Checkboxes",
            QuestionKind::LinearScale => "Linear scale",
            QuestionKind::Title => "Title",
            QuestionKind::Grid => "Choice grid",
            QuestionKind::PageBreak => "Section",
            QuestionKind::Date => "Date",
            QuestionKind::Time => "Time",
            QuestionKind::Image => "Image",
            QuestionKind::Reserved => "12",
            QuestionKind::FileUpload => "File upload",
        }
    }

    /// Choice kinds whose only extra field is the option list.
    pub fn is_choice(self) -> bool {
        matches!(
            self,
            QuestionKind::MultipleChoice | QuestionKind::Dropdown | QuestionKind::Checkboxes
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Requirement {
    Optional,
    Required,
}

impl Requirement {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(Requirement::Optional),
            1 => Some(Requirement::Required),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Requirement::Optional => "Optional",
            Requirement::Required => "Required",
        }
    }

    pub fn is_required(self) -> bool {
        self == Requirement::Required
    }
}

/// Whether a grid takes one choice per row or several.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridSelection {
    SingleChoice,
    Checkbox,
}

impl GridSelection {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(GridSelection::SingleChoice),
            1 => Some(GridSelection::Checkbox),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            GridSelection::SingleChoice => "Single choice grid",
            GridSelection::Checkbox => "Checkbox grid",
        }
    }
}

/// One form section together with the questions parsed out of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub kind: QuestionKind,
    pub questions: Vec<Question>,
}

/// A single answerable field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub entry_id: u64,
    pub required: Requirement,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<GridSelection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<AnswerValue>,
}

impl Question {
    pub fn new(entry_id: u64, required: Requirement) -> Self {
        Self {
            entry_id,
            required,
            options: Vec::new(),
            min: None,
            max: None,
            columns: Vec::new(),
            selection: None,
            value: None,
        }
    }
}

/// A generated answer.
///
/// Generators are loose about JSON types, so deserialization coerces numbers
/// and booleans to text and accepts date/time parts as numbers or numeric
/// strings. `null` maps to an absent answer via `Option<AnswerValue>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Text(String),
    Many(Vec<String>),
    Date {
        #[serde(skip_serializing_if = "Option::is_none")]
        year: Option<u32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        month: Option<u32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        day: Option<u32>,
    },
    Time {
        #[serde(skip_serializing_if = "Option::is_none")]
        hour: Option<u32>,
        #[serde(skip_serializing_if = "Option::is_none")]
        minute: Option<u32>,
    },
}

impl AnswerValue {
    pub fn text(value: impl Into<String>) -> Self {
        AnswerValue::Text(value.into())
    }

    /// Convert a raw JSON value. Returns `Ok(None)` for `null`.
    pub fn from_json(value: Value) -> std::result::Result<Option<Self>, String> {
        match value {
            Value::Null => Ok(None),
            Value::Array(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    match scalar_text(&item) {
                        Some(text) => values.push(text),
                        None if item.is_null() => {}
                        None => return Err(format!("unsupported list element: {item}")),
                    }
                }
                Ok(Some(AnswerValue::Many(values)))
            }
            Value::Object(map) => {
                let part = |key: &str| -> std::result::Result<Option<u32>, String> {
                    map.get(key).map_or(Ok(None), |v| date_part(key, v))
                };
                if ["year", "month", "day"].iter().any(|k| map.contains_key(*k)) {
                    Ok(Some(AnswerValue::Date {
                        year: part("year")?,
                        month: part("month")?,
                        day: part("day")?,
                    }))
                } else if ["hour", "minute"].iter().any(|k| map.contains_key(*k)) {
                    Ok(Some(AnswerValue::Time {
                        hour: part("hour")?,
                        minute: part("minute")?,
                    }))
                } else {
                    Err(format!(
                        "object answer has neither date nor time fields: {:?}",
                        map.keys().collect::<Vec<_>>()
                    ))
                }
            }
            scalar => Ok(scalar_text(&scalar).map(AnswerValue::Text)),
        }
    }
}

impl<'de> Deserialize<'de> for AnswerValue {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Value::deserialize(deserializer)?;
        AnswerValue::from_json(raw)
            .map_err(serde::de::Error::custom)?
            .ok_or_else(|| serde::de::Error::custom("answer must not be null"))
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn date_part(key: &str, value: &Value) -> std::result::Result<Option<u32>, String> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .map(Some)
            .ok_or_else(|| format!("`{key}` is not a non-negative integer: {n}")),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => s
            .trim()
            .parse::<u32>()
            .map(Some)
            .map_err(|_| format!("`{key}` is not numeric: {s:?}")),
        other => Err(format!("`{key}` has unsupported type: {other}")),
    }
}

/// Total number of questions across all sections.
pub fn question_count(sections: &[Section]) -> usize {
    sections.iter().map(|s| s.questions.len()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn kind_codes_follow_table_order() {
        for (code, kind) in QuestionKind::ALL.iter().enumerate() {
            assert_eq!(QuestionKind::from_code(code as i64), Some(*kind));
            assert_eq!(kind.code() as usize, code);
        }
        assert_eq!(QuestionKind::from_code(14), None);
        assert_eq!(QuestionKind::from_code(-1), None);
    }

    #[test]
    fn answers_coerce_loose_json() {
        let answers: Vec<Option<AnswerValue>> = serde_json::from_value(json!([
            "yes",
            7,
            true,
            null,
            ["A", 2],
            {"year": 2024, "month": "03", "day": null},
            {"hour": 9, "minute": 30}
        ]))
        .unwrap();

        assert_eq!(
            answers,
            vec![
                Some(AnswerValue::text("yes")),
                Some(AnswerValue::text("7")),
                Some(AnswerValue::text("true")),
                None,
                Some(AnswerValue::Many(vec!["A".into(), "2".into()])),
                Some(AnswerValue::Date {
                    year: Some(2024),
                    month: Some(3),
                    day: None
                }),
                Some(AnswerValue::Time {
                    hour: Some(9),
                    minute: Some(30)
                }),
            ]
        );
    }

    #[test]
    fn rejects_unrecognized_objects() {
        let err = AnswerValue::from_json(json!({"foo": 1})).unwrap_err();
        assert!(err.contains("neither date nor time"), "{err}");

        let err = AnswerValue::from_json(json!({"year": -3})).unwrap_err();
        assert!(err.contains("year"), "{err}");
    }

    #[test]
    fn question_count_sums_sections() {
        let section = |n: usize| Section {
            title: "t".into(),
            kind: QuestionKind::ShortAnswer,
            questions: (0..n)
                .map(|i| Question::new(i as u64, Requirement::Optional))
                .collect(),
        };
        assert_eq!(question_count(&[section(1), section(2)]), 3);
        assert_eq!(question_count(&[]), 0);
    }
}
