//! Prefilled submission URL encoding.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::schema::{AnswerValue, Question, QuestionKind, Section};

/// Characters left as-is in query values (RFC 3986 unreserved).
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Build the prefilled URL for a bound schema.
pub fn encode_submission(base_url: &str, sections: &[Section]) -> String {
    let separator = if base_url.contains('?') { '&' } else { '?' };
    format!(
        "{base_url}{separator}{}",
        submission_fragments(sections).join("&")
    )
}

/// `entry.<id>=<value>` fragments in section-then-question order.
pub fn submission_fragments(sections: &[Section]) -> Vec<String> {
    let mut fragments = Vec::new();
    for section in sections {
        for question in &section.questions {
            encode_question(section.kind, question, &mut fragments);
        }
    }
    fragments
}

fn encode_question(kind: QuestionKind, question: &Question, out: &mut Vec<String>) {
    let id = question.entry_id;
    match (kind, &question.value) {
        (QuestionKind::Date, Some(AnswerValue::Date { year, month, day })) => {
            push_part(out, id, "_year", *year);
            push_part(out, id, "_month", *month);
            push_part(out, id, "_day", *day);
        }
        (QuestionKind::Time, Some(AnswerValue::Time { hour, minute })) => {
            push_part(out, id, "_hour", *hour);
            push_part(out, id, "_minute", *minute);
        }
        (QuestionKind::Date | QuestionKind::Time, Some(other))
        | (_, Some(other @ (AnswerValue::Date { .. } | AnswerValue::Time { .. }))) => {
            tracing::warn!(entry_id = id, ?kind, value = ?other, "answer shape does not fit question, skipped");
        }
        (_, Some(AnswerValue::Many(values))) => {
            for value in values {
                out.push(fragment(id, "", value));
            }
        }
        (_, Some(AnswerValue::Text(value))) if !value.is_empty() => {
            out.push(fragment(id, "", value));
        }
        _ => {}
    }
}

/// Zero parts are treated as unset.
fn push_part(out: &mut Vec<String>, id: u64, suffix: &str, part: Option<u32>) {
    if let Some(value) = part.filter(|v| *v != 0) {
        out.push(fragment(id, suffix, &value.to_string()));
    }
}

fn fragment(id: u64, suffix: &str, value: &str) -> String {
    format!(
        "entry.{id}{suffix}={}",
        utf8_percent_encode(value, QUERY_VALUE)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Requirement;
    use pretty_assertions::assert_eq;

    fn single(kind: QuestionKind, id: u64, value: Option<AnswerValue>) -> Vec<Section> {
        let mut question = Question::new(id, Requirement::Required);
        question.value = value;
        vec![Section {
            title: "q".into(),
            kind,
            questions: vec![question],
        }]
    }

    #[test]
    fn date_drops_zero_parts() {
        let sections = single(
            QuestionKind::Date,
            9,
            Some(AnswerValue::Date {
                year: Some(2024),
                month: Some(0),
                day: Some(15),
            }),
        );
        assert_eq!(
            submission_fragments(&sections),
            vec!["entry.9_year=2024", "entry.9_day=15"]
        );
    }

    #[test]
    fn time_emits_hour_and_minute() {
        let sections = single(
            QuestionKind::Time,
            10,
            Some(AnswerValue::Time {
                hour: Some(14),
                minute: None,
            }),
        );
        assert_eq!(submission_fragments(&sections), vec!["entry.10_hour=14"]);
    }

    #[test]
    fn multi_values_expand_in_order() {
        let sections = single(
            QuestionKind::Checkboxes,
            4,
            Some(AnswerValue::Many(vec!["A".into(), "B".into()])),
        );
        assert_eq!(
            encode_submission("https://f.test/viewform", &sections),
            "https://f.test/viewform?entry.4=A&entry.4=B"
        );
    }

    #[test]
    fn empty_and_missing_values_are_omitted() {
        let mut sections = single(QuestionKind::ShortAnswer, 1, Some(AnswerValue::text("")));
        sections.extend(single(QuestionKind::Paragraph, 2, None));
        sections.extend(single(QuestionKind::Date, 3, None));
        assert!(submission_fragments(&sections).is_empty());
        assert_eq!(encode_submission("https://f.test/x", &sections), "https://f.test/x?");
    }

    #[test]
    fn mismatched_shapes_are_skipped() {
        let mut sections = single(QuestionKind::Date, 1, Some(AnswerValue::text("2024-01-01")));
        sections.extend(single(
            QuestionKind::ShortAnswer,
            2,
            Some(AnswerValue::Time {
                hour: Some(1),
                minute: Some(2),
            }),
        ));
        sections.extend(single(
            QuestionKind::Time,
            3,
            Some(AnswerValue::Many(vec!["10".into(), "30".into()])),
        ));
        sections.extend(single(
            QuestionKind::Date,
            4,
            Some(AnswerValue::Time {
                hour: Some(9),
                minute: None,
            }),
        ));
        assert!(submission_fragments(&sections).is_empty());
    }

    #[test]
    fn values_are_percent_encoded() {
        let sections = single(
            QuestionKind::Paragraph,
            7,
            Some(AnswerValue::text("fish & chips = 100%")),
        );
        assert_eq!(
            submission_fragments(&sections),
            vec!["entry.7=fish%20%26%20chips%20%3D%20100%25"]
        );
    }

    #[test]
    fn existing_query_is_extended() {
        let sections = single(QuestionKind::ShortAnswer, 1, Some(AnswerValue::text("x")));
        assert_eq!(
            encode_submission("https://f.test/viewform?usp=pp_url", &sections),
            "https://f.test/viewform?usp=pp_url&entry.1=x"
        );
    }
}
