use crate::error::{Error, Result};
use crate::schema::{question_count, AnswerValue, Section};

/// Assign answers to questions in section-then-question order.
///
/// Fails when fewer answers than questions are supplied. Extra answers are
/// dropped. Answer shapes are not checked against question kinds.
pub fn bind_answers(sections: &mut [Section], answers: Vec<Option<AnswerValue>>) -> Result<()> {
    let expected = question_count(sections);
    let supplied = answers.len();
    if supplied < expected {
        return Err(Error::BindingError { expected, supplied });
    }
    if supplied > expected {
        tracing::debug!(expected, supplied, "ignoring surplus answers");
    }

    let mut answers = answers.into_iter();
    for question in sections.iter_mut().flat_map(|s| s.questions.iter_mut()) {
        question.value = answers.next().flatten();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Question, QuestionKind, Requirement};

    fn schema(counts: &[usize]) -> Vec<Section> {
        let mut next_id = 0;
        counts
            .iter()
            .map(|&n| Section {
                title: "s".into(),
                kind: QuestionKind::ShortAnswer,
                questions: (0..n)
                    .map(|_| {
                        next_id += 1;
                        Question::new(next_id, Requirement::Optional)
                    })
                    .collect(),
            })
            .collect()
    }

    #[test]
    fn binds_in_traversal_order() {
        let mut sections = schema(&[1, 2]);
        bind_answers(
            &mut sections,
            vec![
                Some(AnswerValue::text("a")),
                None,
                Some(AnswerValue::Many(vec!["c".into()])),
            ],
        )
        .unwrap();

        assert_eq!(sections[0].questions[0].value, Some(AnswerValue::text("a")));
        assert_eq!(sections[1].questions[0].value, None);
        assert_eq!(
            sections[1].questions[1].value,
            Some(AnswerValue::Many(vec!["c".into()]))
        );
    }

    #[test]
    fn too_few_answers_fail() {
        let mut sections = schema(&[1]);
        let err = bind_answers(&mut sections, Vec::new()).unwrap_err();
        assert!(matches!(
            err,
            Error::BindingError {
                expected: 1,
                supplied: 0
            }
        ));

        bind_answers(&mut sections, vec![Some(AnswerValue::text("ok"))]).unwrap();
        assert_eq!(sections[0].questions[0].value, Some(AnswerValue::text("ok")));
    }

    #[test]
    fn surplus_answers_are_ignored() {
        let mut sections = schema(&[1]);
        bind_answers(
            &mut sections,
            vec![Some(AnswerValue::text("1")), Some(AnswerValue::text("2"))],
        )
        .unwrap();
        assert_eq!(sections[0].questions[0].value, Some(AnswerValue::text("1")));
    }
}
