//! Batch fill cycles: generate, bind and encode one URL per cycle.

use std::path::Path;
use std::time::Duration;

use crate::bind::bind_answers;
use crate::encode::encode_submission;
use crate::error::Result;
use crate::generator::{parse_answers, AnswerGenerator};
use crate::render::{build_prompt, render_questions};
use crate::schema::Section;

/// Overall result of a batch, used for the process exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOutcome {
    AllSucceeded,
    Partial,
    NoneSucceeded,
}

impl BatchOutcome {
    pub fn exit_code(self) -> i32 {
        match self {
            BatchOutcome::AllSucceeded => 0,
            BatchOutcome::NoneSucceeded => 1,
            BatchOutcome::Partial => 3,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub requested: usize,
    pub urls: Vec<String>,
    pub failed: usize,
}

impl BatchReport {
    pub fn outcome(&self) -> BatchOutcome {
        match (self.urls.len(), self.failed) {
            (0, _) => BatchOutcome::NoneSucceeded,
            (_, 0) => BatchOutcome::AllSucceeded,
            _ => BatchOutcome::Partial,
        }
    }
}

/// Runs fill cycles against one decoded schema.
///
/// The schema is a template: every cycle binds answers onto its own clone.
pub struct BatchRunner<'a> {
    template: &'a [Section],
    base_url: &'a str,
    generator: &'a dyn AnswerGenerator,
    rendered: String,
    delay: Duration,
}

impl<'a> BatchRunner<'a> {
    pub fn new(
        template: &'a [Section],
        base_url: &'a str,
        generator: &'a dyn AnswerGenerator,
    ) -> Self {
        Self {
            template,
            base_url,
            generator,
            rendered: render_questions(template),
            delay: Duration::ZERO,
        }
    }

    /// Pause between consecutive generator calls.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// One complete cycle. `cycle` is zero-based and selects the prompt variation.
    pub async fn run_cycle(&self, cycle: usize) -> Result<String> {
        let prompt = build_prompt(&self.rendered, cycle);
        let reply = self.generator.generate(&prompt).await?;
        let answers = parse_answers(&reply)?;

        let mut sections = self.template.to_vec();
        bind_answers(&mut sections, answers)?;
        Ok(encode_submission(self.base_url, &sections))
    }

    /// Run `cycles` independent cycles. A failed cycle is logged and counted,
    /// and the batch moves on.
    pub async fn run(&self, cycles: usize) -> BatchReport {
        let mut report = BatchReport {
            requested: cycles,
            ..Default::default()
        };

        for cycle in 0..cycles {
            tracing::info!(cycle = cycle + 1, total = cycles, "generating response");
            match self.run_cycle(cycle).await {
                Ok(url) => {
                    tracing::info!(cycle = cycle + 1, "response encoded");
                    report.urls.push(url);
                }
                Err(e) => {
                    tracing::warn!(cycle = cycle + 1, error = %e, "cycle failed");
                    report.failed += 1;
                }
            }

            if cycle + 1 < cycles && !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
        }

        tracing::info!(
            succeeded = report.urls.len(),
            failed = report.failed,
            total = cycles,
            "batch completed"
        );
        report
    }
}

/// Write one URL per line.
pub async fn write_urls(path: &Path, urls: &[String]) -> Result<()> {
    let mut contents = urls.join("\n");
    contents.push('\n');
    tokio::fs::write(path, contents).await?;
    Ok(())
}

/// Shorten a URL for log output.
pub fn preview(url: &str, max_chars: usize) -> String {
    if url.chars().count() <= max_chars {
        return url.to_string();
    }
    let mut short: String = url.chars().take(max_chars).collect();
    short.push_str("...");
    short
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::generator::MockAnswerGenerator;
    use crate::schema::{Question, QuestionKind, Requirement};
    use pretty_assertions::assert_eq;

    const BASE: &str = "https://forms.test/viewform";

    fn template() -> Vec<Section> {
        vec![
            Section {
                title: "Count".into(),
                kind: QuestionKind::ShortAnswer,
                questions: vec![Question::new(111, Requirement::Required)],
            },
            Section {
                title: "Score".into(),
                kind: QuestionKind::LinearScale,
                questions: vec![Question::new(222, Requirement::Required)],
            },
        ]
    }

    #[tokio::test]
    async fn cycles_are_isolated_from_template_and_each_other() {
        let mut generator = MockAnswerGenerator::new();
        let mut call = 0;
        generator.expect_generate().times(2).returning(move |_| {
            call += 1;
            Ok(format!("[\"{call}\", \"{}\"]", call * 2))
        });

        let template = template();
        let report = BatchRunner::new(&template, BASE, &generator).run(2).await;

        assert_eq!(
            report.urls,
            vec![
                format!("{BASE}?entry.111=1&entry.222=2"),
                format!("{BASE}?entry.111=2&entry.222=4"),
            ]
        );
        assert_eq!(report.outcome(), BatchOutcome::AllSucceeded);
        assert!(template
            .iter()
            .flat_map(|s| &s.questions)
            .all(|q| q.value.is_none()));
    }

    #[tokio::test]
    async fn failed_cycles_do_not_stop_the_batch() {
        let mut generator = MockAnswerGenerator::new();
        let mut call = 0;
        generator.expect_generate().times(3).returning(move |_| {
            call += 1;
            match call {
                1 => Err(Error::GeneratorError("quota exceeded".into())),
                2 => Ok("[\"only one\"]".into()),
                _ => Ok("```json\n[\"42\", \"7\"]\n```".into()),
            }
        });

        let template = template();
        let report = BatchRunner::new(&template, BASE, &generator).run(3).await;

        assert_eq!(report.failed, 2);
        assert_eq!(report.urls, vec![format!("{BASE}?entry.111=42&entry.222=7")]);
        assert_eq!(report.outcome(), BatchOutcome::Partial);
        assert_eq!(report.outcome().exit_code(), 3);
    }

    #[tokio::test]
    async fn later_cycles_ask_for_variation() {
        let mut generator = MockAnswerGenerator::new();
        generator
            .expect_generate()
            .withf(|prompt| prompt.starts_with("Response variation #1"))
            .times(1)
            .returning(|_| Ok("[\"a\", \"b\"]".into()));

        let template = template();
        let url = BatchRunner::new(&template, BASE, &generator)
            .run_cycle(1)
            .await
            .unwrap();
        assert_eq!(url, format!("{BASE}?entry.111=a&entry.222=b"));
    }

    #[test]
    fn outcome_reflects_counts() {
        let report = BatchReport {
            requested: 2,
            urls: Vec::new(),
            failed: 2,
        };
        assert_eq!(report.outcome(), BatchOutcome::NoneSucceeded);
        assert_eq!(report.outcome().exit_code(), 1);
    }

    #[test]
    fn preview_truncates_on_char_boundary() {
        assert_eq!(preview("short", 10), "short");
        assert_eq!(preview("ééééé", 2), "éé...");
    }

    #[tokio::test]
    async fn writes_one_url_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("responses.txt");
        write_urls(&path, &["u1".into(), "u2".into()]).await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "u1\nu2\n");
    }
}
