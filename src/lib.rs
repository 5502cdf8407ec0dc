pub mod bind;
pub mod browser;
pub mod config;
pub mod decode;
pub mod encode;
pub mod error;
pub mod fetch;
pub mod generator;
pub mod page;
pub mod render;
pub mod runner;
pub mod schema;

pub use bind::bind_answers;
pub use browser::BrowserSource;
pub use config::{FetchMode, FillerBuilder, FillerConfig};
pub use decode::{decode_html, decode_payload, extract_payload};
pub use encode::{encode_submission, submission_fragments};
pub use error::{Error, Result};
pub use fetch::{fetch_schema, load_schema, page_source, HttpSource, PageSource};
pub use generator::{parse_answers, AnswerGenerator, GeminiGenerator};
pub use render::{build_prompt, render_questions};
pub use runner::{BatchOutcome, BatchReport, BatchRunner};
pub use schema::{question_count, AnswerValue, Question, QuestionKind, Requirement, Section};
