//! Evaluation harness for agentic-memory fast learners.
//!
//! Runs scripted reasoning scenarios against a pluggable fast-learner
//! implementation, grading free-text answers with a secondary model call
//! and reporting success rates to a page-structured log.

pub mod config;
pub mod error;
pub mod evaluator;
pub mod grader;
pub mod learner;
pub mod page_log;
pub mod scenarios;
pub mod tasks;

pub use config::{EvalSettings, EvaluationSettings, LearnerSettings, PageLogSettings};
pub use error::{EvalError, Result};
pub use evaluator::{Evaluator, success_rate_percent, test_fast_learner};
pub use grader::Grader;
pub use learner::{FastLearner, LearnerFactory, LearnerRegistry, PromptedLearner, RecallLearner};
pub use page_log::{PageId, PageLog};
pub use scenarios::{Scenario, ScenarioContext};
pub use tasks::{TaskRecord, task_list};
