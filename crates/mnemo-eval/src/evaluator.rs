//! Evaluation driver.
//!
//! Loads settings, constructs the chat client and the configured fast
//! learner, then runs each configured scenario in order, reporting success
//! rates to the page log.

use crate::config::EvalSettings;
use crate::error::{EvalError, Result};
use crate::grader::Grader;
use crate::learner::{FastLearner, LearnerRegistry};
use crate::page_log::PageLog;
use crate::scenarios::{Scenario, ScenarioContext};
use crate::tasks::TaskRecord;
use mnemo_abstraction::ChatModel;
use mnemo_models::ModelFactory;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Rounded percent success rate.
#[must_use]
pub fn success_rate_percent(num_successes: u32, num_trials: u32) -> u32 {
    if num_trials == 0 {
        return 0;
    }
    ((f64::from(num_successes) / f64::from(num_trials)) * 100.0).round() as u32
}

/// Presents a task to the learner for a number of trials, grading each
/// response, and returns `(num_successes, num_trials)`.
pub async fn test_fast_learner(
    learner: &mut dyn FastLearner,
    client: &Arc<dyn ChatModel>,
    page_log: &mut PageLog,
    record: &TaskRecord,
    num_trials: u32,
    use_memory: bool,
) -> Result<(u32, u32)> {
    let page = page_log.begin_page("test_fast_learner")?;
    page_log.add_lines(page, "Testing the fast learner on the given task.", true)?;

    let grader = Grader::new(Arc::clone(client));
    let mut num_successes = 0;

    for trial in 1..=num_trials {
        page_log.add_lines(page, &format!("\n-----  TRIAL {}  -----", trial), true)?;
        let response = learner.assign_task(&record.task, use_memory).await?;
        let (is_correct, extracted_answer) =
            grader.is_response_correct(&record.task, &response, &record.expected_answer).await?;

        page_log.add_lines(page, &format!("Extracted answer:  {}", extracted_answer), true)?;
        if is_correct {
            page_log.add_lines(page, "Answer is CORRECT.", true)?;
            num_successes += 1;
        } else {
            page_log.add_lines(page, "Answer is INCORRECT.", true)?;
        }
    }

    let rate = success_rate_percent(num_successes, num_trials);
    page_log.add_lines(page, &format!("\nSuccess rate:  {}%", rate), true)?;
    page_log.finish_page(page)?;
    Ok((num_successes, num_trials))
}

/// Runs a fixed battery of evaluation scenarios against a configured learner.
pub struct Evaluator {
    registry: LearnerRegistry,
}

impl Evaluator {
    /// Creates an evaluator with the built-in learner registry.
    #[must_use]
    pub fn new() -> Self {
        Self { registry: LearnerRegistry::with_builtins() }
    }

    /// Creates an evaluator with a caller-provided registry.
    #[must_use]
    pub fn with_registry(registry: LearnerRegistry) -> Self {
        Self { registry }
    }

    /// Runs every evaluation listed in the settings file.
    ///
    /// Any failure aborts the remaining sequence; the page log is flushed
    /// with whatever was written before the failure.
    pub async fn run(&self, settings_path: &Path) -> Result<()> {
        let settings = EvalSettings::load(settings_path)?;
        let mut page_log = PageLog::open(&settings.page_log)?;

        let result = self.run_evaluations(&settings, &mut page_log).await;
        // Whatever happened, get the pages onto disk.
        page_log.close()?;
        result
    }

    async fn run_evaluations(
        &self,
        settings: &EvalSettings,
        page_log: &mut PageLog,
    ) -> Result<()> {
        let page = page_log.begin_page("evaluation run")?;
        page_log.add_lines(
            page,
            &format!(
                "Client:  {} via {}\nFast learner:  {}",
                settings.client.model, settings.client.provider, settings.fast_learner.name
            ),
            true,
        )?;

        let client = ModelFactory::create(&settings.client)?;
        let mut learner = self.registry.create(&settings.fast_learner, Arc::clone(&client)).await?;

        for evaluation in &settings.evaluations {
            evaluation.validate()?;
            let scenario = Scenario::from_name(&evaluation.name).ok_or_else(|| {
                EvalError::Configuration(format!("unknown evaluation '{}'", evaluation.name))
            })?;

            info!(scenario = %evaluation.name, "Running evaluation");
            let mut ctx = ScenarioContext {
                learner: learner.as_mut(),
                client: Arc::clone(&client),
                page_log: &mut *page_log,
                settings: evaluation,
            };
            scenario.run(&mut ctx).await?;
        }

        page_log.finish_page(page)?;
        Ok(())
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_rate_rounding() {
        assert_eq!(success_rate_percent(2, 3), 67);
        assert_eq!(success_rate_percent(1, 3), 33);
        assert_eq!(success_rate_percent(0, 3), 0);
        assert_eq!(success_rate_percent(3, 3), 100);
        assert_eq!(success_rate_percent(1, 2), 50);
        assert_eq!(success_rate_percent(0, 0), 0);
    }
}
