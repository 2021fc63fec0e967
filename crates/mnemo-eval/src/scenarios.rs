//! Scripted evaluation scenarios.
//!
//! Each scenario follows the same shape: begin a page, optionally reset the
//! learner's memory, run one or more graded passes over a fixture task, and
//! report success rates.

use crate::config::EvaluationSettings;
use crate::error::Result;
use crate::evaluator::{success_rate_percent, test_fast_learner};
use crate::grader::Grader;
use crate::learner::FastLearner;
use crate::page_log::PageLog;
use crate::tasks::{DEMONSTRATION_TASK, SELF_TEACHING_TASKS, TEACHABILITY_TASK, task_list};
use mnemo_abstraction::ChatModel;
use std::sync::Arc;

/// Everything a scenario needs, threaded explicitly through the run.
pub struct ScenarioContext<'a> {
    /// The learner under evaluation.
    pub learner: &'a mut dyn FastLearner,
    /// Shared chat client (also used for grading).
    pub client: Arc<dyn ChatModel>,
    /// Page log sink for this run.
    pub page_log: &'a mut PageLog,
    /// Per-scenario settings from the evaluations list.
    pub settings: &'a EvaluationSettings,
}

/// The known evaluation scenarios.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    /// Does given advice change the answer to a related question?
    Teachability,
    /// Does a worked demonstration of a similar task help?
    LearningFromDemonstration,
    /// Does training on one task transfer to related tasks?
    SelfTeaching,
}

impl Scenario {
    /// Resolves a scenario from its configured name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "eval_teachability" => Some(Self::Teachability),
            "eval_learning_from_demonstration" => Some(Self::LearningFromDemonstration),
            "eval_self_teaching" => Some(Self::SelfTeaching),
            _ => None,
        }
    }

    /// Names of all known scenarios.
    #[must_use]
    pub fn known_names() -> [&'static str; 3] {
        ["eval_teachability", "eval_learning_from_demonstration", "eval_self_teaching"]
    }

    /// Runs the scenario to completion.
    pub async fn run(self, ctx: &mut ScenarioContext<'_>) -> Result<()> {
        match self {
            Self::Teachability => eval_teachability(ctx).await,
            Self::LearningFromDemonstration => eval_learning_from_demonstration(ctx).await,
            Self::SelfTeaching => eval_self_teaching(ctx).await,
        }
    }
}

/// Asks a question, gives the learner the relevant advice, then asks again
/// to see whether the advice is retrieved from memory.
async fn eval_teachability(ctx: &mut ScenarioContext<'_>) -> Result<()> {
    let page = ctx.page_log.begin_page("eval_teachability")?;

    let tasks = task_list();
    let record = &tasks[TEACHABILITY_TASK];
    let grader = Grader::new(Arc::clone(&ctx.client));
    ctx.learner.reset_memory().await?;

    // First test without memory.
    ctx.page_log.add_lines(page, "\nClear memory, then ask the question.", false)?;
    let response = ctx.learner.handle_user_message(&record.task).await?;
    log_verdict(ctx.page_log, page, &grader, record, &response).await?;

    // Give the advice.
    ctx.page_log.add_lines(page, "Give the advice.", false)?;
    let insight = "When somebody builds an agent on this framework and wants to contribute it, \
        instead of adding a new first-party package it's better to keep the agent in its own \
        repo and add the framework's extension topic to that repo, so the contribution is \
        discoverable through the community extensions page.";
    ctx.learner.handle_user_message(insight).await?;

    // Ask again to see if the advice is retrieved from memory.
    ctx.page_log.add_lines(
        page,
        "\nAsk the question again to see if the advice is retrieved from memory.",
        false,
    )?;
    let response = ctx.learner.handle_user_message(&record.task).await?;
    log_verdict(ctx.page_log, page, &grader, record, &response).await?;

    ctx.page_log.finish_page(page)
}

/// Baselines the learner on a task, demonstrates a similar task, then tests
/// again to see whether the demonstration helps.
async fn eval_learning_from_demonstration(ctx: &mut ScenarioContext<'_>) -> Result<()> {
    let page = ctx.page_log.begin_page("eval_learning_from_demonstration")?;

    let tasks = task_list();
    let record = &tasks[DEMONSTRATION_TASK];
    let num_trials = ctx.settings.num_trials;
    ctx.learner.reset_memory().await?;

    ctx.page_log.add_lines(page, "To get a baseline, clear memory, then assign the task.", false)?;
    let (num_successes, num_trials_run) = test_fast_learner(
        ctx.learner,
        &ctx.client,
        ctx.page_log,
        record,
        num_trials,
        true,
    )
    .await?;
    ctx.page_log.add_lines(
        page,
        &format!("\nSuccess rate:  {}%", success_rate_percent(num_successes, num_trials_run)),
        true,
    )?;

    ctx.page_log.add_lines(page, "Demonstrate a solution to a similar task.", false)?;
    let demo_task = "You are a telecommunications engineer who wants to build cell phone towers \
        on a stretch of road. Houses are located at mile markers 17, 20, 19, 10, 11, 12, 3, 6. \
        Each cell phone tower can cover houses located next to the road within a 4-mile radius. \
        Find the minimum number of cell phone towers needed to cover all houses next to the \
        road. Your answer should be a positive numerical integer value.";
    let demonstration = "Sort the houses by location: 3, 6, 10, 11, 12, 17, 19, 20. Start at one \
        end and place towers only where absolutely needed. The house at 3 can be served by a \
        tower as far away as mile 7 (3 + 4), and that tower reaches up to mile 11, covering the \
        houses at 10 and 11. The next uncovered house is at 12, requiring a second tower at 16 \
        (12 + 4), which reaches mile 20 and covers the rest. So 2 towers are enough.";
    ctx.learner.learn_from_demonstration(demo_task, demonstration).await?;

    ctx.page_log.add_lines(page, "Assign the task again to see if the demonstration helps.", false)?;
    let (num_successes, num_trials_run) = test_fast_learner(
        ctx.learner,
        &ctx.client,
        ctx.page_log,
        record,
        num_trials,
        true,
    )
    .await?;
    ctx.page_log.add_lines(
        page,
        &format!("\nSuccess rate:  {}%", success_rate_percent(num_successes, num_trials_run)),
        true,
    )?;

    ctx.page_log.finish_page(page)
}

/// Loops over train-on-one-task / test-on-all-tasks, reporting per-task and
/// overall success rates.
async fn eval_self_teaching(ctx: &mut ScenarioContext<'_>) -> Result<()> {
    let page = ctx.page_log.begin_page("eval_self_teaching")?;
    ctx.learner.reset_memory().await?;

    let tasks = task_list();
    let records: Vec<_> = SELF_TEACHING_TASKS.iter().map(|&i| tasks[i].clone()).collect();

    let mut total_successes = vec![0u32; records.len()];
    let mut total_trials = 0u32;

    for _ in 0..ctx.settings.num_loops {
        // Always train on the first task.
        let training = &records[0];
        ctx.learner.train_on_task(&training.task, &training.expected_answer).await?;

        // Test on all tasks.
        for (j, record) in records.iter().enumerate() {
            let (num_successes, num_trials_run) = test_fast_learner(
                ctx.learner,
                &ctx.client,
                ctx.page_log,
                record,
                ctx.settings.num_final_test_trials,
                true,
            )
            .await?;
            ctx.page_log.add_lines(
                page,
                &format!(
                    "Success rate ({}):  {}%",
                    j,
                    success_rate_percent(num_successes, num_trials_run)
                ),
                true,
            )?;
            total_successes[j] += num_successes;
        }
        total_trials += ctx.settings.num_final_test_trials;
    }

    for (j, successes) in total_successes.iter().enumerate() {
        ctx.page_log.add_lines(
            page,
            &format!(
                "\nOverall success rate ({}):  {}%",
                j,
                success_rate_percent(*successes, total_trials)
            ),
            true,
        )?;
    }

    ctx.page_log.finish_page(page)
}

async fn log_verdict(
    page_log: &mut PageLog,
    page: crate::page_log::PageId,
    grader: &Grader,
    record: &crate::tasks::TaskRecord,
    response: &str,
) -> Result<()> {
    let (is_correct, extracted_answer) =
        grader.is_response_correct(&record.task, response, &record.expected_answer).await?;
    page_log.add_lines(page, &format!("Extracted answer:  {}", extracted_answer), true)?;
    if is_correct {
        page_log.add_lines(page, "Answer is CORRECT.", true)?;
    } else {
        page_log.add_lines(page, "Answer is INCORRECT.", true)?;
    }
    Ok(())
}
