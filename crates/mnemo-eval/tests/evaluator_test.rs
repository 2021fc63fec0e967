//! End-to-end tests for the evaluation driver using the mock chat client.

use mnemo_abstraction::ChatModel;
use mnemo_eval::config::PageLogSettings;
use mnemo_eval::{
    EvalError, Evaluator, PageLog, success_rate_percent, test_fast_learner,
};
use mnemo_eval::learner::PromptedLearner;
use mnemo_eval::tasks::{TaskRecord, task_list};
use mnemo_models::MockModel;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

fn open_page_log(dir: &TempDir) -> PageLog {
    PageLog::open(&PageLogSettings { path: dir.path().join("pages") }).unwrap()
}

/// Two correct trials out of three must report a 67% success rate.
///
/// Each trial consumes three scripted replies: the learner's response, the
/// grader's answer extraction, and the grader's verdict.
#[tokio::test]
async fn test_two_of_three_trials_is_67_percent() {
    let model = MockModel::new("mock").with_replies(vec![
        "I think all 100 are liars.".to_string(),
        "100".to_string(),
        "yes".to_string(),
        "Maybe half of them lie.".to_string(),
        "50".to_string(),
        "no".to_string(),
        "All 100 of them.".to_string(),
        "100".to_string(),
        "yes".to_string(),
    ]);
    let client: Arc<dyn ChatModel> = Arc::new(model);
    let mut learner = PromptedLearner::new(Arc::clone(&client));

    let dir = TempDir::new().unwrap();
    let mut page_log = open_page_log(&dir);
    let record = &task_list()[0];

    let (num_successes, num_trials) =
        test_fast_learner(&mut learner, &client, &mut page_log, record, 3, true)
            .await
            .unwrap();

    assert_eq!((num_successes, num_trials), (2, 3));
    assert_eq!(success_rate_percent(num_successes, num_trials), 67);

    page_log.close().unwrap();
    let content = fs::read_to_string(dir.path().join("pages/page-000.txt")).unwrap();
    assert!(content.contains("Success rate:  67%"));
    assert!(content.contains("-----  TRIAL 3  -----"));
}

#[tokio::test]
async fn test_all_trials_correct_is_100_percent() {
    let model = MockModel::new("mock").with_replies(vec![
        "256".to_string(),
        "256".to_string(),
        "yes".to_string(),
    ]);
    let client: Arc<dyn ChatModel> = Arc::new(model);
    let mut learner = PromptedLearner::new(Arc::clone(&client));

    let dir = TempDir::new().unwrap();
    let mut page_log = open_page_log(&dir);
    let record = TaskRecord { task: "What is 4^4?".to_string(), expected_answer: "256".to_string() };

    let (num_successes, num_trials) =
        test_fast_learner(&mut learner, &client, &mut page_log, &record, 1, false)
            .await
            .unwrap();

    assert_eq!((num_successes, num_trials), (1, 1));
    page_log.close().unwrap();
}

fn write_settings(dir: &TempDir, body: &str) -> std::path::PathBuf {
    let path = dir.path().join("settings.yaml");
    fs::write(&path, body).unwrap();
    path
}

/// A full driver run over the mock provider: load settings, build the client
/// and learner, run a scenario, and leave page files behind.
#[tokio::test]
async fn test_evaluator_run_writes_page_log() {
    let dir = TempDir::new().unwrap();
    let pages = dir.path().join("pages");
    let settings = format!(
        r"client:
  provider: mock
  model: mock-model
page_log:
  path: {}
fast_learner:
  name: prompted
evaluations:
  - name: eval_teachability
",
        pages.display()
    );
    let path = write_settings(&dir, &settings);

    Evaluator::new().run(&path).await.unwrap();

    let index = fs::read_to_string(pages.join("index.txt")).unwrap();
    assert!(index.contains("evaluation run"));
    assert!(index.contains("eval_teachability"));
    // The unscripted mock echoes every prompt, so the grader's verdict never
    // leads with "yes" and both passes come out incorrect.
    let page = fs::read_to_string(pages.join("page-001.txt")).unwrap();
    assert!(page.contains("Answer is INCORRECT."));
    assert!(page.contains("end of eval_teachability"));
}

#[tokio::test]
async fn test_evaluator_run_with_recall_learner() {
    let dir = TempDir::new().unwrap();
    let settings = format!(
        r"client:
  provider: mock
  model: mock-model
page_log:
  path: {}
fast_learner:
  name: recall
  memory_dir: {}
  reset_memory: true
evaluations:
  - name: eval_learning_from_demonstration
    num_trials: 2
",
        dir.path().join("pages").display(),
        dir.path().join("memory").display()
    );
    let path = write_settings(&dir, &settings);

    Evaluator::new().run(&path).await.unwrap();
    assert!(dir.path().join("memory/uid_text_dict.json").exists());
}

#[tokio::test]
async fn test_evaluator_rejects_unknown_scenario() {
    let dir = TempDir::new().unwrap();
    let settings = format!(
        r"client:
  provider: mock
  model: mock-model
page_log:
  path: {}
fast_learner:
  name: prompted
evaluations:
  - name: eval_mind_reading
",
        dir.path().join("pages").display()
    );
    let path = write_settings(&dir, &settings);

    let err = Evaluator::new().run(&path).await.unwrap_err();
    assert!(matches!(err, EvalError::Configuration(_)));
    assert!(err.to_string().contains("eval_mind_reading"));
}

#[tokio::test]
async fn test_evaluator_rejects_unknown_learner() {
    let dir = TempDir::new().unwrap();
    let settings = format!(
        r"client:
  provider: mock
  model: mock-model
page_log:
  path: {}
fast_learner:
  name: clairvoyant
",
        dir.path().join("pages").display()
    );
    let path = write_settings(&dir, &settings);

    let err = Evaluator::new().run(&path).await.unwrap_err();
    assert!(matches!(err, EvalError::Configuration(_)));
}
