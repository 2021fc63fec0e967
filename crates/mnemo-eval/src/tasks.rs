//! Static task fixtures used by the scripted evaluation scenarios.
//!
//! The list is indexed positionally and read-only at runtime.

/// A task paired with its expected answer.
#[derive(Debug, Clone)]
pub struct TaskRecord {
    /// The task presented to the learner.
    pub task: String,
    /// The answer the grader compares against.
    pub expected_answer: String,
}

impl TaskRecord {
    fn new(task: &str, expected_answer: &str) -> Self {
        Self { task: task.to_string(), expected_answer: expected_answer.to_string() }
    }
}

/// Index of the advice-sensitive question used by the teachability scenario.
pub const TEACHABILITY_TASK: usize = 4;

/// Index of the tower-placement task used by the demonstration scenario.
pub const DEMONSTRATION_TASK: usize = 5;

/// Indices used by the self-teaching scenario; training always uses the first.
pub const SELF_TEACHING_TASKS: [usize; 2] = [3, 1];

/// Returns the fixed task list.
pub fn task_list() -> Vec<TaskRecord> {
    vec![
        // 0
        TaskRecord::new(
            "You ask 100 people: 'How many of you are liars?' They all answer: 'At least one of us is not a liar.' But you know that at least one of the 100 is a liar. How many of them are liars?",
            "100",
        ),
        // 1
        TaskRecord::new(
            "You are Van Helsing, a renowned vampire hunter. A Count of Moldova has tasked you with investigating the village of Sirnea in neighboring Wallachia, where a vampire was spotted crossing the border. One night you glimpse a caped figure leaping from rooftop to rooftop, but it escapes. Because of the remoteness of the village, you know with certainty the vampire is one of the 100 residents. You visit all 100 residents during the day, knowing that humans always tell the truth and vampires always lie. You ask everyone the same question: 'How many vampires are living in Sirnea?' Everyone gives the same response: 'At least one of us is a human.' How many residents of Sirnea have been turned into vampires?",
            "100",
        ),
        // 2
        TaskRecord::new(
            "Three guards stand at a door. You need to determine how many of them are truthful, and you already know for a fact that at least one of them never tells the truth. You ask each one 'How many guards here always tell the truth?' Each one says 'One or more of us always tells the truth'. How many of the guards always tell the truth?",
            "None of them do",
        ),
        // 3
        TaskRecord::new(
            "You ask ten people 'How many of you are liars?' They all answer 'At least one of us is not a liar.' You happen to know that at least one of them IS a liar. How many of them are liars in total?",
            "All of them are liars.",
        ),
        // 4
        TaskRecord::new(
            "As a contribution to this framework, can I create a new first-party package for a copilot extension agent that I built on it?",
            "It's best to have your agent in its own repo, then add the framework's extension topic to that repo.",
        ),
        // 5
        TaskRecord::new(
            "You are a telecommunications engineer who wants to build cell phone towers on a stretch of road. Houses are located at mile markers 16, 17, 19, 11, 9, 10, 2, 5, 4. Each cell phone tower can cover houses located next to the road within a 4-mile radius. Find the minimum number of cell phone towers needed to cover all houses next to the road. Your answer should be a positive numerical integer value.",
            "2",
        ),
        // 6
        TaskRecord::new("What is 4^4?", "256"),
        // 7
        TaskRecord::new("What is 3^3?", "27"),
    ]
}
