use super::model::{Outcome, Task};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AssemblyError {
    #[error("expected {expected} outcomes, got {actual}")]
    CountMismatch { expected: usize, actual: usize },

    #[error("outcome index {index} is out of range for {len} tasks")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("task {index} has more than one outcome")]
    Duplicate { index: usize },

    #[error("outcome for task {index} carries id '{actual}', expected '{expected}'")]
    IdMismatch {
        index: usize,
        expected: String,
        actual: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SucceededTask {
    pub index: usize,
    pub task: Task,
    pub audio: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FailedTask {
    pub index: usize,
    pub task: Task,
    pub error: String,
}

/// Caller-facing view of one batch, in input order
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub total: usize,
    pub successful: Vec<SucceededTask>,
    pub failed: Vec<FailedTask>,
    pub outcomes: Vec<Outcome>,
}

impl BatchReport {
    pub fn successful_count(&self) -> usize {
        self.successful.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Matches outcomes, in any order, back to the tasks that produced them.
///
/// Output is ordered by the task's position in `tasks`. Every task must
/// have exactly one outcome whose id matches the task id.
pub fn assemble(tasks: &[Task], outcomes: Vec<Outcome>) -> Result<BatchReport, AssemblyError> {
    if outcomes.len() != tasks.len() {
        return Err(AssemblyError::CountMismatch {
            expected: tasks.len(),
            actual: outcomes.len(),
        });
    }

    let mut ordered: Vec<Option<Outcome>> = (0..tasks.len()).map(|_| None).collect();
    for outcome in outcomes {
        let index = outcome.index;
        let task = tasks.get(index).ok_or(AssemblyError::IndexOutOfRange {
            index,
            len: tasks.len(),
        })?;
        if task.id != outcome.task_id {
            return Err(AssemblyError::IdMismatch {
                index,
                expected: task.id.clone(),
                actual: outcome.task_id,
            });
        }
        if ordered[index].replace(outcome).is_some() {
            return Err(AssemblyError::Duplicate { index });
        }
    }

    // Equal lengths and no duplicates means every slot is filled
    let outcomes: Vec<Outcome> = ordered.into_iter().flatten().collect();

    let mut report = BatchReport {
        total: tasks.len(),
        ..Default::default()
    };
    for (outcome, task) in outcomes.iter().zip(tasks) {
        match &outcome.result {
            Ok(audio) => report.successful.push(SucceededTask {
                index: outcome.index,
                task: task.clone(),
                audio: audio.clone(),
            }),
            Err(failure) => report.failed.push(FailedTask {
                index: outcome.index,
                task: task.clone(),
                error: failure.to_string(),
            }),
        }
    }
    report.outcomes = outcomes;

    Ok(report)
}
