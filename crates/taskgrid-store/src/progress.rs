//! Task read model: progress percentages and the dashboard overview.
//!
//! Progress blends finished rounds with the mean subtask progress of the
//! current round. Each round weighs `100 / max_rounds` and the result is
//! clamped to `0..=100`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use taskgrid_api_models::{Subtask, SubtaskStatus, Task, TaskStatus};

use crate::format::parse_timestamp;

/// Parse a progress string such as `"37.5%"`. Unparseable or non-finite
/// values read as 0.
#[must_use]
pub fn parse_progress(raw: &str) -> f64 {
    raw.trim()
        .trim_end_matches('%')
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .unwrap_or(0.0)
}

/// Mean subtask progress of the current round, 0 with no subtasks.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn current_round_average(subtasks: &[Subtask]) -> f64 {
    if subtasks.is_empty() {
        return 0.0;
    }
    let total: f64 = subtasks
        .iter()
        .map(|subtask| parse_progress(&subtask.progress))
        .sum();
    total / subtasks.len() as f64
}

/// Overall progress of a task in round `current_round` of `max_rounds`.
///
/// A `max_rounds` of 0 is read as 1 and a `current_round` of 0 as round 1.
#[must_use]
pub fn overall_progress(subtasks: &[Subtask], current_round: u32, max_rounds: u32) -> f64 {
    if subtasks.is_empty() {
        return 0.0;
    }
    let max_rounds = f64::from(max_rounds.max(1));
    let completed_rounds = f64::from(current_round.saturating_sub(1));
    let round_weight = 100.0 / max_rounds;
    let overall =
        completed_rounds.mul_add(round_weight, current_round_average(subtasks) * round_weight / 100.0);
    overall.clamp(0.0, 100.0)
}

/// [`overall_progress`] for one task.
#[must_use]
pub fn task_progress(task: &Task) -> f64 {
    overall_progress(&task.subtask_list, task.current_round, task.max_rounds)
}

/// Subtasks of `task` that finished successfully.
#[must_use]
pub fn completed_subtasks(task: &Task) -> usize {
    task.subtask_list
        .iter()
        .filter(|subtask| subtask.subtask_status == SubtaskStatus::Success)
        .count()
}

/// Display label for a task status.
#[must_use]
pub const fn status_label(status: TaskStatus) -> &'static str {
    match status {
        TaskStatus::Init => "Pending",
        TaskStatus::Assigned => "Assigned",
        TaskStatus::Running => "Running",
        TaskStatus::Success => "Completed",
        TaskStatus::Failure => "Failed",
        TaskStatus::Retrying => "Retrying",
    }
}

/// Dashboard grouping of task statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusBucket {
    /// Finished successfully.
    Success,
    /// Currently computing.
    Running,
    /// Failed permanently.
    Failure,
    /// Everything else: init, assigned, retrying.
    Waiting,
}

impl StatusBucket {
    /// Buckets in display order.
    pub const ALL: [Self; 4] = [Self::Success, Self::Running, Self::Failure, Self::Waiting];

    /// Bucket of a task status.
    #[must_use]
    pub const fn of(status: TaskStatus) -> Self {
        match status {
            TaskStatus::Success => Self::Success,
            TaskStatus::Running => Self::Running,
            TaskStatus::Failure => Self::Failure,
            TaskStatus::Init | TaskStatus::Assigned | TaskStatus::Retrying => Self::Waiting,
        }
    }

    /// Display label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Success => "Completed",
            Self::Running => "Running",
            Self::Failure => "Failed",
            Self::Waiting => "Waiting",
        }
    }
}

/// Aggregates shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct TaskOverview {
    /// Tasks currently running.
    pub running: usize,
    /// Successful tasks completed since UTC midnight.
    pub completed_today: usize,
    /// Non-empty buckets in display order.
    pub distribution: Vec<(StatusBucket, usize)>,
}

/// Summarise `tasks` as of `now`.
#[must_use]
pub fn task_overview(tasks: &[Task], now: DateTime<Utc>) -> TaskOverview {
    let midnight = now.date_naive().and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
    let completed_today = tasks
        .iter()
        .filter(|task| task.task_status == TaskStatus::Success)
        .filter_map(|task| task.completed_at.as_deref().and_then(parse_timestamp))
        .filter(|completed| midnight.is_some_and(|start| *completed >= start))
        .count();
    let distribution = StatusBucket::ALL
        .into_iter()
        .map(|bucket| {
            let count = tasks
                .iter()
                .filter(|task| StatusBucket::of(task.task_status) == bucket)
                .count();
            (bucket, count)
        })
        .filter(|(_, count)| *count > 0)
        .collect();

    TaskOverview {
        running: tasks
            .iter()
            .filter(|task| task.task_status == TaskStatus::Running)
            .count(),
        completed_today,
        distribution,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn subtask(progress: &str, status: SubtaskStatus) -> Subtask {
        Subtask {
            subtask_id: "s".to_string(),
            worker_id: "w".to_string(),
            start_index: 0,
            end_index: 10,
            subtask_status: status,
            progress: progress.to_string(),
            result: None,
            error: None,
        }
    }

    fn task(status: TaskStatus, completed_at: Option<&str>) -> Task {
        Task {
            task_id: "t".to_string(),
            function_id: "sum".to_string(),
            user_id: "u".to_string(),
            file_url: String::new(),
            task_status: status,
            subtask_list: Vec::new(),
            retry_times: 0,
            current_round: 1,
            max_rounds: 1,
            task_volume: 10,
            result: None,
            created_at: "2026-03-01T00:00:00Z".to_string(),
            completed_at: completed_at.map(str::to_string),
        }
    }

    fn close(left: f64, right: f64) -> bool {
        (left - right).abs() < 1e-9
    }

    #[test]
    fn progress_strings_parse_leniently() {
        assert!(close(parse_progress("50%"), 50.0));
        assert!(close(parse_progress(" 12.5 % "), 12.5));
        assert!(close(parse_progress("100"), 100.0));
        assert!(close(parse_progress("n/a"), 0.0));
        assert!(close(parse_progress("NaN"), 0.0));
    }

    #[test]
    fn second_of_four_rounds_at_seventy_five_percent() {
        let subtasks = [
            subtask("50%", SubtaskStatus::Computing),
            subtask("100%", SubtaskStatus::Success),
        ];
        assert!(close(current_round_average(&subtasks), 75.0));
        assert!(close(overall_progress(&subtasks, 2, 4), 43.75));
    }

    #[test]
    fn progress_is_clamped_and_guards_zero_rounds() {
        let subtasks = [subtask("100%", SubtaskStatus::Success)];
        assert!(close(overall_progress(&subtasks, 9, 4), 100.0));
        assert!(close(overall_progress(&subtasks, 0, 0), 100.0));
        assert!(close(overall_progress(&[], 3, 4), 0.0));
    }

    #[test]
    fn completed_subtasks_counts_successes() {
        let mut task = task(TaskStatus::Running, None);
        task.subtask_list = vec![
            subtask("100%", SubtaskStatus::Success),
            subtask("40%", SubtaskStatus::Computing),
            subtask("100%", SubtaskStatus::Success),
        ];
        assert_eq!(completed_subtasks(&task), 2);
        assert!(close(task_progress(&task), 80.0));
    }

    #[test]
    fn overview_buckets_and_counts_today() {
        let now = Utc
            .with_ymd_and_hms(2026, 3, 1, 12, 0, 0)
            .single()
            .unwrap_or_default();
        let tasks = [
            task(TaskStatus::Success, Some("2026-03-01T01:00:00Z")),
            task(TaskStatus::Success, Some("2026-02-28T23:59:59Z")),
            task(TaskStatus::Running, None),
            task(TaskStatus::Retrying, None),
            task(TaskStatus::Init, None),
        ];
        let overview = task_overview(&tasks, now);
        assert_eq!(overview.running, 1);
        assert_eq!(overview.completed_today, 1);
        assert_eq!(
            overview.distribution,
            vec![
                (StatusBucket::Success, 2),
                (StatusBucket::Running, 1),
                (StatusBucket::Waiting, 2),
            ]
        );
    }

    #[test]
    fn labels_cover_every_status() {
        assert_eq!(status_label(TaskStatus::Success), "Completed");
        assert_eq!(StatusBucket::of(TaskStatus::Assigned), StatusBucket::Waiting);
        assert_eq!(StatusBucket::Waiting.label(), "Waiting");
    }
}
