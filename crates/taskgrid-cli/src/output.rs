//! Output renderers and formatting helpers for CLI commands.
//!
//! Table renderers return the text so handlers decide when to print it.

use std::fmt::Write as _;

use anyhow::anyhow;
use serde::Serialize;
use taskgrid_api_models::{ClientOrg, FileRecord, Task};
use taskgrid_store::{
    Session, TaskOverview, Worker, WorkerState, completed_subtasks,
    format_file_size, status_label, task_progress,
};

use crate::cli::OutputFormat;
use crate::client::{CliError, CliResult};

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::failure(anyhow!("failed to format JSON: {err}")))?;
    println!("{text}");
    Ok(())
}

/// Print `value` as JSON or the table produced by `table`.
pub(crate) fn emit<T, F>(format: OutputFormat, value: &T, table: F) -> CliResult<()>
where
    T: Serialize + ?Sized,
    F: FnOnce(&T) -> String,
{
    match format {
        OutputFormat::Json => print_json(value),
        OutputFormat::Table => {
            print!("{}", table(value));
            Ok(())
        }
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

pub(crate) fn session_table(session: &Session) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "display name: {}",
        session.display_name.as_deref().unwrap_or("-")
    );
    let _ = writeln!(out, "client: {}", session.client_id.as_deref().unwrap_or("-"));
    let _ = writeln!(out, "user: {}", session.user_id.as_deref().unwrap_or("-"));
    out
}

pub(crate) fn clients_table(clients: &[ClientOrg]) -> String {
    let mut out = format!("{:<24} {:<28} WEBSITE\n", "ID", "NAME");
    for client in clients {
        let _ = writeln!(
            out,
            "{:<24} {:<28} {}",
            client.client_id,
            client.name,
            client.website.as_deref().unwrap_or("-")
        );
    }
    out
}

pub(crate) fn workers_table(state: &WorkerState) -> String {
    let mut out = format!(
        "{:<20} {:<12} {:<8} {:>6} {:>6} {:>6} {:<4} HEARTBEAT\n",
        "ID", "CLIENT", "STATUS", "CPU", "MEM", "VRAM", "BUSY"
    );
    for worker in &state.workers {
        let _ = writeln!(
            out,
            "{:<20} {:<12} {:<8} {:>5.1}% {:>5.1}% {:>5.1}% {:<4} {}",
            worker.worker_id,
            worker.client_id,
            worker.status.as_str(),
            worker.cpu_usage_percent,
            worker.memory_usage_percent,
            worker.vram_usage_percent,
            yes_no(worker.busy),
            worker.last_heartbeat
        );
    }
    let _ = writeln!(
        out,
        "online: {}  available: {}  total: {}",
        state.online_count,
        state.available_count,
        state.workers.len()
    );
    out
}

pub(crate) fn worker_detail(worker: &Worker, state: &WorkerState) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "id: {}", worker.worker_id);
    let _ = writeln!(out, "client: {}", worker.client_id);
    let _ = writeln!(out, "status: {}", worker.status.as_str());
    let _ = writeln!(out, "busy: {}", yes_no(worker.busy));
    let _ = writeln!(
        out,
        "capacity: {} cores @ {:.1} GHz, {:.1} GB memory, {:.1} GB vram",
        worker.cpu_cores, worker.cpu_frequency_ghz, worker.memory_gb, worker.vram_gb
    );
    let _ = writeln!(
        out,
        "usage: cpu {:.1}% / mem {:.1}% / vram {:.1}%",
        worker.cpu_usage_percent, worker.memory_usage_percent, worker.vram_usage_percent
    );
    let _ = writeln!(out, "heartbeat: {}", worker.last_heartbeat);
    let _ = writeln!(out, "samples: {}", state.resource_history.len());
    out
}

pub(crate) fn tasks_table(tasks: &[Task]) -> String {
    let mut out = format!(
        "{:<36} {:<16} {:<10} {:>8} {:>9} CREATED\n",
        "ID", "FUNCTION", "STATUS", "PROGRESS", "SUBTASKS"
    );
    for task in tasks {
        let subtasks = format!("{}/{}", completed_subtasks(task), task.subtask_list.len());
        let _ = writeln!(
            out,
            "{:<36} {:<16} {:<10} {:>7.2}% {:>9} {}",
            task.task_id,
            task.function_id,
            status_label(task.task_status),
            task_progress(task),
            subtasks,
            task.created_at
        );
    }
    out
}

pub(crate) fn task_detail(task: &Task) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "id: {}", task.task_id);
    let _ = writeln!(out, "function: {}", task.function_id);
    let _ = writeln!(out, "status: {}", status_label(task.task_status));
    let _ = writeln!(
        out,
        "round: {}/{}  retries: {}",
        task.current_round, task.max_rounds, task.retry_times
    );
    let _ = writeln!(out, "progress: {:.2}%", task_progress(task));
    let _ = writeln!(out, "volume: {}", task.task_volume);
    let _ = writeln!(out, "created: {}", task.created_at);
    if let Some(completed) = &task.completed_at {
        let _ = writeln!(out, "completed: {completed}");
    }
    if let Some(result) = &task.result {
        let _ = writeln!(out, "result: {result}");
    }
    if !task.subtask_list.is_empty() {
        let _ = writeln!(
            out,
            "subtasks ({}/{} done):",
            completed_subtasks(task),
            task.subtask_list.len()
        );
        for subtask in &task.subtask_list {
            let _ = writeln!(
                out,
                "  {:<24} {:<16} {:>6}..{:<6} {:<9} {}",
                subtask.subtask_id,
                subtask.worker_id,
                subtask.start_index,
                subtask.end_index,
                subtask.subtask_status.as_str(),
                subtask.progress
            );
        }
    }
    out
}

pub(crate) fn files_table(files: &[FileRecord]) -> String {
    let mut out = format!("{:<36} {:<32} {:>12} UPLOADED\n", "ID", "NAME", "SIZE");
    for file in files {
        let _ = writeln!(
            out,
            "{:<36} {:<32} {:>12} {}",
            file.file_id,
            file.file_name,
            format_file_size(file.file_size),
            file.uploaded_at
        );
    }
    out
}

/// Combined dashboard view.
#[derive(Debug, Serialize)]
pub(crate) struct Dashboard<'a> {
    pub(crate) workers: &'a WorkerState,
    pub(crate) tasks: &'a TaskOverview,
}

pub(crate) fn dashboard_table(dashboard: &Dashboard<'_>) -> String {
    let workers = dashboard.workers;
    let tasks = dashboard.tasks;
    let mut out = String::new();
    let _ = writeln!(
        out,
        "workers: {} total, {} online, {} available",
        workers.workers.len(),
        workers.online_count,
        workers.available_count
    );
    if let Some(sample) = workers.fleet_history.latest() {
        let _ = writeln!(
            out,
            "fleet usage: cpu {:.1}% / mem {:.1}% / vram {:.1}%",
            sample.cpu, sample.memory, sample.vram
        );
    }
    let _ = writeln!(
        out,
        "tasks: {} running, {} completed today",
        tasks.running, tasks.completed_today
    );
    let distribution = tasks
        .distribution
        .iter()
        .map(|(bucket, count)| format!("{} {count}", bucket.label()))
        .collect::<Vec<_>>()
        .join(", ");
    if !distribution.is_empty() {
        let _ = writeln!(out, "distribution: {distribution}");
    }
    out
}
