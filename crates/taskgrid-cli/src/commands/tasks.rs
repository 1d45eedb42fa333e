//! Task listing, submission and status tracking.

use serde_json::json;
use taskgrid_api_models::CreateTaskRequest;
use taskgrid_store::TaskState;

use super::{Flow, watch_until};
use crate::cli::{TaskCreateArgs, TaskStatusArgs, TasksArgs, interval_or};
use crate::client::{AppContext, CliResult};
use crate::output::{emit, task_detail, tasks_table};

pub(crate) async fn handle_tasks(ctx: &AppContext, args: TasksArgs) -> CliResult<()> {
    let store = ctx.task_store();
    if !args.watch {
        store
            .fetch_tasks(false)
            .await
            .map_err(|err| ctx.reported(&err))?;
        return emit(ctx.output, store.snapshot().tasks.as_slice(), tasks_table);
    }

    let interval = interval_or(
        "interval_ms",
        args.interval_ms,
        ctx.config.task_list_poll_interval,
    )?;
    let mut updates = store.subscribe();
    store.start_list_polling(interval);
    let outcome = watch_until(ctx, &mut updates, None, |state: &TaskState| {
        if state.loading {
            return Ok(Flow::Skip);
        }
        emit(ctx.output, state.tasks.as_slice(), tasks_table)?;
        Ok(Flow::Continue)
    })
    .await;
    store.stop_list_polling();
    outcome
}

pub(crate) async fn handle_task_create(ctx: &AppContext, args: TaskCreateArgs) -> CliResult<()> {
    let request = CreateTaskRequest {
        function_id: args.function_id,
    };
    let task_id = ctx
        .task_store()
        .create_task(&request)
        .await
        .map_err(|err| ctx.reported(&err))?;
    emit(ctx.output, &json!({ "task_id": &task_id }), |_| format!("{task_id}\n"))
}

pub(crate) async fn handle_task_status(ctx: &AppContext, args: TaskStatusArgs) -> CliResult<()> {
    let store = ctx.task_store();
    if !args.watch {
        let task = store
            .fetch_task_detail(&args.task_id)
            .await
            .map_err(|err| ctx.reported(&err))?;
        return emit(ctx.output, &task, task_detail);
    }

    let interval = interval_or("interval_ms", args.interval_ms, ctx.config.task_poll_interval)?;
    let mut updates = store.subscribe();
    store.start_polling(args.task_id.clone(), interval);
    let outcome = watch_until(ctx, &mut updates, None, |state: &TaskState| {
        let Some(task) = state
            .current_task
            .as_ref()
            .filter(|task| !state.loading && task.task_id == args.task_id)
        else {
            return Ok(Flow::Skip);
        };
        emit(ctx.output, task, task_detail)?;
        if task.task_status.is_terminal() {
            Ok(Flow::Stop)
        } else {
            Ok(Flow::Continue)
        }
    })
    .await;
    store.stop_polling();
    outcome
}
