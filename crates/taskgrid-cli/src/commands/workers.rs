//! Fleet listing and single-worker monitoring.

use taskgrid_store::WorkerState;

use super::{Flow, resolve_client_id, watch_until};
use crate::cli::{OutputFormat, WorkerArgs, WorkersArgs, interval_or};
use crate::client::{AppContext, CliResult};
use crate::output::{emit, print_json, worker_detail, workers_table};

pub(crate) async fn handle_workers(ctx: &AppContext, args: WorkersArgs) -> CliResult<()> {
    let store = ctx.worker_store();
    if !args.watch {
        store
            .fetch_workers()
            .await
            .map_err(|err| ctx.reported(&err))?;
        return emit(ctx.output, &store.snapshot(), workers_table);
    }

    let interval = interval_or("interval_ms", args.interval_ms, ctx.config.worker_poll_interval)?;
    let mut updates = store.subscribe();
    store.start_polling(interval);
    let outcome = watch_until(ctx, &mut updates, None, |state: &WorkerState| {
        if state.loading {
            return Ok(Flow::Skip);
        }
        emit(ctx.output, state, workers_table)?;
        Ok(Flow::Continue)
    })
    .await;
    store.stop_polling();
    outcome
}

pub(crate) async fn handle_worker(ctx: &AppContext, args: WorkerArgs) -> CliResult<()> {
    let client_id = resolve_client_id(ctx, args.client_id)?;
    let store = ctx.worker_store();
    if !args.watch && args.ticks.is_none() {
        let worker = store
            .fetch_worker_detail(&client_id, &args.worker_id)
            .await
            .map_err(|err| ctx.reported(&err))?;
        return match ctx.output {
            OutputFormat::Json => print_json(&worker),
            OutputFormat::Table => {
                print!("{}", worker_detail(&worker, &store.snapshot()));
                Ok(())
            }
        };
    }

    let interval = interval_or(
        "interval_ms",
        args.interval_ms,
        ctx.config.worker_detail_poll_interval,
    )?;
    let mut updates = store.subscribe();
    store.start_worker_polling(client_id, args.worker_id.clone(), interval);
    let outcome = watch_until(ctx, &mut updates, args.ticks, |state: &WorkerState| {
        if state.loading {
            return Ok(Flow::Skip);
        }
        render_monitor(ctx, &args.worker_id, state)?;
        Ok(Flow::Continue)
    })
    .await;
    store.stop_polling();
    outcome
}

fn render_monitor(ctx: &AppContext, worker_id: &str, state: &WorkerState) -> CliResult<()> {
    match (&state.current_worker, &state.missing_worker) {
        (_, Some(missing)) => {
            eprintln!("worker {missing} is not reported by the fleet");
            Ok(())
        }
        (Some(worker), None) => emit(ctx.output, state, |state| worker_detail(worker, state)),
        (None, None) => {
            tracing::debug!(worker_id, "no sample yet");
            Ok(())
        }
    }
}
