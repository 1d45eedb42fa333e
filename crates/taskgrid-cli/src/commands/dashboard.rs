//! Combined fleet and task summary.

use taskgrid_store::{TaskState, TaskStore, WorkerState, WorkerStore};
use tokio::sync::watch;

use crate::cli::{DashboardArgs, interval_or};
use crate::client::{AppContext, CliError, CliResult};
use crate::output::{Dashboard, dashboard_table, emit};

pub(crate) async fn handle_dashboard(ctx: &AppContext, args: DashboardArgs) -> CliResult<()> {
    let workers = ctx.worker_store();
    let tasks = ctx.task_store();

    let Some(budget) = args.ticks else {
        let (fleet, list) = tokio::join!(workers.fetch_workers(), tasks.fetch_tasks(false));
        fleet.map_err(|err| ctx.reported(&err))?;
        list.map_err(|err| ctx.reported(&err))?;
        return render(ctx, &workers.snapshot(), &tasks);
    };

    let interval = interval_or("interval_ms", args.interval_ms, ctx.config.worker_poll_interval)?;
    let mut fleet_updates = workers.subscribe();
    let mut task_updates = tasks.subscribe();
    workers.start_polling(interval);
    tasks.start_list_polling(interval);
    let outcome = refresh(ctx, &workers, &tasks, &mut fleet_updates, &mut task_updates, budget).await;
    workers.stop_polling();
    tasks.stop_list_polling();
    outcome
}

async fn refresh(
    ctx: &AppContext,
    workers: &WorkerStore,
    tasks: &TaskStore,
    fleet_updates: &mut watch::Receiver<WorkerState>,
    task_updates: &mut watch::Receiver<TaskState>,
    budget: usize,
) -> CliResult<()> {
    let mut session = ctx.auth.subscribe();
    let mut rendered = 0_usize;
    while rendered < budget {
        tokio::select! {
            changed = fleet_updates.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
                fleet_updates.mark_unchanged();
            }
            changed = task_updates.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
                task_updates.mark_unchanged();
            }
            changed = session.changed() => {
                if changed.is_ok() && !session.borrow_and_update().is_authenticated() {
                    return Err(CliError::Reported);
                }
                continue;
            }
            _ = tokio::signal::ctrl_c() => return Ok(()),
        }
        let fleet = workers.snapshot();
        if fleet.loading || tasks.snapshot().loading {
            continue;
        }
        render(ctx, &fleet, tasks)?;
        rendered += 1;
    }
    Ok(())
}

fn render(ctx: &AppContext, fleet: &WorkerState, tasks: &TaskStore) -> CliResult<()> {
    let overview = tasks.overview();
    let dashboard = Dashboard {
        workers: fleet,
        tasks: &overview,
    };
    emit(ctx.output, &dashboard, dashboard_table)
}
