//! Command handlers.
//!
//! One-shot commands fetch once and render. Watch commands start the matching
//! store poller, re-render on every settled state change and stop on Ctrl-C,
//! on a tick budget, or when the session expires.

pub(crate) mod auth;
pub(crate) mod dashboard;
pub(crate) mod files;
pub(crate) mod tasks;
pub(crate) mod workers;

use tokio::sync::watch;

use crate::client::{AppContext, CliError, CliResult};

/// What a watch loop does after rendering one state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flow {
    /// State was not worth rendering (for example mid-fetch).
    Skip,
    /// Rendered; keep watching.
    Continue,
    /// Rendered; the watch is complete.
    Stop,
}

/// Watch `rx` and feed every change to `render` until it returns
/// [`Flow::Stop`], `budget` renders have happened, the operator presses
/// Ctrl-C, or the session ends.
pub(crate) async fn watch_until<T, F>(
    ctx: &AppContext,
    rx: &mut watch::Receiver<T>,
    budget: Option<usize>,
    mut render: F,
) -> CliResult<()>
where
    T: Clone,
    F: FnMut(&T) -> CliResult<Flow>,
{
    let mut session = ctx.auth.subscribe();
    let mut rendered = 0_usize;
    loop {
        if budget.is_some_and(|limit| rendered >= limit) {
            return Ok(());
        }
        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
                let state = rx.borrow_and_update().clone();
                match render(&state)? {
                    Flow::Skip => {}
                    Flow::Continue => rendered += 1,
                    Flow::Stop => return Ok(()),
                }
            }
            changed = session.changed() => {
                if changed.is_ok() && !session.borrow_and_update().is_authenticated() {
                    return Err(CliError::Reported);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::debug!("watch interrupted");
                return Ok(());
            }
        }
    }
}

/// Client id for organisation-scoped calls: the flag, else the session's.
pub(crate) fn resolve_client_id(ctx: &AppContext, flag: Option<String>) -> CliResult<String> {
    flag.or_else(|| {
        ctx.auth
            .snapshot()
            .session
            .and_then(|session| session.client_id)
    })
    .filter(|id| !id.trim().is_empty())
    .ok_or_else(|| CliError::validation("--client-id is required when not logged in"))
}
