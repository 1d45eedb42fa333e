//! Notices printed to stderr so stdout stays machine-readable.

use taskgrid_core::{Notice, Notifier};

/// Writes each notice as `<level>: <message>` on stderr.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn notify(&self, notice: Notice) {
        eprintln!("{notice}");
    }
}
