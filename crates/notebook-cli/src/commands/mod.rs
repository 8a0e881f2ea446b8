//! Command implementations for nbstream

pub mod chat;
pub mod generate;

pub use chat::chat;
pub use generate::generate;

use std::sync::Arc;

use notebook_stream::StreamOutcome;
use tokio::sync::Notify;

use crate::output::{EventPrinter, OutputContext};

/// Resolves when the user presses Ctrl+C
///
/// Never resolves if the signal handler cannot be installed.
pub async fn interrupted() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// Resolves on Ctrl+C or once stdout is closed
pub async fn stopped(stdout_closed: Arc<Notify>) {
    tokio::select! {
        _ = interrupted() => {}
        _ = stdout_closed.notified() => {}
    }
}

/// Report how a stream ended; returns whether it ended cleanly
pub fn report(
    outcome: StreamOutcome,
    printer: &mut EventPrinter<'_>,
    ctx: &OutputContext,
) -> bool {
    printer.finish();

    match outcome {
        StreamOutcome::Cancelled if !printer.stdout_closed() => ctx.info("Cancelled"),
        StreamOutcome::Rejected { status } => {
            tracing::debug!(status, "Server rejected the request");
        }
        _ => {}
    }

    outcome.is_success() && !printer.saw_error()
}
