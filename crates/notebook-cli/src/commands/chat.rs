//! Chat command - stream a reply from a notebook conversation

use notebook_stream::{ChatRequest, NotebookClient};

use super::{report, stopped};
use crate::output::{EventPrinter, OutputContext};

/// Send a chat message and print the streamed reply
///
/// Returns whether the reply completed without an error event.
pub async fn chat(
    client: &NotebookClient,
    notebook: i64,
    conversation: Option<i64>,
    message: &str,
    ctx: &OutputContext,
) -> bool {
    let mut request = ChatRequest::new(notebook, message);
    if let Some(id) = conversation {
        request = request.in_conversation(id);
    }

    let mut printer = EventPrinter::new(ctx);
    let stop = stopped(printer.closed());
    let outcome = client
        .stream_chat_until(&request, &mut printer, stop)
        .await;

    report(outcome, &mut printer, ctx)
}
