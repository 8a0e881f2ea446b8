//! Generate command - stream generated notebook content

use notebook_stream::{GenerateRequest, NotebookClient};

use super::{report, stopped};
use crate::output::{EventPrinter, OutputContext};

/// Generate content of `content_type` for a notebook and print it as it streams
pub async fn generate(
    client: &NotebookClient,
    notebook: i64,
    content_type: &str,
    prompt: Option<&str>,
    ctx: &OutputContext,
) -> bool {
    let mut request = GenerateRequest::new(notebook, content_type);
    if let Some(prompt) = prompt {
        request = request.with_prompt(prompt);
    }

    ctx.info(&format!("Generating {} for notebook {}...", content_type, notebook));

    let mut printer = EventPrinter::new(ctx);
    let stop = stopped(printer.closed());
    let outcome = client
        .stream_generate_until(&request, &mut printer, stop)
        .await;

    report(outcome, &mut printer, ctx)
}
