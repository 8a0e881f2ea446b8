//! Output formatting for nbstream (text, json)

use std::io::{self, Write};
use std::sync::Arc;

use clap::ValueEnum;
use colored::Colorize;
use notebook_stream::{EventKind, EventSink, StreamEvent};
use tokio::sync::Notify;
use tracing::debug;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Streamed text as it arrives (default)
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Json => "json",
        }
    }

    /// Parse a format name from the config file
    pub fn from_name(name: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(name, true).ok()
    }
}

/// Context for output rendering
pub struct OutputContext {
    pub format: OutputFormat,
    pub quiet: bool,
}

impl OutputContext {
    pub fn new(format: OutputFormat, no_color: bool, quiet: bool) -> Self {
        if no_color {
            colored::control::set_override(false);
        }
        Self { format, quiet }
    }

    /// Print an info message to stderr (unless in quiet mode)
    pub fn info(&self, msg: &str) {
        if !self.quiet {
            eprintln!("{}", msg.dimmed());
        }
    }

    /// Print a warning message
    pub fn warn(&self, msg: &str) {
        eprintln!("{}", msg.yellow());
    }

    /// Print an error message
    pub fn error(&self, msg: &str) {
        eprintln!("{}", msg.red());
    }
}

/// What a single event turns into in text mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextLine {
    /// Inline text delta
    Content(String),
    /// End of the reply
    Done(Option<i64>),
    /// Failure reported by the server or the transport
    Error(String),
    /// Nothing to show
    Skip,
}

impl TextLine {
    pub fn from_event(event: &StreamEvent) -> Self {
        match event.kind() {
            EventKind::Content => match &event.content {
                Some(text) if !text.is_empty() => Self::Content(text.clone()),
                _ => Self::Skip,
            },
            EventKind::Done => Self::Done(event.conversation_id),
            EventKind::Error => Self::Error(
                event
                    .error_text()
                    .unwrap_or("Unknown error")
                    .to_string(),
            ),
            EventKind::Other => Self::Skip,
        }
    }
}

/// Event sink that renders a stream to the terminal
///
/// Once stdout is closed (for example by `| head`), further output is
/// dropped and [`closed`](Self::closed) is notified so the caller can stop
/// the stream.
pub struct EventPrinter<'a> {
    ctx: &'a OutputContext,
    saw_error: bool,
    mid_line: bool,
    stdout_closed: bool,
    closed: Arc<Notify>,
}

impl<'a> EventPrinter<'a> {
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self {
            ctx,
            saw_error: false,
            mid_line: false,
            stdout_closed: false,
            closed: Arc::new(Notify::new()),
        }
    }

    /// Notified once stdout stops accepting output
    pub fn closed(&self) -> Arc<Notify> {
        Arc::clone(&self.closed)
    }

    /// Whether stdout stopped accepting output
    pub fn stdout_closed(&self) -> bool {
        self.stdout_closed
    }

    /// Whether any error event reached the printer
    pub fn saw_error(&self) -> bool {
        self.saw_error
    }

    /// Terminate a partially written text line
    pub fn finish(&mut self) {
        if self.mid_line {
            self.mid_line = false;
            self.write_stdout("\n");
        }
    }

    fn write_stdout(&mut self, text: &str) {
        if self.stdout_closed {
            return;
        }
        let mut stdout = io::stdout().lock();
        let result = stdout.write_all(text.as_bytes()).and_then(|_| stdout.flush());
        if let Err(e) = result {
            self.handle_write_error(e);
        }
    }

    fn handle_write_error(&mut self, error: io::Error) {
        if error.kind() == io::ErrorKind::BrokenPipe {
            debug!("stdout closed, stopping stream");
        } else {
            self.ctx.warn(&format!("Failed to write output: {}", error));
        }
        self.stdout_closed = true;
        self.closed.notify_one();
    }

    fn print_text(&mut self, event: &StreamEvent) {
        match TextLine::from_event(event) {
            TextLine::Content(text) => {
                self.write_stdout(&text);
                self.mid_line = !text.ends_with('\n');
            }
            TextLine::Done(conversation_id) => {
                self.finish();
                if let Some(id) = conversation_id {
                    self.ctx.info(&format!("[conversation {}]", id));
                }
            }
            TextLine::Error(reason) => {
                self.finish();
                self.ctx.error(&format!("Error: {}", reason));
            }
            TextLine::Skip => {}
        }
    }

    fn print_json(&mut self, event: &StreamEvent) {
        match serde_json::to_string(event) {
            Ok(json) => self.write_stdout(&format!("{}\n", json)),
            Err(e) => self.ctx.warn(&format!("Failed to serialize event: {}", e)),
        }
    }
}

impl EventSink for EventPrinter<'_> {
    fn emit(&mut self, event: StreamEvent) {
        if event.is_error() {
            self.saw_error = true;
        }

        match self.ctx.format {
            OutputFormat::Text => self.print_text(&event),
            OutputFormat::Json => self.print_json(&event),
        }
    }
}
