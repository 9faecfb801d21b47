//! Stdio control: JSON method calls in on stdin, replies and events out on stdout,
//! one JSON object per line.

use std::io::Write;
use std::sync::Mutex;

use serde_json::json;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{info, warn};
use wearlink_core::{dispatch, Envelope, EventSink, MethodCall, MethodResult, RelayEngine};

/// Line-oriented output shared by replies and events. Write failures (a closed pipe, say)
/// come back as errors instead of panicking.
pub struct LineOutput<W> {
    out: Mutex<W>,
}

impl<W: Write> LineOutput<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn write_line(&self, line: &str) -> std::io::Result<()> {
        let mut out = match self.out.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        writeln!(out, "{line}")?;
        out.flush()
    }
}

/// Each inbound event goes out as `{"event": {...}}`.
impl<W: Write + Send> EventSink for LineOutput<W> {
    fn on_event(&self, envelope: Envelope) {
        let line = json!({ "event": envelope.into_value() }).to_string();
        if let Err(e) = self.write_line(&line) {
            warn!(error = %e, "event dropped, output unavailable");
        }
    }
}

/// Reply line for one call.
pub fn reply_line(result: &MethodResult) -> String {
    json!({ "reply": result }).to_string()
}

/// Handle one input line. Blank lines yield nothing.
pub async fn handle_line(engine: &RelayEngine, line: &str) -> Option<String> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let result = match serde_json::from_str::<MethodCall>(line) {
        Ok(call) => dispatch(engine, call).await,
        Err(e) => {
            warn!(error = %e, "unparseable method call");
            MethodResult::Error {
                code: "INVALID_CALL".to_owned(),
                message: e.to_string(),
            }
        }
    };
    Some(reply_line(&result))
}

/// Serve calls until input ends or the output fails. The caller decides what either means.
pub async fn run<R, W>(
    engine: &RelayEngine,
    input: R,
    output: &LineOutput<W>,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        if let Some(out) = handle_line(engine, &line).await {
            output.write_line(&out)?;
        }
    }
    info!("control input closed");
    Ok(())
}
