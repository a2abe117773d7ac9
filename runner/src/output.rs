use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use inspect::{Value, print};

use crate::config::{Hook, HookContext};

/// Where every message and test log line ends up.
pub trait OutputSink {
    fn write_line(&self, line: &str);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSink;

impl OutputSink for StdoutSink {
    fn write_line(&self, line: &str) {
        let mut out = io::stdout().lock();
        let _ = writeln!(out, "{}", line);
    }
}

/// Keeps lines in memory. Clones share one buffer, so a test can hold a
/// clone while the runner writes into another.
#[derive(Debug, Clone, Default)]
pub struct BufferSink {
    lines: Rc<RefCell<Vec<String>>>,
}

impl BufferSink {
    pub fn new() -> Self {
        BufferSink::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }

    /// Everything written so far, one entry per line.
    pub fn text(&self) -> String {
        self.lines.borrow().join("\n")
    }
}

impl OutputSink for BufferSink {
    fn write_line(&self, line: &str) {
        self.lines.borrow_mut().push(line.to_string());
    }
}

/// Level-gated writer shared by a runner and its capabilities.
#[derive(Clone)]
pub struct Logger {
    sink: Rc<dyn OutputSink>,
    level: u8,
}

impl Logger {
    pub fn new(sink: Rc<dyn OutputSink>, level: u8) -> Self {
        Logger { sink, level }
    }

    pub fn sink(&self) -> &dyn OutputSink {
        self.sink.as_ref()
    }

    /// Write `text` between the hooks when the configured level admits
    /// `gate`. Hooks run even when there is no text.
    pub fn emit(&self, gate: u8, before: Option<&Hook>, after: Option<&Hook>, text: Option<&str>) {
        if self.level < gate {
            return;
        }
        let cx = HookContext {
            level: self.level,
            out: self.sink.as_ref(),
        };
        if let Some(hook) = before {
            hook(&cx);
        }
        if let Some(text) = text {
            self.sink.write_line(text);
        }
        if let Some(hook) = after {
            hook(&cx);
        }
    }
}

/// Join log arguments with single spaces. `Undefined` arguments are dropped
/// and composites go through the printer; `None` if nothing is left.
pub fn join_log_args(args: &[Value]) -> Option<String> {
    let parts: Vec<String> = args
        .iter()
        .filter(|arg| arg.is_defined())
        .map(|arg| print(arg, false).unwrap_or_else(|| arg.to_string()))
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}
