use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use inspect::Value;

use crate::config::{LogConfig, MessageType, TypeDefaults};
use crate::output::{Logger, OutputSink, join_log_args};
use crate::panic::QuietPanics;

/// What a test block gets handed by its runner: `assert`, `log`, `error`
/// and `expect_error`. Clones share the same sticky error slot.
#[derive(Clone)]
pub struct Capabilities {
    inner: Rc<Shared>,
}

struct Shared {
    logger: Logger,
    /// Gate and hooks for test logs (the `other` message type).
    other: TypeDefaults,
    error: RefCell<Option<Value>>,
}

impl Capabilities {
    pub fn new(sink: Rc<dyn OutputSink>, logs: &LogConfig) -> Self {
        Self::with_logger(
            Logger::new(sink, logs.level),
            logs.system_messages.type_defaults(MessageType::Other).clone(),
        )
    }

    pub(crate) fn with_logger(logger: Logger, other: TypeDefaults) -> Self {
        Capabilities {
            inner: Rc::new(Shared {
                logger,
                other,
                error: RefCell::new(None),
            }),
        }
    }

    /// Report `args` when `condition` is false. Never fails the test.
    pub fn assert(&self, condition: bool, args: &[Value]) -> bool {
        if !condition {
            let line = match join_log_args(args) {
                Some(message) => format!("Assertion failed: {}", message),
                None => "Assertion failed".to_string(),
            };
            self.inner.logger.sink().write_line(&line);
        }
        condition
    }

    /// Test output; shown only at the highest log level.
    pub fn log(&self, args: &[Value]) {
        let other = &self.inner.other;
        self.inner.logger.emit(
            other.level,
            other.before.as_ref(),
            other.after.as_ref(),
            join_log_args(args).as_deref(),
        );
    }

    /// Record a failure. The first recorded value sticks; later ones are
    /// ignored.
    pub fn error(&self, error: impl Into<Value>) {
        let mut slot = self.inner.error.borrow_mut();
        if slot.is_none() {
            *slot = Some(error.into());
        }
    }

    /// Run `f`, expecting it to fail. Returning `Err` or panicking is the
    /// expected outcome; returning `Ok` records `message` as the error.
    pub fn expect_error<T, E>(&self, message: impl Into<Value>, f: impl FnOnce() -> Result<T, E>) {
        let outcome = {
            let _quiet = QuietPanics::enter();
            panic::catch_unwind(AssertUnwindSafe(f))
        };
        let threw = !matches!(outcome, Ok(Ok(_)));
        if !threw {
            self.error(message);
        }
    }

    pub fn recorded_error(&self) -> Option<Value> {
        self.inner.error.borrow().clone()
    }

    pub(crate) fn clear_error(&self) {
        self.inner.error.borrow_mut().take();
    }

    pub(crate) fn logger(&self) -> &Logger {
        &self.inner.logger
    }
}
