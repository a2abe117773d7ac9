use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::rc::Rc;

use futures::FutureExt;
use inspect::template::{self, Lookup, Record};
use inspect::{ErrorObject, Value};
use tracing::{debug, trace};

use crate::block::{BlockContext, TestBlock, TestCase};
use crate::capability::Capabilities;
use crate::config::{BlockConfig, SystemMessage};
use crate::error::Stopped;
use crate::output::{Logger, OutputSink};
use crate::panic::QuietPanics;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    NotStarted,
    Running,
    /// Every selected test settled without an error.
    Completed,
    /// A test recorded an error; it was reported and the block stopped.
    Failed,
}

/// Runs one named block's tests in order, one at a time, until the last test
/// settles or the first error sticks.
pub struct TestRunner<H> {
    name: String,
    config: BlockConfig,
    context: Rc<BlockContext<H>>,
    tests: Vec<TestCase<H>>,
    /// Position of the current test; `None` before the first step.
    index: Option<usize>,
    state: RunState,
}

impl<H: 'static> TestRunner<H> {
    /// Build the block by handing `factory` a fresh set of capabilities.
    pub fn new<F>(
        name: impl Into<String>,
        config: BlockConfig,
        sink: Rc<dyn OutputSink>,
        factory: F,
    ) -> Self
    where
        F: FnOnce(&Capabilities) -> TestBlock<H>,
    {
        let name = name.into();
        let caps = Capabilities::new(sink, &config.logs);
        let TestBlock { tests, helpers } = factory(&caps);
        let context = Rc::new(BlockContext::new(name.clone(), caps, helpers));
        TestRunner {
            name,
            config,
            context,
            tests,
            index: None,
            state: RunState::NotStarted,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn test_count(&self) -> usize {
        self.tests.len()
    }

    /// Human (1-based) position of the current test, 0 before the first.
    pub fn test_index(&self) -> usize {
        self.index.map_or(0, |index| index + 1)
    }

    /// The sticky error, if one was recorded.
    pub fn error(&self) -> Option<Value> {
        self.context.caps().recorded_error()
    }

    /// Run the block from the top.
    ///
    /// Resolves once every test has settled. A recorded error is written
    /// out through the `error` message and the run then fails with
    /// [`Stopped`], which carries nothing further.
    pub async fn run(&mut self) -> Result<(), Stopped> {
        self.index = None;
        // An error recorded by the factory counts for the first run only.
        if self.state != RunState::NotStarted {
            self.context.caps().clear_error();
        }
        self.transition(RunState::Running);
        self.system_message(SystemMessage::Start, None);

        if let Some(error) = self.context.caps().recorded_error() {
            return self.fail(error);
        }

        loop {
            let next = self.index.map_or(0, |index| index + 1);
            if next >= self.tests.len() {
                self.transition(RunState::Completed);
                self.system_message(SystemMessage::End, None);
                return Ok(());
            }

            self.index = Some(next);
            if self.config.test_indexes.is_excluded(&(next + 1)) {
                trace!(block = %self.name, test = next + 1, "test excluded by selection");
                continue;
            }

            self.system_message(SystemMessage::TestStart, None);

            if let Err(thrown) = self.invoke(next).await {
                self.context.caps().error(thrown);
            }

            if let Some(error) = self.context.caps().recorded_error() {
                return self.fail(error);
            }

            self.system_message(SystemMessage::TestEnd, None);
        }
    }

    /// Report the sticky error and stop.
    fn fail(&mut self, error: Value) -> Result<(), Stopped> {
        self.system_message(SystemMessage::Error, Some(error));
        self.transition(RunState::Failed);
        Err(Stopped)
    }

    /// Call the test and fold a panic into a thrown error value.
    async fn invoke(&self, index: usize) -> Result<(), Value> {
        let future = self.tests[index].invoke(Rc::clone(&self.context), index);
        let _quiet = QuietPanics::enter();
        match AssertUnwindSafe(future).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(payload) => Err(Value::Error(ErrorObject::named(
                "Panic",
                panic_message(payload.as_ref()),
            ))),
        }
    }

    fn transition(&mut self, next: RunState) {
        debug!(block = %self.name, from = ?self.state, to = ?next, "test block state");
        self.state = next;
    }

    fn system_message(&self, message: SystemMessage, error: Option<Value>) {
        let Some(effective) = self.config.logs.system_messages.effective(message) else {
            trace!(block = %self.name, message = message.name(), "system message removed");
            return;
        };

        let mut data = Record::new();
        if let Some(error) = error {
            data.insert("error", error);
        }
        let block = self.block_data();
        let message_data = effective.data();
        let sources: [&dyn Lookup; 3] = [&message_data, &data, &block];
        let text = template::resolve(&effective.template, &sources);

        self.logger().emit(
            effective.level,
            effective.before.as_ref(),
            effective.after.as_ref(),
            text.as_deref(),
        );
    }

    /// Template data describing the block and its current position.
    fn block_data(&self) -> Record {
        let index = self.index.map_or(-1, |index| index as i64);
        Record::new()
            .with("testBlockName", self.name.as_str())
            .with("testIndex", self.test_index())
            .with("index", index)
            .with("testCount", self.tests.len())
    }

    fn logger(&self) -> &Logger {
        self.context.caps().logger()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "test panicked".to_string()
    }
}
