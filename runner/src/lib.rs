pub mod block;
pub mod capability;
pub mod config;
pub mod error;
pub mod executor;
pub mod output;
mod panic;
pub mod selection;
pub mod suite;

pub use block::{BlockContext, TestBlock, TestCase};
pub use capability::Capabilities;
pub use config::{BlockConfig, BlockConfigOverlay, MessageType, SystemMessage};
pub use error::{ConfigError, Stopped, SuiteError};
pub use executor::{RunState, TestRunner};
pub use output::{BufferSink, OutputSink, StdoutSink};
pub use selection::Selection;
pub use suite::{BlockEntry, BlockRegistry, Suite, SuiteConfig, SuiteReport};

pub use inspect::Value;
