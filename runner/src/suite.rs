use std::collections::BTreeMap;
use std::rc::Rc;

use futures::FutureExt;
use futures::future::LocalBoxFuture;
use serde::Deserialize;
use tracing::{info, trace};

use crate::block::TestBlock;
use crate::capability::Capabilities;
use crate::config::{BlockConfig, BlockConfigOverlay};
use crate::error::{Stopped, SuiteError};
use crate::executor::TestRunner;
use crate::output::OutputSink;
use crate::selection::Selection;

type BlockRun =
    Box<dyn Fn(String, BlockConfig, Rc<dyn OutputSink>) -> LocalBoxFuture<'static, Result<(), Stopped>>>;

/// Block factories by name. Each run of a block calls its factory afresh.
#[derive(Default)]
pub struct BlockRegistry {
    blocks: BTreeMap<String, BlockRun>,
}

impl BlockRegistry {
    pub fn new() -> Self {
        BlockRegistry::default()
    }

    pub fn register<H, F>(&mut self, name: impl Into<String>, factory: F) -> &mut Self
    where
        H: 'static,
        F: Fn(&Capabilities) -> TestBlock<H> + 'static,
    {
        let factory = Rc::new(factory);
        let run: BlockRun = Box::new(move |name: String, config: BlockConfig, sink: Rc<dyn OutputSink>| {
            let factory = Rc::clone(&factory);
            async move {
                let mut runner =
                    TestRunner::new(name, config, sink, |caps: &Capabilities| factory(caps));
                runner.run().await
            }
            .boxed_local()
        });
        self.blocks.insert(name.into(), run);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.blocks.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.blocks.keys().map(String::as_str)
    }

    fn get(&self, name: &str) -> Option<&BlockRun> {
        self.blocks.get(name)
    }
}

/// One configured test block.
#[derive(Debug, Clone, Deserialize)]
pub struct BlockEntry {
    pub name: String,
    /// Registry entry to build the block from. Defaults to `name`.
    #[serde(default)]
    pub block: Option<String>,
    #[serde(flatten)]
    pub overlay: BlockConfigOverlay,
}

impl BlockEntry {
    pub fn new(name: impl Into<String>) -> Self {
        BlockEntry {
            name: name.into(),
            block: None,
            overlay: BlockConfigOverlay::default(),
        }
    }

    pub fn registry_key(&self) -> &str {
        self.block.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SuiteConfig {
    /// Applied to every block before the block's own settings.
    pub default_config: BlockConfigOverlay,
    /// Which blocks run, by name.
    pub test_names: Selection<String>,
    /// Blocks in run order.
    pub tests: Vec<BlockEntry>,
}

impl SuiteConfig {
    /// The full configuration of the named block.
    pub fn block_config(&self, entry: &BlockEntry) -> Result<BlockConfig, SuiteError> {
        let mut config = BlockConfig::default();
        config
            .apply(&self.default_config)
            .and_then(|()| config.apply(&entry.overlay))
            .map_err(|source| SuiteError::Config {
                block: entry.name.clone(),
                source,
            })?;
        Ok(config)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuiteReport {
    pub completed: Vec<String>,
    pub skipped: Vec<String>,
    /// The block that stopped the suite.
    pub failed: Option<String>,
}

impl SuiteReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_none()
    }
}

/// Runs the configured blocks one after another. The first failing block
/// ends the suite.
pub struct Suite {
    config: SuiteConfig,
    registry: BlockRegistry,
    sink: Rc<dyn OutputSink>,
}

impl Suite {
    pub fn new(config: SuiteConfig, registry: BlockRegistry, sink: Rc<dyn OutputSink>) -> Self {
        Suite {
            config,
            registry,
            sink,
        }
    }

    /// Names of the blocks the selection lets through, in run order.
    pub fn selected(&self) -> Vec<&str> {
        self.config
            .tests
            .iter()
            .filter(|entry| !self.config.test_names.is_excluded(&entry.name))
            .map(|entry| entry.name.as_str())
            .collect()
    }

    /// Check every selected block resolves to a factory and a valid config.
    pub fn validate(&self) -> Result<(), SuiteError> {
        for entry in &self.config.tests {
            if self.config.test_names.is_excluded(&entry.name) {
                continue;
            }
            if !self.registry.contains(entry.registry_key()) {
                return Err(SuiteError::UnknownBlock(entry.registry_key().to_string()));
            }
            self.config.block_config(entry)?;
        }
        Ok(())
    }

    pub async fn run(&self) -> Result<SuiteReport, SuiteError> {
        self.announce_selection();

        let mut report = SuiteReport::default();
        for entry in &self.config.tests {
            if self.config.test_names.is_excluded(&entry.name) {
                trace!(block = %entry.name, "test block excluded by selection");
                report.skipped.push(entry.name.clone());
                continue;
            }

            let key = entry.registry_key();
            let run = self
                .registry
                .get(key)
                .ok_or_else(|| SuiteError::UnknownBlock(key.to_string()))?;
            let config = self.config.block_config(entry)?;

            info!(block = %entry.name, "running test block");
            match run(entry.name.clone(), config, Rc::clone(&self.sink)).await {
                Ok(()) => report.completed.push(entry.name.clone()),
                Err(Stopped) => {
                    info!(block = %entry.name, "test block failed, stopping suite");
                    report.failed = Some(entry.name.clone());
                    break;
                }
            }
        }
        Ok(report)
    }

    fn announce_selection(&self) {
        let names = &self.config.test_names;
        let message = if !names.only.is_empty() {
            format!(
                "Executing only '{}' test block{}",
                names.only.join("', '"),
                if names.only.len() > 1 { "s" } else { "" }
            )
        } else if !names.except.is_empty() {
            format!(
                "Executing all test blocks except '{}'",
                names.except.join("', '")
            )
        } else {
            return;
        };

        let banner = "!".repeat(27);
        self.sink.write_line("");
        self.sink.write_line(&format!("{} {} {}", banner, message, banner));
        self.sink.write_line("");
    }
}
