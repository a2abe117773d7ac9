use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use inspect::Record;
use serde::Deserialize;

use crate::error::ConfigError;
use crate::output::OutputSink;
use crate::selection::Selection;

/// Highest meaningful `logs.level`: everything, including test logs.
pub const MAX_LOG_LEVEL: u8 = 2;

/// Side effect run before or after a message is written.
pub type Hook = Rc<dyn Fn(&HookContext<'_>)>;

/// What a hook gets to see: the block's log level and its output.
pub struct HookContext<'a> {
    pub level: u8,
    pub out: &'a dyn OutputSink,
}

fn blank_line() -> Hook {
    Rc::new(|cx: &HookContext<'_>| cx.out.write_line(""))
}

fn blank_line_when_verbose() -> Hook {
    Rc::new(|cx: &HookContext<'_>| {
        if cx.level > 0 {
            cx.out.write_line("");
        }
    })
}

fn end_spacing() -> Hook {
    Rc::new(|cx: &HookContext<'_>| {
        cx.out.write_line("");
        if cx.level > 0 {
            cx.out.write_line("\n\n");
        }
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    /// Block lifecycle: start, error, end.
    Main,
    /// Per-test progress.
    Info,
    /// Everything a test logs itself.
    Other,
}

impl MessageType {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageType::Main => "main",
            MessageType::Info => "info",
            MessageType::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SystemMessage {
    Start,
    TestStart,
    TestEnd,
    Error,
    End,
}

impl SystemMessage {
    pub fn name(self) -> &'static str {
        match self {
            SystemMessage::Start => "start",
            SystemMessage::TestStart => "testStart",
            SystemMessage::TestEnd => "testEnd",
            SystemMessage::Error => "error",
            SystemMessage::End => "end",
        }
    }
}

/// Defaults shared by every message of one [`MessageType`].
#[derive(Clone, Default)]
pub struct TypeDefaults {
    pub level: u8,
    pub msg_start: Option<String>,
    pub msg_end: Option<String>,
    pub before: Option<Hook>,
    pub after: Option<Hook>,
}

impl TypeDefaults {
    fn decorated(level: u8, msg_start: &str, msg_end: &str) -> Self {
        TypeDefaults {
            level,
            msg_start: Some(msg_start.to_string()),
            msg_end: Some(msg_end.to_string()),
            before: None,
            after: None,
        }
    }
}

impl fmt::Debug for TypeDefaults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDefaults")
            .field("level", &self.level)
            .field("msg_start", &self.msg_start)
            .field("msg_end", &self.msg_end)
            .field("before", &self.before.is_some())
            .field("after", &self.after.is_some())
            .finish()
    }
}

/// One system message. Unset fields fall back to the type defaults.
#[derive(Clone)]
pub struct MessageSpec {
    pub kind: MessageType,
    pub template: String,
    pub level: Option<u8>,
    pub msg_start: Option<String>,
    pub msg_end: Option<String>,
    pub before: Option<Hook>,
    pub after: Option<Hook>,
}

impl MessageSpec {
    pub fn new(kind: MessageType, template: impl Into<String>) -> Self {
        MessageSpec {
            kind,
            template: template.into(),
            level: None,
            msg_start: None,
            msg_end: None,
            before: None,
            after: None,
        }
    }

    pub fn with_before(mut self, hook: Hook) -> Self {
        self.before = Some(hook);
        self
    }

    pub fn with_after(mut self, hook: Hook) -> Self {
        self.after = Some(hook);
        self
    }
}

impl fmt::Debug for MessageSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageSpec")
            .field("kind", &self.kind)
            .field("template", &self.template)
            .field("level", &self.level)
            .field("msg_start", &self.msg_start)
            .field("msg_end", &self.msg_end)
            .field("before", &self.before.is_some())
            .field("after", &self.after.is_some())
            .finish()
    }
}

/// A message spec with its type defaults folded in.
#[derive(Clone)]
pub struct EffectiveMessage {
    pub kind: MessageType,
    pub level: u8,
    pub template: String,
    pub msg_start: Option<String>,
    pub msg_end: Option<String>,
    pub before: Option<Hook>,
    pub after: Option<Hook>,
}

impl EffectiveMessage {
    /// Template data contributed by the message itself.
    pub fn data(&self) -> Record {
        let mut data = Record::new()
            .with("type", self.kind.as_str())
            .with("level", self.level as i64)
            .with("template", self.template.as_str());
        if let Some(start) = &self.msg_start {
            data.insert("msgStart", start.as_str());
        }
        if let Some(end) = &self.msg_end {
            data.insert("msgEnd", end.as_str());
        }
        data
    }
}

#[derive(Debug, Clone)]
pub struct SystemMessages {
    pub main: TypeDefaults,
    pub info: TypeDefaults,
    pub other: TypeDefaults,
    pub messages: BTreeMap<SystemMessage, MessageSpec>,
}

impl Default for SystemMessages {
    fn default() -> Self {
        let main = TypeDefaults {
            after: Some(blank_line_when_verbose()),
            ..TypeDefaults::decorated(0, &">".repeat(24), &"<".repeat(24))
        };
        let info = TypeDefaults::decorated(1, &"-".repeat(24), &"-".repeat(24));
        let other = TypeDefaults {
            level: 2,
            ..TypeDefaults::default()
        };

        let mut messages = BTreeMap::new();
        messages.insert(
            SystemMessage::Start,
            MessageSpec::new(
                MessageType::Main,
                "{msgStart} Starting {testBlockName} ... {msgEnd}",
            ),
        );
        messages.insert(
            SystemMessage::Error,
            MessageSpec::new(
                MessageType::Main,
                "{msgStart} Error in {testBlockName} {msgEnd}\nTest index: {testIndex}\nTest error: {error}",
            ),
        );
        messages.insert(
            SystemMessage::End,
            MessageSpec::new(
                MessageType::Main,
                "{msgStart} Ended {testBlockName}. All Good!!! {msgEnd}",
            )
            .with_after(end_spacing()),
        );
        messages.insert(
            SystemMessage::TestStart,
            MessageSpec::new(MessageType::Info, "{msgStart} testing {testIndex} {msgEnd}"),
        );
        messages.insert(
            SystemMessage::TestEnd,
            MessageSpec::new(MessageType::Info, "").with_after(blank_line()),
        );

        SystemMessages {
            main,
            info,
            other,
            messages,
        }
    }
}

impl SystemMessages {
    pub fn type_defaults(&self, kind: MessageType) -> &TypeDefaults {
        match kind {
            MessageType::Main => &self.main,
            MessageType::Info => &self.info,
            MessageType::Other => &self.other,
        }
    }

    pub fn type_defaults_mut(&mut self, kind: MessageType) -> &mut TypeDefaults {
        match kind {
            MessageType::Main => &mut self.main,
            MessageType::Info => &mut self.info,
            MessageType::Other => &mut self.other,
        }
    }

    pub fn get(&self, message: SystemMessage) -> Option<&MessageSpec> {
        self.messages.get(&message)
    }

    pub fn set(&mut self, message: SystemMessage, spec: MessageSpec) {
        self.messages.insert(message, spec);
    }

    /// The message's own fields over its type defaults. `None` when the
    /// message has been removed from the table.
    pub fn effective(&self, message: SystemMessage) -> Option<EffectiveMessage> {
        let spec = self.messages.get(&message)?;
        let defaults = self.type_defaults(spec.kind);
        Some(EffectiveMessage {
            kind: spec.kind,
            level: spec.level.unwrap_or(defaults.level),
            template: spec.template.clone(),
            msg_start: spec.msg_start.clone().or_else(|| defaults.msg_start.clone()),
            msg_end: spec.msg_end.clone().or_else(|| defaults.msg_end.clone()),
            before: spec.before.clone().or_else(|| defaults.before.clone()),
            after: spec.after.clone().or_else(|| defaults.after.clone()),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    /// 0: lifecycle messages only, 1: plus per-test progress, 2: everything.
    pub level: u8,
    pub system_messages: SystemMessages,
}

/// Everything one test block runs with.
#[derive(Debug, Clone, Default)]
pub struct BlockConfig {
    /// Selection over 1-based test positions.
    pub test_indexes: Selection<usize>,
    pub logs: LogConfig,
}

impl BlockConfig {
    pub fn with_log_level(mut self, level: u8) -> Self {
        self.logs.level = level;
        self
    }

    pub fn with_test_indexes(mut self, test_indexes: Selection<usize>) -> Self {
        self.test_indexes = test_indexes;
        self
    }

    /// Merge a partial configuration over this one. Nothing changes when the
    /// overlay is rejected.
    pub fn apply(&mut self, overlay: &BlockConfigOverlay) -> Result<(), ConfigError> {
        if let Some(level) = overlay.logs.as_ref().and_then(|logs| logs.level) {
            if level > MAX_LOG_LEVEL {
                return Err(ConfigError::InvalidLogLevel(level));
            }
        }

        if let Some(test_indexes) = &overlay.test_indexes {
            self.test_indexes = test_indexes.clone();
        }

        let Some(logs) = &overlay.logs else {
            return Ok(());
        };
        if let Some(level) = logs.level {
            self.logs.level = level;
        }

        let messages = &mut self.logs.system_messages;
        for (kind, patch) in &logs.types {
            let defaults = messages.type_defaults_mut(*kind);
            if let Some(level) = patch.level {
                defaults.level = level;
            }
            if let Some(start) = &patch.msg_start {
                defaults.msg_start = Some(start.clone());
            }
            if let Some(end) = &patch.msg_end {
                defaults.msg_end = Some(end.clone());
            }
        }

        for (message, patch) in &logs.system_messages {
            let kind = patch.kind;
            let spec = messages
                .messages
                .entry(*message)
                .or_insert_with(|| MessageSpec::new(kind.unwrap_or(MessageType::Main), ""));
            if let Some(kind) = kind {
                spec.kind = kind;
            }
            if let Some(template) = &patch.template {
                spec.template = template.clone();
            }
            if let Some(level) = patch.level {
                spec.level = Some(level);
            }
            if let Some(start) = &patch.msg_start {
                spec.msg_start = Some(start.clone());
            }
            if let Some(end) = &patch.msg_end {
                spec.msg_end = Some(end.clone());
            }
        }

        Ok(())
    }
}

/// Partial [`BlockConfig`] as read from a configuration file. Hooks can only
/// be set from code.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BlockConfigOverlay {
    pub test_indexes: Option<Selection<usize>>,
    pub logs: Option<LogsOverlay>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LogsOverlay {
    pub level: Option<u8>,
    pub types: BTreeMap<MessageType, TypeOverlay>,
    pub system_messages: BTreeMap<SystemMessage, MessageOverlay>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TypeOverlay {
    pub level: Option<u8>,
    pub msg_start: Option<String>,
    pub msg_end: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MessageOverlay {
    #[serde(rename = "type")]
    pub kind: Option<MessageType>,
    pub template: Option<String>,
    pub level: Option<u8>,
    pub msg_start: Option<String>,
    pub msg_end: Option<String>,
}
