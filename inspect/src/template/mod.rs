pub mod template_string;

use crate::printer;
use crate::value::Value;

use template_string::{TemplateString, TemplateStringPart};

/// A source of template data. Returns only defined values.
pub trait Lookup {
    fn lookup(&self, key: &str) -> Option<Value>;
}

/// Ordered key/value data, the usual template source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    entries: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Record::default()
    }

    /// Builder form of [`Record::insert`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl Lookup for Record {
    fn lookup(&self, key: &str) -> Option<Value> {
        self.get(key).filter(|v| v.is_defined()).cloned()
    }
}

/// Object values act as sources through their properties.
impl Lookup for Value {
    fn lookup(&self, key: &str) -> Option<Value> {
        self.as_object()
            .and_then(|object| object.get(key))
            .filter(|v| v.is_defined())
    }
}

// Sequences are scanned in order, nested sequences depth-first.
impl<T: Lookup> Lookup for [T] {
    fn lookup(&self, key: &str) -> Option<Value> {
        self.iter().find_map(|source| source.lookup(key))
    }
}

impl<T: Lookup, const N: usize> Lookup for [T; N] {
    fn lookup(&self, key: &str) -> Option<Value> {
        self.as_slice().lookup(key)
    }
}

impl<T: Lookup> Lookup for Vec<T> {
    fn lookup(&self, key: &str) -> Option<Value> {
        self.as_slice().lookup(key)
    }
}

impl<T: Lookup> Lookup for Option<T> {
    fn lookup(&self, key: &str) -> Option<Value> {
        self.as_ref().and_then(|source| source.lookup(key))
    }
}

impl<T: Lookup + ?Sized> Lookup for &T {
    fn lookup(&self, key: &str) -> Option<Value> {
        (**self).lookup(key)
    }
}

/// Fill every `{key}` in `template` from `sources`; the first source holding
/// a defined value wins. Unresolved placeholders stay in the output verbatim.
///
/// Returns `None` for an empty template.
pub fn resolve<L: Lookup + ?Sized>(template: &str, sources: &L) -> Option<String> {
    if template.is_empty() {
        return None;
    }
    Some(TemplateString::parse(template).render(sources))
}

impl TemplateString {
    pub fn render<L: Lookup + ?Sized>(&self, sources: &L) -> String {
        let mut out = String::new();
        for part in &self.parts {
            match part {
                TemplateStringPart::Literal(text) => out.push_str(text),
                TemplateStringPart::Placeholder(key) => match sources.lookup(key) {
                    Some(value) => out.push_str(&render_value(&value)),
                    None => {
                        out.push('{');
                        out.push_str(key);
                        out.push('}');
                    }
                },
            }
        }
        out
    }
}

/// Errors render as their message followed by the stack text; other
/// composites go through the printer.
pub fn render_value(value: &Value) -> String {
    match value {
        Value::Error(error) => match &error.stack {
            Some(stack) => format!("{}\n{}", error, stack),
            None => error.to_string(),
        },
        Value::Object(_) => printer::print(value, false).unwrap_or_default(),
        other => other.to_string(),
    }
}
