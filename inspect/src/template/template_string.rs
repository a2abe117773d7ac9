/// A message template split into literal text and `{key}` placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateString {
    pub parts: Vec<TemplateStringPart>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TemplateStringPart {
    /// Literal text content.
    Literal(String),
    /// A key to look up in the data sources, without its braces.
    Placeholder(String),
}

impl TemplateString {
    /// Split `source` on `{key}` occurrences. A placeholder body is matched
    /// non-greedily, holds at least one character and never spans a line
    /// break. Braces that do not form a placeholder stay literal.
    pub fn parse(source: &str) -> Self {
        let mut parts = Vec::new();
        let mut literal = String::new();
        let mut rest = source;

        while let Some(open) = rest.find('{') {
            let body = &rest[open + 1..];
            match placeholder_end(body) {
                Some(end) => {
                    literal.push_str(&rest[..open]);
                    if !literal.is_empty() {
                        parts.push(TemplateStringPart::Literal(std::mem::take(&mut literal)));
                    }
                    parts.push(TemplateStringPart::Placeholder(body[..end].to_string()));
                    rest = &body[end + 1..];
                }
                None => {
                    literal.push_str(&rest[..=open]);
                    rest = body;
                }
            }
        }

        literal.push_str(rest);
        if !literal.is_empty() {
            parts.push(TemplateStringPart::Literal(literal));
        }
        TemplateString { parts }
    }

    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().filter_map(|part| match part {
            TemplateStringPart::Placeholder(key) => Some(key.as_str()),
            TemplateStringPart::Literal(_) => None,
        })
    }
}

/// Byte offset of the `}` that closes a placeholder body.
fn placeholder_end(body: &str) -> Option<usize> {
    let first = body.chars().next()?;
    if is_line_break(first) {
        return None;
    }
    let skip = first.len_utf8();
    for (offset, c) in body[skip..].char_indices() {
        if c == '}' {
            return Some(skip + offset);
        }
        if is_line_break(c) {
            return None;
        }
    }
    None
}

fn is_line_break(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}
