use std::ops::Range;
use std::path::{Path, PathBuf};

use codespan_reporting::diagnostic::{Diagnostic, Label};
use codespan_reporting::files::SimpleFile;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use thiserror::Error;

use runner::SuiteConfig;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read '{path}': {source}", path = path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid suite configuration in '{path}': {message}", path = path.display())]
    Parse {
        path: PathBuf,
        text: String,
        message: String,
        span: Option<Range<usize>>,
    },
}

/// Read and parse a TOML suite file.
pub fn load(path: &Path) -> Result<SuiteConfig, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let parsed = toml::from_str::<SuiteConfig>(&text);
    parsed.map_err(|error| LoadError::Parse {
        path: path.to_path_buf(),
        message: error.message().to_string(),
        span: error.span(),
        text,
    })
}

/// Parse failures with a span point into the file; everything else is a
/// one-line error.
pub fn emit_error(error: &LoadError, color_choice: ColorChoice) {
    match error {
        LoadError::Parse {
            path,
            text,
            message,
            span: Some(span),
        } => {
            let file = SimpleFile::new(path.display().to_string(), text.as_str());
            let diagnostic = Diagnostic::error()
                .with_message("invalid suite configuration")
                .with_labels(vec![Label::primary((), span.clone()).with_message(message)]);
            let writer = StandardStream::stderr(color_choice);
            let config = term::Config::default();
            let _ = term::emit_to_write_style(&mut writer.lock(), &config, &file, &diagnostic);
        }
        other => eprintln!("error: {}", other),
    }
}
