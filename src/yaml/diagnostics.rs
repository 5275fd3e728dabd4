//! YAML error types with source-span diagnostics

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// A YAML syntax or shape error pointing into the offending file
#[derive(Debug, Error, Diagnostic)]
#[error("Invalid YAML in {filename}: {message}")]
#[diagnostic(code(kit::yaml::syntax), help("check indentation and field names"))]
pub struct YamlSyntaxError {
    pub filename: String,
    pub message: String,

    #[source_code]
    pub src: NamedSource<String>,

    #[label("here")]
    pub span: Option<SourceSpan>,
}

impl YamlSyntaxError {
    /// Build from a serde_yml error, keeping the source for rendering
    pub fn from_serde_error(err: &serde_yml::Error, content: &str, filename: &str) -> Self {
        // Locations count characters; spans need byte offsets
        let span = err.location().map(|loc| {
            let offset = content
                .char_indices()
                .nth(loc.index())
                .map_or(content.len(), |(byte, _)| byte);
            SourceSpan::from((offset, 1))
        });

        Self {
            filename: filename.to_string(),
            message: err.to_string(),
            src: NamedSource::new(filename, content.to_string()),
            span,
        }
    }

    /// 1-based line of the error, if known
    pub fn line(&self) -> Option<usize> {
        let offset = self.span?.offset();
        let source = self.src.inner();
        let before = source.get(..offset).unwrap_or(source);
        Some(before.matches('\n').count() + 1)
    }
}

/// Errors reading YAML files
#[derive(Debug, Error, Diagnostic)]
pub enum YamlError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Syntax(#[from] YamlSyntaxError),

    #[error("IO error: {0}")]
    #[diagnostic(code(kit::yaml::io))]
    Io(#[from] std::io::Error),
}
