//! Error types for loading and rendering.
//!
//! [`Error`] covers every failure the engine reports to its caller. Nothing is
//! logged or swallowed internally: each variant reaches the immediate caller
//! of `load`, `exists`, `render` or `compile`.

use std::fmt;
use std::io;

/// The role a template file plays in a render call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    View,
    Layout,
    Partial,
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateKind::View => write!(f, "template"),
            TemplateKind::Layout => write!(f, "layout template"),
            TemplateKind::Partial => write!(f, "partial template"),
        }
    }
}

/// Error type for engine operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The partials matcher could not be compiled.
    #[error("invalid template pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// A view, layout or per-call partial file does not exist.
    #[error("{path} {kind} not found")]
    NotFound { path: String, kind: TemplateKind },

    /// A file under the partials directory was requested as a view or layout.
    #[error("{0} partial cannot render directly")]
    PartialRender(String),

    /// A per-call partial lives under the partials directory.
    #[error("{0} partial already loaded globally")]
    PartialLoaded(String),

    /// Syntax or execution error reported by the template engine.
    #[error(transparent)]
    Template(#[from] minijinja::Error),

    /// The filesystem failed for a reason other than a missing file.
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    /// A template file is not valid UTF-8.
    #[error("{path} is not valid UTF-8")]
    Encoding {
        path: String,
        #[source]
        source: std::string::FromUtf8Error,
    },

    /// Writing the rendered output to the sink failed.
    #[error("failed to write rendered output: {0}")]
    Write(#[source] io::Error),

    /// `load()` has not completed successfully yet.
    #[error("templates are not loaded, call load() first")]
    NotLoaded,

    /// Invalid configuration value.
    #[error("configuration error: {0}")]
    Config(String),

    /// Configuration file could not be parsed.
    #[error("invalid configuration file: {0}")]
    ConfigFormat(#[from] serde_yaml::Error),
}

impl Error {
    /// Returns true for missing view, layout or partial files.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    /// Returns true when a partial file was addressed as a top-level template.
    pub fn is_partial_misuse(&self) -> bool {
        matches!(self, Error::PartialRender(_) | Error::PartialLoaded(_))
    }
}

/// Result alias for engine operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
