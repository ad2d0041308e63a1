// SPDX-FileCopyrightText: 2025 The CodeHem Authors
//
// SPDX-License-Identifier: MIT

//! # Error Taxonomy
//!
//! One typed error enum for the whole workspace. Pure computation errors
//! (`PathSyntax`, `ElementNotFound`, `WriteConflict`, `Validation`) surface
//! directly to callers; transient I/O is retried by the workspace layer;
//! `Parse` and `Plugin` abort the operation without poisoning shared state.
//!
//! Messages name the path, file and mode involved plus a short remediation
//! hint, since the primary consumers are automated agents that act on the
//! message text.

use std::borrow::Cow;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Grammar or parser initialization failure. Not retriable.
    #[error("parse error for language `{language}`: {message}")]
    Parse {
        language: Cow<'static, str>,
        message: Cow<'static, str>,
    },

    /// Malformed path expression.
    #[error("invalid path `{path}`: {message}; expected `Name.child[kind]` syntax")]
    PathSyntax { path: String, message: Cow<'static, str> },

    /// The path resolved to nothing.
    #[error("no element at `{path}`{}; run extract to list available elements", file_suffix(.file))]
    ElementNotFound { path: String, file: Option<PathBuf> },

    /// Optimistic-concurrency hash mismatch at write time.
    #[error(
        "write conflict at `{path}`{}: expected fragment {expected}, found {actual}; \
         re-read the element and retry with the fresh hash",
        file_suffix(.file)
    )]
    WriteConflict {
        path: String,
        file: Option<PathBuf>,
        expected: String,
        actual: String,
    },

    /// No plug-in registered for the extension or language code.
    #[error("unsupported language: {what}; registered codes can be listed via the registry")]
    UnsupportedLanguage { what: String },

    /// Invalid input: empty code, bad mode, missing required field.
    #[error("validation error: {message}")]
    Validation { message: Cow<'static, str> },

    /// File read/write/lock failure.
    #[error("I/O error while {context}: {source}")]
    Io {
        context: Cow<'static, str>,
        #[source]
        source: std::io::Error,
    },

    /// Deadline exceeded in the retry utility.
    #[error("operation `{operation}` timed out after {elapsed:?}")]
    Timeout {
        operation: Cow<'static, str>,
        elapsed: std::time::Duration,
    },

    /// A language plug-in violated its contract.
    #[error("plug-in error in `{language}`: {message}")]
    Plugin {
        language: Cow<'static, str>,
        message: Cow<'static, str>,
    },
}

fn file_suffix(file: &Option<PathBuf>) -> String {
    file.as_ref()
        .map(|f| format!(" in {}", f.display()))
        .unwrap_or_default()
}

impl Error {
    pub fn parse(language: impl Into<Cow<'static, str>>, message: impl Into<Cow<'static, str>>) -> Self {
        Self::Parse {
            language: language.into(),
            message: message.into(),
        }
    }

    pub fn path_syntax(path: impl Into<String>, message: impl Into<Cow<'static, str>>) -> Self {
        Self::PathSyntax {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn not_found(path: impl Into<String>) -> Self {
        Self::ElementNotFound {
            path: path.into(),
            file: None,
        }
    }

    pub fn validation(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn io(context: impl Into<Cow<'static, str>>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub fn plugin(language: impl Into<Cow<'static, str>>, message: impl Into<Cow<'static, str>>) -> Self {
        Self::Plugin {
            language: language.into(),
            message: message.into(),
        }
    }

    /// Attach the file a path-scoped error occurred in.
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        match &mut self {
            Self::ElementNotFound { file, .. } | Self::WriteConflict { file, .. } => {
                *file = Some(path.into());
            }
            _ => {}
        }
        self
    }

    /// The taxonomy name, stable across releases. Used in structured patch
    /// results and for CLI exit-code mapping.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Parse { .. } => "ParseError",
            Self::PathSyntax { .. } => "PathSyntaxError",
            Self::ElementNotFound { .. } => "ElementNotFoundError",
            Self::WriteConflict { .. } => "WriteConflictError",
            Self::UnsupportedLanguage { .. } => "UnsupportedLanguageError",
            Self::Validation { .. } => "ValidationError",
            Self::Io { .. } => "IOError",
            Self::Timeout { .. } => "TimeoutError",
            Self::Plugin { .. } => "PluginError",
        }
    }

    /// Whether the retry utility may re-attempt the failed operation.
    ///
    /// Only environmental I/O hiccups qualify; logical errors never do.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Io { source, .. } => matches!(
                source.kind(),
                std::io::ErrorKind::Interrupted
                    | std::io::ErrorKind::WouldBlock
                    | std::io::ErrorKind::TimedOut
            ),
            _ => false,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn kinds_match_taxonomy_names() {
        assert_eq!(Error::not_found("C.f").kind(), "ElementNotFoundError");
        assert_eq!(Error::validation("empty code").kind(), "ValidationError");
        assert_eq!(
            Error::io("reading", std::io::Error::other("boom")).kind(),
            "IOError"
        );
    }

    #[test]
    fn transient_classification() {
        let transient = Error::io(
            "locking",
            std::io::Error::new(std::io::ErrorKind::Interrupted, "eintr"),
        );
        let terminal = Error::io(
            "reading",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(transient.is_transient());
        assert!(!terminal.is_transient());
        assert!(!Error::not_found("x").is_transient());
    }

    #[test]
    fn messages_carry_context() {
        let err = Error::WriteConflict {
            path: "C.f".into(),
            file: Some(PathBuf::from("src/app.py")),
            expected: "sha256:aa".into(),
            actual: "sha256:bb".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("C.f"));
        assert!(msg.contains("src/app.py"));
        assert!(msg.contains("retry"));
    }
}
