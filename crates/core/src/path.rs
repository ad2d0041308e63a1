// SPDX-FileCopyrightText: 2025 The CodeHem Authors
//
// SPDX-License-Identifier: MIT

//! # Path Expressions
//!
//! Compact selectors for elements, e.g. `C.f`, `C.f[body]`,
//! `FILE.C.v[property_setter]`, `imports`. A path is a dot-separated list of
//! identifier segments with an optional trailing kind tag in brackets.
//!
//! Parsing is a single pass over the string; whitespace is not significant
//! around tokens. Empty segments and unknown tags are rejected with
//! [`Error::PathSyntax`].

use crate::element::ElementKind;
use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// The optional `[...]` suffix of a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathTag {
    /// `[def]` - the full element including signature and body.
    Def,
    /// `[body]` - only the body (callables) or initializer (properties).
    Body,
    /// A kind filter such as `[method]` or `[property_setter]`.
    Kind(ElementKind),
}

impl fmt::Display for PathTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Def => f.write_str("def"),
            Self::Body => f.write_str("body"),
            Self::Kind(kind) => f.write_str(kind.as_str()),
        }
    }
}

impl FromStr for PathTag {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "def" => Ok(Self::Def),
            "body" => Ok(Self::Body),
            // The resolver only accepts the tags the grammar names; kinds like
            // `decorator` or `parameter` are not addressable through paths.
            "class" | "method" | "function" | "property" | "property_getter"
            | "property_setter" | "static_property" | "interface" | "type_alias" | "enum"
            | "namespace" | "imports" => {
                Ok(Self::Kind(s.parse().map_err(|_| format!("unknown kind tag `{s}`"))?))
            }
            other => Err(format!("unknown kind tag `{other}`")),
        }
    }
}

/// A parsed path expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathExpr {
    /// Identifier segments, with any leading `FILE` marker already stripped.
    pub segments: Vec<String>,
    pub tag: Option<PathTag>,
}

impl PathExpr {
    /// Parse a path expression.
    ///
    /// # Example
    ///
    /// ```
    /// use codehem_core::{PathExpr, PathTag};
    ///
    /// let path = PathExpr::parse("C.f[body]").unwrap();
    /// assert_eq!(path.segments, ["C", "f"]);
    /// assert_eq!(path.tag, Some(PathTag::Body));
    /// ```
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(Error::path_syntax(raw, "path is empty"));
        }

        let (body, tag) = match raw.find('[') {
            Some(open) => {
                let rest = &raw[open + 1..];
                let Some(close) = rest.find(']') else {
                    return Err(Error::path_syntax(raw, "unterminated `[` in kind tag"));
                };
                if !rest[close + 1..].trim().is_empty() {
                    return Err(Error::path_syntax(raw, "trailing characters after kind tag"));
                }
                let tag = rest[..close]
                    .trim()
                    .parse::<PathTag>()
                    .map_err(|msg| Error::path_syntax(raw, msg))?;
                (&raw[..open], Some(tag))
            }
            None => (raw, None),
        };

        let mut segments = Vec::new();
        for segment in body.split('.') {
            let segment = segment.trim();
            if segment.is_empty() {
                return Err(Error::path_syntax(raw, "empty path segment"));
            }
            segments.push(segment.to_string());
        }
        // A leading FILE marker addresses the file root explicitly.
        if segments.first().map(String::as_str) == Some("FILE") {
            segments.remove(0);
        }
        if segments.is_empty() {
            // `FILE[def]` and friends select nothing addressable.
            return Err(Error::path_syntax(raw, "path has no element segment"));
        }
        Ok(Self { segments, tag })
    }

    /// True when the path addresses the synthetic imports element.
    #[must_use]
    pub fn is_imports(&self) -> bool {
        self.segments.len() == 1 && self.segments[0] == "imports"
    }
}

impl fmt::Display for PathExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))?;
        if let Some(tag) = &self.tag {
            write!(f, "[{tag}]")?;
        }
        Ok(())
    }
}

impl FromStr for PathExpr {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
