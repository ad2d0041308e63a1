// SPDX-FileCopyrightText: 2025 The CodeHem Authors
//
// SPDX-License-Identifier: MIT

//! # Fragment Hashing
//!
//! Stable digests of element content used for optimistic concurrency.
//! Content is canonicalized before hashing (line endings normalized to LF,
//! trailing newlines stripped) so the same logical fragment hashes identically
//! across parses, platforms and checkouts.
//!
//! Parse- and extraction-cache keys use a separate, cheaper SHA-1 digest over
//! the raw bytes; those keys never leave the process.

use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::borrow::Cow;

/// Canonical form of element content for hashing: CRLF and lone CR become LF,
/// trailing newlines are stripped.
#[must_use]
pub fn canonicalize(content: &str) -> Cow<'_, str> {
    if content.contains('\r') {
        let normalized = content.replace("\r\n", "\n").replace('\r', "\n");
        Cow::Owned(normalized.trim_end_matches('\n').to_string())
    } else {
        Cow::Borrowed(content.trim_end_matches('\n'))
    }
}

/// Fragment hash of element content: an opaque `sha256:<hex>` token.
///
/// Same bytes in, same token out - across parses and processes.
#[must_use]
pub fn fragment_hash(content: &str) -> String {
    let canonical = canonicalize(content);
    let digest = Sha256::digest(canonical.as_bytes());
    let mut out = String::with_capacity(7 + digest.len() * 2);
    out.push_str("sha256:");
    for byte in digest {
        use std::fmt::Write;
        let _ = write!(out, "{byte:02x}");
    }
    out
}

/// Cache key for parse trees and element trees: language code plus a SHA-1
/// over the raw source bytes.
pub type ContentKey = (&'static str, [u8; 20]);

#[must_use]
pub fn content_key(language: &'static str, bytes: &[u8]) -> ContentKey {
    let digest = Sha1::digest(bytes);
    (language, digest.into())
}
