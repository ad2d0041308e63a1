// SPDX-FileCopyrightText: 2025 The CodeHem Authors
//
// SPDX-License-Identifier: MIT

//! # Fragment Formatter
//!
//! Normalizes the indentation of a code fragment before it is spliced into a
//! buffer. The algorithm is the same for both families:
//!
//! 1. normalize the fragment's line endings to LF and strip trailing blank
//!    lines,
//! 2. dedent every line by the fragment's common whitespace prefix,
//! 3. re-indent every line after the first with the target prefix (the first
//!    line lands at the insertion point, which already sits after the target
//!    indent in the buffer).
//!
//! Relative indentation inside the fragment survives both steps. Empty lines
//! stay byte-empty, and the emitted line ending matches the enclosing file's
//! dominant style. The families differ only in the block tokens the
//! [`crate::builder`] helpers generate around fragments.

/// Normalize a fragment that replaces an existing range.
///
/// A fragment whose continuation lines all already sit at (or beyond) the
/// destination indent is taken as absolutely indented - the round-trip case
/// of splicing back text read out of the same buffer - and only gets its line
/// endings normalized. Anything else is treated as a zero-based fragment and
/// re-indented like an insertion.
#[must_use]
pub fn normalize_replacement(fragment: &str, target_indent: &str, line_ending: &str) -> String {
    let unified = fragment.replace("\r\n", "\n").replace('\r', "\n");
    let mut lines: Vec<&str> = unified.split('\n').collect();
    while lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }
    let absolute = !target_indent.is_empty()
        && lines.len() > 1
        && lines[1..]
            .iter()
            .filter(|l| !l.trim().is_empty())
            .all(|l| l.starts_with(target_indent));
    if absolute {
        let mut out = String::with_capacity(unified.len());
        for (i, line) in lines.iter().enumerate() {
            if i > 0 {
                out.push_str(line_ending);
            }
            if !line.trim().is_empty() {
                out.push_str(line);
            }
        }
        return out;
    }
    normalize_fragment(fragment, target_indent, line_ending)
}

/// Normalize a fragment for insertion at a point indented by `target_indent`.
#[must_use]
pub fn normalize_fragment(fragment: &str, target_indent: &str, line_ending: &str) -> String {
    let unified = fragment.replace("\r\n", "\n").replace('\r', "\n");
    let mut lines: Vec<&str> = unified.split('\n').collect();
    while lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }
    if lines.is_empty() {
        return String::new();
    }

    let common = common_indent(&lines);
    let mut out = String::with_capacity(unified.len());
    for (i, line) in lines.iter().enumerate() {
        let dedented = line.strip_prefix(common).unwrap_or(line);
        if i > 0 {
            out.push_str(line_ending);
            if !dedented.trim().is_empty() {
                out.push_str(target_indent);
            }
        }
        if dedented.trim().is_empty() {
            continue;
        }
        out.push_str(dedented);
    }
    out
}

/// Longest whitespace prefix shared by every non-empty line.
fn common_indent<'a>(lines: &[&'a str]) -> &'a str {
    let mut common: Option<&str> = None;
    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        let indent = leading_whitespace(line);
        common = Some(match common {
            None => indent,
            Some(current) => shared_prefix(current, indent),
        });
        if common == Some("") {
            break;
        }
    }
    common.unwrap_or("")
}

fn leading_whitespace(line: &str) -> &str {
    let trimmed = line.trim_start_matches([' ', '\t']);
    &line[..line.len() - trimmed.len()]
}

fn shared_prefix<'a>(a: &'a str, b: &str) -> &'a str {
    let len = a
        .bytes()
        .zip(b.bytes())
        .take_while(|(x, y)| x == y)
        .count();
    &a[..len]
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn single_line_passes_through() {
        assert_eq!(normalize_fragment("return 2", "    ", "\n"), "return 2");
        assert_eq!(normalize_fragment("return 2\n", "    ", "\n"), "return 2");
    }

    #[test]
    fn relative_indent_survives_reindent() {
        let fragment = "def f():\n    if x:\n        pass";
        let normalized = normalize_fragment(fragment, "    ", "\n");
        assert_eq!(normalized, "def f():\n        if x:\n            pass");
    }

    #[test]
    fn over_indented_fragments_are_dedented_first() {
        let fragment = "        def f():\n            pass";
        let normalized = normalize_fragment(fragment, "  ", "\n");
        assert_eq!(normalized, "def f():\n      pass");
    }

    #[test]
    fn empty_lines_stay_empty() {
        let fragment = "a = 1\n\nb = 2";
        let normalized = normalize_fragment(fragment, "    ", "\n");
        assert_eq!(normalized, "a = 1\n\n    b = 2");
    }

    #[test]
    fn crlf_files_get_crlf_fragments() {
        let fragment = "a()\nb()";
        let normalized = normalize_fragment(fragment, "  ", "\r\n");
        assert_eq!(normalized, "a()\r\n  b()");
    }

    #[test]
    fn trailing_blank_lines_are_dropped() {
        assert_eq!(normalize_fragment("x\n\n\n", "", "\n"), "x");
    }

    #[test]
    fn replacement_of_raw_extract_is_untouched() {
        // Continuation lines already at the destination depth: splice as-is.
        let raw = "def f(self):\n        return 1";
        assert_eq!(normalize_replacement(raw, "    ", "\n"), raw);
    }

    #[test]
    fn replacement_of_zero_based_fragment_is_reindented() {
        let fragment = "if x:\n    return 2";
        assert_eq!(
            normalize_replacement(fragment, "        ", "\n"),
            "if x:\n            return 2"
        );
    }

    #[test]
    fn brace_block_keeps_header_brace() {
        let fragment = "b() {\n  return 2\n}";
        let normalized = normalize_fragment(fragment, "  ", "\n");
        assert_eq!(normalized, "b() {\n    return 2\n  }");
    }

    #[test]
    fn tab_indent_targets_are_respected() {
        let fragment = "a()\nb()";
        assert_eq!(normalize_fragment(fragment, "\t", "\n"), "a()\n\tb()");
    }
}
