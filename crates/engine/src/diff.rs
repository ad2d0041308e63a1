// SPDX-FileCopyrightText: 2025 The CodeHem Authors
//
// SPDX-License-Identifier: MIT

//! # Unified Diff
//!
//! Line-based unified diff for dry-run patch results. Common prefix and
//! suffix lines are trimmed before the LCS pass, so the quadratic part only
//! sees the changed region - patches touch element-sized spans, not files.

use std::fmt::Write;

const CONTEXT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Equal,
    Delete,
    Insert,
}

/// Unified diff between two buffers, with `original`/`modified` labels and
/// three lines of context.
#[must_use]
pub fn unified_diff(original: &str, modified: &str) -> String {
    let old_lines: Vec<&str> = original.lines().collect();
    let new_lines: Vec<&str> = modified.lines().collect();

    let prefix = old_lines
        .iter()
        .zip(new_lines.iter())
        .take_while(|(a, b)| a == b)
        .count();
    let suffix = old_lines[prefix..]
        .iter()
        .rev()
        .zip(new_lines[prefix..].iter().rev())
        .take_while(|(a, b)| a == b)
        .count();

    let old_mid = &old_lines[prefix..old_lines.len() - suffix];
    let new_mid = &new_lines[prefix..new_lines.len() - suffix];

    let mut ops: Vec<Op> = Vec::new();
    ops.extend(std::iter::repeat_n(Op::Equal, prefix));
    ops.extend(lcs_ops(old_mid, new_mid));
    ops.extend(std::iter::repeat_n(Op::Equal, suffix));

    render(&old_lines, &new_lines, &ops)
}

/// Edit script for the changed middle via a standard LCS table.
fn lcs_ops(old: &[&str], new: &[&str]) -> Vec<Op> {
    let (n, m) = (old.len(), new.len());
    let mut table = vec![0u32; (n + 1) * (m + 1)];
    let at = |i: usize, j: usize| i * (m + 1) + j;
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            table[at(i, j)] = if old[i] == new[j] {
                table[at(i + 1, j + 1)] + 1
            } else {
                table[at(i + 1, j)].max(table[at(i, j + 1)])
            };
        }
    }

    let mut ops = Vec::with_capacity(n + m);
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if old[i] == new[j] {
            ops.push(Op::Equal);
            i += 1;
            j += 1;
        } else if table[at(i + 1, j)] >= table[at(i, j + 1)] {
            ops.push(Op::Delete);
            i += 1;
        } else {
            ops.push(Op::Insert);
            j += 1;
        }
    }
    ops.extend(std::iter::repeat_n(Op::Delete, n - i));
    ops.extend(std::iter::repeat_n(Op::Insert, m - j));
    ops
}

fn render(old_lines: &[&str], new_lines: &[&str], ops: &[Op]) -> String {
    let changed: Vec<usize> = ops
        .iter()
        .enumerate()
        .filter(|(_, op)| **op != Op::Equal)
        .map(|(i, _)| i)
        .collect();
    if changed.is_empty() {
        return String::new();
    }

    // Group changes whose context windows touch into shared hunks.
    let mut hunks: Vec<(usize, usize)> = Vec::new();
    for &position in &changed {
        let start = position.saturating_sub(CONTEXT);
        let end = (position + CONTEXT + 1).min(ops.len());
        match hunks.last_mut() {
            Some((_, last_end)) if start <= *last_end => *last_end = end,
            _ => hunks.push((start, end)),
        }
    }

    let mut out = String::from("--- original\n+++ modified\n");
    for (hunk_start, hunk_end) in hunks {
        // Line numbers at the hunk start.
        let old_start: usize = ops[..hunk_start]
            .iter()
            .filter(|op| !matches!(op, Op::Insert))
            .count();
        let new_start: usize = ops[..hunk_start]
            .iter()
            .filter(|op| !matches!(op, Op::Delete))
            .count();
        let old_count = ops[hunk_start..hunk_end]
            .iter()
            .filter(|op| !matches!(op, Op::Insert))
            .count();
        let new_count = ops[hunk_start..hunk_end]
            .iter()
            .filter(|op| !matches!(op, Op::Delete))
            .count();

        let _ = writeln!(
            out,
            "@@ -{},{} +{},{} @@",
            old_start + 1,
            old_count,
            new_start + 1,
            new_count
        );

        let (mut old_pos, mut new_pos) = (old_start, new_start);
        for op in &ops[hunk_start..hunk_end] {
            match op {
                Op::Equal => {
                    let _ = writeln!(out, " {}", old_lines[old_pos]);
                    old_pos += 1;
                    new_pos += 1;
                }
                Op::Delete => {
                    let _ = writeln!(out, "-{}", old_lines[old_pos]);
                    old_pos += 1;
                }
                Op::Insert => {
                    let _ = writeln!(out, "+{}", new_lines[new_pos]);
                    new_pos += 1;
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn identical_buffers_produce_an_empty_diff() {
        assert_eq!(unified_diff("a\nb\n", "a\nb\n"), "");
    }

    #[test]
    fn single_line_change_is_one_hunk() {
        let original = "a\nb\nc\nd\ne\nf\ng\n";
        let modified = "a\nb\nc\nD\ne\nf\ng\n";
        let diff = unified_diff(original, modified);
        assert!(diff.starts_with("--- original\n+++ modified\n"));
        assert!(diff.contains("@@ -1,7 +1,7 @@"));
        assert!(diff.contains("-d\n"));
        assert!(diff.contains("+D\n"));
        // One line of context either side at most three lines deep.
        assert!(diff.contains(" c\n"));
        assert!(diff.contains(" e\n"));
    }

    #[test]
    fn insertion_counts_lines() {
        let original = "def f():\n    return 1\n";
        let modified = "def f():\n    return 1\n\ndef g():\n    return 2\n";
        let diff = unified_diff(original, modified);
        let added = diff
            .lines()
            .filter(|l| l.starts_with('+') && !l.starts_with("+++"))
            .count();
        let removed = diff
            .lines()
            .filter(|l| l.starts_with('-') && !l.starts_with("---"))
            .count();
        assert_eq!(added, 3);
        assert_eq!(removed, 0);
    }
}
