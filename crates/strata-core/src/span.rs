//! Boundary resolution: recover the exact line span of a definition from the
//! approximate start line reported by the external indexer.
//!
//! Everything here is a pure function of the file's lines. Malformed input never
//! fails; it only produces a looser span.

use serde::{Deserialize, Serialize};

use crate::classify::classify;
use crate::lexer::{has_code, scan_line, LexState};
use crate::model::{Resolution, Symbol};

/// Keywords that mark a preceding line as part of the same declaration.
pub const MODIFIER_KEYWORDS: [&str; 10] = [
    "typedef", "struct", "enum", "union", "static", "extern", "const", "volatile", "inline",
    "register",
];

/// A resolved `[start, end)` line range, 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    /// 1-based first line.
    pub fn start_line(&self) -> u32 {
        (self.start + 1) as u32
    }

    /// 1-based last line (equal to the exclusive 0-based end).
    pub fn end_line(&self) -> u32 {
        self.end as u32
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The lines covered by this span joined with `\n`.
    pub fn text<S: AsRef<str>>(&self, lines: &[S]) -> String {
        let end = self.end.min(lines.len());
        let start = self.start.min(end);
        lines[start..end]
            .iter()
            .map(|l| l.as_ref())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Resolve the span of the definition whose indexer-reported start is
/// `approx_start` (0-based).
///
/// `nominal_end` is the exclusive upper boundary, normally the next symbol's
/// start; `None` means end of file. The result never starts after
/// `approx_start` and never ends past the nominal boundary.
pub fn resolve_span<S: AsRef<str>>(
    lines: &[S],
    approx_start: usize,
    nominal_end: Option<usize>,
) -> Span {
    if lines.is_empty() {
        return Span { start: 0, end: 0 };
    }
    let approx = approx_start.min(lines.len() - 1);
    let bound = match nominal_end {
        Some(end) if end > approx => end.min(lines.len()),
        _ => lines.len(),
    };

    Span {
        start: find_start(lines, approx),
        end: find_end(lines, approx, bound),
    }
}

/// Resolve span and kind for a symbol against its file's lines.
///
/// Returns `None` when the symbol's start line does not exist in the file.
pub fn resolve_symbol<S: AsRef<str>>(lines: &[S], symbol: &Symbol) -> Option<Resolution> {
    if symbol.start_line == 0 || symbol.start_line as usize > lines.len() {
        return None;
    }
    let nominal_end = (!symbol.is_open()).then_some(symbol.end_line as usize);
    let span = resolve_span(lines, symbol.start_line as usize - 1, nominal_end);

    Some(Resolution {
        id: symbol.id,
        start_line: span.start_line(),
        end_line: span.end_line(),
        kind: classify(&span.text(lines)),
    })
}

fn has_modifier(line: &str) -> bool {
    line.split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .any(|word| MODIFIER_KEYWORDS.contains(&word))
}

/// Walk upward over doc comments, blank lines and the leading part of the
/// declaration (return type, storage class). Greedy, single pass.
fn find_start<S: AsRef<str>>(lines: &[S], approx: usize) -> usize {
    let mut start = approx;
    let mut in_comment = false;

    for idx in (0..approx).rev() {
        let line = lines[idx].as_ref().trim_end();
        let trimmed = line.trim_start();

        if !in_comment && line.contains("*/") {
            in_comment = true;
        }
        if in_comment {
            if line.contains("/*") {
                start = idx;
                in_comment = false;
            }
            continue;
        }

        if trimmed.is_empty() {
            continue;
        }
        if trimmed.starts_with("//") {
            start = idx;
            continue;
        }
        // A directive or a finished statement belongs to something else.
        if trimmed.starts_with('#') || line.ends_with(';') || line.ends_with('{') {
            break;
        }
        if has_modifier(line) || line.starts_with(|c: char| c.is_ascii_alphabetic()) {
            start = idx;
            continue;
        }
        break;
    }

    start
}

fn is_define(line: &str) -> bool {
    line.trim_start()
        .strip_prefix('#')
        .is_some_and(|rest| rest.trim_start().starts_with("define"))
}

fn find_end<S: AsRef<str>>(lines: &[S], start: usize, bound: usize) -> usize {
    let mut state = LexState::Code;
    for idx in start..bound {
        let line = lines[idx].as_ref();
        if has_code(state, line) {
            if is_define(line) {
                return define_end(lines, idx, bound);
            }
            break;
        }
        state = scan_line(state, line, |_, _, _| {});
    }

    brace_end(lines, start, bound).unwrap_or_else(|| trailing_end(lines, start, bound))
}

/// A macro ends at the first line without a continuation backslash.
fn define_end<S: AsRef<str>>(lines: &[S], first: usize, bound: usize) -> usize {
    (first..bound)
        .find(|&idx| !lines[idx].as_ref().trim_end().ends_with('\\'))
        .map_or(bound, |idx| idx + 1)
}

/// Track brace depth outside literals and comments until it returns to zero.
fn brace_end<S: AsRef<str>>(lines: &[S], start: usize, bound: usize) -> Option<usize> {
    let mut state = LexState::Code;
    let mut depth: i64 = 0;
    let mut opened = false;

    for idx in start..bound {
        let line = lines[idx].as_ref();
        let mut close_at = None;
        state = scan_line(state, line, |offset, ch, st| {
            if close_at.is_some() || !st.is_code() {
                return;
            }
            match ch {
                '{' => {
                    depth += 1;
                    opened = true;
                }
                '}' => {
                    depth -= 1;
                    if opened && depth == 0 {
                        close_at = Some(offset + ch.len_utf8());
                    }
                }
                _ => {}
            }
        });

        let Some(offset) = close_at else { continue };
        let remainder = line[offset..].trim();
        if remainder.starts_with(';') {
            return Some(idx + 1);
        }
        // `} Name` with the terminating semicolon on its own line.
        if !remainder.is_empty()
            && !remainder.starts_with('/')
            && idx + 1 < bound
            && lines[idx + 1].as_ref().trim().starts_with(';')
        {
            return Some(idx + 2);
        }
        return Some(idx + 1);
    }

    None
}

/// No braces: end at the last line carrying code, dropping a block comment that
/// introduces the next symbol.
fn trailing_end<S: AsRef<str>>(lines: &[S], start: usize, bound: usize) -> usize {
    let mut idx = bound - 1;
    while idx > start {
        let trimmed = lines[idx].as_ref().trim();
        let comment_only = trimmed.is_empty()
            || trimmed.starts_with("/*")
            || trimmed.starts_with('*')
            || trimmed.starts_with("//");

        if !comment_only {
            if trimmed.contains("*/") && !trimmed.contains("/*") {
                // Tail of a multi-line comment: cut where it opens.
                if let Some(open) = (start + 1..idx).rev().find(|&i| lines[i].as_ref().contains("/*")) {
                    let line = lines[open].as_ref();
                    let before = line.split("/*").next().unwrap_or("").trim();
                    return if before.is_empty() { open } else { open + 1 };
                }
            }
            return idx + 1;
        }
        idx -= 1;
    }

    start + 1
}
