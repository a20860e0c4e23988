//! Heuristic symbol classification from resolved definition text.
//!
//! Rules are evaluated in order and the first that matches wins. Later rules only
//! see text that every earlier rule rejected, so e.g. `typedef struct` is a struct,
//! never a plain typedef.

use std::sync::LazyLock;

use regex::Regex;

use crate::lexer::{scan_line, LexState};
use crate::model::SymbolKind;

static DEFINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^#\s*define\b").unwrap());
static FUNCTION_MACRO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#\s*define\s+\w+\(").unwrap());
static STRUCT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(typedef\s+)?struct\b").unwrap());
static UNION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(typedef\s+)?union\b").unwrap());
static ENUM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(typedef\s+)?enum\b").unwrap());
static TYPEDEF: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^typedef\b").unwrap());
static FUNCTION_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\w\s\*]+\s+\**\w+\s*\([^;{}]*\)\s*\{").unwrap());

/// What a rule looks at.
struct Subject<'a> {
    /// First line that is not blank and not a comment, trimmed.
    head: &'a str,
    /// The whole text, trimmed.
    body: &'a str,
}

type Rule = (fn(&Subject<'_>) -> bool, SymbolKind);

/// Ordered rule list. Order is part of the contract.
const RULES: &[Rule] = &[
    (is_function_macro, SymbolKind::FunctionMacro),
    (is_define, SymbolKind::ConstantMacro),
    (is_struct, SymbolKind::Struct),
    (is_union, SymbolKind::Union),
    (is_enum, SymbolKind::Enum),
    (is_typedef, SymbolKind::Typedef),
    (is_function, SymbolKind::Function),
    (is_statement, SymbolKind::Variable),
];

fn is_function_macro(s: &Subject<'_>) -> bool {
    FUNCTION_MACRO.is_match(s.head)
}

fn is_define(s: &Subject<'_>) -> bool {
    DEFINE.is_match(s.head)
}

fn is_struct(s: &Subject<'_>) -> bool {
    STRUCT.is_match(s.head)
}

fn is_union(s: &Subject<'_>) -> bool {
    UNION.is_match(s.head)
}

fn is_enum(s: &Subject<'_>) -> bool {
    ENUM.is_match(s.head)
}

fn is_typedef(s: &Subject<'_>) -> bool {
    TYPEDEF.is_match(s.head)
}

fn is_function(s: &Subject<'_>) -> bool {
    balanced_braces(s.body) && FUNCTION_HEADER.is_match(s.body)
}

fn is_statement(s: &Subject<'_>) -> bool {
    s.body.ends_with(';')
}

/// Assign a coarse kind to a definition's source text. Never fails; text that
/// matches nothing is [`SymbolKind::Unknown`].
pub fn classify(text: &str) -> SymbolKind {
    let subject = Subject {
        head: first_meaningful_line(text),
        body: text.trim(),
    };
    RULES
        .iter()
        .find(|(matches, _)| matches(&subject))
        .map_or(SymbolKind::Unknown, |&(_, kind)| kind)
}

fn first_meaningful_line(text: &str) -> &str {
    text.lines()
        .map(str::trim)
        .find(|line| {
            !line.is_empty()
                && !line.starts_with("//")
                && !line.starts_with("/*")
                && !line.starts_with('*')
        })
        .unwrap_or("")
}

/// At least one brace pair outside literals/comments, and depth ends at zero
/// without ever going negative.
fn balanced_braces(text: &str) -> bool {
    let mut state = LexState::Code;
    let mut depth: i64 = 0;
    let mut opened = false;
    let mut underflow = false;

    for line in text.lines() {
        state = scan_line(state, line, |_, ch, st| {
            if !st.is_code() {
                return;
            }
            match ch {
                '{' => {
                    depth += 1;
                    opened = true;
                }
                '}' => {
                    depth -= 1;
                    underflow |= depth < 0;
                }
                _ => {}
            }
        });
    }

    opened && depth == 0 && !underflow
}
