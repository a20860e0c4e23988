//! Core data structures for the symbol index

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Externally assigned symbol identifier. Monotonic upstream; only used for
/// identity and as the deterministic tie-break everywhere else.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct SymbolId(pub i64);

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a cluster (batch). Assigned from 1 upward on every planning run.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct ClusterId(pub u32);

/// Coarse syntactic kind of a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Function,
    FunctionMacro,
    ConstantMacro,
    Struct,
    Union,
    Enum,
    Typedef,
    Variable,
    Unknown,
}

impl SymbolKind {
    /// Every kind, in the order clusters are split by.
    pub const ALL: [SymbolKind; 9] = [
        SymbolKind::Function,
        SymbolKind::FunctionMacro,
        SymbolKind::ConstantMacro,
        SymbolKind::Struct,
        SymbolKind::Union,
        SymbolKind::Enum,
        SymbolKind::Typedef,
        SymbolKind::Variable,
        SymbolKind::Unknown,
    ];

    /// Stable name used in config files and the store.
    pub fn as_str(self) -> &'static str {
        match self {
            SymbolKind::Function => "function",
            SymbolKind::FunctionMacro => "function_macro",
            SymbolKind::ConstantMacro => "constant_macro",
            SymbolKind::Struct => "struct",
            SymbolKind::Union => "union",
            SymbolKind::Enum => "enum",
            SymbolKind::Typedef => "typedef",
            SymbolKind::Variable => "variable",
            SymbolKind::Unknown => "unknown",
        }
    }

    /// One-letter tag, used as the suffix of split cluster types (`file_f`, `file_s`, ...).
    pub fn tag(self) -> char {
        match self {
            SymbolKind::Function => 'f',
            SymbolKind::FunctionMacro => 'm',
            SymbolKind::ConstantMacro => 'c',
            SymbolKind::Struct => 's',
            SymbolKind::Union => 'k',
            SymbolKind::Enum => 'e',
            SymbolKind::Typedef => 't',
            SymbolKind::Variable => 'v',
            SymbolKind::Unknown => 'u',
        }
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SymbolKind {
    type Err = String;

    /// Accepts either the long name or the one-letter tag.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SymbolKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s || (s.len() == 1 && s.starts_with(k.tag())))
            .ok_or_else(|| format!("unknown symbol kind: {s}"))
    }
}

/// A named definition at a file location.
///
/// `start_line` is 1-based. `end_line` is the 1-based number of the last line of the
/// definition, which is the same number as the 0-based exclusive end index; `0` means
/// the end is not known yet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Symbol {
    pub id: SymbolId,
    pub name: String,
    pub file_path: PathBuf,
    pub start_line: u32,
    #[serde(default)]
    pub end_line: u32,
    #[serde(default)]
    pub kind: Option<SymbolKind>,
}

impl Symbol {
    pub fn new(id: i64, name: &str, file_path: impl Into<PathBuf>, start_line: u32) -> Self {
        Symbol {
            id: SymbolId(id),
            name: name.to_string(),
            file_path: file_path.into(),
            start_line,
            end_line: 0,
            kind: None,
        }
    }

    /// Whether the nominal end boundary is still open.
    pub fn is_open(&self) -> bool {
        self.end_line == 0
    }
}

/// "Symbol `from` mentions symbol `to` at line `line` of `from`'s file."
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReferenceEdge {
    pub from: SymbolId,
    pub to: SymbolId,
    pub line: u32,
}

impl ReferenceEdge {
    pub fn new(from: i64, to: i64, line: u32) -> Self {
        ReferenceEdge {
            from: SymbolId(from),
            to: SymbolId(to),
            line,
        }
    }

    pub fn is_self_loop(&self) -> bool {
        self.from == self.to
    }
}

/// Resolved span and kind for one symbol, ready to be written back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub id: SymbolId,
    pub start_line: u32,
    pub end_line: u32,
    pub kind: SymbolKind,
}

/// A bounded group of symbols handed downstream as one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    pub id: ClusterId,
    /// `file` for an unsplit file group, `file_<tag>` for a kind-split chunk.
    pub cluster_type: String,
    /// Integer mean of member layers. A scheduling hint only.
    pub layer: u32,
    pub members: Vec<SymbolId>,
    pub estimated_cost: u64,
}

/// Per-symbol result of a planning run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub symbol_id: SymbolId,
    pub layer: u32,
    pub cluster_id: ClusterId,
}
