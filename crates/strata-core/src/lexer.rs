//! Character-level lexical state machine for C source.
//!
//! The scanner only tracks whether a position is inside a string literal, a
//! character literal, a comment, or plain code. Two-character markers (`//`,
//! `/*`, `*/`) and backslash escapes are handled with intermediate states so that
//! the machine advances exactly one character per [`step`].

/// Lexical state between two characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LexState {
    #[default]
    Code,
    /// A `/` was just seen in code; the next character decides what it was.
    Slash,
    String,
    /// A `\` inside a string literal; the next character is taken verbatim.
    StringEscape,
    CharLiteral,
    CharEscape,
    /// Runs until end of line.
    LineComment,
    /// Persists across lines until `*/`.
    BlockComment,
    /// A `*` inside a block comment; a following `/` closes the comment.
    BlockStar,
}

impl LexState {
    /// True when the character that produced this state belongs to code.
    pub fn is_code(self) -> bool {
        matches!(self, LexState::Code | LexState::Slash)
    }

    pub fn in_literal(self) -> bool {
        matches!(
            self,
            LexState::String | LexState::StringEscape | LexState::CharLiteral | LexState::CharEscape
        )
    }

    pub fn in_comment(self) -> bool {
        matches!(
            self,
            LexState::LineComment | LexState::BlockComment | LexState::BlockStar
        )
    }
}

/// Advance the machine by one character.
///
/// A character should be treated as code (e.g. a brace that counts) exactly when
/// the returned state satisfies [`LexState::is_code`].
pub fn step(state: LexState, ch: char) -> LexState {
    match state {
        LexState::Code => match ch {
            '"' => LexState::String,
            '\'' => LexState::CharLiteral,
            '/' => LexState::Slash,
            _ => LexState::Code,
        },
        LexState::Slash => match ch {
            '/' => LexState::LineComment,
            '*' => LexState::BlockComment,
            // The slash was a division operator; re-examine this character as code.
            _ => step(LexState::Code, ch),
        },
        LexState::String => match ch {
            '\\' => LexState::StringEscape,
            '"' => LexState::Code,
            _ => LexState::String,
        },
        LexState::StringEscape => LexState::String,
        LexState::CharLiteral => match ch {
            '\\' => LexState::CharEscape,
            '\'' => LexState::Code,
            _ => LexState::CharLiteral,
        },
        LexState::CharEscape => LexState::CharLiteral,
        LexState::LineComment => LexState::LineComment,
        LexState::BlockComment | LexState::BlockStar => match ch {
            '*' => LexState::BlockStar,
            '/' if state == LexState::BlockStar => LexState::Code,
            _ => LexState::BlockComment,
        },
    }
}

/// Carry a state over a line break.
///
/// Line comments and a dangling `/` end with the line. Unterminated literals and
/// block comments carry into the next line.
pub fn end_of_line(state: LexState) -> LexState {
    match state {
        LexState::LineComment | LexState::Slash => LexState::Code,
        LexState::StringEscape => LexState::String,
        LexState::CharEscape => LexState::CharLiteral,
        LexState::BlockStar => LexState::BlockComment,
        other => other,
    }
}

/// Run a whole line through the machine, calling `visit` with each character's
/// byte offset and post-step state. Returns the state to carry into the next line.
pub fn scan_line<F>(state: LexState, line: &str, mut visit: F) -> LexState
where
    F: FnMut(usize, char, LexState),
{
    let mut state = state;
    for (offset, ch) in line.char_indices() {
        state = step(state, ch);
        visit(offset, ch, state);
    }
    end_of_line(state)
}

/// Whether a line carries any code outside comments, given the state it starts in.
pub fn has_code(state: LexState, line: &str) -> bool {
    let mut found = false;
    scan_line(state, line, |_, ch, st| {
        if st.is_code() && !ch.is_whitespace() && ch != '/' {
            found = true;
        }
    });
    found
}
