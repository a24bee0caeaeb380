// src/lexer/tables/tokens.rs

use super::ActionId;

/// Token kinds of the sample grammar. The discriminant is the action index
/// the sample automaton's terminal states carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum TokenKind {
    Eof = 0,
    Unmatched = 1,

    Ident = 2,
    If = 3,
    Int = 4,
    White = 5,
    LineComment = 6,
    BlockComment = 7,

    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,

    Plus,
    Minus,
    Star,
    Slash,

    Assign,
    EqEq,
    Not,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,

    Ampersand,
    AndAnd,
    Pipe,
    OrOr,
}

impl TokenKind {
    /// Every kind, in discriminant order.
    pub const ALL: [TokenKind; 30] = {
        use TokenKind::*;
        [
            Eof,
            Unmatched,
            Ident,
            If,
            Int,
            White,
            LineComment,
            BlockComment,
            LParen,
            RParen,
            LBracket,
            RBracket,
            LBrace,
            RBrace,
            Plus,
            Minus,
            Star,
            Slash,
            Assign,
            EqEq,
            Not,
            Ne,
            Lt,
            Le,
            Gt,
            Ge,
            Ampersand,
            AndAnd,
            Pipe,
            OrOr,
        ]
    };

    pub fn action(self) -> ActionId {
        self as ActionId
    }

    pub fn from_action(action: ActionId) -> Option<Self> {
        Self::ALL.get(action as usize).copied()
    }

    /// Whitespace and comments.
    pub fn is_trivia(self) -> bool {
        use TokenKind::*;
        matches!(self, White | LineComment | BlockComment)
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| format!("{k:?}") == name)
    }
}

impl TryFrom<u32> for TokenKind {
    type Error = u32;

    fn try_from(v: u32) -> Result<Self, u32> {
        Self::from_action(v).ok_or(v)
    }
}
