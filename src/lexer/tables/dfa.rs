// src/lexer/tables/dfa.rs
// Hand-built automaton for the sample grammar used by the demo, the fuzzer
// and the tests.

use super::{
    Automaton, StateId,
    build::AutomatonBuilder,
    tokens::TokenKind,
};
use crate::lexer::error::LexError;

/// Entry state of the sample automaton.
pub const SAMPLE_ENTRY: StateId = 0;

const ALPHA: [std::ops::RangeInclusive<u8>; 3] = [b'a'..=b'z', b'A'..=b'Z', b'_'..=b'_'];
const WHITE: &[u8] = b" \t\r\n";

/// Identifiers, the `if` keyword, integers, whitespace, `//` and `/* */`
/// comments, brackets and C-like operators. Anything else is consumed one
/// byte at a time as `Unmatched`; an unterminated block comment is
/// `Unmatched` as well.
pub fn sample_automaton() -> Result<Automaton, LexError> {
    let mut b = AutomatonBuilder::new();
    let start = b.dispatch();
    debug_assert_eq!(start, SAMPLE_ENTRY);

    // One terminal per token kind, indexed by discriminant.
    let t: Vec<StateId> = TokenKind::ALL
        .iter()
        .map(|k| b.terminal(k.action()))
        .collect();
    let emit = |k: TokenKind| t[k as usize];

    b.on_eof(start, emit(TokenKind::Eof));

    // `if` is declared before the identifier range so it wins the tie.
    let kw_i = b.dispatch();
    let kw_if = b.dispatch();
    let ident = b.dispatch();
    b.on(start, b"i", kw_i);
    b.on(kw_i, b"f", kw_if);
    for s in [start, kw_i, kw_if, ident] {
        for r in ALPHA {
            b.on_range(s, r, ident);
        }
    }
    for s in [kw_i, kw_if, ident] {
        b.on_range(s, b'0'..=b'9', ident);
    }
    b.otherwise(kw_i, emit(TokenKind::Ident));
    b.otherwise(kw_if, emit(TokenKind::If));
    b.otherwise(ident, emit(TokenKind::Ident));

    let int = b.dispatch();
    b.on_range(start, b'0'..=b'9', int);
    b.on_range(int, b'0'..=b'9', int);
    b.otherwise(int, emit(TokenKind::Int));

    let white = b.dispatch();
    b.on(start, WHITE, white);
    b.on(white, WHITE, white);
    b.otherwise(white, emit(TokenKind::White));

    // Comments.
    let slash = b.dispatch();
    let line = b.dispatch();
    let block = b.dispatch();
    let block_star = b.dispatch();
    let block_done = b.dispatch();
    b.on(start, b"/", slash);
    b.on(slash, b"/", line);
    b.on(slash, b"*", block);
    b.otherwise(slash, emit(TokenKind::Slash));

    b.on(line, b"\n", emit(TokenKind::LineComment));
    b.on_eof(line, emit(TokenKind::LineComment));
    b.otherwise(line, line);

    b.on(block, b"*", block_star);
    b.on_eof(block, emit(TokenKind::Unmatched));
    b.otherwise(block, block);
    b.on(block_star, b"/", block_done);
    b.on(block_star, b"*", block_star);
    b.on_eof(block_star, emit(TokenKind::Unmatched));
    b.otherwise(block_star, block);
    b.otherwise(block_done, emit(TokenKind::BlockComment));

    // Single-byte tokens.
    for (byte, kind) in [
        (b'(', TokenKind::LParen),
        (b')', TokenKind::RParen),
        (b'[', TokenKind::LBracket),
        (b']', TokenKind::RBracket),
        (b'{', TokenKind::LBrace),
        (b'}', TokenKind::RBrace),
        (b'+', TokenKind::Plus),
        (b'-', TokenKind::Minus),
        (b'*', TokenKind::Star),
    ] {
        let after = b.dispatch();
        b.on(start, &[byte], after);
        b.otherwise(after, emit(kind));
    }

    // One- or two-byte operators: `first`, then optionally `second`.
    for (first, second, short, long) in [
        (b'=', b'=', TokenKind::Assign, TokenKind::EqEq),
        (b'!', b'=', TokenKind::Not, TokenKind::Ne),
        (b'<', b'=', TokenKind::Lt, TokenKind::Le),
        (b'>', b'=', TokenKind::Gt, TokenKind::Ge),
        (b'&', b'&', TokenKind::Ampersand, TokenKind::AndAnd),
        (b'|', b'|', TokenKind::Pipe, TokenKind::OrOr),
    ] {
        let maybe = b.dispatch();
        let done = b.dispatch();
        b.on(start, &[first], maybe);
        b.on(maybe, &[second], done);
        b.otherwise(maybe, emit(short));
        b.otherwise(done, emit(long));
    }

    // Anything else: swallow one byte and report it.
    let junk = b.dispatch();
    b.otherwise(start, junk);
    b.otherwise(junk, emit(TokenKind::Unmatched));

    b.build()
}
