// src/lexer/stream.rs
// Batch lexing with blocking refills, used as the reference when comparing
// backends and suspension modes.

use std::sync::Arc;

use super::{
    buffer::{RawSource, ScanBuffer},
    engine::{Backend, Engine, Match},
    error::LexError,
    tables::{TokenKind, dfa::SAMPLE_ENTRY, dfa::sample_automaton},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub len: usize,
}

/// Every match up to and including the first empty match at end of input.
///
/// An empty match anywhere else would repeat forever, so it is reported as a
/// malformed automaton instead.
pub fn lex_all<S: RawSource>(engine: &Engine, mut buf: ScanBuffer<S>) -> Result<Vec<Match>, LexError> {
    let mut out = Vec::new();
    loop {
        let m = engine.next_match(&mut buf)?;
        let empty = m.span.is_empty();
        out.push(m);
        if empty {
            if buf.is_exhausted() {
                return Ok(out);
            }
            return Err(LexError::malformed(format!(
                "empty match at offset {} before end of input",
                buf.window().position()
            )));
        }
    }
}

fn slice_dbg(src: &[u8], i: usize) -> (usize, String) {
    let lo = i.saturating_sub(16);
    let hi = (i + 16).min(src.len());
    let mut s = String::new();
    for &b in &src[lo..hi] {
        s.push(
            if b.is_ascii_graphic() || b == b' ' || b == b'\n' || b == b'\t' || b == b'\r' {
                b as char
            } else {
                '·'
            },
        );
    }
    (lo, s)
}

/// Lex `input` with the sample grammar, dropping trivia and the final EOF.
/// Unmatched input is an error here, reported with some context.
pub fn lex_sample(input: &str, backend: Backend) -> anyhow::Result<Vec<Token>> {
    let bytes = input.as_bytes();
    let engine = Engine::with_backend(backend, Arc::new(sample_automaton()?), SAMPLE_ENTRY)?;
    let mut out = Vec::new();
    for m in lex_all(&engine, ScanBuffer::from_bytes(bytes))? {
        let kind = TokenKind::from_action(m.action)
            .ok_or_else(|| anyhow::anyhow!("sample automaton reported unknown action {}", m.action))?;
        match kind {
            TokenKind::Eof => break,
            TokenKind::Unmatched => {
                let (ctx_lo, ctx) = slice_dbg(bytes, m.span.start);
                anyhow::bail!(
                    "unmatched input {:?} at byte {}; context [{}..{}):\n{}",
                    m.text_lossy(),
                    m.span.start,
                    ctx_lo,
                    ctx_lo + ctx.chars().count(),
                    ctx
                );
            }
            k if k.is_trivia() => {}
            kind => out.push(Token {
                kind,
                start: m.span.start,
                len: m.span.len(),
            }),
        }
    }
    Ok(out)
}
