// src/main.rs
use std::sync::Arc;

use anyhow::Context;
use resumable_lex::{
    config::config,
    lexer::{
        Engine, ReaderSource, ScanBuffer,
        stream::{lex_all, lex_sample},
        tables::{
            TokenKind,
            dfa::{SAMPLE_ENTRY, sample_automaton},
        },
    },
};

fn main() -> anyhow::Result<()> {
    let cfg = config();

    // With a path argument, stream that file through the sample grammar in
    // RLEX_CHUNK-sized reads; otherwise lex a built-in snippet.
    if let Some(path) = std::env::args().nth(1) {
        let file = std::fs::File::open(&path).with_context(|| format!("open {path}"))?;
        let engine = Engine::with_backend(cfg.backend, Arc::new(sample_automaton()?), SAMPLE_ENTRY)?;
        let buf = ScanBuffer::new(ReaderSource::new(file, cfg.chunk_size));
        let matches = lex_all(&engine, buf)?;
        let unmatched = matches
            .iter()
            .filter(|m| m.action == TokenKind::Unmatched.action())
            .count();
        eprintln!(
            "[{}] {path}: {} matches, {unmatched} unmatched",
            cfg.backend,
            matches.len()
        );
        if cfg.verbose {
            for m in &matches {
                let kind = TokenKind::from_action(m.action);
                println!("{:?} @{}+{}  {:?}", kind, m.span.start, m.span.len(), m.text_lossy());
            }
        }
        return Ok(());
    }

    let src = r#"
        foo = 12 + bar/* cmt */(7) // hello
        if baz>=3/*multi
        line*/&& !qux
    "#;

    let tokens = lex_sample(src, cfg.backend)?;
    println!("TOKENS ({} backend):", cfg.backend);
    for t in tokens {
        let lexeme = &src.as_bytes()[t.start..t.start + t.len];
        println!("{:?}  {:?}", t.kind, String::from_utf8_lossy(lexeme));
    }
    Ok(())
}
