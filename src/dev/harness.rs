// src/dev/harness.rs
// Drives one engine over chunked input through a Rule, with or without a
// refill hook, collecting every match. Actions hand the buffer back instead
// of recursing, so arbitrarily long inputs stay off the stack.

use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use crate::lexer::{ChunkSource, Engine, LexError, Match, Rule, ScanBuffer};

type Step = (Match, ScanBuffer<ChunkSource>);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Run {
    pub matches: Vec<Match>,
    /// Times the hook ran (always 0 without one).
    pub suspensions: usize,
    pub refills: usize,
}

/// Lex `input`, delivered as `ChunkSource::split(input, cuts)`, through a
/// rule on `engine` with `n_actions` identical pass-through actions. With
/// `hooked` a hook that resumes immediately is installed.
pub fn run_rule(
    engine: &Engine,
    n_actions: usize,
    input: &[u8],
    cuts: &[usize],
    hooked: bool,
) -> Result<Run, LexError> {
    let suspensions = Arc::new(AtomicUsize::new(0));
    let mut builder = Rule::<ChunkSource, (), Step>::builder("harness", engine.clone());
    for _ in 0..n_actions {
        builder = builder.action(|_, m, buf, ()| Ok((m, buf)));
    }
    if hooked {
        let counter = Arc::clone(&suspensions);
        builder = builder.hook(move |k| {
            counter.fetch_add(1, Ordering::Relaxed);
            k.resume()
        });
    }
    let rule = builder.build()?;

    let mut buf = ScanBuffer::new(ChunkSource::split(input, cuts));
    let mut matches = Vec::new();
    loop {
        let (m, next) = rule.invoke(buf, ())?;
        buf = next;
        let empty = m.span.is_empty();
        matches.push(m);
        if empty {
            if buf.is_exhausted() {
                break;
            }
            return Err(LexError::MalformedAutomaton {
                reason: format!(
                    "empty match at offset {} before end of input",
                    buf.window().position()
                ),
            });
        }
    }

    Ok(Run {
        matches,
        suspensions: suspensions.load(Ordering::Relaxed),
        refills: buf.refills(),
    })
}
