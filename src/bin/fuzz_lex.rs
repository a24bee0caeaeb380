// src/bin/fuzz_lex.rs
// Generate random inputs for the sample grammar and check that every way of
// running the engine agrees with the table backend over a complete buffer:
//   - direct backend, complete buffer
//   - both backends through a rule, input split into random chunks
//   - both backends through a rule with an immediately-resuming hook
//
// Knobs:
//   FUZZ_SEED=<u64>    base seed (iteration i uses seed + i)
//   FUZZ_ITERS=<n>     number of inputs
//   FUZZ_LEN=<bytes>   minimum input size
//   FUZZ_NOISE=<0..1>  rate of stray bytes (exercises Unmatched)
//   FUZZ_INPUT=<path>  replay a single saved input instead

use std::{fs, sync::Arc, time::Instant};

use anyhow::{Context, Result, bail};
use rand::{Rng, SeedableRng, rngs::StdRng};
use rayon::prelude::*;
use resumable_lex::{
    config::{env_u64, env_usize},
    dev::{
        generator::{gen_noisy_source, random_cuts},
        harness::run_rule,
    },
    lexer::{
        Backend, Engine, Match, ScanBuffer,
        stream::lex_all,
        tables::{
            TokenKind,
            dfa::{SAMPLE_ENTRY, sample_automaton},
        },
    },
};

fn main() -> Result<()> {
    let dfa = Arc::new(sample_automaton()?);
    let table = Engine::with_backend(Backend::Table, Arc::clone(&dfa), SAMPLE_ENTRY)?;
    let direct = Engine::with_backend(Backend::Direct, Arc::clone(&dfa), SAMPLE_ENTRY)?;
    let engines = [table, direct];

    if let Ok(path) = std::env::var("FUZZ_INPUT") {
        eprintln!("[replay] reading {path}");
        let src = fs::read(&path).with_context(|| format!("failed to read {path}"))?;
        let mut rng = StdRng::seed_from_u64(env_u64("FUZZ_SEED", 42));
        return run_once(&engines, &src, &mut rng).map(|n| eprintln!("[replay] {n} matches OK"));
    }

    let seed = env_u64("FUZZ_SEED", 42);
    let iters = env_usize("FUZZ_ITERS", 16);
    let len = env_usize("FUZZ_LEN", 64 * 1024);
    let noise: f64 = std::env::var("FUZZ_NOISE")
        .ok()
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(0.01)
        .clamp(0.0, 1.0);
    eprintln!("[fuzz] len={len} iters={iters} seed={seed} noise={noise}");

    let t0 = Instant::now();
    let failures: Vec<(usize, anyhow::Error)> = (0..iters)
        .into_par_iter()
        .filter_map(|i| {
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(i as u64));
            let src = gen_noisy_source(&mut rng, len, noise);
            match run_once(&engines, &src, &mut rng) {
                Ok(n) => {
                    eprintln!("[fuzz] iter {i}: {} bytes, {n} matches -> OK", src.len());
                    None
                }
                Err(e) => Some((i, e)),
            }
        })
        .collect();

    if failures.is_empty() {
        eprintln!(
            "[fuzz] all {iters} iterations matched in {} ms",
            t0.elapsed().as_millis()
        );
        return Ok(());
    }
    for (i, e) in &failures {
        eprintln!("[fuzz] iter {i} (seed {}): {e:#}", seed.wrapping_add(*i as u64));
    }
    bail!("{} of {iters} iterations diverged", failures.len())
}

/// Returns the number of matches in the reference run.
fn run_once(engines: &[Engine; 2], src: &[u8], rng: &mut StdRng) -> Result<usize> {
    let reference = lex_all(&engines[0], ScanBuffer::from_bytes(src))?;
    let n_actions = TokenKind::ALL.len();

    let whole = lex_all(&engines[1], ScanBuffer::from_bytes(src))?;
    compare(src, "direct/whole", &reference, &whole)?;

    for engine in engines {
        let max_pieces = rng.random_range(1..=64);
        let cuts = random_cuts(rng, src.len(), max_pieces);
        for hooked in [false, true] {
            let label = format!(
                "{}/{}chunks{}",
                engine.backend(),
                cuts.len() + 1,
                if hooked { "+hook" } else { "" }
            );
            let run = run_rule(engine, n_actions, src, &cuts, hooked)?;
            compare(src, &label, &reference, &run.matches)?;
            if hooked && run.suspensions != run.refills {
                bail!(
                    "[{label}] hook ran {} times for {} refills",
                    run.suspensions,
                    run.refills
                );
            }
        }
    }
    Ok(reference.len())
}

fn compare(src: &[u8], label: &str, want: &[Match], got: &[Match]) -> Result<()> {
    let n = want.len().min(got.len());
    let first = (0..n).find(|&i| want[i] != got[i]).unwrap_or(n);
    if first == n && want.len() == got.len() {
        return Ok(());
    }
    dump_near(src, want, got, first.saturating_sub(2));
    bail!(
        "[{label}] diverged at match {first} (reference has {}, got {})",
        want.len(),
        got.len()
    )
}

fn dump_near(src: &[u8], want: &[Match], got: &[Match], from: usize) {
    let hi = (from + 6).min(want.len().max(got.len()));
    eprintln!("--- context matches [{from}..{hi}) ---");
    for i in from..hi {
        let w = want.get(i).map(|m| (m.action, m.span.start, m.span.len(), m.text_lossy()));
        let g = got.get(i).map(|m| (m.action, m.span.start, m.span.len(), m.text_lossy()));
        let mark = if w == g { "✅" } else { "❌" };
        eprintln!("{mark} #{i:06} want={w:?}  got={g:?}");
    }
    if let Some(m) = want.get(from) {
        let lo = m.span.start.saturating_sub(32);
        let hi = (m.span.end + 32).min(src.len());
        eprintln!("    {:?}", String::from_utf8_lossy(&src[lo..hi]));
    }
}
