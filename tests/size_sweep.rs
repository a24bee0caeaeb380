//! Size sweep tests for the engine:
//!  - all target lengths < 32 (0..=31), every single cut point, both
//!    backends, with and without a hook; runs by default
//!  - powers of two from 32 up to ~1,000,000 with random chunking; opt-in
//!    (ignored by default)
//!
//! Inputs come from the shared generator (same as fuzz_lex). The table
//! backend over the complete input is the reference every other run must
//! reproduce match for match.

use std::{fs, io::Write, path::Path, sync::Arc};

use rand::{Rng, SeedableRng, rngs::StdRng};
use resumable_lex::{
    config::{env_u64, env_usize},
    dev::{
        generator::{gen_valid_source, random_cuts},
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

fn engines() -> [Engine; 2] {
    let dfa = Arc::new(sample_automaton().expect("sample automaton"));
    [Backend::Table, Backend::Direct]
        .map(|b| Engine::with_backend(b, Arc::clone(&dfa), SAMPLE_ENTRY).expect("engine"))
}

fn first_divergence_idx(want: &[Match], got: &[Match]) -> usize {
    let n = want.len().min(got.len());
    (0..n).find(|&i| want[i] != got[i]).unwrap_or(n)
}

fn dump_near(want: &[Match], got: &[Match], from: usize) {
    let lo = from.saturating_sub(1);
    let hi = (from + 3).min(want.len().max(got.len()));
    eprintln!("--- context matches [{lo}..{hi}) ---");
    for i in lo..hi {
        let w = want
            .get(i)
            .map(|m| (TokenKind::from_action(m.action), m.span, m.text_lossy()));
        let g = got
            .get(i)
            .map(|m| (TokenKind::from_action(m.action), m.span, m.text_lossy()));
        let mark = if w == g { "✅" } else { "❌" };
        eprintln!("{mark} #{i:06} want={w:?}  got={g:?}");
    }
}

fn save_case(dir: &str, target_len: usize, seed: u64, src: &str, cuts: &[usize]) -> String {
    let _ = fs::create_dir_all(dir);
    let base = format!("size_sweep_fail_len{target_len}_seed{seed}_n{}.src", src.len());
    let path = Path::new(dir).join(base);
    fs::write(&path, src.as_bytes()).ok();

    let meta = serde_json::json!({
        "target_len": target_len,
        "actual_bytes": src.len(),
        "seed": seed,
        "cuts": cuts,
        "replay": format!("FUZZ_INPUT={} cargo run --bin fuzz_lex", path.display()),
    });
    if let Ok(mut f) = fs::File::create(path.with_extension("json")) {
        let _ = writeln!(f, "{meta:#}");
    }
    path.display().to_string()
}

struct Case<'a> {
    src: &'a str,
    target: usize,
    seed: u64,
}

impl Case<'_> {
    fn assert_same(&self, label: &str, cuts: &[usize], want: &[Match], got: &[Match]) {
        if want == got {
            return;
        }
        let saved = save_case("fuzz-cases", self.target, self.seed, self.src, cuts);
        let i = first_divergence_idx(want, got);
        eprintln!(
            "[{label}] target_len={} actual_len={} cuts={cuts:?}: diverged at match {i} \
             (want {}, got {})\n  saved: {saved}",
            self.target,
            self.src.len(),
            want.len(),
            got.len()
        );
        dump_near(want, got, i);
        panic!("match mismatch");
    }

    fn check_split(&self, engines: &[Engine; 2], reference: &[Match], cuts: &[usize]) {
        for engine in engines {
            for hooked in [false, true] {
                let label = format!("{}{}", engine.backend(), if hooked { "+hook" } else { "" });
                let run = run_rule(
                    engine,
                    TokenKind::ALL.len(),
                    self.src.as_bytes(),
                    cuts,
                    hooked,
                )
                .unwrap_or_else(|e| panic!("[{label}] rule failed: {e:?}"));
                self.assert_same(&label, cuts, reference, &run.matches);
                if hooked {
                    assert_eq!(run.suspensions, run.refills, "[{label}] cuts={cuts:?}");
                } else {
                    assert_eq!(run.suspensions, 0, "[{label}]");
                }
            }
        }
    }
}

fn source_for(target_len: usize, seed: u64) -> String {
    // Derive a per-length seed for reproducibility across iterations.
    let mut rng =
        StdRng::seed_from_u64(seed ^ (target_len as u64).wrapping_mul(0x9E3779B97F4A7C15));
    gen_valid_source(&mut rng, target_len)
}

fn reference(engines: &[Engine; 2], case: &Case<'_>) -> Vec<Match> {
    let want = lex_all(&engines[0], ScanBuffer::from_bytes(case.src)).expect("table lex failed");
    let direct = lex_all(&engines[1], ScanBuffer::from_bytes(case.src)).expect("direct lex failed");
    case.assert_same("direct/whole", &[], &want, &direct);

    let last = want.last().expect("at least the EOF match");
    assert_eq!(last.action, TokenKind::Eof.action());
    assert_eq!(last.span.start, case.src.len());
    assert!(
        want.iter().all(|m| m.action != TokenKind::Unmatched.action()),
        "generator produced unmatched input: {:?}",
        case.src
    );
    want
}

/// Sweep 0..=31 target lengths, splitting once at every offset and also at
/// every offset twice. (Fast; runs by default.)
#[test]
fn size_sweep_small_targets() {
    let seed = env_u64("SIZE_SWEEP_SEED", 42);
    let engines = engines();
    for target in 0..=31 {
        let src = source_for(target, seed);
        let case = Case {
            src: &src,
            target,
            seed,
        };
        let want = reference(&engines, &case);
        for cut in 0..=src.len() {
            case.check_split(&engines, &want, &[cut]);
            case.check_split(&engines, &want, &[cut, cut]);
        }
    }
}

/// One-byte chunks: every symbol arrives through its own refill.
#[test]
fn byte_at_a_time() {
    let seed = env_u64("SIZE_SWEEP_SEED", 42);
    let engines = engines();
    let src = source_for(300, seed);
    let case = Case {
        src: &src,
        target: 300,
        seed,
    };
    let want = reference(&engines, &case);
    let cuts: Vec<usize> = (1..src.len()).collect();
    case.check_split(&engines, &want, &cuts);
}

/// Powers of two from 32 up to ~1,000,000 (capped by SIZE_SWEEP_MAX), with
/// random chunkings. Ignored by default; opt-in when needed.
#[test]
#[ignore]
fn size_sweep_powers_of_two() {
    let seed = env_u64("SIZE_SWEEP_SEED", 42);
    let max_len = env_usize("SIZE_SWEEP_MAX", 1_000_000);
    let engines = engines();

    let mut n = 32usize;
    while n <= max_len {
        let src = source_for(n, seed);
        let case = Case {
            src: &src,
            target: n,
            seed,
        };
        let want = reference(&engines, &case);
        let mut rng = StdRng::seed_from_u64(seed.wrapping_add(n as u64));
        for _ in 0..4 {
            let pieces = rng.random_range(1..=256);
            let cuts = random_cuts(&mut rng, src.len(), pieces);
            case.check_split(&engines, &want, &cuts);
        }
        eprintln!(
            "[size_sweep] ok: target_len={} actual_len={} matches={}",
            n,
            src.len(),
            want.len()
        );
        n = n.saturating_mul(2);
    }
}
