//! Refill hook protocol: suspension, resumption and hook-free behavior.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use resumable_lex::lexer::{
    Automaton, AutomatonBuilder, Backend, Chunk, ChunkSource, Continuation, Engine, LexError,
    RawSource, ResumePoint, Rule, ScanBuffer, StateId,
};

const START: StateId = 0;
const DIGITS: StateId = 1;

/// `[0-9]+` -> action 0, EOF -> action 1, any other byte -> action 2.
fn digits_automaton() -> Automaton {
    let mut b = AutomatonBuilder::new();
    let start = b.dispatch();
    let digits = b.dispatch();
    let other = b.dispatch();
    assert_eq!((start, digits), (START, DIGITS));
    let number = b.terminal(0);
    let eof = b.terminal(1);
    let skip = b.terminal(2);
    b.on_eof(start, eof);
    b.on_range(start, b'0'..=b'9', digits);
    b.otherwise(start, other);
    b.on_range(digits, b'0'..=b'9', digits);
    b.otherwise(digits, number);
    b.otherwise(other, skip);
    b.build().unwrap()
}

fn engine(backend: Backend) -> Engine {
    Engine::with_backend(backend, Arc::new(digits_automaton()), START).unwrap()
}

fn number(text: &[u8]) -> u64 {
    std::str::from_utf8(text).unwrap().parse().unwrap()
}

/// Sums every number in the input; returns the total at EOF.
fn summing_rule<S>(
    backend: Backend,
    hook: Option<Arc<dyn Fn(Continuation<S, u64, u64>) -> Result<u64, LexError> + Send + Sync>>,
) -> Rule<S, u64, u64>
where
    S: RawSource + 'static,
{
    let mut b = Rule::<S, u64, u64>::builder("sum", engine(backend))
        .action(|rule, m, buf, acc: u64| rule.invoke(buf, acc + number(&m.text)))
        .action(|_, _, _, acc| Ok(acc))
        .action(|rule, _, buf, acc| rule.invoke(buf, acc));
    if let Some(h) = hook {
        b = b.shared_hook(h);
    }
    b.build().unwrap()
}

fn scenario_buffer() -> ScanBuffer<ChunkSource> {
    ScanBuffer::with_prefix("12", ChunkSource::new([Chunk::more("3x"), Chunk::end()]))
}

#[test]
fn number_split_across_refills_is_one_lexeme() {
    for backend in [Backend::Table, Backend::Direct] {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        let rule = summing_rule(
            backend,
            Some(Arc::new(move |k: Continuation<ChunkSource, u64, u64>| {
                counter.fetch_add(1, Ordering::SeqCst);
                k.resume()
            })),
        );

        assert_eq!(rule.invoke(scenario_buffer(), 0).unwrap(), 123, "{backend}");
        assert_eq!(runs.load(Ordering::SeqCst), 2, "{backend}");
    }
}

#[test]
fn no_hook_refills_in_place() {
    for backend in [Backend::Table, Backend::Direct] {
        let rule = summing_rule::<ChunkSource>(backend, None);
        assert!(!rule.has_hook());
        assert_eq!(rule.invoke(scenario_buffer(), 0).unwrap(), 123);

        let rule = summing_rule::<ChunkSource>(backend, None);
        let src = ChunkSource::split(b"7 10x5", &[1, 1, 3, 4]);
        assert_eq!(rule.invoke(ScanBuffer::new(src), 0).unwrap(), 22);
    }
}

#[test]
fn pass_through_hook_matches_hook_free_run() {
    let inputs: [&[u8]; 5] = [b"", b"1", b"1 2 3", b"99bottles of 1000", b"a1b22c333d4444"];
    for backend in [Backend::Table, Backend::Direct] {
        for input in inputs {
            for cut in 0..=input.len() {
                for cuts in [vec![cut], vec![0, cut, cut], vec![cut, input.len()]] {
                    let plain = summing_rule::<ChunkSource>(backend, None)
                        .invoke(ScanBuffer::new(ChunkSource::split(input, &cuts)), 0)
                        .unwrap();
                    let hooked = summing_rule(
                        backend,
                        Some(Arc::new(|k: Continuation<ChunkSource, u64, u64>| k.resume())),
                    )
                    .invoke(ScanBuffer::new(ChunkSource::split(input, &cuts)), 0)
                    .unwrap();
                    assert_eq!(plain, hooked, "{backend} {input:?} {cuts:?}");
                }
            }
        }
    }
}

#[test]
fn continuation_exposes_saved_point_and_resumes_twice_identically() {
    for (backend, expected_at) in [
        (Backend::Table, ResumePoint::State(DIGITS)),
        (Backend::Direct, ResumePoint::Unit(DIGITS)),
    ] {
        let parked: Arc<Mutex<Vec<Continuation<ChunkSource, u64, u64>>>> = Arc::default();
        let slot = Arc::clone(&parked);
        let rule = summing_rule(
            backend,
            Some(Arc::new(move |k: Continuation<ChunkSource, u64, u64>| {
                slot.lock().unwrap().push(k);
                Ok(u64::MAX)
            })),
        );

        let buf = ScanBuffer::with_prefix("12", ChunkSource::new([Chunk::last("3x")]));
        assert_eq!(rule.invoke(buf, 5).unwrap(), u64::MAX);

        let k = parked.lock().unwrap().pop().unwrap();
        assert_eq!(k.resume_point(), expected_at);
        assert_eq!(*k.params(), 5);
        assert_eq!(k.buffer().lexeme(), b"12");
        assert_eq!(k.rule().name(), "sum");

        let again = k.clone();
        assert_eq!(k.resume().unwrap(), 128);
        assert_eq!(again.resume().unwrap(), 128);
        assert!(parked.lock().unwrap().is_empty());
    }
}

#[test]
fn dropped_continuation_abandons_the_invocation() {
    let rule = summing_rule(
        Backend::Direct,
        Some(Arc::new(|k: Continuation<ChunkSource, u64, u64>| {
            drop(k);
            Ok(0)
        })),
    );
    assert_eq!(rule.invoke(scenario_buffer(), 40).unwrap(), 0);
}

/// Delivers one chunk, then fails.
#[derive(Default)]
struct Flaky {
    calls: usize,
}

impl RawSource for Flaky {
    fn supply_more(&mut self) -> anyhow::Result<Chunk> {
        self.calls += 1;
        if self.calls == 1 {
            Ok(Chunk::more("2"))
        } else {
            anyhow::bail!("device unplugged")
        }
    }
}

#[test]
fn raw_input_failure_propagates_with_and_without_hook() {
    let failing = || ScanBuffer::with_prefix("4", Flaky::default());

    for backend in [Backend::Table, Backend::Direct] {
        let err = summing_rule(backend, None).invoke(failing(), 0).unwrap_err();
        assert!(err.is_raw_input(), "{err:?}");
        assert!(format!("{:#}", anyhow::Error::from(err)).contains("device unplugged"));

        let hooks = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hooks);
        let err = summing_rule(
            backend,
            Some(Arc::new(move |k: Continuation<Flaky, u64, u64>| {
                counter.fetch_add(1, Ordering::SeqCst);
                k.resume()
            })),
        )
        .invoke(failing(), 0)
        .unwrap_err();
        assert!(err.is_raw_input(), "{err:?}");
        assert_eq!(hooks.load(Ordering::SeqCst), 2);
    }
}

#[test]
fn hook_can_stage_input_before_resuming() {
    // The source itself is empty; the hook feeds it from a script.
    let script = Arc::new(Mutex::new(vec![Chunk::end(), Chunk::more("5 6"), Chunk::more("4")]));
    let feed = Arc::clone(&script);
    let rule = summing_rule(
        Backend::Table,
        Some(Arc::new(move |mut k: Continuation<ChunkSource, u64, u64>| {
            if let Some(next) = feed.lock().unwrap().pop() {
                *k.buffer_mut().source_mut() = ChunkSource::new([next]);
            }
            k.resume()
        })),
    );
    assert_eq!(rule.invoke(ScanBuffer::new(ChunkSource::default()), 0).unwrap(), 51);
}

#[tokio::test]
async fn deferred_continuation_returns_immediately() {
    type Out = Option<u64>;

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<Result<Out, LexError>>();
    let hooks = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hooks);

    let rule = Rule::<ChunkSource, u64, Out>::builder("sum-later", engine(Backend::Direct))
        .action(|rule, m, buf, acc: u64| rule.invoke(buf, acc + number(&m.text)))
        .action(|_, _, _, acc| Ok(Some(acc)))
        .action(|rule, _, buf, acc| rule.invoke(buf, acc))
        .hook(move |k| {
            counter.fetch_add(1, Ordering::SeqCst);
            let tx = tx.clone();
            tokio::spawn(async move {
                let _ = tx.send(k.resume());
            });
            Ok(None)
        })
        .build()
        .unwrap();

    assert_eq!(rule.invoke(scenario_buffer(), 0).unwrap(), None);
    assert_eq!(hooks.load(Ordering::SeqCst), 1);
    assert!(rx.try_recv().is_err(), "nothing may run before the task does");

    let total = loop {
        match rx.recv().await {
            Some(Ok(Some(total))) => break total,
            Some(Ok(None)) => continue,
            Some(Err(e)) => panic!("resumed scan failed: {e:?}"),
            None => panic!("channel closed without a result"),
        }
    };
    assert_eq!(total, 123);
    assert_eq!(hooks.load(Ordering::SeqCst), 2);
}
