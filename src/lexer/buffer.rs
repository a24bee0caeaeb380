// src/lexer/buffer.rs
// Scan buffer: a sliding window over input that is refilled on demand.

use std::{collections::VecDeque, io::Read};

use anyhow::Context;

use super::error::LexError;

/// Input symbol: `0..=255` are bytes, `EOF_SYM` is end of input.
pub type Sym = u16;

/// End-of-input sentinel, one past the byte range.
pub const EOF_SYM: Sym = 256;

/// Number of distinct symbols (256 bytes + EOF).
pub const N_SYMS: usize = 257;

/// The window ran dry but more input may still arrive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NeedRefill;

/// Absolute byte offsets `[start, end)` into the whole input stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// The byte window the automaton reads from.
///
/// `bytes[0]` sits at absolute offset `base`; `limit` is always
/// `bytes.len()`, so `start <= cursor <= limit` holds by construction of
/// every mutator below.
#[derive(Debug, Clone, Default)]
pub struct Window {
    bytes: Vec<u8>,
    base: usize,
    start: usize,
    cursor: usize,
    at_end: bool,
}

impl Window {
    /// Symbol at `cursor`, or `EOF_SYM` once the input is known to be over.
    #[inline]
    pub fn peek(&self) -> Result<Sym, NeedRefill> {
        match self.bytes.get(self.cursor) {
            Some(&b) => Ok(b as Sym),
            None if self.at_end => Ok(EOF_SYM),
            None => Err(NeedRefill),
        }
    }

    /// Consume the symbol returned by the last successful `peek`.
    /// Consuming EOF leaves the cursor where it is.
    #[inline]
    pub fn advance(&mut self) {
        debug_assert!(
            self.cursor < self.bytes.len() || self.at_end,
            "advance() without a successful peek()"
        );
        if self.cursor < self.bytes.len() {
            self.cursor += 1;
        }
    }

    /// Bytes of the lexeme in progress, `[start, cursor)`.
    pub fn lexeme(&self) -> &[u8] {
        &self.bytes[self.start..self.cursor]
    }

    /// Absolute span of the lexeme in progress.
    pub fn span(&self) -> Span {
        Span {
            start: self.base + self.start,
            end: self.base + self.cursor,
        }
    }

    /// Start a new lexeme at the cursor.
    pub fn begin_lexeme(&mut self) {
        self.start = self.cursor;
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn limit(&self) -> usize {
        self.bytes.len()
    }

    pub fn at_end(&self) -> bool {
        self.at_end
    }

    /// Absolute offset of the cursor in the whole stream.
    pub fn position(&self) -> usize {
        self.base + self.cursor
    }

    /// Buffered bytes not consumed yet.
    pub fn pending(&self) -> &[u8] {
        &self.bytes[self.cursor..]
    }

    /// Drop everything before `start`; offsets shift, absolute spans do not.
    fn compact(&mut self) {
        if self.start == 0 {
            return;
        }
        self.bytes.drain(..self.start);
        self.base += self.start;
        self.cursor -= self.start;
        self.start = 0;
    }

    fn append(&mut self, bytes: &[u8], is_final: bool) {
        self.bytes.extend_from_slice(bytes);
        self.at_end |= is_final;
    }
}

/// One delivery from a raw source.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Chunk {
    pub bytes: Vec<u8>,
    pub is_final: bool,
}

impl Chunk {
    /// Bytes with more to follow.
    pub fn more(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            is_final: false,
        }
    }

    /// Bytes that close the input.
    pub fn last(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            is_final: true,
        }
    }

    /// End of input with no further bytes.
    pub fn end() -> Self {
        Self::last(Vec::new())
    }
}

/// Where raw bytes come from. Called only by `ScanBuffer::refill_sync`.
pub trait RawSource {
    fn supply_more(&mut self) -> anyhow::Result<Chunk>;
}

impl<T: RawSource + ?Sized> RawSource for Box<T> {
    fn supply_more(&mut self) -> anyhow::Result<Chunk> {
        (**self).supply_more()
    }
}

/// Source for buffers created with all their input up front.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSource;

impl RawSource for NoSource {
    fn supply_more(&mut self) -> anyhow::Result<Chunk> {
        Ok(Chunk::end())
    }
}

/// Scripted deliveries; reports end of input once the script runs out.
#[derive(Debug, Clone, Default)]
pub struct ChunkSource {
    chunks: VecDeque<Chunk>,
}

impl ChunkSource {
    pub fn new(chunks: impl IntoIterator<Item = Chunk>) -> Self {
        Self {
            chunks: chunks.into_iter().collect(),
        }
    }

    /// Split `input` at the given offsets; the last piece is final.
    pub fn split(input: &[u8], cuts: &[usize]) -> Self {
        let mut chunks = VecDeque::with_capacity(cuts.len() + 1);
        let mut lo = 0;
        for &cut in cuts {
            let cut = cut.clamp(lo, input.len());
            chunks.push_back(Chunk::more(&input[lo..cut]));
            lo = cut;
        }
        chunks.push_back(Chunk::last(&input[lo..]));
        Self { chunks }
    }

    pub fn remaining(&self) -> usize {
        self.chunks.len()
    }
}

impl RawSource for ChunkSource {
    fn supply_more(&mut self) -> anyhow::Result<Chunk> {
        Ok(self.chunks.pop_front().unwrap_or_else(Chunk::end))
    }
}

/// Blocking reads of up to `chunk_size` bytes from any reader.
#[derive(Debug)]
pub struct ReaderSource<R> {
    reader: R,
    chunk_size: usize,
}

impl<R: Read> ReaderSource<R> {
    pub fn new(reader: R, chunk_size: usize) -> Self {
        Self {
            reader,
            chunk_size: chunk_size.max(1),
        }
    }
}

impl<R: Read> RawSource for ReaderSource<R> {
    fn supply_more(&mut self) -> anyhow::Result<Chunk> {
        let mut buf = vec![0u8; self.chunk_size];
        loop {
            match self.reader.read(&mut buf) {
                Ok(0) => return Ok(Chunk::end()),
                Ok(n) => {
                    buf.truncate(n);
                    return Ok(Chunk::more(buf));
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(e).with_context(|| {
                        format!("read of up to {} bytes failed", self.chunk_size)
                    });
                }
            }
        }
    }
}

/// Adapts a closure into a source.
pub struct FnSource<F>(pub F);

impl<F> RawSource for FnSource<F>
where
    F: FnMut() -> anyhow::Result<Chunk>,
{
    fn supply_more(&mut self) -> anyhow::Result<Chunk> {
        (self.0)()
    }
}

/// A window plus the source that refills it. One per rule invocation chain;
/// it moves by value through actions and continuations.
#[derive(Debug, Clone)]
pub struct ScanBuffer<S> {
    window: Window,
    source: S,
    refills: usize,
}

impl ScanBuffer<NoSource> {
    /// A buffer holding the complete input.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        let mut window = Window::default();
        window.append(&bytes.into(), true);
        Self {
            window,
            source: NoSource,
            refills: 0,
        }
    }
}

impl<S: RawSource> ScanBuffer<S> {
    /// An empty window; the first peek asks for a refill.
    pub fn new(source: S) -> Self {
        Self {
            window: Window::default(),
            source,
            refills: 0,
        }
    }

    /// A window pre-loaded with `prefix`, refilled from `source` afterwards.
    pub fn with_prefix(prefix: impl Into<Vec<u8>>, source: S) -> Self {
        let mut buf = Self::new(source);
        buf.window.append(&prefix.into(), false);
        buf
    }

    /// Blocking refill through the raw source: extends `limit` or sets
    /// `at_end`. The caller retries its peek afterwards.
    pub fn refill_sync(&mut self) -> Result<(), LexError> {
        if self.window.at_end {
            return Ok(());
        }
        self.window.compact();
        let chunk = self.source.supply_more().map_err(LexError::RawInput)?;
        self.refills += 1;
        log::debug!(
            "refill #{}: +{} bytes at offset {}{}",
            self.refills,
            chunk.bytes.len(),
            self.window.base + self.window.limit(),
            if chunk.is_final { " (final)" } else { "" }
        );
        self.window.append(&chunk.bytes, chunk.is_final);
        Ok(())
    }
}

impl<S> ScanBuffer<S> {
    pub fn window(&self) -> &Window {
        &self.window
    }

    pub fn window_mut(&mut self) -> &mut Window {
        &mut self.window
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn into_source(self) -> S {
        self.source
    }

    /// How many times the raw source has been asked for more.
    pub fn refills(&self) -> usize {
        self.refills
    }

    pub fn lexeme(&self) -> &[u8] {
        self.window.lexeme()
    }

    pub fn span(&self) -> Span {
        self.window.span()
    }

    pub fn at_end(&self) -> bool {
        self.window.at_end
    }

    /// Nothing buffered and nothing more to come.
    pub fn is_exhausted(&self) -> bool {
        self.window.at_end && self.window.cursor == self.window.limit()
    }
}
