// src/lexer/mod.rs
pub mod buffer;
pub mod direct;
pub mod engine;
pub mod error;
pub mod rule;
pub mod stream;
pub mod table;
pub mod tables;

pub use buffer::{Chunk, ChunkSource, EOF_SYM, RawSource, ReaderSource, ScanBuffer, Span, Sym};
pub use engine::{Backend, Engine, Match, Outcome, ResumePoint};
pub use error::LexError;
pub use rule::{Action, Continuation, RefillHook, Rule, RuleBuilder};
pub use tables::{ActionId, Automaton, AutomatonBuilder, State, StateId};
