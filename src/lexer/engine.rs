// src/lexer/engine.rs
// Backend selection and the synchronous match loop shared by both backends.

use std::{fmt, str::FromStr, sync::Arc};

use super::{
    buffer::{RawSource, ScanBuffer, Span, Window},
    direct::{self, DirectProgram, UnitId},
    error::LexError,
    table,
    tables::{ActionId, Automaton, StateId},
};

/// Result of running a backend until it stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome<At> {
    Matched(ActionId),
    /// Resume at `At` once the window has been refilled.
    NeedRefill(At),
}

impl<At> Outcome<At> {
    fn map_at<B>(self, f: impl FnOnce(At) -> B) -> Outcome<B> {
        match self {
            Outcome::Matched(a) => Outcome::Matched(a),
            Outcome::NeedRefill(at) => Outcome::NeedRefill(f(at)),
        }
    }
}

/// Where a suspended scan picks up again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResumePoint {
    /// Table-driven backend: the automaton state.
    State(StateId),
    /// Direct backend: the unit to re-enter.
    Unit(UnitId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    #[default]
    Table,
    Direct,
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, String> {
        match s.to_ascii_lowercase().as_str() {
            "table" | "tables" | "interp" => Ok(Backend::Table),
            "direct" | "units" => Ok(Backend::Direct),
            other => Err(format!("unknown backend {other:?} (expected table|direct)")),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Backend::Table => "table",
            Backend::Direct => "direct",
        })
    }
}

/// One finished match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub action: ActionId,
    pub span: Span,
    pub text: Vec<u8>,
}

impl Match {
    pub fn text_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.text)
    }
}

#[derive(Clone)]
enum Program {
    Table(Arc<Automaton>),
    Direct(Arc<DirectProgram>),
}

/// A backend bound to its entry point.
#[derive(Clone)]
pub struct Engine {
    program: Program,
    entry: ResumePoint,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("backend", &self.backend())
            .field("entry", &self.entry)
            .finish()
    }
}

impl Engine {
    pub fn table(dfa: Arc<Automaton>, entry: StateId) -> Result<Self, LexError> {
        dfa.check_entry(entry)?;
        Ok(Self {
            program: Program::Table(dfa),
            entry: ResumePoint::State(entry),
        })
    }

    /// Compiles the automaton into units up front.
    pub fn direct(dfa: &Automaton, entry: StateId) -> Result<Self, LexError> {
        dfa.check_entry(entry)?;
        let prog = DirectProgram::compile(dfa);
        let unit = prog
            .unit_of(entry)
            .ok_or_else(|| LexError::malformed(format!("no unit for entry state {entry}")))?;
        Ok(Self::from_program(Arc::new(prog), unit))
    }

    /// A prebuilt unit network, possibly shared between rules.
    pub fn from_program(prog: Arc<DirectProgram>, entry: UnitId) -> Self {
        Self {
            program: Program::Direct(prog),
            entry: ResumePoint::Unit(entry),
        }
    }

    pub fn with_backend(
        backend: Backend,
        dfa: Arc<Automaton>,
        entry: StateId,
    ) -> Result<Self, LexError> {
        match backend {
            Backend::Table => Self::table(dfa, entry),
            Backend::Direct => Self::direct(&dfa, entry),
        }
    }

    pub fn backend(&self) -> Backend {
        match self.program {
            Program::Table(_) => Backend::Table,
            Program::Direct(_) => Backend::Direct,
        }
    }

    pub fn entry(&self) -> ResumePoint {
        self.entry
    }

    /// Highest action index the program can report, when known.
    pub fn max_action(&self) -> Option<ActionId> {
        match &self.program {
            Program::Table(dfa) => dfa.max_action(),
            Program::Direct(prog) => prog.max_action(),
        }
    }

    /// Run the backend from `at` until it matches or runs dry.
    pub fn run(&self, win: &mut Window, at: ResumePoint) -> Result<Outcome<ResumePoint>, LexError> {
        match (&self.program, at) {
            (Program::Table(dfa), ResumePoint::State(s)) => {
                dfa.check_entry(s)?;
                Ok(table::run(dfa, win, s).map_at(ResumePoint::State))
            }
            (Program::Direct(prog), ResumePoint::Unit(u)) => {
                Ok(direct::run(prog, win, u)?.map_at(ResumePoint::Unit))
            }
            (_, at) => Err(LexError::malformed(format!(
                "{at:?} does not belong to a {} engine",
                self.backend()
            ))),
        }
    }

    /// Scan one lexeme with blocking refills and no action.
    pub fn next_match<S: RawSource>(&self, buf: &mut ScanBuffer<S>) -> Result<Match, LexError> {
        buf.window_mut().begin_lexeme();
        let mut at = self.entry;
        loop {
            match self.run(buf.window_mut(), at)? {
                Outcome::Matched(action) => {
                    let m = Match {
                        action,
                        span: buf.span(),
                        text: buf.lexeme().to_vec(),
                    };
                    buf.window_mut().begin_lexeme();
                    return Ok(m);
                }
                Outcome::NeedRefill(resume) => {
                    buf.refill_sync()?;
                    at = resume;
                }
            }
        }
    }
}
