// src/lexer/direct.rs
// Direct backend: every dispatch state becomes its own unit, and units hand
// control straight to each other without going back through the tables.

use std::fmt;

use super::{
    buffer::{N_SYMS, NeedRefill, Sym, Window},
    engine::Outcome,
    error::LexError,
    tables::{ActionId, Automaton, State, StateId},
};

pub type UnitId = u32;

/// What a unit tells the entry wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transfer {
    /// Symbol consumed; run `UnitId` next.
    Continue(UnitId),
    /// The window ran dry before this unit could read; resume at `UnitId`.
    NeedRefillAt(UnitId),
    /// Match finished; the deciding symbol was not consumed.
    Done(ActionId),
}

/// A compiled state. Contract: it advances the window exactly when it
/// returns `Continue`.
pub type Unit = Box<dyn Fn(&mut Window) -> Transfer + Send + Sync>;

/// The unit network for one automaton.
pub struct DirectProgram {
    units: Vec<Unit>,
    max_action: Option<ActionId>,
}

impl fmt::Debug for DirectProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectProgram")
            .field("units", &self.units.len())
            .field("max_action", &self.max_action)
            .finish()
    }
}

impl DirectProgram {
    /// One unit per automaton state, so `unit_of(state) == state`. Edges are
    /// resolved here: an edge into a terminal becomes `Done(action)` and
    /// never visits the terminal's unit. Terminal units exist only so a rule
    /// may enter at a terminal state.
    pub fn compile(dfa: &Automaton) -> Self {
        let states = dfa.states();
        let units = states
            .iter()
            .enumerate()
            .map(|(id, st)| match st {
                State::Terminal { action } => {
                    let action = *action;
                    Box::new(move |_: &mut Window| Transfer::Done(action)) as Unit
                }
                State::Dispatch { next } => compile_dispatch(dfa, id as UnitId, next),
            })
            .collect();
        Self {
            units,
            max_action: dfa.max_action(),
        }
    }

    /// Hand-written units, for example emitted by a code generator. Unit ids
    /// are positions in `units`; targets are checked as they are taken.
    pub fn from_units(units: Vec<Unit>) -> Result<Self, LexError> {
        if units.is_empty() {
            return Err(LexError::malformed("direct program has no units"));
        }
        Ok(Self {
            units,
            max_action: None,
        })
    }

    pub fn unit_of(&self, state: StateId) -> Option<UnitId> {
        ((state as usize) < self.units.len()).then_some(state)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Highest action a compiled program can report; unknown for
    /// hand-written units.
    pub fn max_action(&self) -> Option<ActionId> {
        self.max_action
    }
}

/// Runs of consecutive symbols sharing one transfer: `(last_sym, transfer)`,
/// sorted by `last_sym`, covering `0..=EOF_SYM`.
fn compile_dispatch(dfa: &Automaton, me: UnitId, next: &[StateId]) -> Unit {
    let resolve = |sym: Sym| -> Transfer {
        let to = next[dfa.class_of(sym) as usize];
        match dfa.action_of(to) {
            Some(action) => Transfer::Done(action),
            None => Transfer::Continue(to),
        }
    };

    let mut runs: Vec<(Sym, Transfer)> = Vec::new();
    for sym in 0..N_SYMS as Sym {
        let t = resolve(sym);
        match runs.last_mut() {
            Some((last, prev)) if *prev == t => *last = sym,
            _ => runs.push((sym, t)),
        }
    }

    match runs.as_slice() {
        [(_, only)] => {
            let only = *only;
            Box::new(move |w: &mut Window| {
                if w.peek() == Err(NeedRefill) {
                    return Transfer::NeedRefillAt(me);
                }
                if let Transfer::Continue(_) = only {
                    w.advance();
                }
                only
            })
        }
        _ => {
            let runs = runs.into_boxed_slice();
            Box::new(move |w: &mut Window| {
                let sym = match w.peek() {
                    Ok(sym) => sym,
                    Err(NeedRefill) => return Transfer::NeedRefillAt(me),
                };
                let t = runs[runs.partition_point(|&(last, _)| last < sym)].1;
                if let Transfer::Continue(_) = t {
                    w.advance();
                }
                t
            })
        }
    }
}

/// The rule's entry wrapper: trampolines between units so the stack never
/// grows with the lexeme, and is the one place a `NeedRefillAt` surfaces.
pub fn run(
    prog: &DirectProgram,
    win: &mut Window,
    from: UnitId,
) -> Result<Outcome<UnitId>, LexError> {
    let mut unit = from;
    loop {
        let Some(f) = prog.units.get(unit as usize) else {
            return Err(LexError::malformed(format!(
                "transfer to missing unit {unit} (program has {})",
                prog.units.len()
            )));
        };
        match f(win) {
            Transfer::Continue(next) => unit = next,
            Transfer::NeedRefillAt(at) => return Ok(Outcome::NeedRefill(at)),
            Transfer::Done(action) => return Ok(Outcome::Matched(action)),
        }
    }
}
