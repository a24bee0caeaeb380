// src/lexer/table.rs
// Table-driven backend: one interpreter loop shared by every rule.

use super::{
    buffer::{NeedRefill, Window},
    engine::Outcome,
    tables::{Automaton, State, StateId},
};

/// Run `dfa` from `from` until a terminal state is reached or the window
/// runs dry.
///
/// The edge into a terminal state does not consume its symbol, so the
/// window's cursor ends exactly past the lexeme. `NeedRefill(state)` is the
/// only suspension exit; `state` is the very state the loop would have
/// continued with, and nothing has been consumed for it yet.
pub fn run(dfa: &Automaton, win: &mut Window, from: StateId) -> Outcome<StateId> {
    let states = dfa.states();
    let mut state = from;
    loop {
        let next = match &states[state as usize] {
            State::Terminal { action } => return Outcome::Matched(*action),
            State::Dispatch { next } => next,
        };
        let sym = match win.peek() {
            Ok(sym) => sym,
            Err(NeedRefill) => return Outcome::NeedRefill(state),
        };
        let to = next[dfa.class_of(sym) as usize];
        if let State::Dispatch { .. } = states[to as usize] {
            win.advance();
        }
        state = to;
    }
}
