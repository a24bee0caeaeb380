// src/lexer/tables/mod.rs
pub mod build;
pub mod compact;
pub mod dfa;
pub mod io;
pub mod tokens;

// Re-exports to keep the external API flat.
pub use build::AutomatonBuilder;
pub use compact::{encode_compact, load_compact_bytes, save_compact};
pub use io::{automaton_to_json, load_automaton_json_bytes, save_automaton_json};
pub use tokens::TokenKind;

use super::{
    buffer::{EOF_SYM, N_SYMS, Sym},
    error::LexError,
};

pub type StateId = u32;
pub type ActionId = u32;

/// One automaton state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum State {
    /// Consumes one symbol; `next` is indexed by symbol class.
    Dispatch { next: Box<[StateId]> },
    /// A finished match naming the action to run.
    Terminal { action: ActionId },
}

/// Immutable recognizer shared by every rule built from it.
///
/// Every symbol (256 bytes and `EOF_SYM`) maps to a class; the EOF class is
/// never shared with a byte. Edges into a terminal state do not consume the
/// symbol that selected them, which is what gives longest match: the
/// automaton only stops once the next symbol cannot extend the lexeme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Automaton {
    classes: [u16; N_SYMS],
    n_classes: u16,
    states: Vec<State>,
}

impl Automaton {
    /// Validates and wraps finished tables.
    pub fn new(classes: [u16; N_SYMS], states: Vec<State>) -> Result<Self, LexError> {
        if states.is_empty() {
            return Err(LexError::malformed("automaton has no states"));
        }
        if states.len() > StateId::MAX as usize {
            return Err(LexError::malformed(format!(
                "{} states do not fit a state id",
                states.len()
            )));
        }

        let n_classes = classes.iter().copied().max().unwrap_or(0) as usize + 1;
        if n_classes > N_SYMS {
            return Err(LexError::malformed(format!(
                "class ids must be dense; highest is {}",
                n_classes - 1
            )));
        }
        let eof_class = classes[EOF_SYM as usize];
        if let Some(b) = (0..256).find(|&b| classes[b] == eof_class) {
            return Err(LexError::malformed(format!(
                "byte 0x{b:02X} shares class {eof_class} with the EOF sentinel"
            )));
        }

        for (id, st) in states.iter().enumerate() {
            let next = match st {
                State::Dispatch { next } => next,
                State::Terminal { action } if *action == ActionId::MAX => {
                    return Err(LexError::malformed(format!(
                        "state {id} uses the reserved action id {action}"
                    )));
                }
                State::Terminal { .. } => continue,
            };
            if next.len() != n_classes {
                return Err(LexError::malformed(format!(
                    "state {id} has {} transitions, expected one per class ({n_classes})",
                    next.len()
                )));
            }
            if let Some((class, &to)) = next
                .iter()
                .enumerate()
                .find(|&(_, &to)| to as usize >= states.len())
            {
                return Err(LexError::malformed(format!(
                    "state {id} class {class} targets missing state {to}"
                )));
            }
            let on_eof = next[eof_class as usize];
            if !matches!(states[on_eof as usize], State::Terminal { .. }) {
                return Err(LexError::malformed(format!(
                    "state {id} continues to dispatch state {on_eof} after EOF"
                )));
            }
        }

        Ok(Self {
            classes,
            n_classes: n_classes as u16,
            states,
        })
    }

    /// One transition. Terminal states are absorbing.
    #[inline]
    pub fn step(&self, state: StateId, sym: Sym) -> StateId {
        match &self.states[state as usize] {
            State::Dispatch { next } => next[self.classes[sym as usize] as usize],
            State::Terminal { .. } => state,
        }
    }

    #[inline]
    pub fn class_of(&self, sym: Sym) -> u16 {
        self.classes[sym as usize]
    }

    pub fn eof_class(&self) -> u16 {
        self.classes[EOF_SYM as usize]
    }

    pub fn classes(&self) -> &[u16; N_SYMS] {
        &self.classes
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes as usize
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn state(&self, id: StateId) -> Option<&State> {
        self.states.get(id as usize)
    }

    /// Action of a terminal state, `None` for dispatch states.
    #[inline]
    pub fn action_of(&self, id: StateId) -> Option<ActionId> {
        match self.states.get(id as usize)? {
            State::Terminal { action } => Some(*action),
            State::Dispatch { .. } => None,
        }
    }

    /// Largest action index any terminal names.
    pub fn max_action(&self) -> Option<ActionId> {
        self.states
            .iter()
            .filter_map(|s| match s {
                State::Terminal { action } => Some(*action),
                State::Dispatch { .. } => None,
            })
            .max()
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub(crate) fn check_entry(&self, entry: StateId) -> Result<(), LexError> {
        if (entry as usize) < self.states.len() {
            Ok(())
        } else {
            Err(LexError::malformed(format!(
                "entry state {entry} out of range (0..{})",
                self.states.len()
            )))
        }
    }
}
