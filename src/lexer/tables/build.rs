// src/lexer/tables/build.rs
// Assembles an Automaton from per-symbol edges and derives the byte classes.

use std::ops::RangeInclusive;

use hashbrown::HashMap;

use super::{ActionId, Automaton, State, StateId};
use crate::lexer::{
    buffer::{EOF_SYM, N_SYMS, Sym},
    error::LexError,
};

enum Draft {
    Dispatch(Box<[Option<StateId>; N_SYMS]>),
    Terminal(ActionId),
}

#[derive(Clone, Copy)]
struct CatchAll {
    swallow: StateId,
    fallback: StateId,
    action: ActionId,
}

/// Edge-by-edge automaton construction.
///
/// The first edge set for a (state, symbol) pair wins; later calls only fill
/// symbols that are still unset. Declaring the higher-priority pattern first
/// is therefore how ties between overlapping rules are broken.
#[derive(Default)]
pub struct AutomatonBuilder {
    states: Vec<Draft>,
    catch_all: Option<ActionId>,
    errors: Vec<String>,
}

impl AutomatonBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A new dispatch state with no edges yet.
    pub fn dispatch(&mut self) -> StateId {
        self.states.push(Draft::Dispatch(Box::new([None; N_SYMS])));
        (self.states.len() - 1) as StateId
    }

    /// A new terminal state running `action`.
    pub fn terminal(&mut self, action: ActionId) -> StateId {
        self.states.push(Draft::Terminal(action));
        (self.states.len() - 1) as StateId
    }

    pub fn on(&mut self, from: StateId, bytes: &[u8], to: StateId) -> &mut Self {
        for &b in bytes {
            self.set(from, b as Sym, to);
        }
        self
    }

    pub fn on_range(&mut self, from: StateId, range: RangeInclusive<u8>, to: StateId) -> &mut Self {
        for b in range {
            self.set(from, b as Sym, to);
        }
        self
    }

    pub fn on_eof(&mut self, from: StateId, to: StateId) -> &mut Self {
        self.set(from, EOF_SYM, to);
        self
    }

    /// Every symbol of `from` not set so far, EOF included.
    pub fn otherwise(&mut self, from: StateId, to: StateId) -> &mut Self {
        for sym in 0..N_SYMS as Sym {
            self.set(from, sym, to);
        }
        self
    }

    /// Route every edge still unset at build time to the unmatched-input
    /// rule running `action`. An unset byte edge consumes that byte first,
    /// through a dispatch state appended after the user's states, so the
    /// reported lexeme is never empty; an unset EOF edge goes straight to the
    /// terminal appended after it.
    pub fn catch_all(&mut self, action: ActionId) -> &mut Self {
        self.catch_all = Some(action);
        self
    }

    fn set(&mut self, from: StateId, sym: Sym, to: StateId) {
        match self.states.get_mut(from as usize) {
            Some(Draft::Dispatch(edges)) => {
                let slot = &mut edges[sym as usize];
                if slot.is_none() {
                    *slot = Some(to);
                }
            }
            Some(Draft::Terminal(_)) => self
                .errors
                .push(format!("edge out of terminal state {from}")),
            None => self.errors.push(format!("edge out of unknown state {from}")),
        }
    }

    pub fn build(&self) -> Result<Automaton, LexError> {
        if let Some(e) = self.errors.first() {
            return Err(LexError::malformed(e.clone()));
        }

        // The catch-all pair is appended past the user's states: `swallow`
        // consumes the offending byte, then every edge leads to `fallback`.
        let n_user = self.states.len();
        let catch_all = self.catch_all.map(|action| CatchAll {
            swallow: n_user as StateId,
            fallback: n_user as StateId + 1,
            action,
        });
        let mut dispatch_ids: Vec<usize> = self
            .states
            .iter()
            .enumerate()
            .filter(|(_, d)| matches!(d, Draft::Dispatch(_)))
            .map(|(i, _)| i)
            .collect();
        if catch_all.is_some() {
            dispatch_ids.push(n_user);
        }

        let edge = |id: usize, sym: usize| -> Result<StateId, LexError> {
            let edges = match self.states.get(id) {
                Some(Draft::Dispatch(edges)) => edges,
                // The appended swallow state: every edge reports.
                _ => {
                    return catch_all
                        .map(|c| c.fallback)
                        .ok_or_else(|| LexError::malformed(format!("no dispatch state {id}")));
                }
            };
            match (edges[sym], catch_all) {
                (Some(to), _) => Ok(to),
                (None, Some(c)) if sym == EOF_SYM as usize => Ok(c.fallback),
                (None, Some(c)) => Ok(c.swallow),
                (None, None) => Err(LexError::malformed(format!(
                    "state {id} has no transition on {}",
                    describe_sym(sym as Sym)
                ))),
            }
        };

        // Intern identical columns (same target from every dispatch state)
        // as one class. EOF always gets a class of its own.
        let mut columns: HashMap<Vec<StateId>, u16> = HashMap::new();
        let mut representative: Vec<usize> = Vec::new();
        let mut classes = [0u16; N_SYMS];
        for sym in 0..N_SYMS {
            let column = dispatch_ids
                .iter()
                .map(|&id| edge(id, sym))
                .collect::<Result<Vec<_>, _>>()?;
            if sym == EOF_SYM as usize {
                classes[sym] = representative.len() as u16;
                representative.push(sym);
                continue;
            }
            let fresh = representative.len() as u16;
            let class = *columns.entry(column).or_insert(fresh);
            if class == fresh {
                representative.push(sym);
            }
            classes[sym] = class;
        }

        let row = |id: usize| -> Result<State, LexError> {
            Ok(State::Dispatch {
                next: representative
                    .iter()
                    .map(|&sym| edge(id, sym))
                    .collect::<Result<Box<[_]>, _>>()?,
            })
        };
        let mut states = Vec::with_capacity(n_user + 2);
        for (id, draft) in self.states.iter().enumerate() {
            states.push(match draft {
                Draft::Terminal(action) => State::Terminal { action: *action },
                Draft::Dispatch(_) => row(id)?,
            });
        }
        if let Some(c) = catch_all {
            states.push(row(n_user)?);
            states.push(State::Terminal { action: c.action });
        }

        log::debug!(
            "built automaton: {} states, {} symbol classes",
            states.len(),
            representative.len()
        );
        Automaton::new(classes, states)
    }
}

fn describe_sym(sym: Sym) -> String {
    if sym == EOF_SYM {
        "EOF".to_string()
    } else if (sym as u8).is_ascii_graphic() {
        format!("{:?}", sym as u8 as char)
    } else {
        format!("0x{sym:02X}")
    }
}
