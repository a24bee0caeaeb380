// src/lexer/tables/io.rs
use std::{
    io::{BufWriter, Write},
    path::Path,
};

use serde::{Deserialize, Serialize};
use serde_with::serde_as;

use super::{ActionId, Automaton, State, StateId};
use crate::lexer::{buffer::N_SYMS, error::LexError};

// -------------------- JSON (de)serialization --------------------

#[serde_as]
#[derive(Serialize, Deserialize)]
struct AutomatonDisk {
    #[serde_as(as = "[_; 257]")]
    classes: [u16; N_SYMS],
    states: Vec<StateDisk>,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum StateDisk {
    Dispatch(Vec<StateId>),
    Terminal(ActionId),
}

impl From<&Automaton> for AutomatonDisk {
    fn from(a: &Automaton) -> Self {
        Self {
            classes: *a.classes(),
            states: a
                .states()
                .iter()
                .map(|s| match s {
                    State::Dispatch { next } => StateDisk::Dispatch(next.to_vec()),
                    State::Terminal { action } => StateDisk::Terminal(*action),
                })
                .collect(),
        }
    }
}

impl AutomatonDisk {
    fn into_automaton(self) -> Result<Automaton, LexError> {
        let states = self
            .states
            .into_iter()
            .map(|s| match s {
                StateDisk::Dispatch(next) => State::Dispatch { next: next.into() },
                StateDisk::Terminal(action) => State::Terminal { action },
            })
            .collect();
        Automaton::new(self.classes, states)
    }
}

pub fn save_automaton_json(path: &Path, a: &Automaton) -> std::io::Result<()> {
    let f = std::fs::File::create(path)?;
    let mut w = BufWriter::new(f);
    serde_json::to_writer(&mut w, &AutomatonDisk::from(a))?;
    w.flush()
}

pub fn automaton_to_json(a: &Automaton) -> Result<String, LexError> {
    serde_json::to_string(&AutomatonDisk::from(a))
        .map_err(|e| LexError::table_format(format!("failed to encode tables JSON: {e}")))
}

/// Decodes and validates; a structurally valid JSON document describing an
/// inconsistent automaton is `MalformedAutomaton`, not `TableFormat`.
pub fn load_automaton_json_bytes(data: &[u8]) -> Result<Automaton, LexError> {
    serde_json::from_slice::<AutomatonDisk>(data)
        .map_err(|e| LexError::table_format(format!("failed to parse tables JSON: {e}")))?
        .into_automaton()
}
