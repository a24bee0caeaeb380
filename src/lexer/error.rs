// src/lexer/error.rs
use thiserror::Error;

/// Everything a rule invocation can fail with.
///
/// Unmatched input is deliberately absent: it is reported through the
/// automaton's catch-all terminal like any other action.
#[derive(Debug, Error)]
pub enum LexError {
    /// The automaton (or its action table) is inconsistent. This is a bug in
    /// whatever produced the tables, never a runtime condition.
    #[error("malformed automaton: {reason}")]
    MalformedAutomaton { reason: String },

    /// The raw-input source failed while refilling the scan buffer.
    #[error("raw input source failed")]
    RawInput(#[source] anyhow::Error),

    /// A user action failed.
    #[error("action failed")]
    Action(#[source] anyhow::Error),

    /// Serialized tables could not be decoded.
    #[error("bad table encoding: {reason}")]
    TableFormat { reason: String },
}

impl LexError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedAutomaton {
            reason: reason.into(),
        }
    }

    pub(crate) fn table_format(reason: impl Into<String>) -> Self {
        Self::TableFormat {
            reason: reason.into(),
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::MalformedAutomaton { .. })
    }

    pub fn is_raw_input(&self) -> bool {
        matches!(self, Self::RawInput(_))
    }
}
