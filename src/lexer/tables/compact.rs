// src/lexer/tables/compact.rs
// Compact little-endian encoding of an Automaton:
//   magic: 8 bytes  = "RLXDFA01"
//   u32:   n_states
//   u32:   n_classes
//   u16:   classes[257]              // byte 0..=255, then EOF
//   per state:
//     u32: tag                       // DISPATCH_TAG, else the terminal's action
//     u32: next[n_classes]           // dispatch states only

use std::{
    io::{BufWriter, Write},
    path::Path,
    time::Instant,
};

use super::{Automaton, State};
use crate::lexer::{buffer::N_SYMS, error::LexError};

const MAGIC: &[u8; 8] = b"RLXDFA01";
const DISPATCH_TAG: u32 = u32::MAX;

#[inline]
fn take_u32(buf: &mut &[u8]) -> Result<u32, LexError> {
    if buf.len() < 4 {
        return Err(LexError::table_format("truncated u32"));
    }
    let mut le = [0u8; 4];
    le.copy_from_slice(&buf[..4]);
    *buf = &buf[4..];
    Ok(u32::from_le_bytes(le))
}

#[inline]
fn take_u16(buf: &mut &[u8]) -> Result<u16, LexError> {
    if buf.len() < 2 {
        return Err(LexError::table_format("truncated u16"));
    }
    let mut le = [0u8; 2];
    le.copy_from_slice(&buf[..2]);
    *buf = &buf[2..];
    Ok(u16::from_le_bytes(le))
}

pub fn encode_compact(a: &Automaton) -> Vec<u8> {
    let dispatch = a
        .states()
        .iter()
        .filter(|s| matches!(s, State::Dispatch { .. }))
        .count();
    let mut out =
        Vec::with_capacity(16 + N_SYMS * 2 + a.len() * 4 + dispatch * a.n_classes() * 4);

    out.extend_from_slice(MAGIC);
    out.extend_from_slice(&(a.len() as u32).to_le_bytes());
    out.extend_from_slice(&(a.n_classes() as u32).to_le_bytes());
    for &c in a.classes() {
        out.extend_from_slice(&c.to_le_bytes());
    }
    for s in a.states() {
        match s {
            State::Dispatch { next } => {
                out.extend_from_slice(&DISPATCH_TAG.to_le_bytes());
                for &to in next.iter() {
                    out.extend_from_slice(&to.to_le_bytes());
                }
            }
            State::Terminal { action } => out.extend_from_slice(&action.to_le_bytes()),
        }
    }
    out
}

pub fn save_compact(path: &Path, a: &Automaton) -> std::io::Result<()> {
    let instant = Instant::now();
    let bytes = encode_compact(a);
    let f = std::fs::File::create(path)?;
    let mut w = BufWriter::new(f);
    w.write_all(&bytes)?;
    let flush = w.flush();
    log::debug!(
        "saved {} bytes of tables to {} in {} ms",
        bytes.len(),
        path.display(),
        instant.elapsed().as_millis()
    );
    flush
}

pub fn load_compact_bytes(mut data: &[u8]) -> Result<Automaton, LexError> {
    if data.len() < 8 + 4 + 4 {
        return Err(LexError::table_format("compact tables too short"));
    }
    if &data[..8] != MAGIC {
        return Err(LexError::table_format("bad magic in compact tables"));
    }
    data = &data[8..];

    let n_states = take_u32(&mut data)? as usize;
    let n_classes = take_u32(&mut data)? as usize;

    let mut classes = [0u16; N_SYMS];
    for c in classes.iter_mut() {
        *c = take_u16(&mut data)?;
    }

    // Every state needs at least its tag; refuse absurd counts before allocating.
    if data.len() / 4 < n_states {
        return Err(LexError::table_format(format!(
            "{n_states} states cannot fit in {} remaining bytes",
            data.len()
        )));
    }
    let mut states = Vec::with_capacity(n_states);
    for _ in 0..n_states {
        let tag = take_u32(&mut data)?;
        if tag != DISPATCH_TAG {
            states.push(State::Terminal { action: tag });
            continue;
        }
        let mut next = Vec::with_capacity(n_classes.min(data.len() / 4));
        for _ in 0..n_classes {
            next.push(take_u32(&mut data)?);
        }
        states.push(State::Dispatch { next: next.into() });
    }
    if !data.is_empty() {
        return Err(LexError::table_format(format!(
            "{} trailing bytes after compact tables",
            data.len()
        )));
    }

    Automaton::new(classes, states)
}
