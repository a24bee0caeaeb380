// src/dev/generator.rs
// Random sources for the sample grammar, and random ways to chunk them.

use rand::Rng;

/// At least `target_len` bytes of input the sample grammar lexes without
/// any `Unmatched` token.
pub fn gen_valid_source<R: Rng>(rng: &mut R, target_len: usize) -> String {
    let mut out = String::with_capacity(target_len + target_len / 8);

    while out.len() < target_len {
        let roll = rng.random_range(0u32..100);

        match roll {
            0..=21 => push_ident(rng, &mut out),          // ~22%
            22..=24 => push_keyword(rng, &mut out),       // ~3%
            25..=39 => push_int(rng, &mut out),           // ~15%
            40..=54 => push_ws(rng, &mut out),            // ~15%
            55..=61 => push_line_comment(rng, &mut out),  // ~7%
            62..=70 => push_block_comment(rng, &mut out), // ~9%
            _ => push_operator(rng, &mut out),            // ~29%
        }
    }

    // Trailer so the last token never glues onto a comment opener.
    out.push(' ');
    out.push('0');
    out.push('\n');

    out
}

/// Like `gen_valid_source`, with stray bytes sprinkled in at `rate`.
pub fn gen_noisy_source<R: Rng>(rng: &mut R, target_len: usize, rate: f64) -> Vec<u8> {
    let clean = gen_valid_source(rng, target_len);
    let mut out = Vec::with_capacity(clean.len() + clean.len() / 16);
    for b in clean.into_bytes() {
        if rng.random_bool(rate) {
            out.push(*pick(rng, b"#$@`~\\\"'%^?\x00\x7f\xff"));
        }
        out.push(b);
    }
    out
}

/// Sorted cut offsets splitting `len` bytes into at most `max_pieces`
/// chunks. Repeated offsets (empty non-final chunks) are allowed on purpose.
pub fn random_cuts<R: Rng>(rng: &mut R, len: usize, max_pieces: usize) -> Vec<usize> {
    let n = rng.random_range(0..max_pieces.max(1));
    let mut cuts: Vec<usize> = (0..n).map(|_| rng.random_range(0..=len)).collect();
    cuts.sort_unstable();
    cuts
}

fn pick<'a, R: Rng, T>(rng: &mut R, set: &'a [T]) -> &'a T {
    &set[rng.random_range(0..set.len())]
}

fn push_ident<R: Rng>(rng: &mut R, out: &mut String) {
    let len = rng.random_range(1..=12);
    out.push(random_alpha(rng));
    for _ in 1..len {
        if rng.random_bool(0.6) {
            out.push(random_alpha(rng));
        } else {
            out.push(random_digit(rng));
        }
    }
}

fn push_keyword<R: Rng>(rng: &mut R, out: &mut String) {
    out.push_str(*pick(rng, &["if", "iff", "i", "if0"]));
    out.push(' ');
}

fn push_int<R: Rng>(rng: &mut R, out: &mut String) {
    let len = rng.random_range(1..=8);
    for _ in 0..len {
        out.push(random_digit(rng));
    }
}

fn push_ws<R: Rng>(rng: &mut R, out: &mut String) {
    let len = rng.random_range(1..=8);
    for _ in 0..len {
        out.push(*pick(rng, &[' ', '\t', '\r', '\n']));
    }
}

fn push_line_comment<R: Rng>(rng: &mut R, out: &mut String) {
    out.push_str("//");
    let len = rng.random_range(0..=40);
    const ALPH: &[u8] =
        b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789 +-*/&|![]{}()<>=*";
    for _ in 0..len {
        out.push(*pick(rng, ALPH) as char);
    }
    out.push('\n');
}

fn push_block_comment<R: Rng>(rng: &mut R, out: &mut String) {
    out.push_str("/*");
    let chunks = rng.random_range(0..=15);
    const BODY: &[u8] =
        b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789 +-![]{}()<>=&|";
    for _ in 0..chunks {
        let k = rng.random_range(1..=8);
        for _ in 0..k {
            out.push(*pick(rng, BODY) as char);
        }
        if rng.random_bool(0.2) {
            out.push('*');
        }
        if rng.random_bool(0.2) {
            out.push('\n');
        }
    }
    out.push_str("*/");
}

fn push_operator<R: Rng>(rng: &mut R, out: &mut String) {
    let ops = [
        "(", ")", "+", "-", "*", "=", "/", "!", "!=", "[", "]", "{", "}", "<", "<=", ">", ">=",
        "==", "&", "&&", "|", "||",
    ];
    let op = *pick(rng, &ops);
    out.push_str(op);
    // A lone slash must not start a comment with whatever follows.
    if op == "/" || rng.random_bool(0.25) {
        out.push(' ');
    }
}

fn random_alpha<R: Rng>(rng: &mut R) -> char {
    *pick(rng, b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ_") as char
}

fn random_digit<R: Rng>(rng: &mut R) -> char {
    *pick(rng, b"0123456789") as char
}
