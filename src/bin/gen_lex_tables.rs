// src/bin/gen_lex_tables.rs
// Write the sample grammar's automaton as JSON and compact binary, then load
// both back to make sure they decode to the same tables.

use std::{fs, path::PathBuf};

use anyhow::{Result, ensure};
use resumable_lex::lexer::tables::{
    dfa::sample_automaton, encode_compact, load_automaton_json_bytes, load_compact_bytes,
    save_automaton_json, save_compact,
};

fn main() -> Result<()> {
    let out_dir = PathBuf::from(std::env::var("TABLES_DIR").unwrap_or_else(|_| "tables".into()));
    fs::create_dir_all(&out_dir)?;

    println!("[gen_tables] building sample automaton...");
    let dfa = sample_automaton()?;
    println!(
        "[gen_tables] {} states, {} symbol classes",
        dfa.len(),
        dfa.n_classes()
    );

    let json_path = out_dir.join("sample.json");
    save_automaton_json(&json_path, &dfa)?;
    let bin_path = out_dir.join("sample.bin");
    save_compact(&bin_path, &dfa)?;

    let from_json = load_automaton_json_bytes(&fs::read(&json_path)?)?;
    let from_bin = load_compact_bytes(&fs::read(&bin_path)?)?;
    ensure!(from_json == dfa, "JSON tables do not reload identically");
    ensure!(from_bin == dfa, "binary tables do not reload identically");

    let bytes = encode_compact(&dfa).len();
    println!(
        "[gen_tables] wrote {} and {} ({} bytes, ~{:.1} KiB binary)",
        json_path.display(),
        bin_path.display(),
        bytes,
        bytes as f64 / 1024.0
    );
    Ok(())
}
