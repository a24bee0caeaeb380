// src/dev/mod.rs
// Helpers shared by the fuzzer and the integration tests.
pub mod generator;
pub mod harness;
