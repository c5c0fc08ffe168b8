//! Library wrapper around the `nova` CLI implementation.
//!
//! The binary crate root (`main.rs`) is compiled as a module here so that
//! `cargo test -p nova-cli --lib` typechecks the CLI without building the
//! binary test suite.
//!
//! Note: `fn main()` inside `main.rs` is just another function when compiled as a module.

#[allow(dead_code)]
#[path = "main.rs"]
mod main_bin;
