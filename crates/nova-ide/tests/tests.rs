// Integration test harness for `nova-ide`.
//
// Keep integration tests as submodules of this harness (under `tests/suite/`) rather than adding
// new top-level `tests/*.rs` files, which would compile as additional test binaries.
mod suite;
