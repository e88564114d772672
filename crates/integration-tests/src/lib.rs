//! Cross-crate flow tests for Nestboard live in `tests/`; this crate has
//! no library code of its own.
