//! End-to-end integration tests for the CAS ticket core.
//!
//! The tests live under `tests/`; this library target is empty.
