//! Tests for runner services
//!
//! The provider adapters are exercised over HTTP in `runner/tests/`; these
//! cover the CSV input and output services.

pub mod csv_source;
