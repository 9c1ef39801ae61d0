//! JSON test vector loader shared by the wire tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::fs;

use serde::de::DeserializeOwned;

/// Raw text of `tests/vectors/{name}`.
pub fn load_str(name: &str) -> String {
    fs::read_to_string(format!("tests/vectors/{name}"))
        .unwrap_or_else(|e| panic!("missing test vector {name}: {e}"))
}

/// Parse `tests/vectors/{name}` into `T`.
pub fn load<T: DeserializeOwned>(name: &str) -> T {
    serde_json::from_str(&load_str(name)).expect("vector must parse")
}
