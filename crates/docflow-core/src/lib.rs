//! Core types and trait definitions for the docflow approval lifecycle.
//!
//! This crate is deliberately free of async runtime and database
//! dependencies. The engine, store, and HTTP crates all build on it.

pub mod document;
pub mod error;
pub mod number;
pub mod outcome;
pub mod store;
pub mod transition;

pub use error::{Error, Result};
