//! DNS wire protocol support.
//!
//! Covers exactly the subset this responder needs: one uncompressed
//! question in, at most one answer out.

pub mod enums;
pub mod wire;

pub use enums::RecordType;
pub use wire::{Question, WireError};
