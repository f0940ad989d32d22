//! Byte-level input and output: compression detection and the line store.

pub mod compression;
pub mod line_store;

pub use line_store::LineStore;
