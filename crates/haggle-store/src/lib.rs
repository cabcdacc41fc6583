//! # haggle-store
//!
//! In-memory implementation of the conversation store adapter. The production
//! deployment substitutes whatever persistence the platform runs on; this
//! implementation is the reference for the ordering contract and backs the
//! test suite and the development binary.

mod memory;

pub use memory::MemoryStore;
