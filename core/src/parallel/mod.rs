//! parallel/mod.rs
//! Multi-threaded block compression over pooled shared buffers.
//!
//! The reader cuts input into pooled blocks, workers compress each into a
//! `SharedWindowBuffer`, and the ordered writer emits them in sequence.

pub mod parallelism;
pub mod job;
pub mod worker;
pub mod writer;
pub mod pipeline;

pub use parallelism::*;
pub use job::*;
pub use worker::*;
pub use writer::*;
pub use pipeline::*;
