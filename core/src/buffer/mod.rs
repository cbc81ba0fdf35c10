//! buffer/mod.rs
//! Pooled window buffers.
//!
//! - `BufferPool` / `BlockPool`: where blocks come from and go back to.
//! - `WindowBuffer`: one leased block with read/write cursors.
//! - `SharedWindowBuffer`: the same buffer behind counted handles, for moving
//!   filled output between threads without copying.

pub mod types;
pub mod pool;
pub mod window;
pub mod shared;

pub use types::*;
pub use pool::*;
pub use window::*;
pub use shared::*;
