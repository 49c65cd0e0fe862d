//! User-facing panels.
//!
//! - `dock` - the pinned app launcher

pub mod dock;
