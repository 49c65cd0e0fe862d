//! Background services for FolderDock.
//!
//! Each service does its blocking or asynchronous work elsewhere and posts
//! a `UiEvent` back to the interactive thread.
//!
//! - `apps` - catalog scans and source watching
//! - `launch` - launch acknowledgements with a bounded wait

pub mod apps;
pub mod launch;
