//! Tap system for revision extension points.
//!
//! Taps are named extension points around draft and version operations.
//! Handlers are called in weight order (lower = higher priority). Pre taps
//! can abort the operation they guard; post taps only observe.

mod dispatcher;
mod hooks;
mod registry;

pub use dispatcher::TapDispatcher;
pub use hooks::{PreCheck, RevisionTap, TapEvent};
pub use registry::{TapHandler, TapRegistry};
