#![doc = include_str!("../README.md")]
#![warn(missing_docs, missing_debug_implementations)]
extern crate alloc;
mod builder;
mod concurrent;
mod error;
mod event;
mod host;
mod stamp;
mod template;
mod thread_local;

pub use builder::{LocalPoolBuilder, PoolBuilder};
pub use concurrent::*;
pub use error::*;
pub use event::*;
pub use host::*;
pub use stamp::PoolId;
pub use template::*;
pub use thread_local::*;
