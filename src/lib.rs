//! The construction context of a template language runtime: a stack of frames that may
//! branch into a tree, layered keep caches, and the resolution of inheritance statements.

pub mod cache;
pub mod context;
pub mod definition;
pub mod fmt;
pub mod host;
pub mod runtime;
pub mod signal;
pub mod symbol;
pub mod term;
pub mod value;
#[cfg(test)]
mod tests;

pub use context::Context;
pub use definition::{Builder, DefId, Source, Table};
pub use runtime::{Runtime, Settings};
pub use signal::{Redirection, Signal, Threshold};
pub use value::Value;
