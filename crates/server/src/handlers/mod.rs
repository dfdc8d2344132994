//! HTTP request handlers.

pub mod account;
pub mod aliases;

pub use account::*;
pub use aliases::*;
