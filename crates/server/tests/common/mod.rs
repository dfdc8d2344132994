//! Common test utilities and fixtures.

pub mod server;
pub mod sso;

#[allow(unused_imports)]
pub use server::*;
#[allow(unused_imports)]
pub use sso::*;
