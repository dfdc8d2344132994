//! Core domain types and shared logic for shortlink.
//!
//! This crate defines the data model used across all other crates:
//! - Aliases, target URLs and alias records
//! - Random alias generation
//! - Caller identities and privilege decisions
//! - Shared configuration

pub mod alias;
pub mod config;
pub mod error;
pub mod identity;

pub use alias::{ALIAS_CHARSET, Alias, AliasGenerator, AliasRecord, MAX_ALIAS_LEN, TargetUrl};
pub use error::{Error, Result};
pub use identity::{CallerIdentity, Privilege, PrivilegeDecision, UserId};
