//! Database models split into domain-specific modules.

pub mod account;
pub mod branch;
pub mod common;

pub use account::*;
pub use branch::*;
pub use common::*;
