//! Core types for Idea-HUB.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod money;
pub mod status;
pub mod username;

pub use email::{Email, EmailError};
pub use id::*;
pub use money::{Cents, IDEA_PRICE, PARTNERSHIP_FEE, PLATFORM_FEE_PERCENT};
pub use status::*;
pub use username::{Username, UsernameError};
