//! Idea-HUB Core - Shared types library.
//!
//! This crate provides common types used across all Idea-HUB components:
//! - `web` - Public marketplace site (feed, profiles, dashboards)
//! - `payments` - Stripe checkout/webhook service
//! - `cli` - Command-line tools for migrations and seeding
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, money, emails, usernames,
//!   and domain enums

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
