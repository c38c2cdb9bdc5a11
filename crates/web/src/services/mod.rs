//! Business logic services for the marketplace.
//!
//! # Services
//!
//! - `auth` - Email/password authentication with Argon2id
//! - `email` - Partnership notification delivery via SMTP
//! - `payments` - HTTP client for the payments service
//! - `storage` - Filesystem media store for avatar uploads

pub mod auth;
pub mod email;
pub mod payments;
pub mod storage;

pub use auth::{AuthError, AuthService};
pub use email::{EmailError, EmailService, PartnershipNotification};
pub use payments::{PaymentsClient, PaymentsError, PayoutSession};
pub use storage::{MediaError, MediaStore};
