//! Store Ratings Core - Shared types library.
//!
//! This crate provides common types used across all Store Ratings components:
//! - `server` - JSON API for registration, login, ratings and administration
//! - `cli` - Command-line tools for migrations and admin bootstrap
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP. Field validation lives here so the server and the CLI apply
//! exactly the same rules.
//!
//! # Modules
//!
//! - [`types`] - Newtype ids, emails, roles and rating values
//! - [`validation`] - Name, address and password policy checks

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;
pub mod validation;

pub use types::*;
pub use validation::{
    PasswordError, ValidationError, is_valid_password, validate_address, validate_email,
    validate_name, validate_password,
};
