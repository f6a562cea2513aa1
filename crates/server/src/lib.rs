//! Store Ratings server library.
//!
//! Accounts, session tokens and the rating ledger behind a JSON API. The
//! binary wires these modules to `PostgreSQL`; tests drive the same router
//! against [`db::MemoryStore`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
