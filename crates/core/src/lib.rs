//! NeonFlake Core - shared types and client-side logic.
//!
//! This crate is used by:
//! - `admin` - the administrative dashboard binary
//! - `cli` - operational commands (user creation, content seeding)
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no async. Everything here can be unit tested without a backend.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, emails, prices, and status enums
//! - [`listing`] - Filter, sort, and paginate an in-memory collection
//! - [`normalize`] - Per-field input normalization
//! - [`form`] - Field-level validation errors
//! - [`time`] - IST display of timestamps

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod form;
pub mod listing;
pub mod normalize;
pub mod time;
pub mod types;

pub use types::*;
