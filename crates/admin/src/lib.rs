//! NeonFlake admin dashboard library.
//!
//! Server-rendered pages for customers, products, orders, content pages,
//! and reports, backed by a hosted backend (REST data API, auth API, and
//! object storage). The binary in `main.rs` wires this into an HTTP server;
//! everything else lives here so it can be tested.
//!
//! # Security
//!
//! The backend session grants full read and write access to store data.
//! Row-level security on the backend is the real boundary; this crate only
//! gates pages behind a signed-in administrator.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod components;
pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
