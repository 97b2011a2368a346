//! # Auth Module
//!
//! This module handles the session lifecycle:
//! - Password hashing and verification
//! - Signed access, refresh and OAuth state tokens
//! - Password and Google sign-in, refresh with rotation
//! - AuthedUser extractor for protected routes

pub mod cookies;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod oauth;
pub mod password;
pub mod refresh;
pub mod routes;
pub mod session;
pub mod tokens;


pub use extractors::AuthedUser;
pub use routes::auth_routes;
