//! Wicket Backend Library
//!
//! Core components of the Wicket auth service: OAuth login, server-side
//! sessions, role-gated routes and the HTTP API that ties them together.

pub mod api;
pub mod auth;
pub mod db;
pub mod oauth;
pub mod session;
pub mod user;
