//! To-do API service for the Telegram Mini App
//!
//! Exposes the routing, repositories, session store and credential
//! verifier so the binary and the HTTP-level tests share one wiring.

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod session;
pub mod state;
pub mod telegram;
