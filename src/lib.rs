//! Identity service library
//!
//! Token authority, credential and session manager, and registration saga,
//! exposed over a JSON RPC surface.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod notify;
pub mod registration;
pub mod routes;
pub mod state;
pub mod storage;
pub mod token;
