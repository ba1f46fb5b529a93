//! Shared service plumbing for Talaro backends: env config, tracing, request ids, health.

pub mod config;
pub mod health;
pub mod middleware;
pub mod tracing;
