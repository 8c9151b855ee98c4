//! HTTP request handlers.

pub mod admin;
pub mod auth;
pub mod health;
pub mod menu;
pub mod settings;
pub mod waiter;
