//! Library exports for the public feed service
//!
//! This module exposes internal components for testing and potential library usage.

pub mod auth;
pub mod config;
pub mod error;
pub mod handler;
pub mod mapper;
pub mod middleware;
pub mod model;
pub mod query;
pub mod route;
pub mod search;
pub mod state;
pub mod timestamp;
