//! Career Guide: intake conversation and career plan service.

pub mod auth;
pub mod config;
pub mod error;
pub mod intake;
pub mod llm;
pub mod plan;
pub mod routes;
pub mod store;
