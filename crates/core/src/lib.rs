//! Warden Core -- certificate request models, policy definitions, configuration and errors.

pub mod config;
pub mod error;
pub mod models;
