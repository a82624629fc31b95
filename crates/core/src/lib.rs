//! Keywarden Core — configuration and shared error types for the Keycloak
//! realm administration toolkit.

pub mod config;
pub mod error;
