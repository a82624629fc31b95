//! Keywarden Admin — typed client for the Keycloak admin REST API.
//!
//! This crate handles admin token acquisition and the realm admin
//! endpoints Keywarden manages: users and their attributes, the
//! user-profile schema, clients, and protocol mappers.

pub mod auth;
pub mod client;
pub mod models;
