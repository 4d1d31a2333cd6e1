//! Distrito 0 dashboard service following the hexagonal layout used across our
//! services.
//!
//! - **domain**: sessions, districts, properties, the map renderer and the view
//!   state machine, all behind ports
//! - **outbound**: adapters for the managed backend
//! - **inbound**: the axum router exposing the dashboard as a json api

pub mod config;
pub mod constants;
pub mod domain;
pub mod inbound;
pub mod outbound;
