//! Speech Relay Service Library Crate
//!
//! This library contains all the logic for the relay web service: the
//! environment configuration, shared state, routing, and the WebSocket
//! ingress that bridges client audio to the recognition backend. The
//! `relay` binary is a thin wrapper around this library.

pub mod config;
pub mod router;
pub mod state;
pub mod ws;
