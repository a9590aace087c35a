//! WebSocket layer: connection tasks, liveness probing, wire frames.
//!
//! The WebSocket endpoint at `/ws` is the persistent delivery channel of
//! the service: presence pushes and routed messages flow server→client,
//! message events flow client→server, and liveness probes flow both ways.

pub mod connection;
pub mod handler;
pub mod liveness;
pub mod messages;
