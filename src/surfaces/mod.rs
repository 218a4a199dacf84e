//! View bindings for the two surfaces sharing the confirmation state machine

pub mod chat;
pub mod order;
