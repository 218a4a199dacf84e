//! Order Confirmation Coordinator
//!
//! Client-side coordinator for the bilateral order-confirmation protocol of
//! a consumer-to-consumer EV marketplace. Tracks one transaction (one
//! listing, one buyer, one seller) through seller initiation, per-party
//! confirmation, and completion or forfeit, and keeps the chat surface and
//! the order-detail surface rendering from one shared projection.

pub mod config;
pub mod contract_cache;
pub mod contract_client;
pub mod coordinator;
pub mod error;
pub mod event_adapter;
pub mod models;
pub mod projector;
pub mod realtime;
pub mod surfaces;
