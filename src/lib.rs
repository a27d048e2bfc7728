//! deskrelay - realtime office desk status
//!
//! Keeps a local view of desks and reservations in sync with the office
//! booking server: a REST snapshot seeds the cache, a push channel patches it
//! as colleagues book and free desks, and changes made by others surface as
//! short notices.

pub mod api;
pub mod cache;
pub mod cli;
pub mod config;
pub mod logging;
pub mod notice;
pub mod relay;
pub mod sync;
