//! Flower catalog browsing with locally persisted favorites.
//!
//! The catalog comes from a remote mock API ([`catalog`]); favorites are a
//! set of item names stored as one JSON string ([`favorites`]) in a local
//! SQLite key-value table ([`storage`]). [`app::Session`] ties the two
//! together the way the catalog screens do.

pub mod app;
pub mod catalog;
pub mod config;
pub mod favorites;
pub mod render;
pub mod storage;
pub mod util;
