//! Room message feed with adaptive polling and progressive reveal.
//!
//! SYSTEM CONTEXT
//! ==============
//! The chat server exposes each room's full message list at
//! `GET /messages/{room_id}`. This crate keeps a client view of one room in
//! sync with it: [`fetch`] pulls snapshots, [`polling`] decides how often,
//! [`reveal`] staggers new snapshots into the view, and [`feed`] owns the
//! task that ties them together for a single room.

pub mod config;
pub mod feed;
pub mod fetch;
pub mod message;
pub mod polling;
pub mod reveal;

pub use config::{ConfigError, FeedConfig};
pub use feed::{FeedView, RoomFeed};
pub use fetch::{FetchError, HttpMessageSource, MessageSource};
pub use message::Message;
pub use reveal::Phase;
