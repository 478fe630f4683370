//! # relink-channels
//!
//! Messaging platform integrations for Relink.

pub mod telegram;
pub mod utils;
