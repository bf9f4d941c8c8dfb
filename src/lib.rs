//! Headless meeting bot.
//!
//! Joins meetings through a platform binding, follows their lifecycle and
//! captures raw audio and shared-screen video for downstream consumers.

pub mod api;
pub mod cli;
pub mod config;
pub mod events;
pub mod ffi;
pub mod global;
pub mod meeting;
pub mod platform;
pub mod registry;
pub mod sdk;
