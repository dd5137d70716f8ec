//! Watch-progress tracking for a streaming client: session initialization,
//! resume-at-saved-position, and periodic progress checkpoints.

#![allow(clippy::result_large_err)]

pub mod backends;
pub mod config;
pub mod constants;
pub mod models;
pub mod player;
pub mod services;
pub mod utils;
