//! # Songshare Common Library
//!
//! Shared code for the songshare crates including:
//! - Domain records (songs, shares, groups, memberships, songbooks, notifications)
//! - SQLite schema initialization
//! - Configuration loading and root folder resolution
//! - Utility functions

pub mod config;
pub mod db;
pub mod error;
pub mod uuid_utils;

pub use error::{Error, Result};
