//! CLI command implementations.
//!
//! # Command Modules
//!
//! - [`cache`] - Cache management (clear, stats)
//! - [`config`] - Configuration management (path, show, init)
//! - [`download`] - Bulk download around a point
//! - [`tile`] - Fetch a single tile to a file
//! - [`tiles`] - List the tiles a download would cover

pub mod cache;
pub mod common;
pub mod config;
pub mod download;
pub mod tile;
pub mod tiles;
