//! Shelf application library
//!
//! Book catalog modules plus the bootstrap shared by the `shelf-app` binary
//! and `shelfctl`.

pub mod app;
pub mod modules;

pub use app::{migrate, serve, Storage};
