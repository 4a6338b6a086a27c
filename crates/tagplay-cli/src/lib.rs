//! tagplay CLI Library
//!
//! Terminal player for NFC-tag video rentals: authorizes a tag against the
//! rental backend, runs the rental countdown, and hands the stream to a
//! media player. Provides both TUI (ratatui) and headless modes.

pub mod backend;
pub mod config;
pub mod controller;
pub mod countdown;
pub mod entry;
pub mod headless;
pub mod player;
pub mod tui;
pub mod ui;
