// ABOUTME: Library module for repodb-tools
// ABOUTME: Exports all core functionality for use in binary and tests

pub mod commands;
pub mod config;
pub mod migration;
pub mod sqlite;
pub mod utils;
