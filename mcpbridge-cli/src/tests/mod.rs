//! Unit tests for mcpbridge-cli, organized by module.
//!
//! Each submodule documents the behaviour under test.

mod config;
mod run;
