// Library root, exposes internals for integration tests.
// The binary entry point is src/main.rs.

pub mod assistant;
pub mod chat;
pub mod cli;
pub mod config;
pub mod console;
pub mod error;
pub mod extract;
pub mod llm;
pub mod logger;
