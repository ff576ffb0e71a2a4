//! Prefix autocomplete over a fixed vocabulary, served by two
//! interchangeable engines: an in-memory ordered prefix index and a
//! sorted SQLite table.

pub mod cli;
pub mod index;
pub mod models;
pub mod search;
pub mod server;
pub mod vocabulary;
