//! Core library components.
//!
//! The migration engine (resolver, scope translation, encryption,
//! orchestration), the export sink, and the configuration they share.

pub mod cipher;
pub mod config;
pub mod constants;
pub mod domain;
pub mod export;
pub mod migrate;
pub mod owner;
pub mod platform;
pub mod resolver;
pub mod scope;
pub mod types;
pub mod values;
