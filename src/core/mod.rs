//! Core modules: the store, its broker, and the engine that owns them.
//!
//! Subsystem operations (elections, debates, rules, tyranny) live in
//! `plugins` and reach the store only through [`engine::Engine`].

pub mod broker;
pub mod chance;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod gate;
pub mod ledger;
pub mod output;
pub mod schemas;
pub mod store;
pub mod time;
