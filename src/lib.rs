pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod history;
pub mod hub;
pub mod observability;
pub mod poll;
pub mod snapshot;
pub mod source;
