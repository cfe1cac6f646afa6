pub mod api;
pub mod cleaner;
pub mod config;
pub mod engine;
pub mod error;
pub mod init;
pub mod optout;
pub mod scheduler;
pub mod service;
pub mod state;
pub mod storage;
pub mod store;
