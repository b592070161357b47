pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod guard;
pub mod handlers;
pub mod middleware;
pub mod proxy;
pub mod session;
pub mod signature;
pub mod types;
pub mod workflow;
