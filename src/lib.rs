pub mod agent;
pub mod auth;
pub mod config;
pub mod ethereum;
pub mod modes;
pub mod server;
pub mod tools;
pub mod units;
pub mod wallet;
pub mod wallet_store;
