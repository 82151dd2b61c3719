// Secure Shop
// Four web shops over shared in-memory stores: two trust the client, two don't

pub mod cli;
pub mod config;
pub mod network;
pub mod observability;
pub mod shop;
pub mod signals;
pub mod store;
pub mod web;
