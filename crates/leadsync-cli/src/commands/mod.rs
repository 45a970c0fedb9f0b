pub mod account;
pub mod add;
pub mod common;
pub mod completions;
pub mod config;
pub mod customize;
pub mod list;
pub mod show;
pub mod stats;
pub mod sync;
pub mod transfer;
pub mod update;
