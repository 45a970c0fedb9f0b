//! Database layer for leadsync

mod account_repository;
mod connection;
mod customization_repository;
mod lead_repository;
mod migrations;

pub use account_repository::{AccountRepository, LibSqlAccountRepository};
pub use connection::Database;
pub use customization_repository::{CustomizationRepository, LibSqlCustomizationRepository};
pub use lead_repository::{LeadRepository, LibSqlLeadRepository};
