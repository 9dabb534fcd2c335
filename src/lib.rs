//! A ledger of shared group expenses that computes who owes whom and the
//! payments needed to settle a group.

pub mod amount;
pub mod balance;
pub mod commands;
pub mod config;
pub mod database;
pub mod error;
pub mod formatter;
pub mod ledger;
pub mod parser;
pub mod report;
pub mod settlement;
pub mod types;
pub mod validator;
