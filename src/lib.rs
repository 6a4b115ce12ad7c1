//! e-SPJ - expense accountability document archive.
//!
//! Stores SPJ records with their scanned attachments, assembles filtered
//! listings with summary counts, and exports attachments as ZIP archives or
//! listings as spreadsheet reports.

#![allow(clippy::should_implement_trait)]

pub mod cli;
pub mod config;
pub mod models;
pub mod repository;
pub mod schema;
pub mod server;
pub mod services;
pub mod storage;
pub mod utils;

mod migrations;
