//! Terminal chat client for asking natural-language questions about NCAA
//! basketball data and viewing the answers as text, tables and charts.

pub mod commands;
pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod models;
pub mod render;
pub mod service;
pub mod ui;
