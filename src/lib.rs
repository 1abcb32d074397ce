pub mod commands;
pub mod config;
pub mod console;
pub mod consts;
pub mod exceptions;
pub mod export;
pub mod fs;
pub mod historystore;
pub mod logging;
pub mod models;
pub mod parsers;
pub mod regression;
pub mod validation;
