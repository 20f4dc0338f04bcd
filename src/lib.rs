pub mod app;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod export;
pub mod output;
pub mod preferences;
pub mod record;
pub mod render;
pub mod search;
pub mod table;
pub mod visibility;

#[cfg(test)]
mod tests;
