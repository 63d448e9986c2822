pub mod analyze;
pub mod config;
pub mod deck;
pub mod quiz;
pub mod words;
