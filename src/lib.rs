pub mod ai_provider;
pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod llm;
pub mod pipeline;
pub mod runner;
pub mod scanner;
pub mod sheet;
