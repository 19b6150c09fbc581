pub mod ask;
pub mod chat;
pub mod check;
pub mod config;
pub mod prompts;
