//! termchat: a terminal chat client for streaming language-model endpoints.

pub mod commands;
pub mod config;
pub mod highlight;
pub mod history;
pub mod inference;
pub mod render;
pub mod session;
pub mod ui;
