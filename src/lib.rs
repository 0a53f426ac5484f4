//! Comment Translator - translate source-code comments in place
//!
//! Extracts comment bodies from source lines across several languages,
//! translates them through Google Translate or LibreTranslate, and keeps a
//! capped translation cache plus an undo history.

pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod history;
pub mod translate;
pub mod workflow;
