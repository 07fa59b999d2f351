pub mod client;
pub mod config;
pub mod daemon;
pub mod domains;
pub mod error;
pub mod factories;
pub mod interfaces;
pub mod prompt;
pub mod providers;
pub mod services;
pub mod storage;
pub mod story;
pub mod tables;

pub use crate::client::Worldscribe;
pub use crate::config::Config;
pub use crate::error::{Result, WorldscribeError};
pub use crate::prompt::ChapterPrompt;
