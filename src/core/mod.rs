pub mod config;
pub mod error;
pub mod file_monitor;
pub mod notifier;
pub mod playlist;
pub mod record;
pub mod record_manager;

#[cfg(test)]
mod config_test;

pub use config::*;
pub use file_monitor::*;
pub use notifier::{DialogNotifier, Notifier};
pub use playlist::*;
pub use record::*;
pub use record_manager::*;
