//! Interactive menu over the product, inventory and sales façades.

pub mod config;
pub mod console;
pub mod shell;
mod workflow;

pub use config::{ConfigError, ProductDefaults, Settings};
pub use console::Console;
pub use shell::{MenuChoice, Shell};
