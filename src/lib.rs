pub mod change;
pub mod cli;
pub mod command;
pub mod config;
pub mod engine;
pub mod error;
pub mod forge;
pub mod git;
pub mod options;
pub mod reconciler;
pub mod resolver;
pub mod result;
pub mod version;

pub use cli::{Args, Command};
pub use command::pr;
pub use result::Result;

#[cfg(test)]
pub mod test_helpers;
