//! Building blocks of the `pcmframe` command-line tool

pub mod config;
pub mod tone;
pub mod wav;

pub use config::CliConfig;
