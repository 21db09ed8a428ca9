pub mod completions;
pub mod config;
pub mod run;
pub mod simulate;
