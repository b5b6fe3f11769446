//! geosearch-cli
//!
//! Flag parsing and the demo driver behind the `geosearch-demo` binary.

pub mod cli;
pub mod demo;

pub use cli::{Args, DemoConfig};
pub use demo::{run, DemoReport};
