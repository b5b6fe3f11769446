//! geosearch-core
//!
//! Backend-neutral pieces of the geosearch workspace: the declarative
//! document mapping, geo math, the query model, configuration and errors.

#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod config;
pub mod error;
pub mod geo;
pub mod mapping;
pub mod query;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
