#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod model;
pub mod scheduler;
pub mod session;
pub mod streak;
pub mod time;

pub use error::{Error, ErrorKind};
pub use time::Clock;
