pub mod config;
pub mod entities;
pub mod error;
pub mod ports;
pub mod session;
pub mod use_cases;

pub use error::{AuthError, Error};
