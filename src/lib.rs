pub mod cli;
pub mod config;
pub mod error;
pub mod origin;
pub mod page;
pub mod panel;
pub mod storage;

pub use config::Config;
pub use error::{Error, Result};
pub use origin::Origin;
