#![forbid(unsafe_code)]

mod batch;
mod config;
mod engine;
mod error;
mod migration;
mod migrator;
mod output;
mod progress;
mod status;
mod step;

pub use batch::*;
pub use config::*;
pub use engine::*;
pub use error::*;
pub use migration::*;
pub use migrator::*;
pub use output::*;
pub use progress::*;
pub use status::*;
pub use step::*;

pub use async_trait::async_trait;
