pub mod config;
pub mod error;
pub mod merger;
pub mod oracle;
pub mod pairs;
pub mod pipeline;
pub mod progress;
pub mod ranking;
pub mod topk;
pub mod worker;

pub use error::*;
