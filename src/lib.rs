pub mod cli;
pub mod cloudwatch;
pub mod collector;
pub mod error;
pub mod liveness;
pub mod ordering;
pub mod output;
pub mod session;
pub mod source;
#[cfg(test)]
mod tests;
pub mod types;
pub mod utils;

pub use error::TailError;
