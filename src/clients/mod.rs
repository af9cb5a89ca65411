pub mod streamhost;

pub use streamhost::{StreamHostClient, StreamHostError};
