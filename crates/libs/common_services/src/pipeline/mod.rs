mod artifacts;
mod error;
mod orchestrator;
mod resolver;

pub use artifacts::*;
pub use error::*;
pub use orchestrator::*;
pub use resolver::*;
