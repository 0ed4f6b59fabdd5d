#![deny(clippy::unwrap_used)]
#![allow(
    clippy::missing_errors_doc,
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss
)]

mod detector;
mod preprocess;
mod reader;

pub use detector::*;
pub use preprocess::*;
pub use reader::*;
