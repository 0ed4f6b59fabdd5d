#![deny(clippy::unwrap_used)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss
)]

mod decoded_image;
mod detection;
mod source;
mod violation;

pub use decoded_image::*;
pub use detection::*;
pub use source::*;
pub use violation::*;
