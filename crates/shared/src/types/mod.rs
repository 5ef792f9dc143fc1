//! Common types used across the application.

pub mod id;
pub mod money;

pub use id::*;
pub use money::{STORAGE_SCALE, fits_scale, fits_storage, from_minor_units, max_amount};
