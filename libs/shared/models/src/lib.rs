pub mod error;
pub mod interval;

pub use error::AppError;
pub use interval::{overlaps, TimeRange};
