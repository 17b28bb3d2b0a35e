//! The three pipeline stages: extract, transform, load

pub mod extract;
pub mod load;
pub mod transform;

pub use extract::{filter_played_on, Extractor};
pub use load::{LoadReport, Loader};
pub use transform::{transform, transform_on, Transformed};
