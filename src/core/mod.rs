pub mod etl;
pub mod flatten;
pub mod loader;
pub mod pipeline;
pub mod template;
pub mod writer;

#[cfg(test)]
pub(crate) mod test_support;

pub use crate::domain::model::{MetadataRecord, Record, TransformResult};
pub use crate::domain::ports::{Pipeline, Storage};
pub use crate::utils::error::Result;
