pub mod engine;
pub mod pipeline;

pub use crate::domain::model::{ExtractResult, RunReport, TransformResult};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
