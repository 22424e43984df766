pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod seats;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::{cli::LocalStorage, toml_config::TomlConfig};

pub use core::{engine::BatchEngine, pipeline::SeatChartPipeline};
pub use domain::decoder::decode;
pub use domain::template::{render, TokenFormat};
pub use utils::error::{Result, SeatChartError};
