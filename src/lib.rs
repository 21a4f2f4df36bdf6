pub mod config;
pub mod converter;
pub mod engine;
pub mod error;
pub mod formats;
pub mod result;
pub mod server;
pub mod service;
pub mod youtube;

pub use config::{Config, EngineConfig};
pub use converter::Converter;
pub use engine::{ConversionEngine, MarkItDownCli};
pub use error::{ApiError, ConversionError};
pub use result::ConversionResult;
pub use server::{AppState, build_router};
pub use service::ConversionService;
