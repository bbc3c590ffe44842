pub mod app_config;
pub mod config;
pub mod geodesy;
pub mod point;
pub mod position;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env, ConfigError};
pub use point::{format_coord, Point, ReferenceSystem};
pub use position::{Position, PositionBuilder, MAX_ZOOM, MIN_ZOOM};
