pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod logging;
pub mod storage;
pub mod types;

// Application layer (use cases and ports) and infrastructure adapters
pub mod app;
pub mod infra;

pub mod observability;

pub use app::pos_service::PosService;
pub use error::{PosError, Result};
pub use types::{CampusType, Pos, PosType};
