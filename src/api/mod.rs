pub mod error;
pub mod router;
pub mod types;

pub use error::ApiError;
pub use router::analysis_router;
