pub mod config;
pub mod error;
pub mod heightmap;
pub mod smooth;

pub use config::SmoothingParams;
pub use error::{Error, Result};
pub use heightmap::{HeightStats, Heightmap};
pub use smooth::{Progress, smooth, smooth_with_progress};
