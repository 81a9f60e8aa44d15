pub mod data;
pub mod io;
pub mod printing;

pub use data::{Config, DEFAULT_BASE_URL, DEFAULT_GREETING};
pub use io::ConfigError;
