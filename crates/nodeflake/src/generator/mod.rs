mod config;
mod interface;
mod lock;
mod mutex;

pub use config::*;
pub use interface::*;
pub use lock::*;
