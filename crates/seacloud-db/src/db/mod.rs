//! Database repositories for the data access layer

pub mod file;
pub mod pool;

pub use file::FileRepository;
pub use pool::{ping, setup_database};
