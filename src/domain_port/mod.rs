mod refresh_store;
mod user_directory;

pub use refresh_store::*;
pub use user_directory::*;
