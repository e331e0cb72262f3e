mod refresh_store_memory;
mod user_directory_memory;

pub use refresh_store_memory::*;
pub use user_directory_memory::*;
