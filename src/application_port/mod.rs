mod access_guard;
mod auth_service;
mod token_signer;

pub use access_guard::*;
pub use auth_service::*;
pub use token_signer::*;
