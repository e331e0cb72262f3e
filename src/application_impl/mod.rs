mod access_guard_impl;
mod auth_service_impl;
mod fingerprint;
mod token_signer_jwt;

pub use access_guard_impl::*;
pub use auth_service_impl::*;
pub use fingerprint::*;
pub use token_signer_jwt::*;
