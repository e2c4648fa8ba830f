pub mod extractor;
pub mod jwt;
pub mod password;
pub mod tokens;

pub use extractor::{AuthUser, Principal, TenantScope};
