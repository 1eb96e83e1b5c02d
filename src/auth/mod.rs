pub mod claims;
pub mod jwt;
pub mod middleware;
pub mod password;
pub mod utils;

pub use claims::{Claims, RefreshClaims};
pub use jwt::JwtService;
pub use middleware::{AdminUser, AuthMiddleware, AuthenticatedUser};
pub use password::{hash_password, verify_password};
pub use utils::{extract_claims_from_context, require_admin, require_owner_or_admin};
