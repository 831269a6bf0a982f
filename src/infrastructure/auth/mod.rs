pub mod credentials;
pub mod middleware;
pub mod request_id;

pub use credentials::{resolve_credentials, CredentialSource};
pub use middleware::{admin_middleware, is_admin, ADMIN_API_KEY_HEADER};
pub use request_id::{request_id_middleware, RequestId};
