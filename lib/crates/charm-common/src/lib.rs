pub mod config;
pub mod identity;
pub mod slug;
pub mod types;
pub mod uac;

pub use config::{ConfigError, RegistryServerConfig, StoreBackend, SupabaseCredentials};
pub use identity::{AuthError, CallerIdentity, TokenPolicy, check_token_shape, parse_bearer};
pub use slug::{derive_slug, public_url};
pub use types::*;
pub use uac::AgentDraft;
