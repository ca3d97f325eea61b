//! DTOs module - Data Transfer Objects
//!
//! Questo modulo contiene tutti i DTOs usati per la comunicazione client-server.
//! I DTOs separano la rappresentazione esterna (API) dalla rappresentazione interna (entities).

pub mod auth;
pub mod query;
pub mod system_configuration;
pub mod user;

// Re-exports per facilitare l'import
pub use auth::{ChangePasswordDTO, LoginDTO, TokenDTO};
pub use query::{UserSearchQuery, VisibilityQuery};
pub use system_configuration::{SystemConfigurationDTO, UpsertConfigurationDTO};
pub use user::{CreateUserDTO, UpdateUserDTO, UserDTO};
