//! Entities module - Entità del dominio applicativo
//!
//! Questo modulo contiene tutte le entità (models) che rappresentano i dati persistiti nel database.
//! Ogni entity corrisponde a una tabella nel database e porta con sé i campi di audit comuni.

pub mod base;
pub mod enums;
pub mod system_configuration;
pub mod user;

// Re-exports per facilitare l'import
pub use base::AuditFields;
pub use enums::{ConfigKey, ConfigUnit, UserType};
pub use system_configuration::SystemConfiguration;
pub use user::User;
