//! Repositories module - Livello di accesso ai dati
//!
//! Il cuore è il [`Repository`] generico: ogni entità che implementa
//! [`Entity`] ottiene get/filter/insert/update/delete/delete_many/any/
//! add_or_update senza scrivere SQL a mano. Le modifiche passano sempre dal
//! [`DbContext`] (change tracking) e vengono scritte dalla [`UnitOfWork`].
//!
//! I repository tipizzati (`UserRepository`, `SystemConfigurationRepository`)
//! aggiungono le query specifiche del dominio sopra quello generico.

// ************************* NOTA SULLE QUERY ************************* //

/*
   Le query qui sono costruite a runtime con sqlx::QueryBuilder e non con
   query!/query_as!: il repository generico non conosce lo schema a compile
   time. Nomi di tabelle e colonne arrivano solo da costanti (`Entity::TABLE`,
   `Entity::COLUMNS`, colonne `&'static str` nei Criteria), mentre ogni valore
   passa da push_bind, quindi niente stringhe utente concatenate nell'SQL.
*/

// ************************* MODULI REPOSITORY ************************* //

pub mod context;
pub mod criteria;
pub mod error;
pub mod generic;
pub mod query;
pub mod system_configuration;
pub mod traits;
pub mod unit_of_work;
pub mod user;
pub mod value;

#[cfg(test)]
pub(crate) mod test_utils;

// alias di tipo per il pool, per semplificare lo switch in caso in cui vogliamo usare un altro db
pub type DbKind = sqlx::Sqlite;
pub type PoolType = sqlx::SqlitePool;
pub type DbRow = sqlx::sqlite::SqliteRow;

pub use context::{Batch, ChangeTracker, DbContext, EntityState};
pub use criteria::{CompareOp, Criteria};
pub use error::RepoError;
pub use generic::Repository;
pub use query::{Order, Query};
pub use traits::{Entity, Persist, Scope};
pub use unit_of_work::UnitOfWork;
pub use value::SqlValue;

pub use system_configuration::SystemConfigurationRepository;
pub use user::UserRepository;
