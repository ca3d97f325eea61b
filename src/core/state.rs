//! Application State - Stato globale dell'applicazione
//!
//! Contiene i repository, la configurazione necessaria agli handler e il
//! token di cancellazione condiviso da tutte le richieste.

use crate::repositories::{DbContext, PoolType, SystemConfigurationRepository, UserRepository};
use chrono::Duration;
use tokio_util::sync::CancellationToken;

/// Stato globale dell'applicazione condiviso tra tutte le route e middleware
pub struct AppState {
    /// Pool condiviso, ogni richiesta apre il proprio DbContext sopra di esso
    pub connection_pool: PoolType,

    /// Repository per la gestione degli utenti
    pub users: UserRepository,

    /// Repository per la configurazione di sistema
    pub configurations: SystemConfigurationRepository,

    /// Secret key per JWT token
    pub jwt_secret: String,

    /// Durata dei token quando la configurazione `TokenLifetime` non è presente
    pub default_token_lifetime: Duration,

    /// Costo bcrypt per le nuove password
    pub password_cost: u32,

    /// Cancellato allo shutdown del server
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Crea una nuova istanza di AppState inizializzando tutti i repository
    /// con il pool di connessioni fornito e la JWT secret.
    ///
    /// # Arguments
    /// * `pool` - Pool di connessioni condiviso
    /// * `jwt_secret` - Chiave segreta per la firma dei token JWT
    /// * `default_token_lifetime` - Durata di fallback dei token
    pub fn new(pool: PoolType, jwt_secret: String, default_token_lifetime: Duration) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            configurations: SystemConfigurationRepository::new(pool.clone()),
            connection_pool: pool,
            jwt_secret,
            default_token_lifetime,
            password_cost: bcrypt::DEFAULT_COST,
            shutdown: CancellationToken::new(),
        }
    }

    /// Overrides the bcrypt cost, tests use the minimum to stay fast
    pub fn with_password_cost(mut self, cost: u32) -> Self {
        self.password_cost = cost;
        self
    }

    /// Token for a single request, cancelled together with the server
    pub fn request_token(&self) -> CancellationToken {
        self.shutdown.child_token()
    }

    /// Fresh unit-of-work scope for a single request
    pub fn context(&self) -> DbContext {
        DbContext::with_cancellation(self.connection_pool.clone(), self.request_token())
    }
}
