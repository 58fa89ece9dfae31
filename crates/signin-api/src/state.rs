//! Application state management
//!
//! Author: hephaex@gmail.com

use crate::auth::{JwtConfig, PasswordConfig, TokenIssuer, UserDto, UserService, ADMIN_ROLE};
use anyhow::Context;
use signin_core::{AppConfig, InMemoryStore, PgStore, RoleRepository, StoreBackend, UserRepository};
use std::sync::Arc;
use std::time::Instant;

/// Application state shared across handlers
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Sign-in and user/role operations
    pub service: UserService,
    /// Server start time
    pub start_time: Instant,
}

impl AppState {
    /// Create state around an already composed service
    pub fn new(config: AppConfig, service: UserService) -> Self {
        Self {
            config,
            service,
            start_time: Instant::now(),
        }
    }

    /// Compose the service from configuration and seed the default roles
    ///
    /// Connects to PostgreSQL when that backend is configured.
    pub async fn initialize(config: AppConfig) -> anyhow::Result<Self> {
        config.validate().context("Invalid configuration")?;

        let (users, roles): (Arc<dyn UserRepository>, Arc<dyn RoleRepository>) =
            match config.database.backend {
                StoreBackend::Memory => {
                    let store = Arc::new(InMemoryStore::new());
                    (
                        store.clone() as Arc<dyn UserRepository>,
                        store as Arc<dyn RoleRepository>,
                    )
                }
                StoreBackend::Postgres => {
                    let store = PgStore::connect(
                        &config.database.postgres_url,
                        config.database.postgres_pool_size,
                    )
                    .await
                    .context("Failed to connect to PostgreSQL")?;
                    store
                        .init_schema()
                        .await
                        .context("Failed to prepare schema")?;
                    let store = Arc::new(store);
                    (
                        store.clone() as Arc<dyn UserRepository>,
                        store as Arc<dyn RoleRepository>,
                    )
                }
            };

        if config.uses_development_secret() {
            tracing::warn!("JWT_SECRET not set; using the development secret");
        }

        let service = UserService::new(
            users,
            roles,
            TokenIssuer::new(JwtConfig::from(&config.token)),
            PasswordConfig::from(&config.hashing),
        );

        service
            .save_roles(&config.seed.roles)
            .await
            .context("Failed to seed roles")?;

        if let Some((username, password)) = config.seed.admin() {
            if service.find_user_by_username(username).await?.is_none() {
                service
                    .create_user(UserDto::new(username, password, "Administrator", ADMIN_ROLE))
                    .await
                    .context("Failed to create bootstrap administrator")?;
                tracing::info!(username = %username, "Bootstrap administrator created");
            }
        }

        tracing::info!(
            backend = ?config.database.backend,
            valid_minutes = config.token.valid_minutes,
            "Application state initialized"
        );

        Ok(Self::new(config, service))
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn light_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.hashing.memory_cost = 1024;
        config.hashing.time_cost = 1;
        config.hashing.parallelism = 1;
        config
    }

    #[tokio::test]
    async fn test_initialize_in_memory_seeds_roles() {
        let config = light_config();

        let state = AppState::initialize(config).await.unwrap();

        let mut names: Vec<String> = state
            .service
            .list_roles()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.role_name)
            .collect();
        names.sort();
        assert_eq!(names, vec!["ADMIN", "USER"]);
        assert!(state.uptime_secs() < 5);
    }

    #[tokio::test]
    async fn test_initialize_creates_bootstrap_admin() {
        let mut config = light_config();
        config.seed.admin_username = Some("root".to_string());
        config.seed.admin_password = Some("root-pass".to_string());

        let state = AppState::initialize(config).await.unwrap();

        let result = state.service.signin("root", "root-pass").await.unwrap();
        assert!(result.authorized);
        let claims = state.service.issuer().validate(&result.auth_code).unwrap();
        assert!(claims.has_role(ADMIN_ROLE));
    }

    #[tokio::test]
    async fn test_initialize_without_admin_has_no_users() {
        let state = AppState::initialize(light_config()).await.unwrap();
        assert!(state.service.list_users().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_initialize_rejects_unusable_hashing_params() {
        let mut config = light_config();
        config.hashing.memory_cost = 0;

        assert!(AppState::initialize(config).await.is_err());
    }
}
