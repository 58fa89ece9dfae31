//! PostgreSQL user/role store
//!
//! Provides user and role persistence using SQLx and PostgreSQL.

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;

use crate::repository::{RepositoryError, RoleRepository, UserRepository};
use crate::{Role, User};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS roles (
        id BIGSERIAL PRIMARY KEY,
        role_name TEXT NOT NULL UNIQUE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id BIGSERIAL PRIMARY KEY,
        username TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        full_name TEXT NOT NULL,
        role_id BIGINT NOT NULL REFERENCES roles(id)
    )
    "#,
];

const SELECT_USERS: &str = r#"
    SELECT u.id, u.username, u.password_hash, u.full_name, r.id AS role_id, r.role_name
    FROM users u
    JOIN roles r ON r.id = u.role_id
"#;

/// PostgreSQL store
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a new store connection
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, RepositoryError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| RepositoryError::Database(format!("PostgreSQL connection failed: {e}")))?;

        Ok(Self { pool })
    }

    /// Create from an existing pool
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create the `roles` and `users` tables if they are missing
    pub async fn init_schema(&self) -> Result<(), RepositoryError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| RepositoryError::Database(format!("Failed to create schema: {e}")))?;
        }
        tracing::debug!("PostgreSQL schema ready");
        Ok(())
    }
}

/// User row joined with its role
#[derive(Debug, FromRow)]
struct UserRow {
    id: i64,
    username: String,
    password_hash: String,
    full_name: String,
    role_id: i64,
    role_name: String,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: Some(row.id),
            username: row.username,
            password_hash: row.password_hash,
            full_name: row.full_name,
            role: Role {
                id: Some(row.role_id),
                role_name: row.role_name,
            },
        }
    }
}

#[derive(Debug, FromRow)]
struct RoleRow {
    id: i64,
    role_name: String,
}

impl From<RoleRow> for Role {
    fn from(row: RoleRow) -> Self {
        Role {
            id: Some(row.id),
            role_name: row.role_name,
        }
    }
}

fn map_write_error(e: sqlx::Error, what: &str) -> RepositoryError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            RepositoryError::Conflict(what.to_string())
        }
        _ => RepositoryError::Database(format!("Failed to save {what}: {e}")),
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{SELECT_USERS} WHERE u.username = $1"))
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(format!("Failed to fetch user: {e}")))?;

        Ok(row.map(User::from))
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{SELECT_USERS} WHERE u.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(format!("Failed to fetch user: {e}")))?;

        Ok(row.map(User::from))
    }

    async fn find_all(&self) -> Result<Vec<User>, RepositoryError> {
        let rows = sqlx::query_as::<_, UserRow>(SELECT_USERS)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(format!("Failed to list users: {e}")))?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn save(&self, mut user: User) -> Result<User, RepositoryError> {
        let role_id = user.role.id.ok_or_else(|| {
            RepositoryError::NotFound(format!("role '{}' is not persisted", user.role.role_name))
        })?;

        match user.id {
            None => {
                let id = sqlx::query_scalar::<_, i64>(
                    r#"
                    INSERT INTO users (username, password_hash, full_name, role_id)
                    VALUES ($1, $2, $3, $4)
                    RETURNING id
                    "#,
                )
                .bind(&user.username)
                .bind(&user.password_hash)
                .bind(&user.full_name)
                .bind(role_id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| map_write_error(e, &format!("user '{}'", user.username)))?;

                user.id = Some(id);
            }
            Some(id) => {
                let result = sqlx::query(
                    r#"
                    UPDATE users
                    SET username = $1, password_hash = $2, full_name = $3, role_id = $4
                    WHERE id = $5
                    "#,
                )
                .bind(&user.username)
                .bind(&user.password_hash)
                .bind(&user.full_name)
                .bind(role_id)
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(|e| map_write_error(e, &format!("user '{}'", user.username)))?;

                if result.rows_affected() == 0 {
                    return Err(RepositoryError::NotFound(format!("user id {id}")));
                }
            }
        }

        Ok(user)
    }

    async fn delete_by_id(&self, id: i64) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(format!("Failed to delete user: {e}")))?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl RoleRepository for PgStore {
    async fn find_by_name(&self, name: &str) -> Result<Option<Role>, RepositoryError> {
        let row = sqlx::query_as::<_, RoleRow>("SELECT id, role_name FROM roles WHERE role_name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(format!("Failed to fetch role: {e}")))?;

        Ok(row.map(Role::from))
    }

    async fn find_all(&self) -> Result<Vec<Role>, RepositoryError> {
        let rows = sqlx::query_as::<_, RoleRow>("SELECT id, role_name FROM roles")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(format!("Failed to list roles: {e}")))?;

        Ok(rows.into_iter().map(Role::from).collect())
    }

    async fn save_all(&self, roles: Vec<Role>) -> Result<Vec<Role>, RepositoryError> {
        let mut saved = Vec::with_capacity(roles.len());

        for role in roles {
            // The no-op update makes RETURNING yield the existing row on conflict
            let row = sqlx::query_as::<_, RoleRow>(
                r#"
                INSERT INTO roles (role_name) VALUES ($1)
                ON CONFLICT (role_name) DO UPDATE SET role_name = EXCLUDED.role_name
                RETURNING id, role_name
                "#,
            )
            .bind(&role.role_name)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_write_error(e, &format!("role '{}'", role.role_name)))?;

            saved.push(Role::from(row));
        }

        Ok(saved)
    }
}
