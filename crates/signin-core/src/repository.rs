//! Storage traits for user and role records
//!
//! The service only talks to these traits. `InMemoryStore` backs
//! development runs and tests; `PgStore` (see `postgres`) backs deployments.

use crate::{Role, User};
use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;

/// Repository errors
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Duplicate record: {0}")]
    Conflict(String),

    #[error("Record not found: {0}")]
    NotFound(String),
}

/// User persistence
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Exact-match lookup by username
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError>;

    /// Lookup by identifier
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, RepositoryError>;

    /// All users, in no particular order
    async fn find_all(&self) -> Result<Vec<User>, RepositoryError>;

    /// Insert when `user.id` is `None`, otherwise replace the record with that id
    async fn save(&self, user: User) -> Result<User, RepositoryError>;

    /// Returns `false` when no record had that id
    async fn delete_by_id(&self, id: i64) -> Result<bool, RepositoryError>;
}

/// Role persistence
#[async_trait]
pub trait RoleRepository: Send + Sync {
    /// Exact-match lookup by role name
    async fn find_by_name(&self, name: &str) -> Result<Option<Role>, RepositoryError>;

    /// All roles, in no particular order
    async fn find_all(&self) -> Result<Vec<Role>, RepositoryError>;

    /// Insert the given roles; names that already exist keep their record
    async fn save_all(&self, roles: Vec<Role>) -> Result<Vec<Role>, RepositoryError>;
}

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<i64, User>,
    roles: HashMap<i64, Role>,
    next_user_id: i64,
    next_role_id: i64,
}

/// Process-local store for users and roles
///
/// Writes are last-write-wins; there is no transaction spanning calls.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, RepositoryError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_all(&self) -> Result<Vec<User>, RepositoryError> {
        Ok(self.tables.read().await.users.values().cloned().collect())
    }

    async fn save(&self, mut user: User) -> Result<User, RepositoryError> {
        let mut tables = self.tables.write().await;

        let taken = tables
            .users
            .values()
            .any(|u| u.username == user.username && u.id != user.id);
        if taken {
            return Err(RepositoryError::Conflict(format!(
                "username '{}'",
                user.username
            )));
        }

        let id = match user.id {
            Some(id) => id,
            None => {
                tables.next_user_id += 1;
                tables.next_user_id
            }
        };
        user.id = Some(id);
        tables.users.insert(id, user.clone());

        Ok(user)
    }

    async fn delete_by_id(&self, id: i64) -> Result<bool, RepositoryError> {
        Ok(self.tables.write().await.users.remove(&id).is_some())
    }
}

#[async_trait]
impl RoleRepository for InMemoryStore {
    async fn find_by_name(&self, name: &str) -> Result<Option<Role>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .roles
            .values()
            .find(|r| r.role_name == name)
            .cloned())
    }

    async fn find_all(&self) -> Result<Vec<Role>, RepositoryError> {
        Ok(self.tables.read().await.roles.values().cloned().collect())
    }

    async fn save_all(&self, roles: Vec<Role>) -> Result<Vec<Role>, RepositoryError> {
        let mut tables = self.tables.write().await;
        let mut saved = Vec::with_capacity(roles.len());

        for role in roles {
            let existing = tables
                .roles
                .values()
                .find(|r| r.role_name == role.role_name)
                .cloned();

            let role = match existing {
                Some(existing) => existing,
                None => {
                    tables.next_role_id += 1;
                    let id = tables.next_role_id;
                    let role = Role {
                        id: Some(id),
                        role_name: role.role_name,
                    };
                    tables.roles.insert(id, role.clone());
                    role
                }
            };
            saved.push(role);
        }

        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded() -> (InMemoryStore, Role) {
        let store = InMemoryStore::new();
        let roles = store
            .save_all(vec![Role::new("ADMIN"), Role::new("USER")])
            .await
            .unwrap();
        let user_role = roles.into_iter().find(|r| r.role_name == "USER").unwrap();
        (store, user_role)
    }

    #[tokio::test]
    async fn test_save_assigns_ids() {
        let (store, role) = seeded().await;

        let alice = store
            .save(User::new("alice", "h1", "Alice", role.clone()))
            .await
            .unwrap();
        let bob = store
            .save(User::new("bob", "h2", "Bob", role))
            .await
            .unwrap();

        assert!(alice.id.is_some());
        assert!(bob.id.is_some());
        assert_ne!(alice.id, bob.id);
        assert_eq!(UserRepository::find_all(&store).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_find_by_username_is_exact() {
        let (store, role) = seeded().await;
        store
            .save(User::new("alice", "h", "Alice", role))
            .await
            .unwrap();

        assert!(store.find_by_username("alice").await.unwrap().is_some());
        assert!(store.find_by_username("Alice").await.unwrap().is_none());
        assert!(store.find_by_username("alic").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let (store, role) = seeded().await;
        store
            .save(User::new("alice", "h", "Alice", role.clone()))
            .await
            .unwrap();

        let result = store.save(User::new("alice", "h", "Other", role)).await;
        assert!(matches!(result, Err(RepositoryError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_save_with_id_replaces() {
        let (store, role) = seeded().await;
        let mut alice = store
            .save(User::new("alice", "h", "Alice", role))
            .await
            .unwrap();

        alice.full_name = "Alice Liddell".to_string();
        store.save(alice.clone()).await.unwrap();

        let found = store.find_by_id(alice.id.unwrap()).await.unwrap().unwrap();
        assert_eq!(found.full_name, "Alice Liddell");
        assert_eq!(UserRepository::find_all(&store).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_by_id() {
        let (store, role) = seeded().await;
        let alice = store
            .save(User::new("alice", "h", "Alice", role))
            .await
            .unwrap();

        assert!(store.delete_by_id(alice.id.unwrap()).await.unwrap());
        assert!(!store.delete_by_id(alice.id.unwrap()).await.unwrap());
        assert!(store.find_by_username("alice").await.unwrap().is_none());
    }

    #[test]
    fn test_save_all_is_idempotent_on_name() {
        tokio_test::block_on(async {
            let store = InMemoryStore::new();
            let first = store.save_all(vec![Role::new("ADMIN")]).await.unwrap();
            let second = store
                .save_all(vec![Role::new("ADMIN"), Role::new("USER")])
                .await
                .unwrap();

            assert_eq!(first[0].id, second[0].id);
            assert_eq!(RoleRepository::find_all(&store).await.unwrap().len(), 2);
            assert!(store.find_by_name("USER").await.unwrap().is_some());
            assert!(store.find_by_name("GUEST").await.unwrap().is_none());
        });
    }
}
