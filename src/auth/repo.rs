use std::collections::HashMap;
use std::sync::Mutex;

use axum::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::{NewUser, Role, User};

/// The credential store. Postgres in production, in-memory in tests; the
/// handlers only ever see this trait.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Find a user by email (exact match, case-sensitive).
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>>;

    /// Find the user holding `token` with an expiry at or after `now`.
    /// Expired tokens are simply never matched; nothing sweeps them.
    async fn find_by_valid_reset_token(
        &self,
        token: &str,
        now: OffsetDateTime,
    ) -> anyhow::Result<Option<User>>;

    /// Create a new user with a hashed password. Role defaults to `user`.
    async fn create(&self, new_user: NewUser) -> anyhow::Result<User>;

    /// Attach a reset token + expiry to the user with this email.
    /// Concurrent calls race; the last write wins.
    async fn set_reset_token(
        &self,
        email: &str,
        token: &str,
        expiry: OffsetDateTime,
    ) -> anyhow::Result<()>;

    /// Store the new password hash and clear both reset fields in one
    /// statement, consuming the token.
    async fn reset_password(&self, id: Uuid, password_hash: &str) -> anyhow::Result<()>;
}

pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, role, reset_token, reset_token_expiry, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_valid_reset_token(
        &self,
        token: &str,
        now: OffsetDateTime,
    ) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, role, reset_token, reset_token_expiry, created_at
            FROM users
            WHERE reset_token = $1 AND reset_token_expiry >= $2
            "#,
        )
        .bind(token)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn create(&self, new_user: NewUser) -> anyhow::Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, name, email, password_hash, role, reset_token, reset_token_expiry, created_at
            "#,
        )
        .bind(&new_user.name)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .fetch_one(&self.pool)
        .await?;
        Ok(user)
    }

    async fn set_reset_token(
        &self,
        email: &str,
        token: &str,
        expiry: OffsetDateTime,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET reset_token = $2, reset_token_expiry = $3
            WHERE email = $1
            "#,
        )
        .bind(email)
        .bind(token)
        .bind(expiry)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn reset_password(&self, id: Uuid, password_hash: &str) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2, reset_token = NULL, reset_token_expiry = NULL
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

/// Hash-map store backing `AppState::fake()`. Mirrors the Postgres semantics
/// handlers rely on, including the unique email constraint.
#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<HashMap<Uuid, User>>,
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        let users = self.users.lock().expect("users mutex poisoned");
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_valid_reset_token(
        &self,
        token: &str,
        now: OffsetDateTime,
    ) -> anyhow::Result<Option<User>> {
        let users = self.users.lock().expect("users mutex poisoned");
        Ok(users
            .values()
            .find(|u| {
                u.reset_token.as_deref() == Some(token)
                    && u.reset_token_expiry.map_or(false, |expiry| expiry >= now)
            })
            .cloned())
    }

    async fn create(&self, new_user: NewUser) -> anyhow::Result<User> {
        let mut users = self.users.lock().expect("users mutex poisoned");
        if users.values().any(|u| u.email == new_user.email) {
            anyhow::bail!("duplicate email: {}", new_user.email);
        }
        let user = User {
            id: Uuid::new_v4(),
            name: new_user.name,
            email: new_user.email,
            password_hash: new_user.password_hash,
            role: Role::default(),
            reset_token: None,
            reset_token_expiry: None,
            created_at: OffsetDateTime::now_utc(),
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn set_reset_token(
        &self,
        email: &str,
        token: &str,
        expiry: OffsetDateTime,
    ) -> anyhow::Result<()> {
        let mut users = self.users.lock().expect("users mutex poisoned");
        if let Some(user) = users.values_mut().find(|u| u.email == email) {
            user.reset_token = Some(token.to_string());
            user.reset_token_expiry = Some(expiry);
        }
        Ok(())
    }

    async fn reset_password(&self, id: Uuid, password_hash: &str) -> anyhow::Result<()> {
        let mut users = self.users.lock().expect("users mutex poisoned");
        if let Some(user) = users.get_mut(&id) {
            user.password_hash = password_hash.to_string();
            user.reset_token = None;
            user.reset_token_expiry = None;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Ann".into(),
            email: email.into(),
            password_hash: "$argon2id$fake".into(),
        }
    }

    #[tokio::test]
    async fn create_and_find_roundtrip() {
        let store = MemoryUserStore::default();
        let created = store.create(new_user("ann@x.com")).await.unwrap();
        assert_eq!(created.role, Role::User);

        let found = store.find_by_email("ann@x.com").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert!(store.find_by_email("bob@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn email_lookup_is_case_sensitive() {
        let store = MemoryUserStore::default();
        store.create(new_user("Ann@x.com")).await.unwrap();
        assert!(store.find_by_email("ann@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn create_rejects_duplicate_email() {
        let store = MemoryUserStore::default();
        store.create(new_user("ann@x.com")).await.unwrap();
        assert!(store.create(new_user("ann@x.com")).await.is_err());
    }

    #[tokio::test]
    async fn reset_token_lookup_skips_expired_and_foreign_tokens() {
        let store = MemoryUserStore::default();
        let user = store.create(new_user("ann@x.com")).await.unwrap();
        let now = OffsetDateTime::now_utc();

        store
            .set_reset_token("ann@x.com", "fresh", now + Duration::minutes(15))
            .await
            .unwrap();
        let found = store
            .find_by_valid_reset_token("fresh", now)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, user.id);

        assert!(store
            .find_by_valid_reset_token("other", now)
            .await
            .unwrap()
            .is_none());

        store
            .set_reset_token("ann@x.com", "stale", now - Duration::seconds(1))
            .await
            .unwrap();
        assert!(store
            .find_by_valid_reset_token("stale", now)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn reset_password_consumes_the_token() {
        let store = MemoryUserStore::default();
        let user = store.create(new_user("ann@x.com")).await.unwrap();
        let now = OffsetDateTime::now_utc();
        store
            .set_reset_token("ann@x.com", "tok", now + Duration::minutes(15))
            .await
            .unwrap();

        store.reset_password(user.id, "$argon2id$new").await.unwrap();

        let updated = store.find_by_email("ann@x.com").await.unwrap().unwrap();
        assert_eq!(updated.password_hash, "$argon2id$new");
        assert!(updated.reset_token.is_none());
        assert!(updated.reset_token_expiry.is_none());
        assert!(store
            .find_by_valid_reset_token("tok", now)
            .await
            .unwrap()
            .is_none());
    }
}
