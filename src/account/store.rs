/// Persistent account store
///
/// CRUD-by-id and by-email access to the `users` table, plus the cascade
/// that removes the collections owned by an account. This is the only module
/// that touches account rows directly; services above it never write SQL.
use crate::{
    db::account::User,
    error::{AuthError, AuthResult},
};
use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use uuid::Uuid;

/// Fields required to create an account. The store assigns the id and
/// timestamps; new accounts are never admins.
#[derive(Debug, Clone)]
pub struct UserDraft {
    pub email: String,
    pub password_hash: String,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
}

/// Patch for the paired reset token columns. The two columns only ever move
/// together, so the patch offers no way to touch one without the other.
#[derive(Debug, Clone)]
pub enum ResetTokenPatch {
    Set {
        token: String,
        expires_at: DateTime<Utc>,
    },
    Clear,
}

/// Sparse field update. Only fields that are `Some` end up in the UPDATE
/// statement; everything else is left as stored.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub email: Option<String>,
    pub firstname: Option<String>,
    pub lastname: Option<String>,
    pub password_hash: Option<String>,
    pub reset_token: Option<ResetTokenPatch>,
}

impl UserPatch {
    fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.firstname.is_none()
            && self.lastname.is_none()
            && self.password_hash.is_none()
            && self.reset_token.is_none()
    }
}

/// Account store backed by the service's SQLite pool
pub struct UserStore {
    db: SqlitePool,
}

impl UserStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    #[cfg(test)]
    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.db
    }

    /// Look up an account by normalized email
    pub async fn find_by_email(&self, email: &str) -> AuthResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, firstname, lastname, is_admin,
                    password_reset_token, password_reset_token_expires_at, created_at
             FROM users WHERE email = ?1",
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;

        Ok(user)
    }

    /// Look up an account by id
    pub async fn find_by_id(&self, id: &str) -> AuthResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, firstname, lastname, is_admin,
                    password_reset_token, password_reset_token_expires_at, created_at
             FROM users WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(user)
    }

    /// Look up an account by a pending, non-expired reset token.
    ///
    /// A token whose expiry has passed but was never cleared behaves exactly
    /// like an absent token.
    pub async fn find_by_reset_token(&self, token: &str) -> AuthResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, firstname, lastname, is_admin,
                    password_reset_token, password_reset_token_expires_at, created_at
             FROM users
             WHERE password_reset_token = ?1
               AND password_reset_token_expires_at > ?2",
        )
        .bind(token)
        .bind(Utc::now())
        .fetch_optional(&self.db)
        .await?;

        Ok(user)
    }

    /// Insert a new account.
    ///
    /// The UNIQUE index on email is the authoritative uniqueness guard; a
    /// concurrent signup that slips past the service's friendly pre-check
    /// still surfaces here as [`AuthError::EmailTaken`].
    pub async fn insert(&self, draft: UserDraft) -> AuthResult<User> {
        let user = User {
            id: Uuid::new_v4().to_string(),
            email: draft.email,
            password_hash: draft.password_hash,
            firstname: draft.firstname,
            lastname: draft.lastname,
            is_admin: false,
            password_reset_token: None,
            password_reset_token_expires_at: None,
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO users (id, email, password_hash, firstname, lastname, is_admin, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.firstname)
        .bind(&user.lastname)
        .bind(user.is_admin)
        .bind(user.created_at)
        .execute(&self.db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db) = &e {
                if db.is_unique_violation() {
                    return AuthError::EmailTaken;
                }
            }
            AuthError::Database(e)
        })?;

        Ok(user)
    }

    /// Apply a sparse patch to an account.
    ///
    /// Returns the post-update record, even when no field changed value, and
    /// `None` when the id does not exist.
    pub async fn update_fields(&self, id: &str, patch: UserPatch) -> AuthResult<Option<User>> {
        if patch.is_empty() {
            return self.find_by_id(id).await;
        }

        let mut builder = QueryBuilder::<Sqlite>::new("UPDATE users SET ");
        let mut updates = builder.separated(", ");

        if let Some(email) = &patch.email {
            updates.push("email = ");
            updates.push_bind_unseparated(email.clone());
        }
        if let Some(firstname) = &patch.firstname {
            updates.push("firstname = ");
            updates.push_bind_unseparated(firstname.clone());
        }
        if let Some(lastname) = &patch.lastname {
            updates.push("lastname = ");
            updates.push_bind_unseparated(lastname.clone());
        }
        if let Some(password_hash) = &patch.password_hash {
            updates.push("password_hash = ");
            updates.push_bind_unseparated(password_hash.clone());
        }
        match &patch.reset_token {
            Some(ResetTokenPatch::Set { token, expires_at }) => {
                updates.push("password_reset_token = ");
                updates.push_bind_unseparated(token.clone());
                updates.push("password_reset_token_expires_at = ");
                updates.push_bind_unseparated(*expires_at);
            }
            Some(ResetTokenPatch::Clear) => {
                updates.push("password_reset_token = NULL");
                updates.push("password_reset_token_expires_at = NULL");
            }
            None => {}
        }

        builder.push(" WHERE id = ");
        builder.push_bind(id);

        builder
            .build()
            .execute(&self.db)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(db) = &e {
                    if db.is_unique_violation() {
                        return AuthError::EmailTaken;
                    }
                }
                AuthError::Database(e)
            })?;

        self.find_by_id(id).await
    }

    /// Delete every caption owned by `user_id`, returning the removed count
    pub async fn delete_captions_for(&self, user_id: &str) -> AuthResult<u64> {
        let result = sqlx::query("DELETE FROM captions WHERE user_id = ?1")
            .bind(user_id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected())
    }

    /// Delete every scheduled post owned by `user_id`, returning the removed count
    pub async fn delete_scheduled_posts_for(&self, user_id: &str) -> AuthResult<u64> {
        let result = sqlx::query("DELETE FROM scheduled_posts WHERE user_id = ?1")
            .bind(user_id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected())
    }

    /// Remove an account and everything it owns.
    ///
    /// Dependent collections go first, then the account row. There is no
    /// cross-table transaction here: if the account row removal fails after
    /// dependents are gone, the inconsistency is logged for operator
    /// follow-up rather than rolled back.
    pub async fn delete_cascade(&self, id: &str) -> AuthResult<bool> {
        let captions = self.delete_captions_for(id).await?;
        let scheduled_posts = self.delete_scheduled_posts_for(id).await?;

        let result = sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(id)
            .execute(&self.db)
            .await;

        match result {
            Ok(r) if r.rows_affected() == 0 => {
                if captions + scheduled_posts > 0 {
                    tracing::warn!(
                        user_id = %id,
                        captions,
                        scheduled_posts,
                        "Dependent records removed but no account row matched"
                    );
                }
                Ok(false)
            }
            Ok(_) => {
                tracing::info!(
                    user_id = %id,
                    captions,
                    scheduled_posts,
                    "Account and owned records deleted"
                );
                Ok(true)
            }
            Err(e) => {
                if captions + scheduled_posts > 0 {
                    tracing::error!(
                        user_id = %id,
                        captions,
                        scheduled_posts,
                        "Account row removal failed after dependents were deleted; store needs operator attention"
                    );
                }
                Err(AuthError::Database(e))
            }
        }
    }

    /// List accounts with pagination and optional case-insensitive search
    /// over email and profile names, ordered by email for stable paging.
    pub async fn list(
        &self,
        skip: i64,
        limit: i64,
        search: Option<&str>,
    ) -> AuthResult<Vec<User>> {
        let users = if let Some(query) = search {
            let pattern = format!("%{}%", query);
            sqlx::query_as::<_, User>(
                "SELECT id, email, password_hash, firstname, lastname, is_admin,
                        password_reset_token, password_reset_token_expires_at, created_at
                 FROM users
                 WHERE email LIKE ?1 OR firstname LIKE ?1 OR lastname LIKE ?1
                 ORDER BY email
                 LIMIT ?2 OFFSET ?3",
            )
            .bind(pattern)
            .bind(limit)
            .bind(skip)
            .fetch_all(&self.db)
            .await?
        } else {
            sqlx::query_as::<_, User>(
                "SELECT id, email, password_hash, firstname, lastname, is_admin,
                        password_reset_token, password_reset_token_expires_at, created_at
                 FROM users
                 ORDER BY email
                 LIMIT ?1 OFFSET ?2",
            )
            .bind(limit)
            .bind(skip)
            .fetch_all(&self.db)
            .await?
        };

        Ok(users)
    }

    /// Count accounts, optionally filtered by the same search as [`list`](Self::list)
    pub async fn count(&self, search: Option<&str>) -> AuthResult<i64> {
        let count: i64 = if let Some(query) = search {
            let pattern = format!("%{}%", query);
            sqlx::query_scalar(
                "SELECT COUNT(*) FROM users
                 WHERE email LIKE ?1 OR firstname LIKE ?1 OR lastname LIKE ?1",
            )
            .bind(pattern)
            .fetch_one(&self.db)
            .await?
        } else {
            sqlx::query_scalar("SELECT COUNT(*) FROM users")
                .fetch_one(&self.db)
                .await?
        };

        Ok(count)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Duration;

    pub(crate) async fn test_store() -> UserStore {
        // Single connection so the in-memory database is shared across queries
        let db = sqlx::sqlite::SqlitePoolOptions::new()
            .max_connections(1)
            .connect(":memory:")
            .await
            .unwrap();
        crate::db::run_migrations(&db).await.unwrap();
        UserStore::new(db)
    }

    pub(crate) fn draft(email: &str) -> UserDraft {
        UserDraft {
            email: email.to_string(),
            password_hash: "stored-hash".to_string(),
            firstname: Some("Ada".to_string()),
            lastname: Some("Lovelace".to_string()),
        }
    }

    /// Seed a dependent record in each owned collection
    pub(crate) async fn seed_owned_records(store: &UserStore, user_id: &str) {
        sqlx::query(
            "INSERT INTO captions (id, user_id, content, created_at) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(user_id)
        .bind("Launch day! #ad")
        .bind(Utc::now())
        .execute(&store.db)
        .await
        .unwrap();

        sqlx::query(
            "INSERT INTO scheduled_posts (id, user_id, caption, image_url, scheduled_at, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(user_id)
        .bind("Launch day! #ad")
        .bind("/uploads/launch.png")
        .bind(Utc::now() + Duration::days(1))
        .bind("scheduled")
        .bind(Utc::now())
        .execute(&store.db)
        .await
        .unwrap();
    }

    pub(crate) async fn count_owned_records(store: &UserStore, user_id: &str) -> i64 {
        let captions: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM captions WHERE user_id = ?1")
            .bind(user_id)
            .fetch_one(&store.db)
            .await
            .unwrap();
        let posts: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM scheduled_posts WHERE user_id = ?1")
                .bind(user_id)
                .fetch_one(&store.db)
                .await
                .unwrap();
        captions + posts
    }

    #[tokio::test]
    async fn test_insert_and_find() {
        let store = test_store().await;

        let user = store.insert(draft("ada@gmail.com")).await.unwrap();
        assert!(!user.id.is_empty());
        assert!(!user.is_admin);
        assert!(user.password_reset_token.is_none());

        let by_email = store.find_by_email("ada@gmail.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, user.id);

        let by_id = store.find_by_id(&user.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "ada@gmail.com");

        assert!(store.find_by_email("nobody@gmail.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_duplicate_email_conflicts() {
        let store = test_store().await;

        store.insert(draft("ada@gmail.com")).await.unwrap();
        let result = store.insert(draft("ada@gmail.com")).await;

        assert!(matches!(result.unwrap_err(), AuthError::EmailTaken));
    }

    #[tokio::test]
    async fn test_update_fields_is_sparse() {
        let store = test_store().await;
        let user = store.insert(draft("ada@gmail.com")).await.unwrap();

        let updated = store
            .update_fields(
                &user.id,
                UserPatch {
                    firstname: Some("Augusta".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        // Patched field changed, everything else untouched
        assert_eq!(updated.firstname.as_deref(), Some("Augusta"));
        assert_eq!(updated.lastname.as_deref(), Some("Lovelace"));
        assert_eq!(updated.email, "ada@gmail.com");
        assert_eq!(updated.password_hash, "stored-hash");
    }

    #[tokio::test]
    async fn test_update_fields_missing_id_returns_none() {
        let store = test_store().await;

        let result = store
            .update_fields(
                "no-such-id",
                UserPatch {
                    firstname: Some("Ghost".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_update_fields_empty_patch_returns_current_row() {
        let store = test_store().await;
        let user = store.insert(draft("ada@gmail.com")).await.unwrap();

        let unchanged = store
            .update_fields(&user.id, UserPatch::default())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(unchanged.email, user.email);
        assert_eq!(unchanged.firstname, user.firstname);
    }

    #[tokio::test]
    async fn test_update_fields_email_conflict() {
        let store = test_store().await;
        store.insert(draft("first@gmail.com")).await.unwrap();
        let second = store.insert(draft("second@gmail.com")).await.unwrap();

        let result = store
            .update_fields(
                &second.id,
                UserPatch {
                    email: Some("first@gmail.com".to_string()),
                    ..Default::default()
                },
            )
            .await;

        assert!(matches!(result.unwrap_err(), AuthError::EmailTaken));
    }

    #[tokio::test]
    async fn test_reset_token_set_lookup_clear() {
        let store = test_store().await;
        let user = store.insert(draft("ada@gmail.com")).await.unwrap();

        let expires_at = Utc::now() + Duration::hours(1);
        let updated = store
            .update_fields(
                &user.id,
                UserPatch {
                    reset_token: Some(ResetTokenPatch::Set {
                        token: "reset-token-abc".to_string(),
                        expires_at,
                    }),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.password_reset_token.as_deref(), Some("reset-token-abc"));
        assert!(updated.password_reset_token_expires_at.is_some());

        let found = store
            .find_by_reset_token("reset-token-abc")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, user.id);

        let cleared = store
            .update_fields(
                &user.id,
                UserPatch {
                    reset_token: Some(ResetTokenPatch::Clear),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .unwrap();

        // Both columns clear together
        assert!(cleared.password_reset_token.is_none());
        assert!(cleared.password_reset_token_expires_at.is_none());
        assert!(store
            .find_by_reset_token("reset-token-abc")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_find_by_reset_token_treats_expired_as_absent() {
        let store = test_store().await;
        let user = store.insert(draft("ada@gmail.com")).await.unwrap();

        store
            .update_fields(
                &user.id,
                UserPatch {
                    reset_token: Some(ResetTokenPatch::Set {
                        token: "stale-token".to_string(),
                        expires_at: Utc::now() - Duration::minutes(1),
                    }),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        // The token is still stored on the row but the lookup must miss
        let row = store.find_by_id(&user.id).await.unwrap().unwrap();
        assert_eq!(row.password_reset_token.as_deref(), Some("stale-token"));
        assert!(store.find_by_reset_token("stale-token").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_by_reset_token_expiry_is_per_account() {
        let store = test_store().await;
        let expired = store.insert(draft("expired@gmail.com")).await.unwrap();
        let valid = store
            .insert(UserDraft {
                email: "valid@gmail.com".to_string(),
                password_hash: "stored-hash".to_string(),
                firstname: None,
                lastname: None,
            })
            .await
            .unwrap();

        // Identical token bytes on both rows; only one is still live
        for (id, expires_at) in [
            (&expired.id, Utc::now() - Duration::minutes(1)),
            (&valid.id, Utc::now() + Duration::hours(1)),
        ] {
            store
                .update_fields(
                    id,
                    UserPatch {
                        reset_token: Some(ResetTokenPatch::Set {
                            token: "shared-token".to_string(),
                            expires_at,
                        }),
                        ..Default::default()
                    },
                )
                .await
                .unwrap();
        }

        let found = store
            .find_by_reset_token("shared-token")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, valid.id);
    }

    #[tokio::test]
    async fn test_delete_cascade_removes_owned_records() {
        let store = test_store().await;
        let user = store.insert(draft("ada@gmail.com")).await.unwrap();
        seed_owned_records(&store, &user.id).await;
        assert_eq!(count_owned_records(&store, &user.id).await, 2);

        let deleted = store.delete_cascade(&user.id).await.unwrap();

        assert!(deleted);
        assert!(store.find_by_id(&user.id).await.unwrap().is_none());
        assert_eq!(count_owned_records(&store, &user.id).await, 0);
    }

    #[tokio::test]
    async fn test_delete_cascade_missing_account() {
        let store = test_store().await;

        let deleted = store.delete_cascade("no-such-id").await.unwrap();
        assert!(!deleted);
    }

    #[tokio::test]
    async fn test_list_and_count_with_search() {
        let store = test_store().await;
        store.insert(draft("ada@gmail.com")).await.unwrap();
        store
            .insert(UserDraft {
                email: "grace@yahoo.com".to_string(),
                password_hash: "stored-hash".to_string(),
                firstname: Some("Grace".to_string()),
                lastname: Some("Hopper".to_string()),
            })
            .await
            .unwrap();

        let all = store.list(0, 10, None).await.unwrap();
        assert_eq!(all.len(), 2);
        // Ordered by email
        assert_eq!(all[0].email, "ada@gmail.com");

        let matched = store.list(0, 10, Some("grace")).await.unwrap();
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].email, "grace@yahoo.com");

        // Search also matches profile names, case-insensitively
        let by_name = store.list(0, 10, Some("hopper")).await.unwrap();
        assert_eq!(by_name.len(), 1);

        assert_eq!(store.count(None).await.unwrap(), 2);
        assert_eq!(store.count(Some("gmail")).await.unwrap(), 1);

        // Pagination
        let page = store.list(1, 10, None).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].email, "grace@yahoo.com");
    }
}
