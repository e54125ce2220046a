//! # User Repository
//!
//! Users, their permission rows and the one-time legacy record upgrade.
//!
//! ## Record Versions
//! ```text
//! version 1  username, name, role, legacy_password (plaintext),
//!            is_active NULL, maybe no user_permissions row
//!
//!    upgrade_legacy_records()  (startup, once)
//!       │   hash legacy_password ─► password_hash, clear legacy_password
//!       │   missing permissions  ─► defaults for role
//!       │   missing is_active    ─► true
//!       ▼
//! version 2  every field present; the domain User has no optionals
//! ```

use sqlx::{FromRow, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use linus_core::auth::{
    upgrade_record, LegacyUserRecord, StoredUser, CURRENT_RECORD_VERSION,
};
use linus_core::{Role, User, UserPermissions};

#[derive(Debug, FromRow)]
struct UserRow {
    username: String,
    name: String,
    role: Role,
    password_hash: Option<String>,
    legacy_password: Option<String>,
    is_active: Option<bool>,
    record_version: i64,
    perm_username: Option<String>,
    can_manage_inventory: Option<bool>,
    can_view_reports: Option<bool>,
    can_manage_settings: Option<bool>,
    can_manage_users: Option<bool>,
}

impl UserRow {
    fn permissions(&self) -> Option<UserPermissions> {
        self.perm_username.as_ref()?;
        Some(UserPermissions {
            can_manage_inventory: self.can_manage_inventory.unwrap_or(false),
            can_view_reports: self.can_view_reports.unwrap_or(false),
            can_manage_settings: self.can_manage_settings.unwrap_or(false),
            can_manage_users: self.can_manage_users.unwrap_or(false),
        })
    }

    fn into_legacy(self) -> LegacyUserRecord {
        let permissions = self.permissions();
        LegacyUserRecord {
            username: self.username,
            name: self.name,
            role: self.role,
            password_hash: self.password_hash,
            legacy_password: self.legacy_password,
            is_active: self.is_active,
            permissions,
            record_version: self.record_version,
        }
    }

    /// Reads an upgraded row. Fields an upgrade would have filled are read
    /// with the same defaults.
    fn into_stored(self) -> StoredUser {
        let permissions = self
            .permissions()
            .unwrap_or_else(|| UserPermissions::for_role(self.role));
        StoredUser {
            user: User {
                username: self.username,
                name: self.name,
                role: self.role,
                is_active: self.is_active.unwrap_or(true),
                permissions,
            },
            password_hash: self.password_hash,
        }
    }
}

const SELECT_USER: &str = r#"
    SELECT u.username, u.name, u.role, u.password_hash, u.legacy_password,
           u.is_active, u.record_version,
           p.username AS perm_username,
           p.can_manage_inventory, p.can_view_reports,
           p.can_manage_settings, p.can_manage_users
    FROM users u
    LEFT JOIN user_permissions p ON p.username = u.username
"#;

/// Repository for user database operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// All users ordered by username. Never includes credentials.
    pub async fn list(&self) -> DbResult<Vec<User>> {
        let rows: Vec<UserRow> = sqlx::query_as(&format!("{SELECT_USER} ORDER BY u.username"))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(|r| r.into_stored().user).collect())
    }

    /// A user with its credential, for login.
    pub async fn find(&self, username: &str) -> DbResult<Option<StoredUser>> {
        let row: Option<UserRow> = sqlx::query_as(&format!("{SELECT_USER} WHERE u.username = ?1"))
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(UserRow::into_stored))
    }

    pub async fn get(&self, username: &str) -> DbResult<Option<User>> {
        Ok(self.find(username).await?.map(|s| s.user))
    }

    /// Creates a user and its permission row.
    ///
    /// ## Errors
    /// - `UniqueViolation` when the username exists
    pub async fn create(&self, user: &User, password_hash: &str) -> DbResult<()> {
        debug!(username = %user.username, "Creating user");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO users (username, name, role, password_hash, is_active, record_version)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&user.username)
        .bind(&user.name)
        .bind(user.role)
        .bind(password_hash)
        .bind(user.is_active)
        .bind(CURRENT_RECORD_VERSION)
        .execute(&mut *tx)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::UniqueViolation {
                field,
                value: user.username.clone(),
            },
            other => other,
        })?;

        write_permissions(&mut tx, &user.username, &user.permissions).await?;

        tx.commit().await?;
        Ok(())
    }

    /// Sets the active flag.
    pub async fn set_active(&self, username: &str, active: bool) -> DbResult<()> {
        debug!(username = %username, active, "Setting user active flag");

        let result = sqlx::query("UPDATE users SET is_active = ?1 WHERE username = ?2")
            .bind(active)
            .bind(username)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", username));
        }

        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Upgrades every record below the current version. Returns how many
    /// were rewritten.
    pub async fn upgrade_legacy_records(&self) -> DbResult<usize> {
        let rows: Vec<UserRow> =
            sqlx::query_as(&format!("{SELECT_USER} WHERE u.record_version < ?1"))
                .bind(CURRENT_RECORD_VERSION)
                .fetch_all(&self.pool)
                .await?;

        if rows.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        let mut upgraded = 0;

        for row in rows {
            let stored = upgrade_record(row.into_legacy())
                .map_err(|e| DbError::Internal(e.to_string()))?;
            let user = &stored.user;

            sqlx::query(
                r#"
                UPDATE users SET
                    password_hash = ?1,
                    legacy_password = NULL,
                    is_active = ?2,
                    record_version = ?3
                WHERE username = ?4
                "#,
            )
            .bind(&stored.password_hash)
            .bind(user.is_active)
            .bind(CURRENT_RECORD_VERSION)
            .bind(&user.username)
            .execute(&mut *tx)
            .await?;

            write_permissions(&mut tx, &user.username, &user.permissions).await?;
            upgraded += 1;
        }

        tx.commit().await?;
        info!(upgraded, "Upgraded legacy user records");
        Ok(upgraded)
    }

    /// Creates the default admin when the table is empty. Returns whether a
    /// user was created.
    pub async fn ensure_default_admin(&self, name: &str, password_hash: &str) -> DbResult<bool> {
        if self.count().await? > 0 {
            return Ok(false);
        }

        let admin = User {
            username: linus_core::auth::ADMIN_USERNAME.to_string(),
            name: name.to_string(),
            role: Role::Admin,
            is_active: true,
            permissions: UserPermissions::all(),
        };
        self.create(&admin, password_hash).await?;
        info!(username = %admin.username, "Created default admin");
        Ok(true)
    }

    /// Inserts a version 1 record as older stores held them.
    pub async fn insert_legacy(
        &self,
        username: &str,
        name: &str,
        role: Role,
        plaintext_password: Option<&str>,
    ) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (username, name, role, legacy_password, record_version)
            VALUES (?1, ?2, ?3, ?4, 1)
            "#,
        )
        .bind(username)
        .bind(name)
        .bind(role)
        .bind(plaintext_password)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

async fn write_permissions(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    username: &str,
    permissions: &UserPermissions,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO user_permissions (
            username, can_manage_inventory, can_view_reports,
            can_manage_settings, can_manage_users
        ) VALUES (?1, ?2, ?3, ?4, ?5)
        ON CONFLICT(username) DO UPDATE SET
            can_manage_inventory = excluded.can_manage_inventory,
            can_view_reports = excluded.can_view_reports,
            can_manage_settings = excluded.can_manage_settings,
            can_manage_users = excluded.can_manage_users
        "#,
    )
    .bind(username)
    .bind(permissions.can_manage_inventory)
    .bind(permissions.can_view_reports)
    .bind(permissions.can_manage_settings)
    .bind(permissions.can_manage_users)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use linus_core::auth::{authenticate, hash_password, verify_password, AuthError};

    fn staff(username: &str) -> User {
        User {
            username: username.to_string(),
            name: username.to_uppercase(),
            role: Role::Staff,
            is_active: true,
            permissions: UserPermissions {
                can_view_reports: true,
                ..UserPermissions::none()
            },
        }
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.users();

        repo.create(&staff("sara"), &hash_password("pw").unwrap())
            .await
            .unwrap();

        let stored = repo.find("sara").await.unwrap().unwrap();
        assert_eq!(stored.user, staff("sara"));
        assert!(verify_password("pw", stored.password_hash.as_deref().unwrap()).unwrap());
        assert!(repo.find("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_is_conflict() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.users();
        let hash = hash_password("pw").unwrap();

        repo.create(&staff("sara"), &hash).await.unwrap();
        let err = repo.create(&staff("sara"), &hash).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { value, .. } if value == "sara"));
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_disabled_user_login_outcome() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.users();
        repo.create(&staff("ali"), &hash_password("pw").unwrap())
            .await
            .unwrap();
        repo.set_active("ali", false).await.unwrap();

        let record = repo.find("ali").await.unwrap();
        assert!(authenticate(record.as_ref(), "wrong").unwrap().is_none());
        assert!(matches!(
            authenticate(record.as_ref(), "pw"),
            Err(AuthError::AccountDisabled)
        ));
    }

    #[tokio::test]
    async fn test_upgrade_legacy_records() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.users();
        repo.insert_legacy("boss", "Boss", Role::Admin, Some("123"))
            .await
            .unwrap();
        repo.insert_legacy("clerk", "Clerk", Role::Staff, Some("abc"))
            .await
            .unwrap();

        assert_eq!(repo.upgrade_legacy_records().await.unwrap(), 2);
        assert_eq!(repo.upgrade_legacy_records().await.unwrap(), 0);

        let boss = repo.find("boss").await.unwrap().unwrap();
        assert!(boss.user.is_active);
        assert_eq!(boss.user.permissions, UserPermissions::all());
        assert!(verify_password("123", boss.password_hash.as_deref().unwrap()).unwrap());

        let clerk = repo.get("clerk").await.unwrap().unwrap();
        assert_eq!(clerk.permissions, UserPermissions::none());

        let plaintext: Option<String> =
            sqlx::query_scalar("SELECT legacy_password FROM users WHERE username = 'boss'")
                .fetch_one(db.pool())
                .await
                .unwrap();
        assert!(plaintext.is_none());
    }

    #[tokio::test]
    async fn test_default_admin_only_when_empty() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.users();
        let hash = hash_password("123").unwrap();

        assert!(repo.ensure_default_admin("Admin", &hash).await.unwrap());
        assert!(!repo.ensure_default_admin("Admin", &hash).await.unwrap());

        let admin = repo.get("admin").await.unwrap().unwrap();
        assert_eq!(admin.role, Role::Admin);
        assert_eq!(admin.permissions, UserPermissions::all());
    }
}
