//! # Authentication & Permission Gate
//!
//! Credential verification, permission checks and the one-time upgrade of
//! legacy user records.
//!
//! ## Login Outcomes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  authenticate(record, password)                                         │
//! │                                                                         │
//! │  no such user ─────────────────────────────► Ok(None)                   │
//! │  wrong password ───────────────────────────► Ok(None)                   │
//! │  password ok, is_active = false ───────────► Err(AccountDisabled)       │
//! │  password ok, is_active = true ────────────► Ok(Some(user))             │
//! │                                                                         │
//! │  The active flag is only looked at after the credentials match, so a   │
//! │  caller can tell "no match" apart from "matched but disabled".         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every path runs one Argon2 verification. Unknown users and accounts
//! without a password are checked against [`UNMATCHABLE_HASH`].
//!
//! ## Passwords
//! Argon2id PHC strings with a per-password random salt.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use ts_rs::TS;

use crate::types::{Role, User, UserPermissions};

/// Username of the distinguished administrator account.
pub const ADMIN_USERNAME: &str = "admin";

/// Record version produced by [`upgrade_record`].
pub const CURRENT_RECORD_VERSION: i64 = 2;

/// A well-formed Argon2id PHC string, at the default cost parameters, that
/// no password is known to match.
pub const UNMATCHABLE_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$1YEXU+CBV7r5e3SmaVVINw$6ooeUOMEMe3cYlYl9qtMYLeutgKzQODZCGxK9zh0iek";

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum AuthError {
    /// Credentials matched an account whose active flag is off.
    #[error("Account disabled")]
    AccountDisabled,

    /// The session lacks the permission required for the action.
    #[error("Missing permission: {0}")]
    Forbidden(Permission),

    /// The admin account cannot be deactivated.
    #[error("admin account cannot be deactivated")]
    AdminImmutable,

    /// Hashing failed or a stored hash could not be parsed.
    #[error("Password hashing failed: {0}")]
    Hashing(String),
}

pub type AuthResult<T> = Result<T, AuthError>;

// =============================================================================
// Permissions
// =============================================================================

/// A gated capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub enum Permission {
    ManageInventory,
    ViewReports,
    ManageSettings,
    ManageUsers,
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Permission::ManageInventory => "manage inventory",
            Permission::ViewReports => "view reports",
            Permission::ManageSettings => "manage settings",
            Permission::ManageUsers => "manage users",
        };
        f.write_str(label)
    }
}

impl UserPermissions {
    /// Pure read of one flag.
    pub const fn allows(&self, permission: Permission) -> bool {
        match permission {
            Permission::ManageInventory => self.can_manage_inventory,
            Permission::ViewReports => self.can_view_reports,
            Permission::ManageSettings => self.can_manage_settings,
            Permission::ManageUsers => self.can_manage_users,
        }
    }
}

impl User {
    pub fn require(&self, permission: Permission) -> AuthResult<()> {
        if self.permissions.allows(permission) {
            Ok(())
        } else {
            Err(AuthError::Forbidden(permission))
        }
    }

    pub fn is_admin_account(&self) -> bool {
        is_admin_username(&self.username)
    }
}

pub fn is_admin_username(username: &str) -> bool {
    username == ADMIN_USERNAME
}

// =============================================================================
// Password Hashing
// =============================================================================

/// Hashes a password with a fresh random salt.
pub fn hash_password(password: &str) -> AuthResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Hashing(e.to_string()))
}

/// Verifies a password against a stored PHC string.
pub fn verify_password(password: &str, stored: &str) -> AuthResult<bool> {
    let parsed = PasswordHash::new(stored).map_err(|e| AuthError::Hashing(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

// =============================================================================
// Stored Users
// =============================================================================

/// A user together with its credential, as held by the store.
///
/// `password_hash` is `None` only for accounts that never had a password;
/// such accounts cannot log in.
#[derive(Debug, Clone)]
pub struct StoredUser {
    pub user: User,
    pub password_hash: Option<String>,
}

/// Maps credentials to a user.
pub fn authenticate(record: Option<&StoredUser>, password: &str) -> AuthResult<Option<User>> {
    let Some((record, hash)) =
        record.and_then(|r| r.password_hash.as_deref().map(|hash| (r, hash)))
    else {
        verify_password(password, UNMATCHABLE_HASH)?;
        return Ok(None);
    };

    if !verify_password(password, hash)? {
        return Ok(None);
    }

    if !record.user.is_active {
        return Err(AuthError::AccountDisabled);
    }

    Ok(Some(record.user.clone()))
}

/// Rejects toggling the admin account; otherwise returns the flipped flag.
pub fn toggled_active(user: &User) -> AuthResult<bool> {
    if user.is_admin_account() {
        return Err(AuthError::AdminImmutable);
    }
    Ok(!user.is_active)
}

// =============================================================================
// Legacy Record Upgrade
// =============================================================================

/// A user row as it may exist from earlier versions of the store.
///
/// Version 1 records may hold a plaintext password, no permission set and
/// no active flag.
#[derive(Debug, Clone)]
pub struct LegacyUserRecord {
    pub username: String,
    pub name: String,
    pub role: Role,
    pub password_hash: Option<String>,
    pub legacy_password: Option<String>,
    pub is_active: Option<bool>,
    pub permissions: Option<UserPermissions>,
    pub record_version: i64,
}

impl LegacyUserRecord {
    pub fn needs_upgrade(&self) -> bool {
        self.record_version < CURRENT_RECORD_VERSION
            || self.legacy_password.is_some()
            || self.is_active.is_none()
            || self.permissions.is_none()
    }
}

/// Produces a fully-typed user from a legacy record.
///
/// - plaintext password: hashed (an existing hash wins)
/// - missing permissions: defaults for the role
/// - missing active flag: `true`
pub fn upgrade_record(record: LegacyUserRecord) -> AuthResult<StoredUser> {
    let password_hash = match (record.password_hash, record.legacy_password) {
        (Some(hash), _) => Some(hash),
        (None, Some(plain)) if !plain.is_empty() => Some(hash_password(&plain)?),
        (None, _) => None,
    };

    Ok(StoredUser {
        user: User {
            permissions: record
                .permissions
                .unwrap_or_else(|| UserPermissions::for_role(record.role)),
            is_active: record.is_active.unwrap_or(true),
            username: record.username,
            name: record.name,
            role: record.role,
        },
        password_hash,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(username: &str, password: &str, active: bool) -> StoredUser {
        StoredUser {
            user: User {
                username: username.to_string(),
                name: username.to_uppercase(),
                role: Role::Staff,
                is_active: active,
                permissions: UserPermissions::none(),
            },
            password_hash: Some(hash_password(password).unwrap()),
        }
    }

    #[test]
    fn test_hash_is_salted_and_verifies() {
        let a = hash_password("123").unwrap();
        let b = hash_password("123").unwrap();
        assert_ne!(a, b);
        assert!(verify_password("123", &a).unwrap());
        assert!(!verify_password("124", &a).unwrap());
    }

    #[test]
    fn test_authenticate_outcomes() {
        let active = stored("sara", "pw", true);
        let disabled = stored("ali", "pw", false);

        assert!(authenticate(None, "pw").unwrap().is_none());
        assert!(authenticate(Some(&active), "wrong").unwrap().is_none());
        assert_eq!(
            authenticate(Some(&active), "pw").unwrap().unwrap().username,
            "sara"
        );
        // Wrong password on a disabled account is still just "no match"
        assert!(authenticate(Some(&disabled), "wrong").unwrap().is_none());
        assert!(matches!(
            authenticate(Some(&disabled), "pw"),
            Err(AuthError::AccountDisabled)
        ));
    }

    #[test]
    fn test_unmatchable_hash_parses_at_default_cost() {
        let parsed = PasswordHash::new(UNMATCHABLE_HASH).unwrap();
        let real = hash_password("pw").unwrap();
        let real = PasswordHash::new(&real).unwrap();

        assert_eq!(parsed.algorithm, real.algorithm);
        assert_eq!(parsed.params, real.params);
        assert!(!verify_password("", UNMATCHABLE_HASH).unwrap());
        assert!(!verify_password("123", UNMATCHABLE_HASH).unwrap());
    }

    #[test]
    fn test_account_without_password_cannot_log_in() {
        let mut record = stored("nopw", "x", true);
        record.password_hash = None;
        assert!(authenticate(Some(&record), "").unwrap().is_none());
    }

    #[test]
    fn test_permission_gate() {
        let mut user = stored("sara", "pw", true).user;
        user.permissions.can_view_reports = true;

        assert!(user.require(Permission::ViewReports).is_ok());
        assert!(matches!(
            user.require(Permission::ManageUsers),
            Err(AuthError::Forbidden(Permission::ManageUsers))
        ));
    }

    #[test]
    fn test_admin_cannot_be_toggled() {
        let mut admin = stored(ADMIN_USERNAME, "pw", true).user;
        admin.role = Role::Admin;
        assert!(matches!(toggled_active(&admin), Err(AuthError::AdminImmutable)));

        let staff = stored("sara", "pw", true).user;
        assert!(!toggled_active(&staff).unwrap());
    }

    #[test]
    fn test_upgrade_legacy_record() {
        let legacy = LegacyUserRecord {
            username: "old".to_string(),
            name: "Old Timer".to_string(),
            role: Role::Admin,
            password_hash: None,
            legacy_password: Some("secret".to_string()),
            is_active: None,
            permissions: None,
            record_version: 1,
        };
        assert!(legacy.needs_upgrade());

        let upgraded = upgrade_record(legacy).unwrap();
        assert!(upgraded.user.is_active);
        assert_eq!(upgraded.user.permissions, UserPermissions::all());
        let hash = upgraded.password_hash.unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("secret", &hash).unwrap());
    }

    #[test]
    fn test_upgrade_keeps_explicit_fields() {
        let perms = UserPermissions {
            can_view_reports: true,
            ..UserPermissions::none()
        };
        let legacy = LegacyUserRecord {
            username: "s".to_string(),
            name: "S".to_string(),
            role: Role::Admin,
            password_hash: None,
            legacy_password: None,
            is_active: Some(false),
            permissions: Some(perms),
            record_version: 1,
        };

        let upgraded = upgrade_record(legacy).unwrap();
        assert!(!upgraded.user.is_active);
        assert_eq!(upgraded.user.permissions, perms);
        assert!(upgraded.password_hash.is_none());
    }
}
