//! Auth collaborator and the explicit session handed to views.
//!
//! [`LocalAuth`] keeps accounts in `<root>/accounts.json` and the signed-in
//! user in `<root>/session.json`, so a login survives between runs.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::PathBuf;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::persist::{load_json, load_json_strict, save_json};
use crate::{AuthError, Error, Result, User};

/// Sign-in provider
pub trait AuthProvider {
    fn current_user(&self) -> Option<User>;

    fn login_with_password(&mut self, email: &str, password: &str) -> Result<User>;

    fn register_with_password(&mut self, email: &str, password: &str) -> Result<User>;

    /// Sign in through an external identity provider
    fn login_with_federated_provider(&mut self) -> Result<User>;

    fn logout(&mut self) -> Result<()>;
}

/// Auth state passed explicitly into the views that need it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub user: Option<User>,
    pub loading: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            user: None,
            loading: true,
        }
    }
}

impl Session {
    /// Resolve the session against the provider's current state
    pub fn refresh<A: AuthProvider + ?Sized>(&mut self, provider: &A) {
        self.user = provider.current_user();
        self.loading = false;
    }

    pub fn resolved<A: AuthProvider + ?Sized>(provider: &A) -> Self {
        let mut session = Self::default();
        session.refresh(provider);
        session
    }

    /// The signed-in user; views behind sign-in call this first
    pub fn require_user(&self) -> Result<&User> {
        self.user.as_ref().ok_or(Error::NotSignedIn)
    }
}

// ============================================================================
// Local provider
// ============================================================================

#[derive(Clone, Debug, Serialize, Deserialize)]
struct Account {
    uid: String,
    salt: String,
    password_hash: String,
    #[serde(default)]
    failed_attempts: u32,
    #[serde(default)]
    locked_until: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
struct AccountBook {
    #[serde(default)]
    accounts: BTreeMap<String, Account>,
}

/// File-backed email/password provider
pub struct LocalAuth {
    root: PathBuf,
    policy: AuthConfig,
    current: Option<User>,
}

impl LocalAuth {
    /// Open the provider and restore any persisted session
    pub fn open(root: impl Into<PathBuf>, policy: AuthConfig) -> Result<Self> {
        let root = root.into();
        let current = load_json::<User>(&root.join("session.json"))?;
        if let Some(user) = &current {
            tracing::debug!("Restored session for {}", user.uid);
        }
        Ok(Self {
            root,
            policy,
            current,
        })
    }

    fn accounts_path(&self) -> PathBuf {
        self.root.join("accounts.json")
    }

    fn session_path(&self) -> PathBuf {
        self.root.join("session.json")
    }

    /// Account book for modification; an unreadable file is an error, never empty
    fn load_book(&self) -> Result<AccountBook> {
        Ok(load_json_strict(&self.accounts_path())?.unwrap_or_default())
    }

    fn lockout_until(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
        Duration::try_seconds(self.policy.lockout_seconds)
            .filter(|lockout| *lockout > Duration::zero())
            .and_then(|lockout| now.checked_add_signed(lockout))
            .ok_or_else(|| {
                Error::Config(format!(
                    "auth.lockout_seconds out of range: {}",
                    self.policy.lockout_seconds
                ))
            })
    }

    fn sign_in(&mut self, user: User) -> Result<User> {
        save_json(&self.session_path(), &user)?;
        tracing::info!("Signed in as {}", user.uid);
        self.current = Some(user.clone());
        Ok(user)
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    }
}

fn hash_password(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

impl AuthProvider for LocalAuth {
    fn current_user(&self) -> Option<User> {
        self.current.clone()
    }

    fn login_with_password(&mut self, email: &str, password: &str) -> Result<User> {
        let email = normalize_email(email);
        let mut book = self.load_book()?;
        let now = Utc::now();

        let Some(account) = book.accounts.get_mut(&email) else {
            return Err(AuthError::new("auth/user-not-found", "No such account").into());
        };

        if let Some(until) = account.locked_until {
            if now < until {
                tracing::warn!("Login for {} refused while locked", email);
                return Err(AuthError::new("auth/too-many-requests", "Account locked").into());
            }
            account.locked_until = None;
            account.failed_attempts = 0;
        }

        if hash_password(&account.salt, password) != account.password_hash {
            account.failed_attempts = account.failed_attempts.saturating_add(1);
            let locked = account.failed_attempts >= self.policy.max_failed_attempts;
            if locked {
                account.locked_until = Some(self.lockout_until(now)?);
                tracing::warn!("Locking {} after {} failed attempts", email, account.failed_attempts);
            }
            save_json(&self.accounts_path(), &book)?;

            let code = if locked {
                "auth/too-many-requests"
            } else {
                "auth/invalid-credential"
            };
            return Err(AuthError::new(code, "Password rejected").into());
        }

        account.failed_attempts = 0;
        let user = User {
            uid: account.uid.clone(),
            email: Some(email),
        };
        save_json(&self.accounts_path(), &book)?;
        self.sign_in(user)
    }

    fn register_with_password(&mut self, email: &str, password: &str) -> Result<User> {
        let email = normalize_email(email);
        if !plausible_email(&email) {
            return Err(AuthError::new("auth/invalid-email", "That email address is not valid.").into());
        }
        if password.chars().count() < self.policy.min_password_len {
            return Err(AuthError::new(
                "auth/weak-password",
                format!(
                    "Password should be at least {} characters.",
                    self.policy.min_password_len
                ),
            )
            .into());
        }

        let mut book = self.load_book()?;
        if book.accounts.contains_key(&email) {
            return Err(AuthError::new("auth/email-already-in-use", "Email taken").into());
        }

        let salt = Uuid::new_v4().simple().to_string();
        let account = Account {
            uid: Uuid::new_v4().simple().to_string(),
            password_hash: hash_password(&salt, password),
            salt,
            failed_attempts: 0,
            locked_until: None,
        };
        let user = User {
            uid: account.uid.clone(),
            email: Some(email.clone()),
        };
        book.accounts.insert(email, account);
        save_json(&self.accounts_path(), &book)?;

        tracing::info!("Registered account {}", user.uid);
        self.sign_in(user)
    }

    fn login_with_federated_provider(&mut self) -> Result<User> {
        Err(AuthError::new(
            "auth/operation-not-allowed",
            "Federated sign-in is not available for local accounts.",
        )
        .into())
    }

    fn logout(&mut self) -> Result<()> {
        let path = self.session_path();
        if path.exists() {
            std::fs::remove_file(&path)?;
        }
        if let Some(user) = self.current.take() {
            tracing::info!("Signed out {}", user.uid);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(root: &std::path::Path) -> LocalAuth {
        LocalAuth::open(root, AuthConfig::default()).unwrap()
    }

    fn auth_code(result: Result<User>) -> String {
        match result {
            Err(Error::Auth(err)) => err.code,
            other => panic!("expected auth error, got {:?}", other),
        }
    }

    #[test]
    fn test_register_then_login() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut auth = open(temp_dir.path());

        let registered = auth
            .register_with_password(" Ana@Example.com ", "secret1")
            .unwrap();
        assert_eq!(registered.email.as_deref(), Some("ana@example.com"));

        auth.logout().unwrap();
        assert!(auth.current_user().is_none());

        let user = auth.login_with_password("ana@example.com", "secret1").unwrap();
        assert_eq!(user.uid, registered.uid);
    }

    #[test]
    fn test_session_survives_reopen() {
        let temp_dir = tempfile::tempdir().unwrap();
        let user = open(temp_dir.path())
            .register_with_password("a@b.io", "secret1")
            .unwrap();

        let reopened = open(temp_dir.path());
        assert_eq!(reopened.current_user(), Some(user));
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut auth = open(temp_dir.path());
        auth.register_with_password("a@b.io", "secret1").unwrap();

        let code = auth_code(auth.register_with_password("A@B.io", "another1"));
        assert_eq!(code, "auth/email-already-in-use");
    }

    #[test]
    fn test_registration_validation() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut auth = open(temp_dir.path());

        assert_eq!(
            auth_code(auth.register_with_password("not-an-email", "secret1")),
            "auth/invalid-email"
        );
        assert_eq!(
            auth_code(auth.register_with_password("a@b.io", "123")),
            "auth/weak-password"
        );
    }

    #[test]
    fn test_wrong_password_and_unknown_user() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut auth = open(temp_dir.path());
        auth.register_with_password("a@b.io", "secret1").unwrap();
        auth.logout().unwrap();

        assert_eq!(
            auth_code(auth.login_with_password("a@b.io", "nope")),
            "auth/invalid-credential"
        );
        assert_eq!(
            auth_code(auth.login_with_password("x@b.io", "secret1")),
            "auth/user-not-found"
        );
        assert!(auth.current_user().is_none());
    }

    #[test]
    fn test_lockout_after_repeated_failures() {
        let temp_dir = tempfile::tempdir().unwrap();
        let policy = AuthConfig {
            max_failed_attempts: 2,
            ..AuthConfig::default()
        };
        let mut auth = LocalAuth::open(temp_dir.path(), policy).unwrap();
        auth.register_with_password("a@b.io", "secret1").unwrap();
        auth.logout().unwrap();

        assert_eq!(
            auth_code(auth.login_with_password("a@b.io", "bad")),
            "auth/invalid-credential"
        );
        assert_eq!(
            auth_code(auth.login_with_password("a@b.io", "bad")),
            "auth/too-many-requests"
        );
        // correct password still refused while locked
        assert_eq!(
            auth_code(auth.login_with_password("a@b.io", "secret1")),
            "auth/too-many-requests"
        );
    }

    #[test]
    fn test_federated_login_unavailable() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut auth = open(temp_dir.path());
        assert_eq!(
            auth_code(auth.login_with_federated_provider()),
            "auth/operation-not-allowed"
        );
    }

    #[test]
    fn test_session_require_user() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut auth = open(temp_dir.path());

        let session = Session::resolved(&auth);
        assert!(!session.loading);
        assert!(matches!(session.require_user(), Err(Error::NotSignedIn)));

        auth.register_with_password("a@b.io", "secret1").unwrap();
        let session = Session::resolved(&auth);
        assert!(session.require_user().is_ok());
    }

    #[test]
    fn test_unreadable_account_book_is_never_overwritten() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut auth = open(temp_dir.path());
        auth.register_with_password("a@b.io", "secret1").unwrap();
        auth.logout().unwrap();

        let path = temp_dir.path().join("accounts.json");
        std::fs::write(&path, "{ truncated").unwrap();

        assert!(matches!(
            auth.register_with_password("c@d.io", "secret1"),
            Err(Error::Storage(_))
        ));
        assert!(matches!(
            auth.login_with_password("a@b.io", "secret1"),
            Err(Error::Storage(_))
        ));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ truncated");
        assert!(auth.current_user().is_none());
    }

    #[test]
    fn test_out_of_range_lockout_is_an_error_not_a_panic() {
        let temp_dir = tempfile::tempdir().unwrap();
        let policy = AuthConfig {
            max_failed_attempts: 1,
            lockout_seconds: i64::MAX,
            ..AuthConfig::default()
        };
        let mut auth = LocalAuth::open(temp_dir.path(), policy).unwrap();
        auth.register_with_password("a@b.io", "secret1").unwrap();
        auth.logout().unwrap();

        assert!(matches!(
            auth.login_with_password("a@b.io", "bad"),
            Err(Error::Config(_))
        ));
        // the failed attempt was not recorded
        let mut relaxed = open(temp_dir.path());
        assert!(relaxed.login_with_password("a@b.io", "secret1").is_ok());
    }
}
