//! Authentication boundary, roles and session resolution.
//!
//! The backend's auth service only knows who is signed in; what they may do
//! comes from a separate user-profile document keyed by their uid. This
//! module carries the [`AuthService`] trait at that boundary, the
//! [`Role`] ladder read from the profile, [`resolve_session`] which joins the
//! two (and treats a missing profile as revoked access), and the guard
//! checks for editing documents and managing accounts.
//!
//! Role gating is advisory UI control only, never a security boundary; the
//! backend's own rules are the enforcement layer.

use crate::document::Document;
use crate::error::{Error, Result};
use crate::store::{DocumentStore, ListenerHandle};
use crate::timestamp::{self, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

/// Collection holding the user-profile documents.
pub const USERS_COLLECTION: &str = "users";

/// The role stored in a user's profile document.
///
/// Anything other than the three known strings deserializes to [`Role::User`]
/// so unknown roles behave as unprivileged viewers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Role {
    /// Full edit and delete rights over every document.
    Admin,
    /// Edit and delete rights over own documents only.
    Manager,
    /// Read-only.
    #[default]
    User,
}

impl Role {
    /// Parses the stored role string; unknown values map to `User`.
    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "Admin" => Self::Admin,
            "Manager" => Self::Manager,
            _ => Self::User,
        }
    }

    /// The stored string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "Admin",
            Self::Manager => "Manager",
            Self::User => "User",
        }
    }

    /// Whether a holder of this role may edit or delete a document owned by
    /// `owner_uid`, acting as `actor_uid`. Admins may always; managers only
    /// their own; users never.
    pub fn can_edit(&self, actor_uid: &str, owner_uid: Option<&str>) -> bool {
        match self {
            Self::Admin => true,
            Self::Manager => owner_uid == Some(actor_uid),
            Self::User => false,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Role {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from_str_lossy(&s))
    }
}

/// The authenticated identity, as the auth service reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInfo {
    /// Stable user id, the key of the profile document.
    pub uid: String,
    /// Sign-in email.
    pub email: String,
}

/// A user-profile document from the `users` collection.
///
/// `protected` marks accounts that must never be edited or deleted from the
/// admin UI. `lastLogin` is stamped on every successful sign-in; older
/// documents may hold locale-formatted strings there, which read back as
/// `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAccount {
    /// Document id; equals the auth uid.
    #[serde(default)]
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub username: String,
    /// Sign-in email.
    #[serde(default)]
    pub email: String,
    /// The stored role.
    #[serde(default)]
    pub role: Role,
    /// Whether the account is shielded from admin edits and deletes.
    #[serde(default)]
    pub protected: bool,
    /// When the account document was created.
    #[serde(default)]
    pub date_created: Timestamp,
    /// Last successful sign-in, if ever recorded in a parseable form.
    #[serde(default, deserialize_with = "timestamp::lenient_opt")]
    pub last_login: Option<Timestamp>,
}

impl UserAccount {
    /// Creates a profile with the given uid, email and role.
    pub fn new(uid: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        let email = email.into();
        Self {
            id: uid.into(),
            username: email.clone(),
            email,
            role,
            protected: false,
            date_created: Timestamp::now(),
            last_login: None,
        }
    }

    /// Marks the account protected (builder).
    pub fn with_protected(mut self) -> Self {
        self.protected = true;
        self
    }

    /// Sets the display name (builder).
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }
}

impl Document for UserAccount {
    fn id(&self) -> &str {
        &self.id
    }

    fn with_id(mut self, id: &str) -> Self {
        self.id = id.to_string();
        self
    }

    fn search_fields(&self) -> Vec<&str> {
        vec![&self.username, &self.email, self.role.as_str()]
    }

    fn created_at(&self) -> Timestamp {
        self.date_created
    }

    fn modified_at(&self) -> Timestamp {
        self.last_login.unwrap_or(self.date_created)
    }
}

impl fmt::Display for UserAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.username)
    }
}

/// Callback invoked whenever the signed-in user changes; `None` on sign-out.
pub type AuthStateFn = Arc<dyn Fn(Option<UserInfo>) + Send + Sync>;

/// The authentication service boundary.
pub trait AuthService: Send + Sync {
    /// The currently signed-in user, if any.
    fn current_user(&self) -> Option<UserInfo>;

    /// Attempts a credential sign-in.
    fn sign_in(&self, email: &str, password: &str) -> Result<UserInfo>;

    /// Signs the current user out.
    fn sign_out(&self);

    /// Registers for auth-state changes. The callback fires immediately with
    /// the current state and again on every change until the handle is
    /// released.
    fn on_auth_state_changed(&self, callback: AuthStateFn) -> ListenerHandle;
}

/// A resolved session: the authenticated identity joined with its profile.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    /// The authenticated identity.
    pub user: UserInfo,
    /// Role read from the profile document.
    pub role: Role,
}

impl Session {
    /// Whether this session may edit or delete a document owned by
    /// `owner_uid`. Advisory gating only.
    pub fn can_edit(&self, owner_uid: Option<&str>) -> bool {
        self.role.can_edit(&self.user.uid, owner_uid)
    }
}

/// Joins the signed-in user with their profile document.
///
/// Looks up the profile keyed by the auth uid, stamps `lastLogin`, and
/// returns the session. A signed-in user without a profile document has had
/// access revoked: the result is [`Error::Unauthorized`] and the user is
/// signed out. No one signed in is also `Unauthorized`.
pub fn resolve_session(
    auth: &dyn AuthService,
    store: &dyn DocumentStore<UserAccount>,
) -> Result<Session> {
    let user = auth
        .current_user()
        .ok_or_else(|| Error::unauthorized("No user is signed in."))?;

    let mut account = match store.get_one(USERS_COLLECTION, &user.uid) {
        Ok(account) => account,
        Err(Error::NotFound(_)) => {
            auth.sign_out();
            return Err(Error::unauthorized(
                "User not found. Access may have been revoked.",
            ));
        }
        Err(e) => return Err(e),
    };

    account.last_login = Some(Timestamp::now());
    let role = account.role;
    store.update_one(USERS_COLLECTION, &user.uid, account)?;

    Ok(Session { user, role })
}

/// Caches the resolved session for the process lifetime, mirroring the
/// session-storage cache the admin pages keep between navigations.
#[derive(Default)]
pub struct SessionCache {
    session: Mutex<Option<Session>>,
}

impl SessionCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached session, resolving and caching it on first use.
    pub fn get_or_resolve(
        &self,
        auth: &dyn AuthService,
        store: &dyn DocumentStore<UserAccount>,
    ) -> Result<Session> {
        let mut slot = lock(&self.session);
        if let Some(session) = slot.as_ref() {
            return Ok(session.clone());
        }
        let session = resolve_session(auth, store)?;
        *slot = Some(session.clone());
        Ok(session)
    }

    /// Drops the cached session, forcing the next call to resolve again.
    pub fn clear(&self) {
        lock(&self.session).take();
    }
}

/// Refuses edits to protected accounts.
pub fn check_account_edit(target: &UserAccount) -> Result<()> {
    if target.protected {
        return Err(Error::unauthorized("This admin account is protected."));
    }
    Ok(())
}

/// Refuses deleting protected accounts and a session's own account.
pub fn check_account_delete(session: &Session, target: &UserAccount) -> Result<()> {
    if target.protected {
        return Err(Error::unauthorized(
            "This account is protected and cannot be deleted.",
        ));
    }
    if target.id == session.user.uid {
        return Err(Error::unauthorized("You cannot delete your own account."));
    }
    Ok(())
}

struct MemoryAuthInner {
    accounts: Mutex<Vec<(String, String, String)>>, // email, password, uid
    current: Mutex<Option<UserInfo>>,
    listeners: Mutex<Vec<(u64, AuthStateFn)>>,
    next_listener_id: std::sync::atomic::AtomicU64,
}

/// In-process [`AuthService`] used by tests and headless embedding.
#[derive(Clone)]
pub struct MemoryAuth {
    inner: Arc<MemoryAuthInner>,
}

impl Default for MemoryAuth {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryAuth {
    /// Creates a service with no registered users.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MemoryAuthInner {
                accounts: Mutex::new(Vec::new()),
                current: Mutex::new(None),
                listeners: Mutex::new(Vec::new()),
                next_listener_id: std::sync::atomic::AtomicU64::new(1),
            }),
        }
    }

    /// Registers a user that can sign in.
    pub fn register(&self, email: &str, password: &str, uid: &str) {
        lock(&self.inner.accounts).push((email.to_string(), password.to_string(), uid.to_string()));
    }

    /// Signs a registered user in directly, bypassing the password check.
    pub fn force_sign_in(&self, uid: &str, email: &str) {
        let user = UserInfo {
            uid: uid.to_string(),
            email: email.to_string(),
        };
        *lock(&self.inner.current) = Some(user);
        self.notify();
    }

    fn notify(&self) {
        let current = lock(&self.inner.current).clone();
        let callbacks: Vec<AuthStateFn> = lock(&self.inner.listeners)
            .iter()
            .map(|(_, f)| Arc::clone(f))
            .collect();
        for callback in callbacks {
            callback(current.clone());
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl AuthService for MemoryAuth {
    fn current_user(&self) -> Option<UserInfo> {
        lock(&self.inner.current).clone()
    }

    fn sign_in(&self, email: &str, password: &str) -> Result<UserInfo> {
        let uid = lock(&self.inner.accounts)
            .iter()
            .find(|(e, p, _)| e == email && p == password)
            .map(|(_, _, uid)| uid.clone())
            .ok_or_else(|| Error::unauthorized("Incorrect email or password."))?;
        let user = UserInfo {
            uid,
            email: email.to_string(),
        };
        *lock(&self.inner.current) = Some(user.clone());
        self.notify();
        Ok(user)
    }

    fn sign_out(&self) {
        lock(&self.inner.current).take();
        self.notify();
    }

    fn on_auth_state_changed(&self, callback: AuthStateFn) -> ListenerHandle {
        let id = self
            .inner
            .next_listener_id
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        lock(&self.inner.listeners).push((id, Arc::clone(&callback)));
        callback(lock(&self.inner.current).clone());

        let inner = Arc::clone(&self.inner);
        ListenerHandle::new(Box::new(move || {
            lock(&inner.listeners).retain(|(lid, _)| *lid != id);
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn setup(role: Role) -> (MemoryAuth, MemoryStore<UserAccount>) {
        let auth = MemoryAuth::new();
        auth.register("admin@example.org", "hunter2", "u-1");
        let store = MemoryStore::new();
        store.seed(
            USERS_COLLECTION,
            vec![UserAccount::new("u-1", "admin@example.org", role)],
        );
        (auth, store)
    }

    #[test]
    fn test_role_string_round_trip_and_lossy_parse() {
        assert_eq!(Role::from_str_lossy("Admin"), Role::Admin);
        assert_eq!(Role::from_str_lossy("Manager"), Role::Manager);
        assert_eq!(Role::from_str_lossy("User"), Role::User);
        assert_eq!(Role::from_str_lossy("superuser"), Role::User);

        let parsed: Role = serde_json::from_str("\"Manager\"").unwrap();
        assert_eq!(parsed, Role::Manager);
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"Admin\"");
    }

    #[test]
    fn test_can_edit_truth_table() {
        // (role, owner, expected)
        let cases = [
            (Role::Admin, Some("someone-else"), true),
            (Role::Admin, None, true),
            (Role::Manager, Some("me"), true),
            (Role::Manager, Some("someone-else"), false),
            (Role::Manager, None, false),
            (Role::User, Some("me"), false),
        ];
        for (role, owner, expected) in cases {
            assert_eq!(
                role.can_edit("me", owner),
                expected,
                "{role} editing doc owned by {owner:?}"
            );
        }
    }

    #[test]
    fn test_resolve_session_stamps_last_login() {
        let (auth, store) = setup(Role::Manager);
        auth.sign_in("admin@example.org", "hunter2").unwrap();
        let session = resolve_session(&auth, &store).unwrap();
        assert_eq!(session.role, Role::Manager);
        assert_eq!(session.user.uid, "u-1");

        let stored = store.get_one(USERS_COLLECTION, "u-1").unwrap();
        assert!(stored.last_login.is_some(), "lastLogin must be stamped");
    }

    #[test]
    fn test_missing_profile_is_revoked_and_signs_out() {
        let auth = MemoryAuth::new();
        auth.force_sign_in("ghost", "ghost@example.org");
        let store: MemoryStore<UserAccount> = MemoryStore::new();

        let err = resolve_session(&auth, &store).unwrap_err();
        assert!(matches!(err, Error::Unauthorized(_)));
        assert!(err.to_string().contains("revoked"));
        assert!(auth.current_user().is_none(), "revoked user is signed out");
    }

    #[test]
    fn test_no_user_is_unauthorized() {
        let (auth, store) = setup(Role::Admin);
        assert!(matches!(
            resolve_session(&auth, &store),
            Err(Error::Unauthorized(_))
        ));
    }

    #[test]
    fn test_wrong_password_rejected() {
        let (auth, _) = setup(Role::Admin);
        assert!(auth.sign_in("admin@example.org", "wrong").is_err());
        assert!(auth.current_user().is_none());
    }

    #[test]
    fn test_session_cache_resolves_once() {
        let (auth, store) = setup(Role::Admin);
        auth.sign_in("admin@example.org", "hunter2").unwrap();

        let cache = SessionCache::new();
        let first = cache.get_or_resolve(&auth, &store).unwrap();
        // A store failure after caching must not matter.
        store.set_offline(true);
        let second = cache.get_or_resolve(&auth, &store).unwrap();
        assert_eq!(first, second);

        cache.clear();
        assert!(cache.get_or_resolve(&auth, &store).is_err());
    }

    #[test]
    fn test_account_guards() {
        let session = Session {
            user: UserInfo {
                uid: "u-1".to_string(),
                email: "admin@example.org".to_string(),
            },
            role: Role::Admin,
        };

        let protected = UserAccount::new("u-2", "root@example.org", Role::Admin).with_protected();
        assert!(matches!(
            check_account_edit(&protected),
            Err(Error::Unauthorized(_))
        ));
        assert!(matches!(
            check_account_delete(&session, &protected),
            Err(Error::Unauthorized(_))
        ));

        let own = UserAccount::new("u-1", "admin@example.org", Role::Admin);
        let err = check_account_delete(&session, &own).unwrap_err();
        assert!(err.to_string().contains("your own account"));

        let other = UserAccount::new("u-3", "other@example.org", Role::User);
        assert!(check_account_edit(&other).is_ok());
        assert!(check_account_delete(&session, &other).is_ok());
    }

    #[test]
    fn test_auth_state_listener_fires_and_releases() {
        let (auth, _) = setup(Role::Admin);
        let (tx, rx) = std::sync::mpsc::channel();
        let callback: AuthStateFn = Arc::new(move |user| {
            let _ = tx.send(user.is_some());
        });
        let mut handle = auth.on_auth_state_changed(callback);
        assert_eq!(rx.try_recv(), Ok(false), "immediate initial state");

        auth.sign_in("admin@example.org", "hunter2").unwrap();
        assert_eq!(rx.try_recv(), Ok(true));

        handle.unsubscribe();
        auth.sign_out();
        assert!(rx.try_recv().is_err(), "released listener must not fire");
    }

    #[test]
    fn test_lenient_last_login_in_profile_documents() {
        let json = r#"{
            "username": "admin",
            "email": "admin@example.org",
            "role": "Admin",
            "protected": true,
            "lastLogin": "8/21/2026, 10:30:00 AM"
        }"#;
        let account: UserAccount = serde_json::from_str(json).unwrap();
        assert!(account.last_login.is_none());
        assert!(account.protected);
        assert_eq!(account.role, Role::Admin);
    }
}
