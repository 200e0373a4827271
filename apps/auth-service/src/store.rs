// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 FishPath

//! In-memory user store.
//!
//! The identity collaborator behind the authentication core: it owns user
//! records and answers subject lookups for the blocking-side interceptor.
//! Credentials are stored as per-user-salted HMAC-SHA-256 digests and
//! compared in constant time; plaintext passwords never persist beyond the
//! handler call.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;
use uuid::Uuid;

use fishpath_auth::{Identity, IdentityLookup, Role};

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("username is already taken")]
    DuplicateUsername,
}

/// A stored user. The digest is keyed by the record's own random salt.
#[derive(Debug, Clone, PartialEq)]
pub struct UserRecord {
    pub user_id: u64,
    pub username: String,
    salt: [u8; 16],
    digest: Vec<u8>,
    pub roles: Vec<Role>,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl UserRecord {
    fn new(user_id: u64, username: String, password: &str, roles: Vec<Role>) -> Self {
        let salt = *Uuid::new_v4().as_bytes();
        Self {
            user_id,
            username,
            digest: digest_password(&salt, password),
            salt,
            roles,
            enabled: true,
            created_at: Utc::now(),
            last_login: None,
        }
    }

    fn verify_password(&self, password: &str) -> bool {
        let mut mac = HmacSha256::new_from_slice(&self.salt).expect("HMAC accepts any key length");
        mac.update(password.as_bytes());
        mac.verify_slice(&self.digest).is_ok()
    }

    fn set_password(&mut self, password: &str) {
        self.salt = *Uuid::new_v4().as_bytes();
        self.digest = digest_password(&self.salt, password);
    }

    fn identity(&self) -> Identity {
        Identity::new(self.username.clone(), self.roles.clone())
    }
}

fn digest_password(salt: &[u8], password: &str) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(salt).expect("HMAC accepts any key length");
    mac.update(password.as_bytes());
    mac.finalize().into_bytes().to_vec()
}

/// Plain map-backed store; wrap in [`SharedUserStore`] for concurrent use.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: HashMap<String, UserRecord>,
    next_id: u64,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self {
            users: HashMap::new(),
            next_id: 1,
        }
    }

    /// Seed the deployment's admin account. Idempotent: an existing record
    /// with the same username is left untouched.
    pub fn seed_admin(&mut self, username: &str, password: &str) {
        if self.users.contains_key(username) {
            return;
        }
        let id = self.take_id();
        self.users.insert(
            username.to_string(),
            UserRecord::new(
                id,
                username.to_string(),
                password,
                vec![Role::Treatment, Role::Admin],
            ),
        );
    }

    /// Create a user with the default treatment role.
    pub fn register(&mut self, username: &str, password: &str) -> Result<UserRecord, StoreError> {
        if self.users.contains_key(username) {
            return Err(StoreError::DuplicateUsername);
        }
        let id = self.take_id();
        let record = UserRecord::new(id, username.to_string(), password, vec![Role::Treatment]);
        self.users.insert(username.to_string(), record.clone());
        Ok(record)
    }

    /// Validate credentials. Disabled accounts never authenticate.
    pub fn authenticate(&self, username: &str, password: &str) -> Option<UserRecord> {
        self.users
            .get(username)
            .filter(|u| u.enabled && u.verify_password(password))
            .cloned()
    }

    pub fn find_by_username(&self, username: &str) -> Option<UserRecord> {
        self.users.get(username).cloned()
    }

    pub fn find_by_id(&self, user_id: u64) -> Option<UserRecord> {
        self.users.values().find(|u| u.user_id == user_id).cloned()
    }

    pub fn list(&self) -> Vec<UserRecord> {
        let mut users: Vec<_> = self.users.values().cloned().collect();
        users.sort_by_key(|u| u.user_id);
        users
    }

    pub fn record_login(&mut self, username: &str) {
        if let Some(user) = self.users.get_mut(username) {
            user.last_login = Some(Utc::now());
        }
    }

    pub fn update_password(&mut self, user_id: u64, password: &str) -> Option<UserRecord> {
        let user = self.users.values_mut().find(|u| u.user_id == user_id)?;
        user.set_password(password);
        Some(user.clone())
    }

    /// Grant the admin role. Roles are additive; the treatment role stays.
    pub fn promote_admin(&mut self, user_id: u64) -> Option<UserRecord> {
        let user = self.users.values_mut().find(|u| u.user_id == user_id)?;
        if !user.roles.contains(&Role::Admin) {
            user.roles.push(Role::Admin);
        }
        Some(user.clone())
    }

    pub fn disable(&mut self, user_id: u64) -> Option<UserRecord> {
        let user = self.users.values_mut().find(|u| u.user_id == user_id)?;
        user.enabled = false;
        Some(user.clone())
    }

    pub fn delete(&mut self, user_id: u64) -> bool {
        let username = self
            .users
            .values()
            .find(|u| u.user_id == user_id)
            .map(|u| u.username.clone());
        match username {
            Some(username) => self.users.remove(&username).is_some(),
            None => false,
        }
    }

    fn take_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

/// Cloneable handle sharing one store across handlers and the
/// authentication middleware. Lock sections are short; handlers run on
/// worker threads where the brief block is acceptable.
#[derive(Debug, Clone, Default)]
pub struct SharedUserStore(Arc<RwLock<InMemoryUserStore>>);

impl SharedUserStore {
    pub fn new(store: InMemoryUserStore) -> Self {
        Self(Arc::new(RwLock::new(store)))
    }

    pub fn read<R>(&self, f: impl FnOnce(&InMemoryUserStore) -> R) -> R {
        f(&self.0.read().expect("user store lock poisoned"))
    }

    pub fn write<R>(&self, f: impl FnOnce(&mut InMemoryUserStore) -> R) -> R {
        f(&mut self.0.write().expect("user store lock poisoned"))
    }
}

impl IdentityLookup for SharedUserStore {
    /// Subject lookup for the blocking-side interceptor. Disabled accounts
    /// resolve to no identity, so their outstanding tokens stop working.
    fn find_by_subject(&self, subject: &str) -> Option<Identity> {
        self.read(|store| {
            store
                .users
                .get(subject)
                .filter(|u| u.enabled)
                .map(UserRecord::identity)
        })
    }
}
