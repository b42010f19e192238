//! Token/session store.
//!
//! ARCHITECTURE
//! ============
//! Four independent slots (access token, refresh token, user, role) kept in an
//! in-memory map that is always authoritative for reads. When the durable
//! backend passes the start-up probe, every write is mirrored to it and read
//! back; on open the slots are loaded from it so a session survives restarts.
//! When the probe fails the store runs memory-only until the process exits.
//!
//! TRADE-OFFS
//! ==========
//! A failed or unverifiable durable write is logged and otherwise ignored.
//! The session keeps working for this process; it just will not survive a
//! restart.
//!
//! SESSION EPOCH
//! =============
//! `begin_attempt` and `clear` bump an epoch. Async work (a login round trip,
//! a token refresh) remembers the epoch it started under and its result is
//! only committed if the epoch is unchanged, so a response arriving after a
//! logout or a newer login is dropped instead of resurrecting a dead session.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;

use super::storage::{self, StorageBackend};
use crate::models::{LoginGrant, Role, User};

pub const ACCESS_TOKEN_KEY: &str = "access_token";
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
pub const USER_KEY: &str = "user";
pub const ROLE_KEY: &str = "role";

const SLOT_KEYS: [&str; 4] = [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY, ROLE_KEY];

/// Where session writes end up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StorageMode {
    /// Mirrored to the durable backend.
    Durable,
    /// Process-local only.
    Memory,
}

#[derive(Default)]
struct Slots {
    values: HashMap<&'static str, String>,
    epoch: u64,
}

pub struct SessionStore {
    durable: Option<Box<dyn StorageBackend>>,
    slots: Mutex<Slots>,
    revision: watch::Sender<u64>,
}

impl SessionStore {
    /// Open the store on top of `backend`, probing it first.
    ///
    /// A backend that fails the probe is discarded and the store runs in
    /// [`StorageMode::Memory`].
    #[must_use]
    pub fn open(backend: Box<dyn StorageBackend>) -> Self {
        match storage::probe(backend.as_ref()) {
            Ok(()) => {
                let store = Self::with_backend(Some(backend));
                store.hydrate();
                tracing::debug!("session storage probe passed; using durable storage");
                store
            }
            Err(e) => {
                tracing::warn!(error = %e, "session storage unavailable; falling back to memory");
                Self::with_backend(None)
            }
        }
    }

    /// Memory-only store.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::with_backend(None)
    }

    fn with_backend(durable: Option<Box<dyn StorageBackend>>) -> Self {
        let (revision, _) = watch::channel(0);
        Self { durable, slots: Mutex::new(Slots::default()), revision }
    }

    fn hydrate(&self) {
        let Some(durable) = &self.durable else { return };
        let mut slots = self.lock();
        for key in SLOT_KEYS {
            match durable.get_item(key) {
                Ok(Some(value)) => {
                    slots.values.insert(key, value);
                }
                Ok(None) => {}
                Err(e) => tracing::warn!(key, error = %e, "failed to load persisted session slot"),
            }
        }
    }

    #[must_use]
    pub fn mode(&self) -> StorageMode {
        if self.durable.is_some() { StorageMode::Durable } else { StorageMode::Memory }
    }

    fn lock(&self) -> MutexGuard<'_, Slots> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // =========================================================================
    // SLOTS
    // =========================================================================

    #[must_use]
    pub fn access_token(&self) -> Option<String> {
        self.get(ACCESS_TOKEN_KEY)
    }

    pub fn set_access_token(&self, token: &str) {
        self.set(ACCESS_TOKEN_KEY, token.to_owned());
    }

    #[must_use]
    pub fn refresh_token(&self) -> Option<String> {
        self.get(REFRESH_TOKEN_KEY)
    }

    pub fn set_refresh_token(&self, token: &str) {
        self.set(REFRESH_TOKEN_KEY, token.to_owned());
    }

    /// Stored user, or `None` if absent or not decodable.
    #[must_use]
    pub fn user(&self) -> Option<User> {
        let raw = self.get(USER_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::warn!(error = %e, "stored user is not valid JSON; ignoring");
                None
            }
        }
    }

    pub fn set_user(&self, user: &User) {
        match serde_json::to_string(user) {
            Ok(raw) => self.set(USER_KEY, raw),
            Err(e) => tracing::warn!(error = %e, "failed to serialize user"),
        }
    }

    /// Stored role, or `None` if absent or not a known role.
    #[must_use]
    pub fn role(&self) -> Option<Role> {
        let raw = self.get(ROLE_KEY)?;
        match raw.parse() {
            Ok(role) => Some(role),
            Err(e) => {
                tracing::warn!(error = %e, "stored role is not recognised; ignoring");
                None
            }
        }
    }

    pub fn set_role(&self, role: Role) {
        self.set(ROLE_KEY, role.as_str().to_owned());
    }

    /// True iff a user is stored and either an access token or a role is present.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        let slots = self.lock();
        let has_user = slots
            .values
            .get(USER_KEY)
            .is_some_and(|raw| serde_json::from_str::<User>(raw).is_ok());
        let has_role = slots.values.get(ROLE_KEY).is_some_and(|raw| raw.parse::<Role>().is_ok());
        has_user && (slots.values.contains_key(ACCESS_TOKEN_KEY) || has_role)
    }

    /// Remove all four slots together and invalidate in-flight work.
    pub fn clear(&self) {
        {
            let mut slots = self.lock();
            self.clear_locked(&mut slots);
        }
        self.bump_revision();
    }

    /// [`SessionStore::clear`] only if `epoch` is still current. Returns whether it cleared.
    pub fn clear_if(&self, epoch: u64) -> bool {
        {
            let mut slots = self.lock();
            if slots.epoch != epoch {
                return false;
            }
            self.clear_locked(&mut slots);
        }
        self.bump_revision();
        true
    }

    fn clear_locked(&self, slots: &mut Slots) {
        slots.epoch += 1;
        for key in SLOT_KEYS {
            slots.values.remove(key);
            self.erase(key);
        }
    }

    // =========================================================================
    // EPOCH
    // =========================================================================

    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.lock().epoch
    }

    /// Start a login attempt. Anything started under an older epoch will no
    /// longer be committed.
    pub fn begin_attempt(&self) -> u64 {
        let mut slots = self.lock();
        slots.epoch += 1;
        slots.epoch
    }

    /// Write a login grant if `epoch` is still current. Returns whether it was written.
    pub fn commit_login(&self, epoch: u64, grant: &LoginGrant) -> bool {
        let user = match serde_json::to_string(&grant.user) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize user");
                return false;
            }
        };
        {
            let mut slots = self.lock();
            if slots.epoch != epoch {
                return false;
            }
            let entries = [
                (ACCESS_TOKEN_KEY, grant.access.clone()),
                (REFRESH_TOKEN_KEY, grant.refresh.clone()),
                (USER_KEY, user),
                (ROLE_KEY, grant.user.role.as_str().to_owned()),
            ];
            for (key, value) in entries {
                self.persist(key, &value);
                slots.values.insert(key, value);
            }
        }
        self.bump_revision();
        true
    }

    /// Replace the access token if `epoch` is still current. Returns whether it was written.
    pub fn set_access_token_if(&self, epoch: u64, token: &str) -> bool {
        {
            let mut slots = self.lock();
            if slots.epoch != epoch {
                return false;
            }
            self.persist(ACCESS_TOKEN_KEY, token);
            slots.values.insert(ACCESS_TOKEN_KEY, token.to_owned());
        }
        self.bump_revision();
        true
    }

    /// Receiver that changes on every mutation of the store.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    fn get(&self, key: &'static str) -> Option<String> {
        self.lock().values.get(key).cloned()
    }

    fn set(&self, key: &'static str, value: String) {
        {
            let mut slots = self.lock();
            self.persist(key, &value);
            slots.values.insert(key, value);
        }
        self.bump_revision();
    }

    fn persist(&self, key: &str, value: &str) {
        let Some(durable) = &self.durable else { return };
        let result = durable
            .set_item(key, value)
            .and_then(|()| storage::verify_write(durable.as_ref(), key, value));
        if let Err(e) = result {
            tracing::warn!(key, error = %e, "durable session write failed; in-memory value is authoritative");
        }
    }

    fn erase(&self, key: &str) {
        let Some(durable) = &self.durable else { return };
        if let Err(e) = durable.remove_item(key) {
            tracing::warn!(key, error = %e, "failed to remove persisted session slot");
        }
    }

    fn bump_revision(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
