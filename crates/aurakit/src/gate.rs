//! PIN gate for the members area.
//!
//! This is a content reveal, not authentication: the PIN is a shared constant
//! and nothing rate-limits guesses.

use crate::store::{FlagStore, StorageKey};
use derive_more::{AsRef, Deref, Display, From, Into};
use serde::{Deserialize, Serialize};

pub const STORAGE_KEY: &str = "usersAccessGranted";
pub const DEFAULT_PIN: &str = "2233";
pub const PIN_QUERY_PARAM: &str = "pin";
pub const INVALID_PIN_MESSAGE: &str = "PIN incorrecto.";

const GRANTED_VALUE: &str = "true";

#[derive(
    Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, Deref, From, Into, AsRef,
)]
#[serde(transparent)]
pub struct Pin(String);

crate::impl_string_newtype!(Pin);

impl Default for Pin {
    fn default() -> Self {
        Self::new(DEFAULT_PIN)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessOutcome {
    Granted,
    Denied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BypassOutcome {
    Granted,
    NoOp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AccessState {
    pub granted: bool,
}

/// Strips everything but ASCII digits, the way the PIN field filters keystrokes.
pub fn sanitize_pin_input(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Extracts the value of `name` from a query string. A leading `?` is accepted.
pub fn query_param(query: &str, name: &str) -> Option<String> {
    let query = query.trim().trim_start_matches('?');
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.into_owned())
}

pub struct Gate<S: FlagStore> {
    store: S,
    pin: Pin,
    key: StorageKey,
    state: AccessState,
    error: Option<String>,
    persistent: bool,
}

impl<S: FlagStore> Gate<S> {
    /// Builds the gate and restores its state: a matching `pin` in `query`
    /// wins, otherwise the persisted flag decides.
    pub fn mount(store: S, pin: Pin, query: Option<&str>) -> Self {
        let mut gate = Self {
            store,
            pin,
            key: StorageKey::new(STORAGE_KEY),
            state: AccessState::default(),
            error: None,
            persistent: true,
        };

        let bypassed = query
            .map(|q| gate.check_url_bypass(q) == BypassOutcome::Granted)
            .unwrap_or(false);

        if !bypassed {
            match gate.store.read(&gate.key) {
                Ok(value) => gate.state.granted = value.as_deref() == Some(GRANTED_VALUE),
                Err(e) => gate.degrade(&e),
            }
        }

        gate
    }

    pub fn check_access(&mut self, pin_input: &str) -> AccessOutcome {
        if pin_input.trim() == self.pin.as_str() {
            self.grant();
            AccessOutcome::Granted
        } else {
            log::debug!("Rejected PIN entry");
            self.error = Some(INVALID_PIN_MESSAGE.to_string());
            AccessOutcome::Denied
        }
    }

    pub fn check_url_bypass(&mut self, query: &str) -> BypassOutcome {
        match query_param(query, PIN_QUERY_PARAM) {
            Some(value) if value == self.pin.as_str() => {
                self.grant();
                BypassOutcome::Granted
            }
            _ => BypassOutcome::NoOp,
        }
    }

    pub fn logout(&mut self) {
        if let Err(e) = self.store.remove(&self.key) {
            self.degrade(&e);
        }
        self.state.granted = false;
        self.error = None;
    }

    /// Replaces the valid PIN without touching the current access state.
    pub fn set_pin(&mut self, pin: Pin) {
        self.pin = pin;
    }

    pub fn is_granted(&self) -> bool {
        self.state.granted
    }

    pub fn state(&self) -> AccessState {
        self.state
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// `false` once storage has failed; the grant then only lasts for this run.
    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    fn grant(&mut self) {
        if let Err(e) = self.store.write(&self.key, GRANTED_VALUE) {
            self.degrade(&e);
        }
        self.state.granted = true;
        self.error = None;
    }

    fn degrade(&mut self, err: &crate::store::StoreError) {
        if self.persistent {
            log::warn!("Access flag storage unavailable, keeping session-only state: {}", err);
        }
        self.persistent = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{DisabledStore, FileStore, MemoryStore};

    fn gate() -> Gate<MemoryStore> {
        Gate::mount(MemoryStore::new(), Pin::new("2233"), None)
    }

    #[test]
    fn test_pin_entry() {
        let mut g = gate();
        assert!(!g.is_granted());

        assert_eq!(g.check_access("2234"), AccessOutcome::Denied);
        assert!(!g.is_granted());
        assert_eq!(g.error(), Some(INVALID_PIN_MESSAGE));

        assert_eq!(g.check_access(" 2233 "), AccessOutcome::Granted);
        assert!(g.is_granted());
        assert_eq!(g.error(), None);
    }

    #[test]
    fn test_exact_pin_grants_and_persists() {
        let mut g = gate();
        assert_eq!(g.check_access("2233"), AccessOutcome::Granted);

        let key = StorageKey::new(STORAGE_KEY);
        assert_eq!(g.store().read(&key).unwrap().as_deref(), Some("true"));

        let remounted = Gate::mount(g.into_store(), Pin::new("2233"), None);
        assert!(remounted.is_granted());
    }

    #[test]
    fn test_denied_entries_leave_state_locked() {
        let mut g = gate();
        for input in ["", "22", "22330", "abcd", "2 233"] {
            assert_eq!(g.check_access(input), AccessOutcome::Denied);
            assert!(!g.is_granted());
            assert!(g.error().is_some_and(|e| !e.is_empty()));
        }
    }

    #[test]
    fn test_url_bypass_on_mount() {
        let g = Gate::mount(MemoryStore::new(), Pin::new("2233"), Some("?pin=2233"));
        assert!(g.is_granted());
        let key = StorageKey::new(STORAGE_KEY);
        assert_eq!(g.store().read(&key).unwrap().as_deref(), Some("true"));

        let g = Gate::mount(
            MemoryStore::new(),
            Pin::new("2233"),
            Some("mode=sesion&pin=9999"),
        );
        assert!(!g.is_granted());
    }

    #[test]
    fn test_url_bypass_is_noop_when_missing() {
        let mut g = gate();
        assert_eq!(g.check_url_bypass("?mode=consulta"), BypassOutcome::NoOp);
        assert_eq!(g.check_url_bypass(""), BypassOutcome::NoOp);
        assert!(!g.is_granted());
        assert_eq!(g.check_url_bypass("msg=hola&pin=2233"), BypassOutcome::Granted);
        assert!(g.is_granted());
    }

    #[test]
    fn test_logout_clears_persisted_grant() {
        let mut g = gate();
        g.check_access("2233");
        g.logout();
        assert!(!g.is_granted());

        let remounted = Gate::mount(g.into_store(), Pin::new("2233"), None);
        assert!(!remounted.is_granted());
    }

    #[test]
    fn test_disabled_storage_degrades_to_session() {
        let mut g = Gate::mount(DisabledStore, Pin::new("2233"), None);
        assert!(!g.is_granted());
        assert!(!g.is_persistent());

        assert_eq!(g.check_access("2233"), AccessOutcome::Granted);
        assert!(g.is_granted());
        // degrading is silent
        assert_eq!(g.error(), None);
        g.logout();
        assert!(!g.is_granted());

        let g = Gate::mount(DisabledStore, Pin::new("2233"), Some("pin=2233"));
        assert!(g.is_granted());
    }

    #[test]
    fn test_file_backed_gate_survives_remount() {
        let dir = crate::store::scratch_dir("gate");
        let mut g = Gate::mount(FileStore::new(&dir), Pin::default(), None);
        g.check_access("2233");
        assert!(g.is_persistent());

        let g = Gate::mount(FileStore::new(&dir), Pin::default(), None);
        assert!(g.is_granted());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_sanitize_pin_input() {
        assert_eq!(sanitize_pin_input("22a3-3 "), "2233");
        assert_eq!(sanitize_pin_input(""), "");
    }

    #[test]
    fn test_query_param_decodes() {
        assert_eq!(query_param("?msg=hola%20mundo", "msg").as_deref(), Some("hola mundo"));
        assert_eq!(query_param("a=1&b=2", "b").as_deref(), Some("2"));
        assert_eq!(query_param("a=1", "b"), None);
    }
}
