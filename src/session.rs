// 🔐 Session - Explicit login state
// Passed to whoever needs it instead of living in ambient storage.

use crate::config::AppConfig;
use anyhow::{bail, Result};
use serde::Serialize;
use std::collections::HashMap;

/// Read side of a session, as seen by screens and the host
pub trait SessionHolder {
    fn is_authenticated(&self) -> bool;
    fn current_user_label(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Session {
    authenticated: bool,
    user_label: String,
}

impl Session {
    pub fn anonymous() -> Self {
        Session::default()
    }

    pub fn authenticated(user_label: &str) -> Self {
        Session {
            authenticated: true,
            user_label: user_label.to_string(),
        }
    }

    pub fn sign_out(&mut self) {
        log::info!("Signed out {}", self.user_label);
        *self = Session::anonymous();
    }

    pub fn require_authenticated(&self) -> Result<()> {
        if !self.authenticated {
            bail!("Not signed in");
        }
        Ok(())
    }
}

impl SessionHolder for Session {
    fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    fn current_user_label(&self) -> &str {
        &self.user_label
    }
}

/// Fixed credential table checked on sign-in.
///
/// An empty table leaves the gate open: any non-blank user label signs in.
#[derive(Debug, Clone, Default)]
pub struct CredentialGate {
    users: HashMap<String, String>,
}

impl CredentialGate {
    pub fn new(users: HashMap<String, String>) -> Self {
        CredentialGate { users }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        CredentialGate::new(config.users.clone())
    }

    pub fn is_open(&self) -> bool {
        self.users.is_empty()
    }

    pub fn sign_in(&self, user: &str, password: &str) -> Result<Session> {
        let user = user.trim();
        let password = password.trim();

        if user.is_empty() {
            bail!("User is required");
        }

        if self.is_open() {
            log::warn!("No users configured, signing in {} without a password check", user);
            return Ok(Session::authenticated(user));
        }

        match self.users.get(user) {
            Some(expected) if expected == password => {
                log::info!("Signed in {}", user);
                Ok(Session::authenticated(user))
            }
            _ => {
                log::warn!("Rejected sign-in for {}", user);
                bail!("Invalid credentials")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate() -> CredentialGate {
        let mut users = HashMap::new();
        users.insert("caja1".to_string(), "123".to_string());
        users.insert("caja2".to_string(), "1234".to_string());
        CredentialGate::new(users)
    }

    #[test]
    fn test_sign_in_trims_and_checks() {
        let session = gate().sign_in("  caja1 ", " 123 ").unwrap();
        assert!(session.is_authenticated());
        assert_eq!(session.current_user_label(), "caja1");
    }

    #[test]
    fn test_sign_in_rejects_wrong_password() {
        assert!(gate().sign_in("caja1", "1234").is_err());
        assert!(gate().sign_in("nobody", "123").is_err());
        assert!(gate().sign_in("", "123").is_err());
    }

    #[test]
    fn test_sign_out_clears_session() {
        let mut session = gate().sign_in("caja2", "1234").unwrap();
        session.sign_out();
        assert!(!session.is_authenticated());
        assert_eq!(session.current_user_label(), "");
        assert!(session.require_authenticated().is_err());
    }

    #[test]
    fn test_open_gate_accepts_any_user() {
        let gate = CredentialGate::default();
        assert!(gate.is_open());
        let session = gate.sign_in("owner", "").unwrap();
        assert!(session.require_authenticated().is_ok());
    }
}
