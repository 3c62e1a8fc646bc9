//! Administrator sessions.
//!
//! Mutating catalog operations take a [`Session`] and check it with
//! [`require_admin`] before touching the store.

use log::{info, warn};

use crate::error::{Error, Result};
use crate::settings::AdminSettings;

/// Who is acting. Anonymous sessions may browse and export only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Session {
    admin_logged_in: bool,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Check `username`/`password` against the configured administrator.
    pub fn login(admin: &AdminSettings, username: &str, password: &str) -> Result<Self> {
        if username == admin.username && password == admin.password {
            info!("Admin '{username}' logged in");
            Ok(Self {
                admin_logged_in: true,
            })
        } else {
            warn!("Rejected login for '{username}'");
            Err(Error::Unauthorized)
        }
    }

    pub fn is_admin(&self) -> bool {
        self.admin_logged_in
    }

    pub fn logout(&mut self) {
        self.admin_logged_in = false;
    }
}

pub fn require_admin(session: &Session) -> Result<()> {
    if session.is_admin() {
        Ok(())
    } else {
        Err(Error::Unauthorized)
    }
}
