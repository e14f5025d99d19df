//! Administrator accounts and the rules for who may change what.
//! Used by: state, handlers::admin.

use std::collections::HashSet;

use parking_lot::RwLock;

use crate::config::Config;
use crate::error::{Error, Result};

/// Regular administrators share one password; the super administrator has
/// its own and is the only one who can grant or revoke administrators.
pub struct AdminDirectory {
    super_account: String,
    super_password: String,
    admin_password: String,
    accounts: RwLock<HashSet<String>>,
    protected: HashSet<String>,
}

impl AdminDirectory {
    pub fn new(config: &Config) -> Self {
        let accounts = HashSet::from([config.super_admin_account.clone()]);
        Self {
            super_account: config.super_admin_account.clone(),
            super_password: config.super_admin_password.clone(),
            admin_password: config.admin_password.clone(),
            accounts: RwLock::new(accounts),
            protected: config.protected_identities.iter().cloned().collect(),
        }
    }

    pub fn is_admin(&self, name: &str) -> bool {
        self.accounts.read().contains(name)
    }

    /// Checks that `account` may change the override of `target`.
    pub fn authorize_set_access(&self, account: &str, password: &str, target: &str) -> Result<()> {
        if !self.is_admin(account) || password != self.admin_password {
            return Err(Error::Unauthorized);
        }
        if self.protected.contains(target) {
            return Err(Error::Forbidden("protected client".into()));
        }
        if self.is_admin(target) && account != self.super_account {
            return Err(Error::Forbidden("target is an administrator".into()));
        }
        Ok(())
    }

    /// Grants or revokes administrator rights for `name`.
    pub fn set_admin(&self, account: &str, password: &str, name: &str, is_admin: bool) -> Result<()> {
        if account != self.super_account || password != self.super_password {
            return Err(Error::Unauthorized);
        }
        if name == self.super_account {
            return Err(Error::Forbidden("target is the super administrator".into()));
        }
        if name.is_empty() {
            return Err(Error::Validation("name must not be empty".into()));
        }
        let mut accounts = self.accounts.write();
        if is_admin {
            accounts.insert(name.to_owned());
        } else {
            accounts.remove(name);
        }
        Ok(())
    }
}
