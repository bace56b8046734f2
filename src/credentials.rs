use std::{collections::HashMap, path::Path};

use log::debug;
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LookupError {
    #[error("Cannot find authed account '{0}'")]
    UnknownAccount(String),
    #[error("IO error reading accounts file")]
    IO(#[from] std::io::Error),
    #[error("TOML parsing error")]
    Toml(#[from] toml::de::Error),
}

/// Source of stored access tokens.
pub trait CredentialLookup {
    fn token(&self, account: &str) -> Result<String, LookupError>;
}

/// Accounts read from a toml file:
///
/// ```toml
/// [accounts]
/// "github:alice" = "ghp_..."
/// ```
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
pub struct AccountsFile {
    #[serde(default)]
    accounts: HashMap<String, String>,
}

impl AccountsFile {
    pub fn from_file(path: &Path) -> Result<AccountsFile, LookupError> {
        debug!("Loading accounts from {}", path.display());
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(data: &str) -> Result<AccountsFile, LookupError> {
        Ok(toml::from_str(data)?)
    }
}

impl CredentialLookup for AccountsFile {
    fn token(&self, account: &str) -> Result<String, LookupError> {
        self.accounts
            .get(account)
            .cloned()
            .ok_or_else(|| LookupError::UnknownAccount(account.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn finds_registered_account() {
        let accounts = AccountsFile::from_toml_str(
            r#"
            [accounts]
            "github:alice" = "tok-a"
            "gitlab:bob" = "tok-b"
        "#,
        )
        .unwrap();
        assert_eq!(accounts.token("gitlab:bob").unwrap(), "tok-b");
    }

    #[test]
    fn unknown_account_is_an_error() {
        let accounts = AccountsFile::from_toml_str("").unwrap();
        let error = accounts.token("github:carol").unwrap_err();
        assert!(
            matches!(error, LookupError::UnknownAccount(account) if account == "github:carol")
        );
    }

    #[test]
    fn reads_accounts_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accounts.toml");
        std::fs::write(&path, "[accounts]\n\"github:alice\" = \"tok\"\n").unwrap();
        let accounts = AccountsFile::from_file(&path).unwrap();
        assert_eq!(accounts.token("github:alice").unwrap(), "tok");
    }
}
