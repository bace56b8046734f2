use std::{collections::HashMap, path::PathBuf};

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

use crate::git::Author;

/// Settings read from `CATALOG_PUBLISH_*` environment variables.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CatalogPublishConfig {
    pub cache_dir: Option<PathBuf>,
    pub default_branch: Option<String>,
    pub author: Author,
    pub accounts_file: Option<PathBuf>,
}

impl CatalogPublishConfig {
    pub fn load() -> anyhow::Result<Self> {
        Ok(Self::from_raw(RawConfig::load(None)?))
    }

    fn from_raw(raw_config: RawConfig) -> Self {
        let default_author = Author::default();
        let author = raw_config.git.author;
        Self {
            cache_dir: raw_config.cache.dir,
            default_branch: raw_config.git.branch,
            author: Author {
                name: author.name.unwrap_or(default_author.name),
                email: author.email.unwrap_or(default_author.email),
            },
            accounts_file: raw_config.accounts.file,
        }
    }
}

#[derive(Default, Debug, Deserialize, PartialEq, Eq)]
struct RawConfig {
    #[serde(default)]
    cache: CacheConfig,
    #[serde(default)]
    git: GitConfig,
    #[serde(default)]
    accounts: AccountsConfig,
}

#[derive(Default, Debug, Deserialize, PartialEq, Eq)]
struct CacheConfig {
    dir: Option<PathBuf>,
}

#[derive(Default, Debug, Deserialize, PartialEq, Eq)]
struct GitConfig {
    branch: Option<String>,
    #[serde(default)]
    author: AuthorConfig,
}

#[derive(Default, Debug, Deserialize, PartialEq, Eq)]
struct AuthorConfig {
    name: Option<String>,
    email: Option<String>,
}

#[derive(Default, Debug, Deserialize, PartialEq, Eq)]
struct AccountsConfig {
    file: Option<PathBuf>,
}

impl RawConfig {
    fn load(env: Option<HashMap<String, String>>) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(
                Environment::with_prefix("CATALOG_PUBLISH")
                    .separator("_")
                    .source(env),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn load_empty() {
        let env = HashMap::from([]);
        let config = RawConfig::load(Some(env)).unwrap();
        assert_eq!(config, RawConfig::default());
        assert_eq!(
            CatalogPublishConfig::from_raw(config),
            CatalogPublishConfig::default()
        );
    }

    #[test]
    fn load_environment() {
        let env = HashMap::from([
            ("CATALOG_PUBLISH_CACHE_DIR".to_owned(), "/cache".to_owned()),
            ("CATALOG_PUBLISH_GIT_BRANCH".to_owned(), "main".to_owned()),
            ("CATALOG_PUBLISH_GIT_AUTHOR_NAME".to_owned(), "ci".to_owned()),
            (
                "CATALOG_PUBLISH_ACCOUNTS_FILE".to_owned(),
                "/etc/accounts.toml".to_owned(),
            ),
        ]);
        let config = CatalogPublishConfig::from_raw(RawConfig::load(Some(env)).unwrap());
        assert_eq!(
            config,
            CatalogPublishConfig {
                cache_dir: Some("/cache".into()),
                default_branch: Some("main".to_owned()),
                author: Author {
                    name: "ci".to_owned(),
                    email: "catalog-publish@localhost".to_owned(),
                },
                accounts_file: Some("/etc/accounts.toml".into()),
            }
        )
    }
}
