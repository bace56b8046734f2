use std::path::{Path, PathBuf};

use log::info;

use crate::{
    cache,
    git::GitWorkingCopy,
    model::UpgradeRequest,
    publish::{PublishError, Published, TemplatePublisher},
};

mod builder;

pub use builder::CatalogPublisherBuilder;

/// Entry point used by the command line: a [`TemplatePublisher`] over libgit2
/// with a fixed cache directory.
pub struct CatalogPublisher {
    publisher: TemplatePublisher<GitWorkingCopy>,
    cache_directory: PathBuf,
    default_branch: String,
}

impl CatalogPublisher {
    pub fn builder() -> CatalogPublisherBuilder {
        CatalogPublisherBuilder::default()
    }

    pub fn cache_directory(&self) -> &Path {
        &self.cache_directory
    }

    pub fn default_branch(&self) -> &str {
        &self.default_branch
    }

    /// Publishes a new version of a template
    pub fn publish(&self, request: &UpgradeRequest) -> Result<Published, PublishError> {
        self.publisher.publish(request)
    }

    /// Syncs the repository and returns the latest version of a template
    pub fn latest_version(&self, request: &UpgradeRequest) -> Result<Option<u64>, PublishError> {
        self.publisher.latest_version(request)
    }

    /// Location of the working copy for a repository and branch
    pub fn cache_path(&self, remote_url: &str, branch: &str) -> PathBuf {
        cache::entry_path(&self.cache_directory, remote_url, branch)
    }

    /// Removes every cached working copy
    pub fn clear_cache(&self) -> std::io::Result<()> {
        if self.cache_directory.exists() {
            info!(
                "Clearing catalog repository cache {}.",
                self.cache_directory.display()
            );
            std::fs::remove_dir_all(&self.cache_directory)?;
        }
        Ok(())
    }
}
