use std::path::{Path, PathBuf};

use log::{debug, error, info};
use thiserror::Error;

use crate::{
    auth::{self, AuthError},
    cache::{self, CacheError, WorkingCopy},
    flock::{FileLock, LockError},
    model::{ParseError, TemplateName, UpgradeRequest},
    version::{self, ScanError},
};

const COMPOSE_FILE: &str = "docker-compose.yml";
const RANCHER_COMPOSE_FILE: &str = "rancher-compose.yml";
const README_FILE: &str = "README.md";

/// Phase a publish failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input; retrying without changing the request will fail again.
    Configuration,
    CacheResolution,
    Scan,
    Write,
    Push,
}

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("Invalid git credentials")]
    Credentials(#[from] AuthError),
    #[error("Invalid template")]
    Template(#[from] ParseError),
    #[error("Prepare git repo path failed")]
    Cache(#[source] CacheError),
    #[error("Lock on git repo path failed")]
    Lock(#[from] LockError),
    #[error("Get template version failed")]
    Scan(#[from] ScanError),
    #[error("Prepare new template version failed at {}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Push of template version {version} failed")]
    Push {
        version: u64,
        #[source]
        source: anyhow::Error,
    },
}

impl PublishError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PublishError::Credentials(_) | PublishError::Template(_) => ErrorKind::Configuration,
            PublishError::Cache(_) | PublishError::Lock(_) => ErrorKind::CacheResolution,
            PublishError::Scan(_) => ErrorKind::Scan,
            PublishError::Write { .. } => ErrorKind::Write,
            PublishError::Push { .. } => ErrorKind::Push,
        }
    }
}

impl From<CacheError> for PublishError {
    fn from(error: CacheError) -> Self {
        match error {
            CacheError::Auth(error) => PublishError::Credentials(error),
            other => PublishError::Cache(other),
        }
    }
}

/// Outcome of a successful publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    pub version: u64,
    pub version_path: PathBuf,
    /// Head of the branch the version was built on.
    pub base_commit: String,
}

/// Version chosen for a template, not created yet.
struct PendingVersion {
    name: TemplateName,
    template_path: PathBuf,
    version: u64,
    base_commit: String,
}

/// Writes new template versions into cached working copies and pushes them.
///
/// Publishes of the same repository and branch are serialised through a lock
/// file next to the cache entry. A failed push leaves the written version in
/// the working copy; the next sync with the remote discards it.
pub struct TemplatePublisher<W> {
    working_copy: W,
}

impl<W: WorkingCopy> TemplatePublisher<W> {
    pub fn new(working_copy: W) -> TemplatePublisher<W> {
        TemplatePublisher { working_copy }
    }

    pub fn publish(&self, request: &UpgradeRequest) -> Result<Published, PublishError> {
        let name = TemplateName::parse(&request.template_folder_name)?;
        let _lock = self.lock(request)?;
        let pending = self.pending_version(request, name)?;
        self.publish_version(request, pending)
    }

    /// Latest version of the requested template after syncing the cache, ignoring contents.
    pub fn latest_version(&self, request: &UpgradeRequest) -> Result<Option<u64>, PublishError> {
        let name = TemplateName::parse(&request.template_folder_name)?;
        let _lock = self.lock(request)?;
        let repository = cache::resolve(
            &self.working_copy,
            &request.cache_root_path,
            &request.remote_url,
            request.branch(),
            &request.credential_user,
            &request.credential_token,
        )?;
        let template_path = request.template_path(&repository.path, &name);
        Ok(version::latest_version(&template_path)?)
    }

    fn lock(&self, request: &UpgradeRequest) -> Result<FileLock, PublishError> {
        let root = &request.cache_root_path;
        std::fs::create_dir_all(root).map_err(|source| CacheError::CreateDir {
            path: root.clone(),
            source,
        })?;
        Ok(FileLock::new(&cache::lock_path(
            root,
            &request.remote_url,
            request.branch(),
        ))?)
    }

    /// Syncs the cache and picks the version following the latest one.
    fn pending_version(
        &self,
        request: &UpgradeRequest,
        name: TemplateName,
    ) -> Result<PendingVersion, PublishError> {
        let repository = cache::resolve(
            &self.working_copy,
            &request.cache_root_path,
            &request.remote_url,
            request.branch(),
            &request.credential_user,
            &request.credential_token,
        )
        .map_err(|e| {
            error!("Prepare git repo path got error: {}", e);
            e
        })?;
        debug!("Cache resolved at commit {}", repository.head_commit);

        let template_path = request.template_path(&repository.path, &name);
        let latest = version::latest_version(&template_path)?;
        let version = version::next_version(&template_path, latest)?;
        debug!(
            "Latest version of {} is {:?}, publishing {}",
            name.value, latest, version
        );

        Ok(PendingVersion {
            name,
            template_path,
            version,
            base_commit: repository.head_commit,
        })
    }

    /// Creates the pending version directory, fills it and pushes it.
    fn publish_version(
        &self,
        request: &UpgradeRequest,
        pending: PendingVersion,
    ) -> Result<Published, PublishError> {
        let PendingVersion {
            name,
            template_path,
            version,
            base_commit,
        } = pending;
        let version_path = template_path.join(version.to_string());
        std::fs::create_dir(&version_path).map_err(|source| write_error(&version_path, source))?;

        write_file(&version_path.join(COMPOSE_FILE), &request.compose_content)?;
        write_file(
            &version_path.join(RANCHER_COMPOSE_FILE),
            &request.rancher_compose_content,
        )?;
        if let Some(readme) = request.readme() {
            write_file(&version_path.join(README_FILE), readme)?;
        }

        let url = auth::authenticated_url(
            &request.remote_url,
            &request.credential_user,
            &request.credential_token,
        )?;
        let message = format!("Upgrade template {} to version {}", name.value, version);
        self.working_copy
            .push(&template_path, &url, request.branch(), &message)
            .map_err(|source| {
                error!(
                    "Push of {} version {} failed: {:#}",
                    name.value, version, source
                );
                PublishError::Push { version, source }
            })?;
        info!(
            "Published {} version {} to {} ({})",
            name.value,
            version,
            request.remote_url,
            request.branch()
        );

        Ok(Published {
            version,
            version_path,
            base_commit,
        })
    }
}

fn write_file(path: &Path, contents: &str) -> Result<(), PublishError> {
    std::fs::write(path, contents).map_err(|source| write_error(path, source))
}

fn write_error(path: &Path, source: std::io::Error) -> PublishError {
    error!(
        "Prepare new template version got error at {}: {}",
        path.display(),
        source
    );
    PublishError::Write {
        path: path.to_path_buf(),
        source,
    }
}
