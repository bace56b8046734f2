use std::{cell::Cell, path::Path};

use anyhow::anyhow;
use git2::{
    build::{CheckoutBuilder, RepoBuilder},
    AutotagOption, Commit, Cred, CredentialType, ErrorCode, FetchOptions, IndexAddOption,
    PushOptions, RemoteCallbacks, Repository, ResetType, Signature, Status, StatusOptions,
};
use log::{debug, info, trace};

use crate::{auth, cache::WorkingCopy};

const ORIGIN: &str = "origin";

/// Identity recorded on the commits created before a push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub name: String,
    pub email: String,
}

impl Default for Author {
    fn default() -> Self {
        Author {
            name: "catalog-publish".to_owned(),
            email: "catalog-publish@localhost".to_owned(),
        }
    }
}

/// [`WorkingCopy`] backed by libgit2.
///
/// Credentials travel inside the url; they are also handed to libgit2 when a
/// server asks for them explicitly.
pub struct GitWorkingCopy {
    author: Author,
}

impl GitWorkingCopy {
    pub fn new(author: Author) -> GitWorkingCopy {
        GitWorkingCopy { author }
    }

    fn clone_into(&self, path: &Path, url: &str, branch: &str) -> anyhow::Result<()> {
        trace!(
            "Cloning {} ({}) into {}",
            auth::redacted(url),
            branch,
            path.display()
        );
        let mut builder = RepoBuilder::new();
        builder.branch(branch).fetch_options(fetch_options(url));
        builder.clone(url, path)?;
        Ok(())
    }

    fn update(&self, path: &Path, url: &str, branch: &str) -> anyhow::Result<()> {
        trace!("Updating existing working copy at {}", path.display());
        let repo = Repository::open(path)?;
        // Tokens rotate, the stored url may be stale.
        repo.remote_set_url(ORIGIN, url)?;

        let tracking = format!("refs/remotes/{ORIGIN}/{branch}");
        let refspec = format!("+refs/heads/{branch}:{tracking}");
        repo.find_remote(ORIGIN)?
            .fetch(&[refspec.as_str()], Some(&mut fetch_options(url)), None)?;

        let commit = repo.find_reference(&tracking)?.peel_to_commit()?;
        let local = format!("refs/heads/{branch}");
        repo.reference(&local, commit.id(), true, "catalog-publish: sync with origin")?;
        repo.set_head(&local)?;
        repo.reset(
            commit.as_object(),
            ResetType::Hard,
            Some(CheckoutBuilder::new().force()),
        )?;
        remove_untracked(&repo)?;
        debug!("Reset {} to {}", path.display(), commit.id());
        Ok(())
    }

    fn commit_all(&self, repo: &Repository, pathspec: &str, message: &str) -> anyhow::Result<()> {
        let mut index = repo.index()?;
        index.add_all([pathspec], IndexAddOption::DEFAULT, None)?;
        index.write()?;
        let tree = repo.find_tree(index.write_tree()?)?;

        let parent = match repo.head() {
            Ok(head) => Some(head.peel_to_commit()?),
            Err(error) if error.code() == ErrorCode::UnbornBranch => None,
            Err(error) => return Err(error.into()),
        };
        let parents: Vec<&Commit> = parent.iter().collect();

        let signature = Signature::now(&self.author.name, &self.author.email)?;
        let oid = repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message,
            &tree,
            &parents,
        )?;
        debug!("Created commit {} for {}", oid, pathspec);
        Ok(())
    }
}

impl WorkingCopy for GitWorkingCopy {
    fn clone_or_update(&self, path: &Path, url: &str, branch: &str) -> anyhow::Result<()> {
        if path.join(".git").exists() {
            self.update(path, url, branch)
        } else {
            self.clone_into(path, url, branch)
        }
    }

    fn head_commit(&self, path: &Path) -> anyhow::Result<String> {
        let repo = Repository::open(path)?;
        let commit = repo.head()?.peel_to_commit()?;
        Ok(commit.id().to_string())
    }

    fn push(&self, path: &Path, url: &str, branch: &str, message: &str) -> anyhow::Result<()> {
        let repo = Repository::discover(path)?;
        let workdir = repo
            .workdir()
            .ok_or_else(|| anyhow!("Repository containing {} is bare", path.display()))?;
        let pathspec = relative_pathspec(workdir, path);
        self.commit_all(&repo, &pathspec, message)?;

        let mut callbacks = remote_callbacks(url);
        callbacks.push_update_reference(|reference, status| match status {
            Some(status) => Err(git2::Error::from_str(&format!(
                "remote rejected {reference}: {status}"
            ))),
            None => Ok(()),
        });
        let mut options = PushOptions::new();
        options.remote_callbacks(callbacks);

        let refspec = format!("refs/heads/{branch}:refs/heads/{branch}");
        info!("Pushing {} to {}", refspec, auth::redacted(url));
        repo.remote_anonymous(url)?
            .push(&[refspec.as_str()], Some(&mut options))?;
        Ok(())
    }
}

fn remote_callbacks(url: &str) -> RemoteCallbacks<'_> {
    let mut callbacks = RemoteCallbacks::new();
    let attempted = Cell::new(false);
    callbacks.credentials(move |_url, username, allowed_types| {
        trace!(
            "Requested credentials for {}, username {:?}, allowed types {:?}",
            auth::redacted(url),
            username,
            allowed_types
        );
        // libgit2 keeps asking while the server rejects what it got.
        if attempted.replace(true) {
            return Err(git2::Error::from_str("credentials were rejected"));
        }
        match auth::url_credentials(url) {
            Some((user, password))
                if allowed_types.contains(CredentialType::USER_PASS_PLAINTEXT) =>
            {
                Cred::userpass_plaintext(user, password)
            }
            _ => Err(git2::Error::from_str("no valid authentication available")),
        }
    });
    callbacks
}

fn fetch_options(url: &str) -> FetchOptions<'_> {
    let mut fetch_options = FetchOptions::new();
    fetch_options
        .remote_callbacks(remote_callbacks(url))
        .download_tags(AutotagOption::None);
    fetch_options
}

/// Deletes everything in the working directory that git does not track.
///
/// A hard reset leaves untracked files alone. Directories git never reports,
/// the empty ones, are dropped as well.
fn remove_untracked(repo: &Repository) -> anyhow::Result<()> {
    let workdir = repo
        .workdir()
        .ok_or_else(|| anyhow!("Repository at {} is bare", repo.path().display()))?;

    let mut options = StatusOptions::new();
    options
        .include_untracked(true)
        .recurse_untracked_dirs(false)
        .include_ignored(false);
    let statuses = repo.statuses(Some(&mut options))?;
    for entry in statuses.iter() {
        if !entry.status().contains(Status::WT_NEW) {
            continue;
        }
        let Some(relative) = entry.path() else {
            continue;
        };
        let untracked = workdir.join(relative);
        trace!("Removing untracked {}", untracked.display());
        if untracked.is_dir() {
            std::fs::remove_dir_all(&untracked)?;
        } else {
            std::fs::remove_file(&untracked)?;
        }
    }

    remove_empty_dirs(workdir, true)?;
    Ok(())
}

/// Removes empty directories below `dir`, returns whether `dir` ended up empty.
fn remove_empty_dirs(dir: &Path, is_root: bool) -> std::io::Result<bool> {
    let mut empty = true;
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if is_root && entry.file_name() == ".git" {
            empty = false;
            continue;
        }
        if entry.file_type()?.is_dir() && remove_empty_dirs(&path, false)? {
            std::fs::remove_dir(&path)?;
        } else {
            empty = false;
        }
    }
    Ok(empty)
}

/// Pathspec of `path` relative to the working directory, everything if it is outside.
fn relative_pathspec(workdir: &Path, path: &Path) -> String {
    let (Ok(workdir), Ok(path)) = (workdir.canonicalize(), path.canonicalize()) else {
        return "*".to_owned();
    };
    match path.strip_prefix(&workdir) {
        Ok(relative) if !relative.as_os_str().is_empty() => {
            relative.to_string_lossy().replace('\\', "/")
        }
        _ => "*".to_owned(),
    }
}
