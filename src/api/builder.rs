use std::{env, error::Error, path::PathBuf};

use home::home_dir;

use crate::{
    git::{Author, GitWorkingCopy},
    model::DEFAULT_BRANCH,
    publish::TemplatePublisher,
    CatalogPublisher,
};

#[derive(Default)]
pub struct CatalogPublisherBuilder {
    root: Option<PathBuf>,
    cache_directory_path: Option<PathBuf>,
    default_branch: Option<String>,
    author: Option<Author>,
}

impl CatalogPublisherBuilder {
    /// Directory relative cache paths are resolved against.
    ///
    /// Defaults to the current directory.
    pub fn root(mut self, path: impl Into<PathBuf>) -> Self {
        self.root = Some(path.into());
        self
    }

    /// Location of the repository cache.
    ///
    /// Defaults to `$HOME/.catalog-publish/cache`.
    pub fn cache_directory(mut self, path: impl Into<PathBuf>) -> Self {
        self.cache_directory_path = Some(path.into());
        self
    }

    /// Branch used when a request does not name one.
    ///
    /// Defaults to `master`.
    pub fn default_branch(mut self, branch: impl Into<String>) -> Self {
        self.default_branch = Some(branch.into());
        self
    }

    /// Author of the commits created for new versions.
    pub fn author(mut self, author: Author) -> Self {
        self.author = Some(author);
        self
    }

    pub fn try_build(self) -> Result<CatalogPublisher, Box<dyn Error>> {
        let Self {
            root,
            cache_directory_path,
            default_branch,
            author,
        } = self;
        let root = match root {
            Some(root) => root,
            None => env::current_dir()?,
        };

        let cache_directory = match cache_directory_path {
            Some(path) => root.join(path),
            None => default_cache_directory()?,
        };

        let default_branch = default_branch
            .filter(|branch| !branch.is_empty())
            .unwrap_or_else(|| DEFAULT_BRANCH.to_owned());

        let working_copy = GitWorkingCopy::new(author.unwrap_or_default());

        Ok(CatalogPublisher {
            publisher: TemplatePublisher::new(working_copy),
            cache_directory,
            default_branch,
        })
    }
}

fn default_cache_directory() -> Result<PathBuf, Box<dyn Error>> {
    let mut cache_directory =
        home_dir().ok_or("Could not find home dir. Please define $HOME env variable.")?;
    cache_directory.push(".catalog-publish/cache");
    Ok(cache_directory)
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;

    #[test]
    fn relative_cache_directory_is_resolved_against_root() {
        let publisher = CatalogPublisher::builder()
            .root("/work")
            .cache_directory("cache")
            .try_build()
            .unwrap();
        assert_eq!(publisher.cache_directory(), PathBuf::from("/work/cache"));
        assert_eq!(publisher.default_branch(), "master");
    }

    #[test]
    fn cache_path_is_keyed_on_url_and_branch() {
        let publisher = CatalogPublisher::builder()
            .cache_directory("/cache")
            .default_branch("main")
            .try_build()
            .unwrap();
        let path = publisher.cache_path("https://example.com/catalog.git", "main");
        assert_eq!(path.parent(), Some(PathBuf::from("/cache").as_path()));
        assert_eq!(publisher.default_branch(), "main");
    }

    #[test]
    fn clear_cache_removes_directory() {
        let dir = tempfile::tempdir().unwrap();
        let cache = dir.path().join("cache");
        std::fs::create_dir_all(cache.join("entry")).unwrap();
        let publisher = CatalogPublisher::builder()
            .cache_directory(&cache)
            .try_build()
            .unwrap();

        publisher.clear_cache().unwrap();
        publisher.clear_cache().unwrap();

        assert!(!cache.exists());
    }
}
