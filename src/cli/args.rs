use std::path::PathBuf;

use clap::Parser;

/// Publishes new versions of catalog templates into git repositories.
#[derive(Debug, Parser)]
#[clap(version)]
pub struct CliArgs {
    #[clap(subcommand)]
    pub cmd: Command,
    /// Location of the repository cache. Defaults to $HOME/.catalog-publish/cache
    #[clap(short, long)]
    pub cache_directory: Option<PathBuf>,
}

/// Catalog repository a command works on.
#[derive(Debug, clap::Args)]
pub struct RepositoryArgs {
    /// Url of the catalog git repository
    #[clap(short, long)]
    pub url: String,
    /// Branch of the catalog, defaults to the configured branch or master
    #[clap(short, long)]
    pub branch: Option<String>,
}

/// Credentials and template a command works on.
#[derive(Debug, clap::Args)]
pub struct TemplateArgs {
    #[clap(flatten)]
    pub repository: RepositoryArgs,
    /// Git user in the <provider>:<username> format, provider being github or gitlab
    #[clap(long, env = "CATALOG_PUBLISH_GIT_USER")]
    pub git_user: String,
    /// Access token, looked up in the accounts file when omitted
    #[clap(long, env = "CATALOG_PUBLISH_GIT_TOKEN", hide_env_values = true)]
    pub git_token: Option<String>,
    /// Toml file mapping git users to access tokens
    #[clap(long)]
    pub accounts_file: Option<PathBuf>,
    /// Template folder name
    #[clap(short, long)]
    pub template: String,
    /// Whether the template is a system template stored under infra-templates
    #[clap(long)]
    pub system: bool,
}

#[derive(Debug, Parser)]
pub enum Command {
    /// Publishes a new version of a template and pushes it
    Publish {
        #[clap(flatten)]
        template: TemplateArgs,
        /// docker-compose.yml of the new version
        #[clap(long)]
        compose: PathBuf,
        /// rancher-compose.yml of the new version
        #[clap(long)]
        rancher_compose: PathBuf,
        /// README.md of the new version
        #[clap(long)]
        readme: Option<PathBuf>,
    },
    /// Prints the latest published version of a template
    LatestVersion {
        #[clap(flatten)]
        template: TemplateArgs,
    },
    /// Prints the cache directory used for a repository and branch
    CachePath {
        #[clap(flatten)]
        repository: RepositoryArgs,
    },
    /// Cleans the repository cache
    ClearCache,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn arguments_are_consistent() {
        CliArgs::command().debug_assert();
    }

    #[test]
    fn parses_publish() {
        let args = CliArgs::try_parse_from([
            "catalog-publish",
            "publish",
            "--url",
            "https://example.com/catalog.git",
            "--git-user",
            "github:alice",
            "--git-token",
            "tok",
            "--template",
            "app",
            "--compose",
            "docker-compose.yml",
            "--rancher-compose",
            "rancher-compose.yml",
        ])
        .unwrap();
        match args.cmd {
            Command::Publish {
                template, readme, ..
            } => {
                assert_eq!(template.template, "app");
                assert_eq!(template.git_token.as_deref(), Some("tok"));
                assert_eq!(template.repository.branch, None);
                assert!(!template.system);
                assert_eq!(readme, None);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
