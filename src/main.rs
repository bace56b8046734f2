use std::error::Error;

use clap::Parser;
use env_logger::Target;

use catalog_publish::{
    cli::{
        args::{CliArgs, Command},
        command_handlers::{self, VersionFiles},
    },
    config::CatalogPublishConfig,
    CatalogPublisher,
};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(Target::Stderr)
        .init();

    if let Err(e) = run() {
        log::error!("{}", render_chain(e.as_ref()));
        std::process::exit(1);
    }
}

/// Error message followed by each of its causes.
fn render_chain(error: &dyn Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

fn run() -> Result<(), Box<dyn Error>> {
    let cli_args: CliArgs = CliArgs::parse();
    let config = CatalogPublishConfig::load()?;

    let mut builder = CatalogPublisher::builder().author(config.author);
    if let Some(cache_directory) = cli_args.cache_directory.or(config.cache_dir) {
        builder = builder.cache_directory(cache_directory);
    }
    if let Some(branch) = config.default_branch {
        builder = builder.default_branch(branch);
    }
    let publisher = builder.try_build()?;

    match cli_args.cmd {
        Command::Publish {
            template,
            compose,
            rancher_compose,
            readme,
        } => {
            let accounts_file = template.accounts_file.clone().or(config.accounts_file);
            command_handlers::do_publish(
                &publisher,
                &template,
                VersionFiles {
                    compose: &compose,
                    rancher_compose: &rancher_compose,
                    readme: readme.as_deref(),
                },
                accounts_file.as_deref(),
            )
        }
        Command::LatestVersion { template } => {
            let accounts_file = template.accounts_file.clone().or(config.accounts_file);
            command_handlers::do_latest_version(&publisher, &template, accounts_file.as_deref())
        }
        Command::CachePath { repository } => {
            command_handlers::do_cache_path(&publisher, &repository)
        }
        Command::ClearCache => command_handlers::do_clear_cache(&publisher),
    }
}
