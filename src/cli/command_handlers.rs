use std::{error::Error, path::Path};

use log::info;

use crate::{
    cli::args::{RepositoryArgs, TemplateArgs},
    credentials::{AccountsFile, CredentialLookup},
    model::UpgradeRequest,
    CatalogPublisher,
};

/// Contents of a new template version, read from disk.
pub struct VersionFiles<'a> {
    pub compose: &'a Path,
    pub rancher_compose: &'a Path,
    pub readme: Option<&'a Path>,
}

/// Handler to publish command
pub fn do_publish(
    publisher: &CatalogPublisher,
    template: &TemplateArgs,
    files: VersionFiles<'_>,
    accounts_file: Option<&Path>,
) -> Result<(), Box<dyn Error>> {
    let mut request = build_request(publisher, template, accounts_file)?;
    request.compose_content = read_file(files.compose)?;
    request.rancher_compose_content = read_file(files.rancher_compose)?;
    request.readme_content = files.readme.map(read_file).transpose()?;

    let published = publisher.publish(&request)?;
    info!(
        "Version {} of {} written to {} on top of {}",
        published.version,
        request.template_folder_name,
        published.version_path.display(),
        published.base_commit
    );
    println!("{}", published.version);
    Ok(())
}

/// Handler to latest-version command
pub fn do_latest_version(
    publisher: &CatalogPublisher,
    template: &TemplateArgs,
    accounts_file: Option<&Path>,
) -> Result<(), Box<dyn Error>> {
    let request = build_request(publisher, template, accounts_file)?;
    match publisher.latest_version(&request)? {
        Some(version) => println!("{version}"),
        None => info!("No versions of {} found", request.template_folder_name),
    }
    Ok(())
}

/// Handler to cache-path command
pub fn do_cache_path(
    publisher: &CatalogPublisher,
    repository: &RepositoryArgs,
) -> Result<(), Box<dyn Error>> {
    let branch = branch(publisher, repository);
    println!(
        "{}",
        publisher.cache_path(&repository.url, &branch).display()
    );
    Ok(())
}

/// Handler to clear-cache command
pub fn do_clear_cache(publisher: &CatalogPublisher) -> Result<(), Box<dyn Error>> {
    publisher.clear_cache()?;
    Ok(())
}

fn build_request(
    publisher: &CatalogPublisher,
    template: &TemplateArgs,
    accounts_file: Option<&Path>,
) -> Result<UpgradeRequest, Box<dyn Error>> {
    let credential_token = match (&template.git_token, accounts_file) {
        (Some(token), _) => token.clone(),
        (None, Some(accounts_file)) => {
            AccountsFile::from_file(accounts_file)?.token(&template.git_user)?
        }
        (None, None) => String::new(),
    };

    Ok(UpgradeRequest {
        remote_url: template.repository.url.clone(),
        branch: branch(publisher, &template.repository),
        credential_user: template.git_user.clone(),
        credential_token,
        template_folder_name: template.template.clone(),
        is_system_template: template.system,
        compose_content: String::new(),
        rancher_compose_content: String::new(),
        readme_content: None,
        cache_root_path: publisher.cache_directory().to_path_buf(),
    })
}

fn branch(publisher: &CatalogPublisher, repository: &RepositoryArgs) -> String {
    repository
        .branch
        .clone()
        .unwrap_or_else(|| publisher.default_branch().to_owned())
}

fn read_file(path: &Path) -> Result<String, Box<dyn Error>> {
    std::fs::read_to_string(path)
        .map_err(|e| format!("Could not read {}: {}", path.display(), e).into())
}
