use std::path::{Path, PathBuf};

use regex_lite::Regex;
use thiserror::Error;

pub const DEFAULT_BRANCH: &str = "master";

const TEMPLATES_DIR: &str = "templates";
const INFRA_TEMPLATES_DIR: &str = "infra-templates";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    #[error("Invalid template folder name `{0}`")]
    InvalidTemplateName(String),
}

/// Which namespace of the catalog repository a template lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    /// Regular user templates, stored under `templates/`.
    User,
    /// System templates, stored under `infra-templates/`.
    System,
}

impl TemplateKind {
    pub fn from_system_flag(is_system: bool) -> TemplateKind {
        if is_system {
            TemplateKind::System
        } else {
            TemplateKind::User
        }
    }

    pub fn directory(&self) -> &'static str {
        match self {
            TemplateKind::User => TEMPLATES_DIR,
            TemplateKind::System => INFRA_TEMPLATES_DIR,
        }
    }
}

/// Name of a template folder, guaranteed to be a single path component.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TemplateName {
    pub value: String,
}

impl TemplateName {
    pub fn parse(value: &str) -> Result<TemplateName, ParseError> {
        let re: Regex = Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").unwrap();
        if re.is_match(value) && !value.contains("..") {
            Ok(TemplateName {
                value: value.to_owned(),
            })
        } else {
            Err(ParseError::InvalidTemplateName(value.to_owned()))
        }
    }
}

/// Input of a single publish operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeRequest {
    pub remote_url: String,
    /// Target branch, [`DEFAULT_BRANCH`] when empty.
    pub branch: String,
    /// Credential user in the `<provider>:<username>` format.
    pub credential_user: String,
    pub credential_token: String,
    pub template_folder_name: String,
    pub is_system_template: bool,
    pub compose_content: String,
    pub rancher_compose_content: String,
    pub readme_content: Option<String>,
    pub cache_root_path: PathBuf,
}

impl UpgradeRequest {
    pub fn branch(&self) -> &str {
        effective_branch(&self.branch)
    }

    pub fn template_kind(&self) -> TemplateKind {
        TemplateKind::from_system_flag(self.is_system_template)
    }

    /// Location of the template inside a working copy of the catalog repository.
    pub fn template_path(&self, repo_path: &Path, name: &TemplateName) -> PathBuf {
        repo_path
            .join(self.template_kind().directory())
            .join(&name.value)
    }

    pub fn readme(&self) -> Option<&str> {
        self.readme_content.as_deref().filter(|readme| !readme.is_empty())
    }
}

pub fn effective_branch(branch: &str) -> &str {
    if branch.is_empty() {
        DEFAULT_BRANCH
    } else {
        branch
    }
}
