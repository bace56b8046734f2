use std::path::{Path, PathBuf};

use log::{error, trace};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Could not read template path {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("No version can follow {latest} in {}", .path.display())]
    Exhausted { path: PathBuf, latest: u64 },
}

/// Returns the highest integer named entry of `template_path`.
///
/// Entries whose name is not a non-negative integer are skipped, so metadata
/// files may live next to the versions. `Ok(None)` means no version exists yet.
pub fn latest_version(template_path: &Path) -> Result<Option<u64>, ScanError> {
    let entries = std::fs::read_dir(template_path).map_err(|source| {
        error!(
            "Read template path {} failed: {}",
            template_path.display(),
            source
        );
        ScanError::Read {
            path: template_path.to_path_buf(),
            source,
        }
    })?;

    let mut latest = None;
    for entry in entries {
        let entry = entry.map_err(|source| ScanError::Read {
            path: template_path.to_path_buf(),
            source,
        })?;
        let file_name = entry.file_name();
        let Some(version) = file_name.to_str().and_then(|name| name.parse::<u64>().ok()) else {
            trace!("Skipping non version entry {:?}", file_name);
            continue;
        };
        latest = latest.max(Some(version));
    }

    Ok(latest)
}

/// Version following `latest` in `template_path`, starting at 0.
pub fn next_version(template_path: &Path, latest: Option<u64>) -> Result<u64, ScanError> {
    match latest {
        None => Ok(0),
        Some(latest) => latest.checked_add(1).ok_or_else(|| ScanError::Exhausted {
            path: template_path.to_path_buf(),
            latest,
        }),
    }
}
