use std::fmt;
use std::path::PathBuf;

use anyhow::{bail, Result};

/// Where a model file lives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModelLocation {
    LocalPath(PathBuf),
    Gcs { bucket: String, object: String },
}

impl ModelLocation {
    /// `gs://<bucket>/<object>` is a Cloud Storage locator; anything else is
    /// taken as a local path.
    pub fn parse(raw: &str) -> Result<Self> {
        let Some(rest) = raw.strip_prefix("gs:") else {
            return Ok(Self::LocalPath(PathBuf::from(raw)));
        };

        let rest = rest.trim_start_matches('/');
        let (bucket, object) = rest.split_once('/').unwrap_or((rest, ""));
        if bucket.is_empty() || object.is_empty() {
            bail!("invalid Cloud Storage locator: {raw} (expected gs://<bucket>/<object>)");
        }

        Ok(Self::Gcs {
            bucket: bucket.to_string(),
            object: object.to_string(),
        })
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Gcs { .. })
    }
}

impl fmt::Display for ModelLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LocalPath(path) => write!(f, "{}", path.display()),
            Self::Gcs { bucket, object } => write!(f, "gs://{bucket}/{object}"),
        }
    }
}
