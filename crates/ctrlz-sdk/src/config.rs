//! Per-repository settings stored in `.git/config.json`.
//!
//! Every field is optional. Keys are PascalCase on disk:
//!
//! ```json
//! {
//!   "UserName": "ann",
//!   "RepoName": "notes",
//!   "RemoteUrl": "http://127.0.0.1:8080",
//!   "BatchThreshold": 52428800,
//!   "MissingObjects": "abort",
//!   "AuthorName": "Ann",
//!   "AuthorEmail": "ann@example.org"
//! }
//! ```

use std::fs;
use std::path::Path;

use ctrlz_store::Signature;
use ctrlz_sync::{MissingObjectPolicy, SyncConfig, DEFAULT_BATCH_THRESHOLD};
use ctrlz_refs::DEFAULT_BRANCH;
use serde::{Deserialize, Serialize};

use crate::error::{SdkError, SdkResult};

/// File name of the config under the metadata directory.
pub const CONFIG_FILE: &str = "config.json";

/// Remote used when neither the config nor the environment names one.
pub const DEFAULT_REMOTE_URL: &str = "http://127.0.0.1:8080";

/// Environment variable overriding `RemoteUrl`.
pub const REMOTE_URL_ENV: &str = "CTRLZ_REMOTE_URL";

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RepoConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_threshold: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missing_objects: Option<MissingObjectPolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_email: Option<String>,
}

impl RepoConfig {
    /// Read the config at `path`. A missing file is the default config.
    pub fn load(path: &Path) -> SdkResult<Self> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&text).map_err(|source| SdkError::Config {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> SdkResult<()> {
        let mut text = serde_json::to_string_pretty(self).map_err(|source| SdkError::Config {
            path: path.to_path_buf(),
            source,
        })?;
        text.push('\n');
        fs::write(path, text)?;
        Ok(())
    }

    /// The `(user, repo)` pair pushes are addressed to, once both are set.
    pub fn remote_repo(&self) -> Option<(&str, &str)> {
        match (self.user_name.as_deref(), self.repo_name.as_deref()) {
            (Some(user), Some(repo)) if !user.is_empty() && !repo.is_empty() => Some((user, repo)),
            _ => None,
        }
    }

    /// Remote base URL: the environment wins over the file, then the default.
    pub fn remote_url(&self) -> String {
        self.remote_url_with(std::env::var(REMOTE_URL_ENV).ok())
    }

    fn remote_url_with(&self, env: Option<String>) -> String {
        env.filter(|url| !url.is_empty())
            .or_else(|| self.remote_url.clone())
            .unwrap_or_else(|| DEFAULT_REMOTE_URL.to_string())
    }

    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            branch: DEFAULT_BRANCH.to_string(),
            batch_threshold: self.batch_threshold.unwrap_or(DEFAULT_BATCH_THRESHOLD),
            missing_objects: self.missing_objects.unwrap_or_default(),
        }
    }

    /// Signature recorded as author and committer on new commits.
    pub fn identity(&self) -> Signature {
        let name = self
            .author_name
            .clone()
            .or_else(|| self.user_name.clone())
            .unwrap_or_else(|| "ctrlz".to_string());
        let email = self
            .author_email
            .clone()
            .unwrap_or_else(|| format!("{}@localhost", name.to_lowercase().replace(' ', ".")));
        Signature::new(name, email)
    }
}
