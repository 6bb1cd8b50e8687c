use serde::{Deserialize, Serialize};
use ctrlz_types::ObjectId;

/// Default upper bound for one upload batch: 50 MiB.
pub const DEFAULT_BATCH_THRESHOLD: usize = 50 * 1024 * 1024;

/// What to do when a reachable object cannot be read locally.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingObjectPolicy {
    /// Fail before anything is uploaded.
    #[default]
    Abort,
    /// Warn, leave the object out and keep going.
    Skip,
}

/// Tunables for a push.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SyncConfig {
    pub branch: String,
    pub batch_threshold: usize,
    pub missing_objects: MissingObjectPolicy,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            branch: "main".into(),
            batch_threshold: DEFAULT_BATCH_THRESHOLD,
            missing_objects: MissingObjectPolicy::Abort,
        }
    }
}

/// Body of the ref-update request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefUpdate {
    #[serde(rename = "Ref")]
    pub branch: String,
    #[serde(rename = "Hash")]
    pub hash: String,
}

/// Totals from a [`BatchUploader`](crate::batch::BatchUploader).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub objects: usize,
    pub batches: usize,
    pub bytes: u64,
}

/// Outcome of a push.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PushReport {
    /// Remote head before the push.
    pub remote_head: Option<ObjectId>,
    /// Remote head after the push.
    pub new_head: Option<ObjectId>,
    /// Commits the remote did not have, newest first.
    pub commits: Vec<ObjectId>,
    pub objects_sent: usize,
    pub batches: usize,
    pub bytes_sent: u64,
    /// Objects left out under [`MissingObjectPolicy::Skip`].
    pub skipped: Vec<ObjectId>,
}

impl PushReport {
    pub fn is_up_to_date(&self) -> bool {
        self.commits.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_parses_lowercase() {
        let skip: MissingObjectPolicy = serde_json::from_str("\"skip\"").unwrap();
        assert_eq!(skip, MissingObjectPolicy::Skip);
        assert_eq!(MissingObjectPolicy::default(), MissingObjectPolicy::Abort);
        assert!(serde_json::from_str::<MissingObjectPolicy>("\"ignore\"").is_err());
    }

    #[test]
    fn ref_update_uses_wire_field_names() {
        let body = RefUpdate {
            branch: "main".into(),
            hash: "ab".repeat(20),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["Ref"], "main");
        assert_eq!(json["Hash"], "ab".repeat(20));
    }

    #[test]
    fn config_defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.branch, "main");
        assert_eq!(config.batch_threshold, 52_428_800);
        assert_eq!(config.missing_objects, MissingObjectPolicy::Abort);
    }

    #[test]
    fn empty_report_is_up_to_date() {
        assert!(PushReport::default().is_up_to_date());
    }
}
