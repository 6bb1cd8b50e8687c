use ctrlz_types::ObjectId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("remote rejected {endpoint}: HTTP {status}: {body}")]
    RemoteStatus {
        endpoint: String,
        status: u16,
        body: String,
    },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("remote returned an invalid ref value: {0:?}")]
    InvalidRemoteRef(String),

    #[error("{} object(s) missing from the local store: {}", .0.len(), preview(.0))]
    MissingObjects(Vec<ObjectId>),

    #[error("graph error: {0}")]
    Graph(#[from] ctrlz_graph::GraphError),

    #[error("store error: {0}")]
    Store(#[from] ctrlz_store::StoreError),
}

pub type SyncResult<T> = Result<T, SyncError>;

fn preview(ids: &[ObjectId]) -> String {
    const SHOWN: usize = 5;
    let mut out: Vec<String> = ids.iter().take(SHOWN).map(|id| id.short_hex()).collect();
    if ids.len() > SHOWN {
        out.push("...".into());
    }
    out.join(", ")
}
