use std::path::Path;
use std::sync::{Arc, Mutex};

use dirmirror::dispatch::{RemoteStore, StoreFuture};
use dirmirror::types::ActionKind;

/// One operation received by a [`RecordingStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedOp {
    pub kind: ActionKind,
    pub key: String,
    /// File contents at upload time (`None` for deletes or unreadable files).
    pub contents: Option<Vec<u8>>,
}

/// Remote store that records every upload and delete.
#[derive(Debug, Clone, Default)]
pub struct RecordingStore {
    ops: Arc<Mutex<Vec<RecordedOp>>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> Vec<RecordedOp> {
        self.ops.lock().unwrap().clone()
    }

    /// `(kind, key)` pairs in completion order.
    pub fn keys(&self) -> Vec<(ActionKind, String)> {
        self.ops
            .lock()
            .unwrap()
            .iter()
            .map(|op| (op.kind, op.key.clone()))
            .collect()
    }
}

impl RemoteStore for RecordingStore {
    fn upload<'a>(&'a self, local: &'a Path, key: &'a str) -> StoreFuture<'a> {
        Box::pin(async move {
            let contents = tokio::fs::read(local).await.ok();
            self.ops.lock().unwrap().push(RecordedOp {
                kind: ActionKind::Copy,
                key: key.to_string(),
                contents,
            });
            Ok(())
        })
    }

    fn delete<'a>(&'a self, key: &'a str) -> StoreFuture<'a> {
        Box::pin(async move {
            self.ops.lock().unwrap().push(RecordedOp {
                kind: ActionKind::Remove,
                key: key.to_string(),
                contents: None,
            });
            Ok(())
        })
    }

    fn name(&self) -> &str {
        "recording"
    }
}
