/// Upload intake and per-session accumulation
///
/// A conversion needs two workbooks, which arrive as two separate uploads.
/// `UploadSessions` buffers them per session id and hands the pair over once
/// the second arrives, clearing the session at the same moment so the next
/// upload always starts a fresh pair. Sessions abandoned after a single
/// upload are evicted once they have been idle for the configured timeout.
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

pub const ACCEPTED_EXTENSIONS: [&str; 2] = [".xlsx", ".xls"];

/// Uploads needed before a conversion runs
pub const FILES_PER_CONVERSION: usize = 2;

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("Unsupported file '{0}': please upload an Excel spreadsheet (.xlsx or .xls)")]
    UnsupportedFileType(String),
}

/// A buffered workbook upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Outcome of buffering one upload
#[derive(Debug, PartialEq, Eq)]
pub enum UploadProgress {
    AwaitingSecondFile { files_received: usize },
    /// Both files arrived; the session buffer has already been cleared
    Ready(PendingUpload, PendingUpload),
}

/// Reject anything that is not named like an Excel workbook
pub fn validate_file_name(file_name: &str) -> Result<(), UploadError> {
    let lower = file_name.to_ascii_lowercase();
    if ACCEPTED_EXTENSIONS.iter().any(|ext| lower.ends_with(ext)) {
        Ok(())
    } else {
        Err(UploadError::UnsupportedFileType(file_name.to_string()))
    }
}

/// How long a half-complete session is kept without a further upload
pub const DEFAULT_SESSION_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

struct PendingSession {
    files: Vec<PendingUpload>,
    last_upload: Instant,
}

#[derive(Clone)]
pub struct UploadSessions {
    pending: Arc<Mutex<HashMap<String, PendingSession>>>,
    idle_timeout: Duration,
}

impl Default for UploadSessions {
    fn default() -> Self {
        Self::with_idle_timeout(DEFAULT_SESSION_IDLE_TIMEOUT)
    }
}

impl UploadSessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sessions idle for at least `idle_timeout` are dropped on the next upload
    pub fn with_idle_timeout(idle_timeout: Duration) -> Self {
        Self {
            pending: Arc::new(Mutex::new(HashMap::new())),
            idle_timeout,
        }
    }

    /// Buffer an upload for a session, handing back the pair once complete
    pub async fn push(&self, session_id: &str, upload: PendingUpload) -> UploadProgress {
        self.push_at(session_id, upload, Instant::now()).await
    }

    async fn push_at(&self, session_id: &str, upload: PendingUpload, now: Instant) -> UploadProgress {
        let mut pending = self.pending.lock().await;
        evict_idle(&mut pending, now, self.idle_timeout);

        let session = pending
            .entry(session_id.to_string())
            .or_insert_with(|| PendingSession {
                files: Vec::new(),
                last_upload: now,
            });
        session.files.push(upload);
        session.last_upload = now;
        debug!(
            "Session {} has {} pending uploads",
            session_id,
            session.files.len()
        );

        if session.files.len() < FILES_PER_CONVERSION {
            return UploadProgress::AwaitingSecondFile {
                files_received: session.files.len(),
            };
        }

        let mut files = pending
            .remove(session_id)
            .map(|session| session.files)
            .unwrap_or_default()
            .into_iter();
        match (files.next(), files.next()) {
            (Some(first), Some(second)) => {
                info!("Session {} has both workbooks, ready to convert", session_id);
                UploadProgress::Ready(first, second)
            }
            (first, _) => {
                let files_received = usize::from(first.is_some());
                UploadProgress::AwaitingSecondFile { files_received }
            }
        }
    }

    /// Drop any pending uploads for a session. Returns whether any were held.
    pub async fn reset(&self, session_id: &str) -> bool {
        let removed = self.pending.lock().await.remove(session_id);
        if removed.is_some() {
            info!("Cleared pending uploads for session {}", session_id);
        }
        removed.is_some()
    }

    pub async fn pending_count(&self, session_id: &str) -> usize {
        self.pending
            .lock()
            .await
            .get(session_id)
            .map(|session| session.files.len())
            .unwrap_or(0)
    }

    /// Number of sessions currently holding a first upload
    pub async fn session_count(&self) -> usize {
        self.pending.lock().await.len()
    }
}

fn evict_idle(pending: &mut HashMap<String, PendingSession>, now: Instant, idle_timeout: Duration) {
    let before = pending.len();
    pending.retain(|_, session| now.saturating_duration_since(session.last_upload) < idle_timeout);

    let evicted = before - pending.len();
    if evicted > 0 {
        warn!("Dropped {} abandoned upload session(s)", evicted);
    }
}
