pub mod memory;

pub use memory::ConversationMemory;

use bytes::Bytes;
use dashmap::DashMap;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};
use tokio::sync::broadcast;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::answer::{self, Answer};
use crate::config::{ChunkingConfig, Config, RetrievalConfig};
use crate::error::ServiceError;
use crate::index::{self, Retriever};
use crate::ingest::{self, DocumentChunk};
use crate::providers::ModelServices;

/// Stamp file inside each artifact directory; its mtime mirrors the
/// session's last access so recency survives a restart.
const STAMP_FILE: &str = ".last_access";

/// Longest accepted session identifier.
const MAX_SESSION_ID_LEN: usize = 64;

/// One uploaded file as received from the API layer.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Bytes,
}

/// Result of a successful upload.
#[derive(Debug, Clone, Serialize)]
pub struct UploadReceipt {
    pub files: usize,
    pub chunks: usize,
}

// ============================================================================
// Session state
// ============================================================================

struct SessionState {
    /// The retrieval capability; `None` until the first successful upload.
    retriever: Option<Arc<Retriever>>,
    memory: ConversationMemory,
    dir: PathBuf,
    last_access: Instant,
    /// Set under the lock when the session is evicted. A task holding a
    /// stale slot handle re-checks this after locking and treats the slot
    /// as absent.
    evicted: bool,
}

impl SessionState {
    fn new(dir: PathBuf) -> Self {
        Self {
            retriever: None,
            memory: ConversationMemory::new(),
            dir,
            last_access: Instant::now(),
            evicted: false,
        }
    }

    fn touch(&mut self) {
        self.last_access = Instant::now();
        let stamp = self.dir.join(STAMP_FILE);
        if let Err(e) = std::fs::write(&stamp, chrono::Utc::now().to_rfc3339()) {
            debug!("could not refresh stamp {}: {e}", stamp.display());
        }
    }
}

type SlotHandle = Arc<Mutex<SessionState>>;

// ============================================================================
// Session store
// ============================================================================

/// Owns every live session: its retrieval capability, conversation
/// memory, artifact directory, and last-access time.
///
/// Concurrency discipline: one `tokio::sync::Mutex` per session, held
/// across the await points of an operation, so all reads and writes to a
/// single session are mutually exclusive while operations on different
/// sessions proceed concurrently. The map itself is a `DashMap` and is
/// never exposed to callers.
pub struct SessionStore {
    sessions: DashMap<String, SlotHandle>,
    services: ModelServices,
    root: PathBuf,
    ttl: Duration,
    chunking: ChunkingConfig,
    retrieval: RetrievalConfig,
}

impl SessionStore {
    /// Create a store rooted at the configured storage directory.
    pub fn new(config: &Config, services: ModelServices) -> Result<Self, ServiceError> {
        let root = config.storage_root();
        std::fs::create_dir_all(&root)?;
        info!(root = %root.display(), ttl_secs = config.storage.ttl_seconds, "session store ready");
        Ok(Self {
            sessions: DashMap::new(),
            services,
            root,
            ttl: Duration::from_secs(config.storage.ttl_seconds),
            chunking: config.chunking.clone(),
            retrieval: config.retrieval.clone(),
        })
    }

    pub fn active_count(&self) -> usize {
        self.sessions.len()
    }

    // ------------------------------------------------------------------
    // Upload
    // ------------------------------------------------------------------

    /// Replace the session's documents wholesale: delete the prior
    /// artifact directory, write the new files, extract, chunk, index,
    /// and install the new retrieval capability.
    ///
    /// The per-session lock is held for the full swap, so a concurrent
    /// ask sees either the old capability or the new one, never a
    /// mixture. Conversation memory survives re-uploads. On failure the
    /// prior capability stays installed.
    pub async fn upload(
        &self,
        session_id: &str,
        files: Vec<UploadedFile>,
    ) -> Result<UploadReceipt, ServiceError> {
        let session_id = sanitize_session_id(session_id)?;
        if files.is_empty() {
            return Err(ServiceError::Validation("no files provided".to_string()));
        }

        let mut state = self.acquire(&session_id, true).await.expect("create=true");

        // Full swap of the artifact directory; no partial mix of old and
        // new documents.
        match std::fs::remove_dir_all(&state.dir) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(ServiceError::Io(e)),
        }
        tokio::fs::create_dir_all(&state.dir).await?;

        let mut chunks: Vec<DocumentChunk> = Vec::new();
        let mut written = 0usize;
        for file in &files {
            let name = safe_file_name(&file.name)?;
            tokio::fs::write(state.dir.join(&name), &file.bytes).await?;
            written += 1;

            let pages = ingest::extract_pdf(&name, &file.bytes)?;
            let offset = chunks.len();
            let mut file_chunks =
                ingest::chunk_pages(&name, &pages, self.chunking.chunk_size, self.chunking.overlap);
            for chunk in &mut file_chunks {
                chunk.index += offset;
            }
            chunks.extend(file_chunks);
        }

        let retriever = index::build_index(
            chunks,
            self.services.embedder.clone(),
            self.services.reranker.clone(),
            self.retrieval.clone(),
        )
        .await?;
        let chunk_count = retriever.chunk_count();

        state.retriever = Some(Arc::new(retriever));
        state.touch();

        info!(
            session_id = %session_id,
            files = written,
            chunks = chunk_count,
            "session index installed"
        );

        Ok(UploadReceipt {
            files: written,
            chunks: chunk_count,
        })
    }

    // ------------------------------------------------------------------
    // Ask
    // ------------------------------------------------------------------

    /// Answer a question against the session's index and memory. Fails
    /// with `SessionNotFound` when the session has no capability; never
    /// creates sessions implicitly.
    pub async fn ask(&self, session_id: &str, question: &str) -> Result<Answer, ServiceError> {
        let session_id = sanitize_session_id(session_id)?;
        if question.trim().is_empty() {
            return Err(ServiceError::Validation("question is empty".to_string()));
        }

        let mut state = self
            .acquire(&session_id, false)
            .await
            .ok_or(ServiceError::SessionNotFound)?;

        let retriever = state
            .retriever
            .clone()
            .ok_or(ServiceError::SessionNotFound)?;

        let result =
            answer::answer(question, &retriever, &mut state.memory, &self.services.chat).await?;

        state.touch();
        Ok(result)
    }

    // ------------------------------------------------------------------
    // Eviction
    // ------------------------------------------------------------------

    /// Remove a session's capability, memory, and artifact directory.
    /// Idempotent; missing directories are ignored, other removal
    /// failures are logged and skipped.
    pub async fn evict(&self, session_id: &str) {
        let slot = match self.sessions.get(session_id) {
            Some(entry) => entry.value().clone(),
            None => return,
        };
        let guard = slot.lock_owned().await;
        self.evict_locked(session_id, guard);
    }

    /// Eviction body, called with the per-session lock held. The
    /// directory is removed before the map entry so a new upload for the
    /// same id (which can only start once the entry is gone or the flag
    /// observed) never races the cleanup.
    fn evict_locked(&self, session_id: &str, mut state: OwnedMutexGuard<SessionState>) {
        if state.evicted {
            return;
        }
        state.evicted = true;
        state.retriever = None;
        state.memory = ConversationMemory::new();

        if let Err(e) = std::fs::remove_dir_all(&state.dir) {
            if e.kind() != ErrorKind::NotFound {
                warn!(session_id, "could not remove artifact dir: {e}");
            }
        }
        self.sessions.remove(session_id);
        info!(session_id, "session evicted");
    }

    /// Evict every session idle past the TTL, then reap stale orphan
    /// directories left behind by a previous process. Iterates a
    /// snapshot of ids so no global lock is held across the pass; a
    /// failure for one session never stops the sweep for the rest.
    pub async fn sweep(&self) {
        let ids: Vec<String> = self.sessions.iter().map(|e| e.key().clone()).collect();
        let mut evicted = 0usize;

        for id in ids {
            let slot = match self.sessions.get(&id) {
                Some(entry) => entry.value().clone(),
                None => continue,
            };
            let guard = slot.lock_owned().await;
            if !guard.evicted && guard.last_access.elapsed() >= self.ttl {
                self.evict_locked(&id, guard);
                evicted += 1;
            }
        }

        let orphans = self.reap_orphans();
        if evicted > 0 || orphans > 0 {
            info!(evicted, orphans, "sweep pass complete");
        } else {
            debug!("sweep pass complete, nothing to evict");
        }
    }

    /// Remove directories under the storage root that have no live
    /// session and whose stamp mtime is older than the TTL. Recovers
    /// disk space from sessions of a previous process run.
    fn reap_orphans(&self) -> usize {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("cannot scan storage root: {e}");
                return 0;
            }
        };

        let mut reaped = 0usize;
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let name = match path.file_name().and_then(|n| n.to_str()) {
                Some(n) => n.to_string(),
                None => continue,
            };
            if self.sessions.contains_key(&name) {
                continue;
            }
            if !stamp_older_than(&path, self.ttl) {
                continue;
            }
            match std::fs::remove_dir_all(&path) {
                Ok(()) => {
                    reaped += 1;
                    debug!(session_id = %name, "orphan directory reaped");
                }
                Err(e) => warn!(session_id = %name, "could not reap orphan dir: {e}"),
            }
        }
        reaped
    }

    /// Run the periodic sweep until the shutdown channel fires. The first
    /// tick fires immediately, so one sweep runs at process start.
    pub fn spawn_sweeper(
        self: Arc<Self>,
        interval: Duration,
        mut shutdown: broadcast::Receiver<()>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => self.sweep().await,
                    _ = shutdown.recv() => {
                        debug!("sweep task shutting down");
                        break;
                    }
                }
            }
        })
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Lock a session's slot, optionally creating it. Loops on the
    /// evicted flag: a slot handle obtained before an eviction completes
    /// behaves as absent once locked.
    async fn acquire(&self, session_id: &str, create: bool) -> Option<OwnedMutexGuard<SessionState>> {
        loop {
            let slot = match self.sessions.get(session_id) {
                Some(entry) => entry.value().clone(),
                None if create => self
                    .sessions
                    .entry(session_id.to_string())
                    .or_insert_with(|| {
                        Arc::new(Mutex::new(SessionState::new(self.root.join(session_id))))
                    })
                    .value()
                    .clone(),
                None => return None,
            };

            let guard = slot.lock_owned().await;
            if guard.evicted {
                // Raced an eviction; the map entry is gone, start over.
                continue;
            }
            return Some(guard);
        }
    }
}

// ============================================================================
// Input validation
// ============================================================================

/// Validate an untrusted session identifier before it becomes a path
/// segment. Fail-closed: only `[A-Za-z0-9._-]`, at most 64 characters,
/// and no leading dot, which rules out traversal, separators, and hidden
/// directories outright.
pub fn sanitize_session_id(id: &str) -> Result<String, ServiceError> {
    if id.is_empty() || id.len() > MAX_SESSION_ID_LEN {
        return Err(ServiceError::Validation(
            "session_id must be 1-64 characters".to_string(),
        ));
    }
    if id.starts_with('.') {
        return Err(ServiceError::Validation(
            "session_id must not start with '.'".to_string(),
        ));
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    {
        return Err(ServiceError::Validation(
            "session_id may only contain letters, digits, '.', '_' and '-'".to_string(),
        ));
    }
    Ok(id.to_string())
}

/// Reduce an uploaded file name to a safe basename.
fn safe_file_name(name: &str) -> Result<String, ServiceError> {
    let base = Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("")
        .to_string();
    if base.is_empty() || base == "." || base == ".." || base.contains('\0') {
        return Err(ServiceError::Validation(format!(
            "invalid file name '{name}'"
        )));
    }
    Ok(base)
}

fn stamp_older_than(dir: &Path, ttl: Duration) -> bool {
    let stamp = dir.join(STAMP_FILE);
    let mtime = std::fs::metadata(&stamp)
        .or_else(|_| std::fs::metadata(dir))
        .and_then(|m| m.modified());
    match mtime {
        Ok(modified) => SystemTime::now()
            .duration_since(modified)
            .map(|age| age >= ttl)
            .unwrap_or(false),
        // No readable timestamp at all: treat as stale and reclaim.
        Err(_) => true,
    }
}
