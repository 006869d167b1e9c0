//! Testing utilities: scripted mock collaborators.
//!
//! Every external service the engine depends on has a mock here so
//! integration tests can run full cycles deterministically, without
//! network access, and can script any failure mode.

use crate::collab::{
    CommentBackend, DiscoveredAccount, ImageGenerator, MediaPost, MediaType, PhotoSearch,
    PublishBackend, PublishReceipt, PublishStatus, SocialDiscovery, TextGenerator,
};
use crate::error::{CollabError, CollabResult};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Text generator returning scripted responses in order.
///
/// Once the script is exhausted, calls fail fatally; tests that expect
/// retries must queue enough responses.
pub struct MockTextGenerator {
    responses: Mutex<VecDeque<CollabResult<String>>>,
    calls: AtomicUsize,
}

impl MockTextGenerator {
    /// Create with a scripted response queue.
    pub fn with_responses(responses: Vec<CollabResult<String>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: AtomicUsize::new(0),
        }
    }

    /// A generator whose every call fails fatally.
    pub fn always_failing() -> Self {
        Self::with_responses(Vec::new())
    }

    /// Queue another response.
    pub fn queue(&self, response: CollabResult<String>) {
        self.responses.lock().unwrap().push_back(response);
    }

    /// How many times the generator was called.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for MockTextGenerator {
    async fn generate(
        &self,
        _system: Option<&str>,
        _prompt: &str,
        _temperature: f32,
        _max_tokens: u32,
    ) -> CollabResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(CollabError::fatal("no scripted response left")))
    }
}

/// Image generator returning fixed bytes, or failing.
pub struct MockImageGenerator {
    result: CollabResult<Vec<u8>>,
    calls: AtomicUsize,
}

impl MockImageGenerator {
    /// Always return these bytes.
    pub fn returning(bytes: Vec<u8>) -> Self {
        Self {
            result: Ok(bytes),
            calls: AtomicUsize::new(0),
        }
    }

    /// Always fail transiently.
    pub fn failing() -> Self {
        Self {
            result: Err(CollabError::transient("scripted image failure")),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageGenerator for MockImageGenerator {
    async fn generate(
        &self,
        _persona_refs: &[PathBuf],
        _background_refs: &[PathBuf],
        _instructions: &str,
    ) -> CollabResult<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.clone()
    }
}

/// Photo search returning a fixed set of local paths.
pub struct MockPhotoSearch {
    paths: Vec<PathBuf>,
}

impl MockPhotoSearch {
    pub fn returning(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }

    /// A search that finds nothing (valid outcome, lowers confidence).
    pub fn empty() -> Self {
        Self { paths: Vec::new() }
    }
}

#[async_trait]
impl PhotoSearch for MockPhotoSearch {
    async fn search(&self, _keywords: &[String], max_count: usize) -> CollabResult<Vec<PathBuf>> {
        let mut paths = self.paths.clone();
        paths.truncate(max_count);
        Ok(paths)
    }
}

/// Publisher recording every call and replying with a fixed status.
pub struct MockPublisher {
    status: PublishStatus,
    published: Mutex<Vec<(PathBuf, String, MediaType)>>,
}

impl MockPublisher {
    pub fn with_status(status: PublishStatus) -> Self {
        Self {
            status,
            published: Mutex::new(Vec::new()),
        }
    }

    pub fn succeeding() -> Self {
        Self::with_status(PublishStatus::Success)
    }

    /// Calls recorded so far.
    pub fn published(&self) -> Vec<(PathBuf, String, MediaType)> {
        self.published.lock().unwrap().clone()
    }
}

#[async_trait]
impl PublishBackend for MockPublisher {
    async fn publish(
        &self,
        media_path: &Path,
        caption: &str,
        media_type: MediaType,
    ) -> CollabResult<PublishReceipt> {
        self.published
            .lock()
            .unwrap()
            .push((media_path.to_path_buf(), caption.to_string(), media_type));
        Ok(PublishReceipt {
            status: self.status,
            detail: "scripted".to_string(),
        })
    }
}

/// Comment backend that fails a configurable number of leading calls.
pub struct MockCommentBackend {
    failures_remaining: AtomicUsize,
    comments: Mutex<Vec<(String, String)>>,
}

impl MockCommentBackend {
    pub fn succeeding() -> Self {
        Self::failing_first(0)
    }

    /// Fail the first `n` calls, then succeed.
    pub fn failing_first(n: usize) -> Self {
        Self {
            failures_remaining: AtomicUsize::new(n),
            comments: Mutex::new(Vec::new()),
        }
    }

    /// `(media_id, text)` pairs that were accepted.
    pub fn comments(&self) -> Vec<(String, String)> {
        self.comments.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommentBackend for MockCommentBackend {
    async fn comment(&self, media_id: &str, text: &str) -> CollabResult<String> {
        let remaining = self.failures_remaining.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures_remaining.store(remaining - 1, Ordering::SeqCst);
            return Err(CollabError::transient("scripted comment failure"));
        }
        self.comments
            .lock()
            .unwrap()
            .push((media_id.to_string(), text.to_string()));
        Ok(format!("comment-{}", self.comments.lock().unwrap().len()))
    }
}

/// Scripted discovery: username resolution, keyword search, recent media.
#[derive(Default)]
pub struct MockDiscovery {
    accounts: HashMap<String, String>,
    search_results: Vec<DiscoveredAccount>,
    media: HashMap<String, Vec<MediaPost>>,
}

impl MockDiscovery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a username resolvable.
    pub fn with_account(mut self, username: &str, account_id: &str) -> Self {
        self.accounts
            .insert(username.to_string(), account_id.to_string());
        self
    }

    /// Add a keyword-search result.
    pub fn with_search_result(mut self, username: Option<&str>, account_id: Option<&str>) -> Self {
        self.search_results.push(DiscoveredAccount {
            username: username.map(str::to_string),
            account_id: account_id.map(str::to_string),
        });
        self
    }

    /// Add a recent post for an account.
    pub fn with_media(mut self, account_id: &str, post: MediaPost) -> Self {
        self.media
            .entry(account_id.to_string())
            .or_default()
            .push(post);
        self
    }
}

#[async_trait]
impl SocialDiscovery for MockDiscovery {
    async fn resolve_account(&self, username: &str) -> CollabResult<Option<String>> {
        Ok(self.accounts.get(username).cloned())
    }

    async fn search_accounts(
        &self,
        _keyword: &str,
        limit: usize,
    ) -> CollabResult<Vec<DiscoveredAccount>> {
        let mut results = self.search_results.clone();
        results.truncate(limit);
        Ok(results)
    }

    async fn recent_media(&self, account_id: &str, limit: usize) -> CollabResult<Vec<MediaPost>> {
        let mut posts = self.media.get(account_id).cloned().unwrap_or_default();
        posts.truncate(limit);
        Ok(posts)
    }
}
