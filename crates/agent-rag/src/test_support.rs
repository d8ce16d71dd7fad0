//! In-crate fakes shared by unit tests

use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::generation::{ChatModel, Message, ModelReply, ReasoningAgent, ToolSpec};
use crate::ingestion::{DocumentLoader, IngestionError};
use crate::providers::{EmbeddingProvider, ObjectStore, RemoteLocator};
use crate::retrieval::{VectorIndex, VectorSearchResult};
use crate::types::{Chunk, ChunkSource, Page};

/// Bucket used by `MemoryObjectStore`
pub const TEST_BUCKET: &str = "test-bucket";

/// Single-page PDF whose content stream draws `phrase`
pub fn minimal_pdf(phrase: &str) -> Vec<u8> {
    let stream = format!("BT /F1 12 Tf 100 700 Td ({}) Tj ET", phrase);

    let mut out = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n");
    let o1 = out.len();
    out.extend_from_slice(b"1 0 obj << /Type /Catalog /Pages 2 0 R >> endobj\n");
    let o2 = out.len();
    out.extend_from_slice(b"2 0 obj << /Type /Pages /Kids [3 0 R] /Count 1 >> endobj\n");
    let o3 = out.len();
    out.extend_from_slice(b"3 0 obj << /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R /Resources << /Font << /F1 5 0 R >> >> >> endobj\n");
    let o4 = out.len();
    out.extend_from_slice(
        format!(
            "4 0 obj << /Length {} >> stream\n{}\nendstream endobj\n",
            stream.len(),
            stream
        )
        .as_bytes(),
    );
    let o5 = out.len();
    out.extend_from_slice(b"5 0 obj << /Type /Font /Subtype /Type1 /BaseFont /Helvetica >> endobj\n");
    let xref_start = out.len();
    out.extend_from_slice(b"xref\n0 6\n");
    out.extend_from_slice(format!("{:010} 65535 f \n", 0).as_bytes());
    for offset in [o1, o2, o3, o4, o5] {
        out.extend_from_slice(format!("{:010} 00000 n \n", offset).as_bytes());
    }
    out.extend_from_slice(b"trailer << /Size 6 /Root 1 0 R >>\nstartxref\n");
    out.extend_from_slice(format!("{}\n", xref_start).as_bytes());
    out.extend_from_slice(b"%%EOF\n");
    out
}

/// A chunk with default source information
pub fn chunk(document_id: &str, content: &str) -> Chunk {
    let source = ChunkSource {
        locator: format!("mem://{}/{}", TEST_BUCKET, document_id),
        page_number: Some(1),
        page_count: Some(1),
    };
    Chunk::new(document_id, content.to_string(), source, 0, content.chars().count(), 0)
}

/// Deterministic bag-of-words embedder
pub struct HashEmbedder {
    dimensions: usize,
    failing: AtomicBool,
}

impl HashEmbedder {
    pub fn with_dimensions(dimensions: usize) -> Self {
        Self {
            dimensions,
            failing: AtomicBool::new(false),
        }
    }

    /// Make every later `embed` call fail (or succeed again)
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn vector(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; self.dimensions];
        for word in text.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
            let mut hasher = DefaultHasher::new();
            word.to_lowercase().hash(&mut hasher);
            vector[(hasher.finish() % self.dimensions as u64) as usize] += 1.0;
        }
        vector
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::with_dimensions(256)
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::embedding("embedding quota exhausted"));
        }
        Ok(self.vector(text))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "hash"
    }
}

/// Object store kept in memory, producing `mem://test-bucket/<key>` locators
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    puts: AtomicUsize,
    fail_puts: bool,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store whose `put` always fails
    pub fn failing() -> Self {
        Self {
            fail_puts: true,
            ..Default::default()
        }
    }

    pub fn insert(&self, key: &str, data: Vec<u8>) {
        self.objects.lock().insert(key.to_string(), data);
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().get(key).cloned()
    }

    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(&self, key: &str, _content_type: &str, data: Vec<u8>) -> Result<String> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if self.fail_puts {
            return Err(Error::object_store("bucket unreachable"));
        }
        self.insert(key, data);
        Ok(RemoteLocator::new("mem", TEST_BUCKET, key).to_string())
    }

    async fn fetch(&self, locator: &RemoteLocator) -> Result<Vec<u8>> {
        self.get(&locator.key)
            .ok_or_else(|| Error::object_store(format!("No such object: {}", locator)))
    }

    fn scheme(&self) -> &str {
        "mem"
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// Loader returning a fixed text (or a fixed error) for any file
pub struct StaticLoader {
    result: std::result::Result<String, IngestionError>,
    seen: Arc<Mutex<Option<Vec<u8>>>>,
}

impl StaticLoader {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            result: Ok(text.into()),
            seen: Arc::default(),
        }
    }

    pub fn failing(err: IngestionError) -> Self {
        Self {
            result: Err(err),
            seen: Arc::default(),
        }
    }

    /// Bytes of the last file handed to `load`
    pub fn seen_bytes(&self) -> Arc<Mutex<Option<Vec<u8>>>> {
        self.seen.clone()
    }
}

#[async_trait]
impl DocumentLoader for StaticLoader {
    async fn load(&self, path: &Path) -> std::result::Result<Vec<Page>, IngestionError> {
        let data = std::fs::read(path)
            .map_err(|e| IngestionError::SourceUnavailable(e.to_string()))?;
        *self.seen.lock() = Some(data);

        self.result.clone().map(|text| vec![Page::new(1, text)])
    }

    fn name(&self) -> &str {
        "static"
    }
}

/// Index whose writes and searches always fail
pub struct FailingIndex;

#[async_trait]
impl VectorIndex for FailingIndex {
    async fn add(&self, _chunks: &[Chunk]) -> Result<()> {
        Err(Error::vector_db("disk full"))
    }

    async fn search(&self, _query: &str, _top_k: usize) -> Result<Vec<VectorSearchResult>> {
        Err(Error::vector_db("index offline"))
    }

    async fn delete_by_document(&self, _document_id: &str) -> Result<usize> {
        Ok(0)
    }

    async fn replace_document(&self, _document_id: &str, _chunks: &[Chunk]) -> Result<usize> {
        Err(Error::vector_db("disk full"))
    }

    async fn len(&self) -> Result<usize> {
        Ok(0)
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(false)
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Chat model replaying a fixed script and recording every conversation
pub struct ScriptedChatModel {
    replies: Mutex<VecDeque<ModelReply>>,
    calls: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedChatModel {
    pub fn new(replies: Vec<ModelReply>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Vec<Message>> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl ChatModel for ScriptedChatModel {
    async fn complete(
        &self,
        _system: &str,
        messages: &[Message],
        _tools: &[ToolSpec],
    ) -> Result<ModelReply> {
        self.calls.lock().push(messages.to_vec());
        self.replies
            .lock()
            .pop_front()
            .ok_or_else(|| Error::llm("script exhausted"))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

enum AgentBehavior {
    Answer(String),
    Silent,
    Fail,
    Panic,
}

/// Agent with a fixed outcome that records its inputs
pub struct StaticAgent {
    behavior: AgentBehavior,
    inputs: Arc<Mutex<Vec<String>>>,
}

impl StaticAgent {
    fn with(behavior: AgentBehavior) -> Self {
        Self {
            behavior,
            inputs: Arc::default(),
        }
    }

    pub fn answer(text: &str) -> Self {
        Self::with(AgentBehavior::Answer(text.to_string()))
    }

    pub fn silent() -> Self {
        Self::with(AgentBehavior::Silent)
    }

    pub fn failing() -> Self {
        Self::with(AgentBehavior::Fail)
    }

    pub fn panicking() -> Self {
        Self::with(AgentBehavior::Panic)
    }

    /// Every input passed to `run`, shared so it outlives the agent
    pub fn inputs(&self) -> Arc<Mutex<Vec<String>>> {
        self.inputs.clone()
    }
}

#[async_trait]
impl ReasoningAgent for StaticAgent {
    async fn run(&self, input: &str) -> Result<Option<String>> {
        self.inputs.lock().push(input.to_string());
        match &self.behavior {
            AgentBehavior::Answer(text) => Ok(Some(text.clone())),
            AgentBehavior::Silent => Ok(None),
            AgentBehavior::Fail => Err(Error::llm("quota exceeded")),
            AgentBehavior::Panic => panic!("agent exploded"),
        }
    }
}

/// A request received by `FakeGemini`
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub api_key: Option<String>,
    pub body: Value,
}

struct FakeGeminiState {
    responses: Mutex<VecDeque<(u16, Value)>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// Local HTTP server answering with scripted `(status, json)` pairs in order
pub struct FakeGemini {
    addr: std::net::SocketAddr,
    state: Arc<FakeGeminiState>,
}

impl FakeGemini {
    pub async fn start(responses: Vec<(u16, Value)>) -> Self {
        let state = Arc::new(FakeGeminiState {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new().fallback(record).with_state(state.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().clone()
    }
}

async fn record(
    State(state): State<Arc<FakeGeminiState>>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    state.requests.lock().push(RecordedRequest {
        path: uri.path().to_string(),
        api_key: headers
            .get("x-goog-api-key")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body: serde_json::from_slice(&body).unwrap_or(Value::Null),
    });

    let (status, json) = state
        .responses
        .lock()
        .pop_front()
        .unwrap_or((500, serde_json::json!({"error": "no scripted response"})));
    (
        StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(json),
    )
}
