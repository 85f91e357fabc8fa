//! In-memory collaborators for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use bytes::Bytes;

use crate::analysis::feedback::AnalysisResponse;
use crate::analysis::raster::{image_name, Rasterizer};
use crate::analysis::service::AnalysisService;
use crate::storage::{FileBlob, FileStore, FileUpload, RecordEntry, RecordStore, StoredFile};

pub const FEEDBACK_JSON: &str = r#"{
    "overallScore": 82,
    "ATS": {"score": 90, "tips": [{"type": "good", "tip": "Standard section headings"}]},
    "toneAndStyle": {"score": 75, "tips": [{"type": "improve", "tip": "Fewer buzzwords", "explanation": "Prefer concrete verbs."}]},
    "content": {"score": 80, "tips": []},
    "structure": {"score": 85, "tips": []},
    "skills": {"score": 78, "tips": []}
}"#;

pub fn pdf_upload(name: &str) -> FileUpload {
    FileUpload {
        name: name.to_string(),
        content_type: "application/pdf".to_string(),
        bytes: Bytes::from_static(b"%PDF-1.4\n1 0 obj\n<<>>\nendobj\n%%EOF"),
    }
}

// ── FileStore ───────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeFileStore {
    blobs: Mutex<Vec<(String, FileBlob)>>,
    uploads: AtomicUsize,
    /// 1-based upload number from which uploads fail; 0 = never.
    fail_from: AtomicUsize,
}

impl FakeFileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_uploads_from(&self, nth: usize) {
        self.fail_from.store(nth, Ordering::SeqCst);
    }

    pub fn upload_count(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    pub fn uploaded_paths(&self) -> Vec<String> {
        self.blobs.lock().unwrap().iter().map(|(p, _)| p.clone()).collect()
    }

    pub fn insert(&self, path: &str, bytes: &'static [u8], content_type: &str) {
        self.blobs.lock().unwrap().push((
            path.to_string(),
            FileBlob {
                bytes: Bytes::from_static(bytes),
                content_type: Some(content_type.to_string()),
            },
        ));
    }
}

#[async_trait]
impl FileStore for FakeFileStore {
    async fn upload(&self, file: &FileUpload) -> Result<StoredFile> {
        let n = self.uploads.fetch_add(1, Ordering::SeqCst) + 1;
        let fail_from = self.fail_from.load(Ordering::SeqCst);
        if fail_from != 0 && n >= fail_from {
            return Err(anyhow!("upload {n} rejected"));
        }
        let path = format!("uploads/{n}/{}", file.name);
        self.blobs.lock().unwrap().push((
            path.clone(),
            FileBlob {
                bytes: file.bytes.clone(),
                content_type: Some(file.content_type.clone()),
            },
        ));
        Ok(StoredFile { path })
    }

    async fn read(&self, path: &str) -> Result<Option<FileBlob>> {
        Ok(self
            .blobs
            .lock()
            .unwrap()
            .iter()
            .find(|(p, _)| p == path)
            .map(|(_, blob)| blob.clone()))
    }
}

// ── RecordStore ─────────────────────────────────────────────────────────────

/// Keeps insertion order for listings and every write for assertions.
#[derive(Default)]
pub struct FakeRecordStore {
    entries: Mutex<Vec<(String, String)>>,
    writes: Mutex<Vec<(String, String)>>,
    fail_from: AtomicUsize,
    fail_listing: AtomicUsize,
}

impl FakeRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let store = Self::new();
        *store.entries.lock().unwrap() = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        store
    }

    /// 1-based write number from which `set` fails; 0 = never.
    pub fn fail_writes_from(&self, nth: usize) {
        self.fail_from.store(nth, Ordering::SeqCst);
    }

    pub fn fail_listing(&self) {
        self.fail_listing.store(1, Ordering::SeqCst);
    }

    pub fn keys(&self) -> Vec<String> {
        self.entries.lock().unwrap().iter().map(|(k, _)| k.clone()).collect()
    }

    pub fn value(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    /// Every successful `set`, in order.
    pub fn writes(&self) -> Vec<(String, String)> {
        self.writes.lock().unwrap().clone()
    }
}

/// Glob match supporting a single trailing `*`, the only form the service uses.
fn matches_pattern(pattern: &str, key: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => key.starts_with(prefix),
        None => key == pattern,
    }
}

#[async_trait]
impl RecordStore for FakeRecordStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.value(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let attempt = self.writes.lock().unwrap().len() + 1;
        let fail_from = self.fail_from.load(Ordering::SeqCst);
        if fail_from != 0 && attempt >= fail_from {
            return Err(anyhow!("write {attempt} rejected"));
        }

        let mut entries = self.entries.lock().unwrap();
        match entries.iter_mut().find(|(k, _)| k == key) {
            Some(entry) => entry.1 = value.to_string(),
            None => entries.push((key.to_string(), value.to_string())),
        }
        self.writes
            .lock()
            .unwrap()
            .push((key.to_string(), value.to_string()));
        Ok(())
    }

    async fn list(&self, pattern: &str, include_values: bool) -> Result<Vec<RecordEntry>> {
        if self.fail_listing.load(Ordering::SeqCst) != 0 {
            return Err(anyhow!("listing unavailable"));
        }
        Ok(self
            .entries
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _)| matches_pattern(pattern, k))
            .map(|(k, v)| RecordEntry {
                key: k.clone(),
                value: include_values.then(|| v.clone()),
            })
            .collect())
    }
}

// ── Rasterizer ──────────────────────────────────────────────────────────────

enum RasterBehaviour {
    Image,
    Nothing,
    Error,
}

pub struct FakeRasterizer {
    behaviour: RasterBehaviour,
    inputs: Mutex<Vec<Bytes>>,
}

impl FakeRasterizer {
    fn with(behaviour: RasterBehaviour) -> Self {
        Self {
            behaviour,
            inputs: Mutex::new(Vec::new()),
        }
    }

    pub fn producing_image() -> Self {
        Self::with(RasterBehaviour::Image)
    }

    pub fn producing_nothing() -> Self {
        Self::with(RasterBehaviour::Nothing)
    }

    pub fn failing() -> Self {
        Self::with(RasterBehaviour::Error)
    }

    pub fn call_count(&self) -> usize {
        self.inputs.lock().unwrap().len()
    }

    pub fn inputs(&self) -> Vec<Bytes> {
        self.inputs.lock().unwrap().clone()
    }
}

#[async_trait]
impl Rasterizer for FakeRasterizer {
    async fn rasterize(&self, pdf: &FileUpload) -> Result<Option<FileUpload>> {
        self.inputs.lock().unwrap().push(pdf.bytes.clone());
        match self.behaviour {
            RasterBehaviour::Image => Ok(Some(FileUpload {
                name: image_name(&pdf.name),
                content_type: "image/png".to_string(),
                bytes: Bytes::from_static(b"\x89PNG\r\n\x1a\n"),
            })),
            RasterBehaviour::Nothing => Ok(None),
            RasterBehaviour::Error => Err(anyhow!("renderer crashed")),
        }
    }
}

// ── AnalysisService ─────────────────────────────────────────────────────────

pub struct FakeAnalysis {
    response: Option<AnalysisResponse>,
    fail: bool,
    calls: Mutex<Vec<(String, String)>>,
}

impl FakeAnalysis {
    pub fn responding(response: AnalysisResponse) -> Self {
        Self {
            response: Some(response),
            fail: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn silent() -> Self {
        Self {
            response: None,
            fail: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            response: None,
            fail: true,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// `(path, instructions)` per call.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AnalysisService for FakeAnalysis {
    async fn feedback(&self, path: &str, instructions: &str) -> Result<Option<AnalysisResponse>> {
        self.calls
            .lock()
            .unwrap()
            .push((path.to_string(), instructions.to_string()));
        if self.fail {
            return Err(anyhow!("inference backend unavailable"));
        }
        Ok(self.response.clone())
    }
}
