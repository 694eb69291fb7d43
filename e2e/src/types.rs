//! Shared types for the e2e test framework

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};

/// A mock response the backend serves for the next generation request
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub body: String,
    pub content_type: String,
}

impl MockResponse {
    /// A JSON response with status 200
    pub fn json(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
            content_type: "application/json".to_string(),
        }
    }

    /// A plain-text response with status 200
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
            content_type: "text/plain".to_string(),
        }
    }

    /// A JSON error response
    pub fn error(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            content_type: "application/json".to_string(),
        }
    }
}

/// Shared state for the mock backend server
#[derive(Debug, Default)]
pub struct BackendState {
    /// Tests push responses, the backend pops one per generation request
    pub response_queue: VecDeque<MockResponse>,
    /// All requests received by the backend (for inspection)
    pub received_requests: Vec<ReceivedRequest>,
}

/// A request received by the mock backend
#[derive(Debug, Clone)]
pub struct ReceivedRequest {
    pub path: String,
    /// Lower-cased header names
    pub headers: BTreeMap<String, String>,
    pub body: serde_json::Value,
}

impl ReceivedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(String::as_str)
    }
}

pub type SharedBackendState = Arc<Mutex<BackendState>>;

/// Status, selected headers and parsed body of a relay response
#[derive(Debug)]
pub struct RelayResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: serde_json::Value,
}

impl RelayResponse {
    /// Get a nested field using dot notation (e.g. "choices.0.message.content")
    pub fn get(&self, path: &str) -> Option<&serde_json::Value> {
        let mut current = &self.body;
        for part in path.split('.') {
            current = if let Ok(idx) = part.parse::<usize>() {
                current.as_array()?.get(idx)?
            } else {
                current.as_object()?.get(part)?
            };
        }
        Some(current)
    }

    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path)?.as_str()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(String::as_str)
    }
}

/// Result of a single test case
#[derive(Debug)]
#[allow(dead_code)]
pub struct TestResult {
    pub name: String,
    pub passed: bool,
    pub error: Option<String>,
    pub duration_ms: u64,
}
