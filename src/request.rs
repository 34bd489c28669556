use crate::error::{AppError, AppResult};
use oneroof_shared::protocol::HttpMethod;
use serde::de::DeserializeOwned;
use std::collections::HashMap;

#[cfg(test)]
use std::cell::RefCell;

// =========================================================
// 核心抽象层 (HTTP Interface Abstraction)
// =========================================================

/// 通用 HTTP 请求结构
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: String,
    pub method: HttpMethod,
    pub headers: HashMap<String, String>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn new(url: &str, method: HttpMethod) -> Self {
        Self {
            url: url.to_string(),
            method,
            headers: HashMap::new(),
            body: None,
        }
    }

    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.headers.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_json_body(mut self, body: String) -> Self {
        self.headers
            .insert("Content-Type".to_string(), "application/json".to_string());
        self.body = Some(body);
        self
    }
}

/// 通用 HTTP 响应结构
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parse the body; an empty body is read as `null`, then as `{}`.
    pub fn json<T: DeserializeOwned>(&self) -> AppResult<T> {
        if self.body.trim().is_empty() {
            return serde_json::from_str("null")
                .or_else(|_| serde_json::from_str("{}"))
                .map_err(AppError::from);
        }
        serde_json::from_str(&self.body).map_err(AppError::from)
    }
}

/// HTTP 客户端特性 (Trait)
///
/// `?Send` because browser fetch futures are not `Send`.
#[async_trait::async_trait(?Send)]
pub trait HttpClient {
    /// Only transport failures are errors; any status code is a response.
    async fn send(&self, req: HttpRequest) -> AppResult<HttpResponse>;
}

// =========================================================
// 测试工具: MockHttpClient
// =========================================================

#[cfg(test)]
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: Option<String>,
}

#[cfg(test)]
impl RecordedRequest {
    pub fn body_json(&self) -> serde_json::Value {
        self.body
            .as_deref()
            .map(|b| serde_json::from_str(b).unwrap())
            .unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
#[derive(Default)]
pub struct MockHttpClient {
    // ("METHOD URL", (Status, Response Body))
    responses: RefCell<HashMap<String, (u16, String)>>,
    pub requests: RefCell<Vec<RecordedRequest>>,
}

#[cfg(test)]
impl MockHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(method: HttpMethod, url: &str) -> String {
        format!("{} {}", method.as_str(), url)
    }

    pub fn mock_response(&self, method: HttpMethod, url: &str, status: u16, body: serde_json::Value) {
        self.responses
            .borrow_mut()
            .insert(Self::key(method, url), (status, body.to_string()));
    }

    pub fn requests_to(&self, method: HttpMethod, url: &str) -> Vec<RecordedRequest> {
        self.requests
            .borrow()
            .iter()
            .filter(|r| r.method == method && r.url == url)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
#[async_trait::async_trait(?Send)]
impl HttpClient for MockHttpClient {
    async fn send(&self, req: HttpRequest) -> AppResult<HttpResponse> {
        self.requests.borrow_mut().push(RecordedRequest {
            method: req.method,
            url: req.url.clone(),
            headers: req.headers.clone(),
            body: req.body.clone(),
        });

        let responses = self.responses.borrow();
        match responses.get(&Self::key(req.method, &req.url)) {
            Some((status, body)) => Ok(HttpResponse {
                status: *status,
                body: body.clone(),
            }),
            None => Ok(HttpResponse {
                status: 404,
                body: "Not Found".to_string(),
            }),
        }
    }
}
