use serde::{Deserialize, Serialize};

pub const FETCH_QUOTE: &str = "QuoteServer.FetchQuote";

/// Page sentinels understood by the content source.
pub const ROOT_PATH: &str = "/";
pub const FIRST_PATH: &str = "/?0";
pub const LAST_PATH: &str = "/?last";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchRequest {
    pub path: String,
}

impl FetchRequest {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

/// Result of one `FetchQuote` call. Check `error` before using `quote`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchResponse {
    pub quote: String,
    pub next_link: String,
    pub previous_link: String,
    pub error: String,
}

impl FetchResponse {
    pub fn failed(message: impl Into<String>) -> Self {
        Self { error: message.into(), ..Self::default() }
    }

    pub fn is_error(&self) -> bool {
        !self.error.is_empty()
    }
}

/// One line on the wire from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestFrame {
    pub id: u64,
    pub method: String,
    pub params: FetchRequest,
}

/// One line on the wire from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseFrame {
    pub id: u64,
    pub result: Option<FetchResponse>,
    pub error: Option<String>,
}
