use thiserror::Error;

/// Failure while fetching or reading one page of the content source.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{url} returned status {status}")]
    Status { status: u16, url: String },

    #[error("could not read page body: {0}")]
    Body(String),
}

impl FetchError {
    /// Network and HTTP status failures. The RPC call itself fails for these;
    /// everything else is reported inside the response.
    pub fn is_hard(&self) -> bool {
        matches!(self, FetchError::Request(_) | FetchError::Status { .. })
    }
}

/// Transport-level failure of a single RPC call or of the connection.
#[derive(Error, Debug)]
pub enum RpcError {
    #[error("connection error: {0}")]
    Io(#[from] std::io::Error),

    #[error("framing error: {0}")]
    Codec(String),

    #[error("malformed message: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{0}")]
    Remote(String),

    #[error("connection closed")]
    ConnectionClosed,

    #[error("unknown method {0}")]
    UnknownMethod(String),
}

impl From<tokio_util::codec::LinesCodecError> for RpcError {
    fn from(err: tokio_util::codec::LinesCodecError) -> Self {
        match err {
            tokio_util::codec::LinesCodecError::Io(e) => RpcError::Io(e),
            other => RpcError::Codec(other.to_string()),
        }
    }
}
