//! Line-delimited JSON RPC over one persistent TCP connection.
//!
//! Every request carries a client-chosen id, so several calls can be in
//! flight on the same connection and answered in any order.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::codec::{Framed, LinesCodec, LinesCodecError};

use crate::error::RpcError;
use crate::models::{FETCH_QUOTE, FetchRequest, FetchResponse, RequestFrame, ResponseFrame};

pub const MAX_FRAME: usize = 1024 * 1024;

/// What a service returns for one call: the response body, plus a call-level
/// error when the call as a whole failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallResult {
    pub response: FetchResponse,
    pub error: Option<String>,
}

pub trait RpcService: Send + Sync + 'static {
    fn call(&self, method: &str, params: FetchRequest) -> impl Future<Output = Result<CallResult, RpcError>> + Send;
}

fn codec() -> LinesCodec {
    LinesCodec::new_with_max_length(MAX_FRAME)
}

/// Accepts connections forever. Each connection and each call gets its own task.
pub async fn serve<S: RpcService>(listener: TcpListener, service: Arc<S>) -> Result<(), RpcError> {
    loop {
        let (stream, peer) = listener.accept().await?;
        let service = service.clone();
        tokio::spawn(async move {
            tracing::debug!(%peer, "Client connected");
            match handle_connection(stream, service).await {
                Ok(()) => tracing::debug!(%peer, "Client disconnected"),
                Err(e) => tracing::warn!(%peer, error = %e, "Connection error"),
            }
        });
    }
}

async fn handle_connection<S: RpcService>(stream: TcpStream, service: Arc<S>) -> Result<(), RpcError> {
    let (mut sink, mut lines) = Framed::new(stream, codec()).split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ResponseFrame>();

    let writer = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            sink.send(serde_json::to_string(&frame)?).await?;
        }
        Ok::<(), RpcError>(())
    });

    while let Some(line) = lines.next().await {
        let line = match line {
            Ok(line) => line,
            // The codec cannot resync after an overlong line, so the connection ends here.
            Err(LinesCodecError::MaxLineLengthExceeded) => {
                tracing::warn!(max = MAX_FRAME, "Closing connection after oversized frame");
                return Err(RpcError::Codec(format!("request frame longer than {} bytes", MAX_FRAME)));
            }
            Err(e) => return Err(e.into()),
        };
        let frame: RequestFrame = match serde_json::from_str(&line) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(error = %e, "Invalid request frame");
                continue;
            }
        };

        let service = service.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            let reply = match service.call(&frame.method, frame.params).await {
                Ok(CallResult { response, error }) => ResponseFrame { id: frame.id, result: Some(response), error },
                Err(e) => ResponseFrame { id: frame.id, result: None, error: Some(e.to_string()) },
            };
            // The writer is gone only if the connection already failed.
            let _ = tx.send(reply);
        });
    }

    drop(tx);
    writer.await.map_err(|e| RpcError::Codec(e.to_string()))?
}

type Reply = Result<ResponseFrame, RpcError>;

#[derive(Default)]
struct Pending {
    closed: bool,
    waiters: HashMap<u64, oneshot::Sender<Reply>>,
}

/// Enough of a response to route it when the rest does not decode.
#[derive(Deserialize)]
struct FrameId {
    id: u64,
}

type SharedPending = Arc<Mutex<Pending>>;

fn close(pending: &SharedPending) {
    let mut p = pending.lock().unwrap_or_else(PoisonError::into_inner);
    p.closed = true;
    // Dropping the senders wakes every caller with `ConnectionClosed`.
    p.waiters.clear();
}

struct ClientInner {
    next_id: AtomicU64,
    pending: SharedPending,
    outgoing: mpsc::UnboundedSender<String>,
    reader: JoinHandle<()>,
}

impl Drop for ClientInner {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

/// Cheap to clone; all clones share one connection.
#[derive(Clone)]
pub struct RpcClient {
    inner: Arc<ClientInner>,
}

impl RpcClient {
    pub async fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self, RpcError> {
        let stream = TcpStream::connect(addr).await?;
        let (mut sink, mut lines) = Framed::new(stream, codec()).split();
        let pending = SharedPending::default();
        let (outgoing, mut rx) = mpsc::unbounded_channel::<String>();

        let writer_pending = pending.clone();
        tokio::spawn(async move {
            while let Some(line) = rx.recv().await {
                if sink.send(line).await.is_err() {
                    break;
                }
            }
            close(&writer_pending);
        });

        let reader_pending = pending.clone();
        let reader = tokio::spawn(async move {
            while let Some(Ok(line)) = lines.next().await {
                let (id, reply) = match serde_json::from_str::<ResponseFrame>(&line) {
                    Ok(frame) => (frame.id, Ok(frame)),
                    Err(e) => match serde_json::from_str::<FrameId>(&line) {
                        Ok(FrameId { id }) => (id, Err(RpcError::Decode(e))),
                        Err(_) => {
                            // Nobody can be told which call this was meant for.
                            tracing::warn!(error = %e, "Unroutable response frame, closing connection");
                            break;
                        }
                    },
                };
                let waiter = {
                    let mut p = reader_pending.lock().unwrap_or_else(PoisonError::into_inner);
                    p.waiters.remove(&id)
                };
                if let Some(waiter) = waiter {
                    let _ = waiter.send(reply);
                }
            }
            close(&reader_pending);
        });

        Ok(Self {
            inner: Arc::new(ClientInner { next_id: AtomicU64::new(1), pending, outgoing, reader }),
        })
    }

    pub async fn call(&self, method: &str, params: FetchRequest) -> Result<FetchResponse, RpcError> {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        {
            let mut p = self.inner.pending.lock().unwrap_or_else(PoisonError::into_inner);
            if p.closed {
                return Err(RpcError::ConnectionClosed);
            }
            p.waiters.insert(id, tx);
        }

        let forget = || {
            self.inner.pending.lock().unwrap_or_else(PoisonError::into_inner).waiters.remove(&id);
        };

        let frame = RequestFrame { id, method: method.to_string(), params };
        let line = match serde_json::to_string(&frame) {
            Ok(line) => line,
            Err(e) => {
                forget();
                return Err(e.into());
            }
        };
        // The server hangs up on anything longer, taking every other call with it.
        if line.len() > MAX_FRAME {
            forget();
            return Err(RpcError::Codec(format!("request frame longer than {} bytes", MAX_FRAME)));
        }
        if self.inner.outgoing.send(line).is_err() {
            forget();
            return Err(RpcError::ConnectionClosed);
        }

        let reply = rx.await.map_err(|_| RpcError::ConnectionClosed)??;
        if let Some(err) = reply.error {
            return Err(RpcError::Remote(err));
        }
        reply.result.ok_or_else(|| RpcError::Codec(format!("response {} has neither result nor error", id)))
    }

    pub async fn fetch_quote(&self, path: &str) -> Result<FetchResponse, RpcError> {
        self.call(FETCH_QUOTE, FetchRequest::new(path)).await
    }
}
