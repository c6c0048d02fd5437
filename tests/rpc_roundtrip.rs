//! Client, RPC transport, handler and scraper wired together over loopback,
//! with a local HTTP server standing in for the excuse site.

use std::sync::Arc;
use std::time::Duration;

use excuses::app::{ClientState, dispatch_fetch};
use excuses::handler::QuoteService;
use excuses::metrics::Metrics;
use excuses::network::{RpcClient, serve};
use excuses::scrape::ExcuseSite;
use excuses::{Command, RpcError};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::runtime::Handle;
use tokio::sync::mpsc;

const QUOTE_PAGE: &str = "<html><body>\
    <div class=\"quote\">\n   Le certificat a expiré pendant le week-end.\n  </div>\
    <div class=\"links\"><a href=\"/?1\">Excuse précédente</a><a href=\"/?3\">Excuse suivante</a></div>\
    </body></html>";

fn page(quote: &str, next: &str) -> String {
    format!(
        "<div class=\"quote\">{}</div><div class=\"links\"><a href=\"{}\">Excuse suivante</a></div>",
        quote, next
    )
}

/// Tiny HTTP/1.1 responder keyed on the request target.
async fn fake_site() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        loop {
            let (mut socket, _) = listener.accept().await.unwrap();
            tokio::spawn(async move {
                let mut buf = vec![0u8; 4096];
                let n = socket.read(&mut buf).await.unwrap_or(0);
                let request = String::from_utf8_lossy(&buf[..n]).to_string();
                let target = request.split_whitespace().nth(1).unwrap_or("/").to_string();

                let (status, body) = match target.as_str() {
                    "/?2" => ("200 OK", QUOTE_PAGE.to_string()),
                    "/?blank" => ("200 OK", "<html><body>rien</body></html>".to_string()),
                    "/?slow" => {
                        tokio::time::sleep(Duration::from_millis(400)).await;
                        ("200 OK", page("lent", "/?after-slow"))
                    }
                    "/?fast" => ("200 OK", page("rapide", "/?after-fast")),
                    _ => ("404 Not Found", "nope".to_string()),
                };
                let reply = format!(
                    "HTTP/1.1 {}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = socket.write_all(reply.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });
    format!("http://{}/", addr)
}

async fn start_server() -> (RpcClient, Arc<Metrics>) {
    let base = fake_site().await;
    let metrics = Arc::new(Metrics::new());
    let service = Arc::new(QuoteService::new(ExcuseSite::new(&base).unwrap(), metrics.clone()));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve(listener, service));

    (RpcClient::connect(addr).await.unwrap(), metrics)
}

#[tokio::test]
async fn response_fields_cross_the_wire_untouched() {
    let (client, metrics) = start_server().await;
    let resp = client.fetch_quote("/?2").await.unwrap();

    assert_eq!(resp.quote, "\n   Le certificat a expiré pendant le week-end.\n  ");
    assert_eq!(resp.next_link, "/?3");
    assert_eq!(resp.previous_link, "/?1");
    assert!(resp.error.is_empty());
    assert_eq!(metrics.snapshot().succeeded, 1);
}

#[tokio::test]
async fn page_without_quote_is_a_plain_success() {
    let (client, _) = start_server().await;
    let resp = client.fetch_quote("/?blank").await.unwrap();
    assert!(resp.quote.is_empty());
    assert!(resp.error.is_empty());
}

#[tokio::test]
async fn http_failure_fails_the_call() {
    let (client, metrics) = start_server().await;
    let err = client.fetch_quote("/?404").await.unwrap_err();
    assert!(matches!(&err, RpcError::Remote(msg) if msg.contains("404")));
    assert_eq!(metrics.snapshot().failed, 1);

    // The connection is still usable afterwards.
    assert!(client.fetch_quote("/?2").await.is_ok());
}

#[tokio::test]
async fn last_completion_to_arrive_wins() {
    let (client, _) = start_server().await;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut state = ClientState::new(0);

    // A is issued first but answers last.
    dispatch_fetch(&Handle::current(), client.clone(), "/?slow".into(), tx.clone());
    dispatch_fetch(&Handle::current(), client.clone(), "/?fast".into(), tx.clone());

    let first = rx.recv().await.unwrap();
    state.update(first);
    assert_eq!(state.quote, "rapide");
    assert!(!state.loading);

    let second = rx.recv().await.unwrap();
    state.update(second);
    assert_eq!(state.quote, "lent");
    assert_eq!(state.next_link, "/?after-slow");
}

#[tokio::test]
async fn lost_server_moves_loading_to_errored() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accept = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        drop(stream);
    });
    let client = RpcClient::connect(addr).await.unwrap();
    accept.await.unwrap();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut state = ClientState::new(0);
    let Command::Fetch(path) = state.init() else {
        panic!("startup should fetch");
    };
    dispatch_fetch(&Handle::current(), client, path, tx);

    assert!(state.loading);
    state.update(rx.recv().await.unwrap());
    assert!(!state.loading);
    assert!(state.err.is_some());
    assert!(state.quote.is_empty());
}
