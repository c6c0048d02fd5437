//! Cyber security excuses: a scraping RPC server and the terminal client that
//! browses through it.

pub mod app;
pub mod config;
pub mod error;
pub mod handler;
pub mod input;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod network;
pub mod scrape;
pub mod theme;
pub mod ui;

pub use app::{Action, AppEvent, ClientState, Command};
pub use error::{FetchError, RpcError};
pub use models::{FetchRequest, FetchResponse};
