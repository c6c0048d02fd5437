//! Client navigation state. Every input, timer tick and fetch completion is
//! an [`AppEvent`] fed through [`ClientState::update`] on one thread; fetches
//! run elsewhere and come back as events.

use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedSender;

use crate::error::RpcError;
use crate::models::{FIRST_PATH, FetchResponse, LAST_PATH, ROOT_PATH};
use crate::network::RpcClient;
use crate::theme::{Theme, random_seed};

pub const SPINNER_FRAMES: [&str; 4] = ["|", "/", "-", "\\"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Next,
    Previous,
    First,
    Last,
    Random,
    Quit,
}

pub type FetchOutcome = Result<FetchResponse, RpcError>;

#[derive(Debug)]
pub enum AppEvent {
    Action(Action),
    Resize { width: u16, height: u16 },
    Tick,
    Fetched(FetchOutcome),
}

/// Side effects the caller has to carry out after an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Fetch(String),
    Quit,
}

#[derive(Debug, Clone)]
pub struct ClientState {
    pub quote: String,
    pub next_link: String,
    pub previous_link: String,
    /// Overlay flag: the last quote or error stays in memory underneath it.
    pub loading: bool,
    pub err: Option<String>,
    pub color_seed: u64,
    pub width: u16,
    pub height: u16,
    pub spinner: usize,
    pub quit: bool,
}

impl Default for ClientState {
    fn default() -> Self {
        Self::new(random_seed())
    }
}

impl ClientState {
    pub fn new(color_seed: u64) -> Self {
        Self {
            quote: String::new(),
            next_link: String::new(),
            previous_link: String::new(),
            loading: true,
            err: None,
            color_seed,
            width: 80,
            height: 10,
            spinner: 0,
            quit: false,
        }
    }

    /// The fetch issued at startup.
    pub fn init(&self) -> Command {
        Command::Fetch(String::new())
    }

    pub fn theme(&self) -> Theme {
        Theme::from_seed(self.color_seed)
    }

    pub fn spinner_frame(&self) -> &'static str {
        SPINNER_FRAMES[self.spinner % SPINNER_FRAMES.len()]
    }

    pub fn update(&mut self, event: AppEvent) -> Option<Command> {
        if self.quit {
            return None;
        }

        match event {
            AppEvent::Action(action) => self.navigate(action),
            AppEvent::Resize { width, height } => {
                self.width = width;
                self.height = height;
                None
            }
            AppEvent::Tick => {
                if self.loading {
                    self.spinner = (self.spinner + 1) % SPINNER_FRAMES.len();
                }
                None
            }
            AppEvent::Fetched(outcome) => {
                self.complete(outcome);
                None
            }
        }
    }

    fn navigate(&mut self, action: Action) -> Option<Command> {
        let path = match action {
            Action::Quit => {
                self.quit = true;
                return Some(Command::Quit);
            }
            Action::Next => self.next_link.clone(),
            Action::Previous => self.previous_link.clone(),
            Action::First => FIRST_PATH.to_string(),
            Action::Last => LAST_PATH.to_string(),
            Action::Random => ROOT_PATH.to_string(),
        };
        self.loading = true;
        self.color_seed = random_seed();
        Some(Command::Fetch(path))
    }

    /// Completions are applied in arrival order; the last one to arrive wins.
    fn complete(&mut self, outcome: FetchOutcome) {
        self.loading = false;
        match outcome {
            Err(e) => self.err = Some(e.to_string()),
            Ok(resp) if resp.is_error() => self.err = Some(resp.error),
            Ok(resp) => {
                self.err = None;
                self.quote = resp.quote.trim().to_string();
                self.next_link = resp.next_link;
                self.previous_link = resp.previous_link;
            }
        }
    }
}

/// Runs one fetch on the runtime and posts its outcome back to the event loop.
/// Superseded fetches are not cancelled.
pub fn dispatch_fetch(handle: &Handle, client: RpcClient, path: String, events: UnboundedSender<AppEvent>) {
    handle.spawn(async move {
        let outcome = client.fetch_quote(&path).await;
        // The loop has exited if nobody is listening.
        let _ = events.send(AppEvent::Fetched(outcome));
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(quote: &str, next: &str, prev: &str) -> AppEvent {
        AppEvent::Fetched(Ok(FetchResponse {
            quote: quote.into(),
            next_link: next.into(),
            previous_link: prev.into(),
            error: String::new(),
        }))
    }

    #[test]
    fn starts_loading_with_empty_fetch() {
        let state = ClientState::new(0);
        assert!(state.loading);
        assert_eq!(state.init(), Command::Fetch(String::new()));
    }

    #[test]
    fn success_trims_quote_and_stores_links() {
        let mut state = ClientState::new(0);
        state.update(ok("\n  Le proxy.  \n", "/?8", "/?6"));
        assert!(!state.loading);
        assert_eq!(state.quote, "Le proxy.");
        assert_eq!(state.next_link, "/?8");
        assert_eq!(state.previous_link, "/?6");
    }

    #[test]
    fn navigation_uses_links_and_sentinels() {
        let mut state = ClientState::new(0);
        state.update(ok("q", "/?8", "/?6"));

        assert_eq!(state.update(AppEvent::Action(Action::Next)), Some(Command::Fetch("/?8".into())));
        assert!(state.loading);
        assert_eq!(state.quote, "q");
        assert_eq!(state.update(AppEvent::Action(Action::Previous)), Some(Command::Fetch("/?6".into())));
        assert_eq!(state.update(AppEvent::Action(Action::First)), Some(Command::Fetch("/?0".into())));
        assert_eq!(state.update(AppEvent::Action(Action::Last)), Some(Command::Fetch("/?last".into())));
        assert_eq!(state.update(AppEvent::Action(Action::Random)), Some(Command::Fetch("/".into())));
    }

    #[test]
    fn next_without_link_fetches_empty_path() {
        let mut state = ClientState::new(0);
        state.update(ok("q", "", "/?6"));
        assert_eq!(state.update(AppEvent::Action(Action::Next)), Some(Command::Fetch(String::new())));
    }

    #[test]
    fn transport_error_goes_straight_to_errored() {
        let mut state = ClientState::new(0);
        state.update(AppEvent::Fetched(Err(RpcError::ConnectionClosed)));
        assert!(!state.loading);
        assert_eq!(state.err.as_deref(), Some("connection closed"));
        assert!(state.quote.is_empty());
    }

    #[test]
    fn content_error_is_shown() {
        let mut state = ClientState::new(0);
        state.update(ok("old", "/?2", "/?0"));
        state.update(AppEvent::Fetched(Ok(FetchResponse::failed("could not read page body"))));
        assert_eq!(state.err.as_deref(), Some("could not read page body"));
        assert_eq!(state.next_link, "/?2");
    }

    #[test]
    fn success_clears_previous_error() {
        let mut state = ClientState::new(0);
        state.update(AppEvent::Fetched(Err(RpcError::Remote("502".into()))));
        state.update(ok("back", "", ""));
        assert!(state.err.is_none());
        assert_eq!(state.quote, "back");
    }

    #[test]
    fn resize_only_touches_viewport() {
        let mut state = ClientState::new(0);
        assert_eq!(state.update(AppEvent::Resize { width: 120, height: 40 }), None);
        assert_eq!((state.width, state.height), (120, 40));
        assert!(state.loading);
    }

    #[test]
    fn spinner_only_moves_while_loading() {
        let mut state = ClientState::new(0);
        state.update(AppEvent::Tick);
        assert_eq!(state.spinner_frame(), "/");
        state.update(ok("q", "", ""));
        state.update(AppEvent::Tick);
        assert_eq!(state.spinner, 1);
    }

    #[test]
    fn nothing_changes_after_quit() {
        let mut state = ClientState::new(0);
        assert_eq!(state.update(AppEvent::Action(Action::Quit)), Some(Command::Quit));
        assert_eq!(state.update(ok("late", "/?1", "")), None);
        assert_eq!(state.update(AppEvent::Action(Action::Next)), None);
        assert!(state.loading);
        assert!(state.quote.is_empty());
    }
}
