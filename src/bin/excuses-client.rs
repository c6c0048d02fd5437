use std::io::{self, Stdout};
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use crossterm::{
    event, execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use tokio::runtime::Runtime;
use tokio::sync::mpsc::{self, UnboundedSender};

use excuses::app::{AppEvent, ClientState, Command, dispatch_fetch};
use excuses::config::{ClientCli, ClientSettings};
use excuses::network::RpcClient;
use excuses::{input, ui};

const TICK: Duration = Duration::from_millis(100);

fn main() -> anyhow::Result<()> {
    let cli = ClientCli::parse();
    let settings = ClientSettings::load(&cli).context("Could not load configuration")?;

    let rt = Runtime::new()?;
    let client = rt
        .block_on(RpcClient::connect(settings.server.as_str()))
        .with_context(|| format!("Connection error: {}", settings.server))?;

    terminal::enable_raw_mode()?;
    execute!(io::stdout(), EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;

    let result = run(&mut terminal, &rt, client);

    terminal::disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result
}

/// Returns false once the loop should stop.
fn perform(command: Option<Command>, rt: &Runtime, client: &RpcClient, events: &UnboundedSender<AppEvent>) -> bool {
    match command {
        Some(Command::Fetch(path)) => {
            dispatch_fetch(rt.handle(), client.clone(), path, events.clone());
            true
        }
        Some(Command::Quit) => false,
        None => true,
    }
}

fn run(terminal: &mut Terminal<CrosstermBackend<Stdout>>, rt: &Runtime, client: RpcClient) -> anyhow::Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel::<AppEvent>();
    let mut state = ClientState::default();

    let (width, height) = terminal::size()?;
    state.update(AppEvent::Resize { width, height });
    perform(Some(state.init()), rt, &client, &tx);

    loop {
        terminal.draw(|f| ui::render(f, &state))?;

        if event::poll(TICK)? {
            if let Some(ev) = input::translate(event::read()?) {
                if !perform(state.update(ev), rt, &client, &tx) {
                    break;
                }
            }
        }

        while let Ok(ev) = rx.try_recv() {
            perform(state.update(ev), rt, &client, &tx);
        }
        state.update(AppEvent::Tick);
    }

    Ok(())
}
