//! Interactive event loop
//!
//! Terminal bracketing, key dispatch per screen, and the drain of auth
//! and channel completions into the state machines. Every state
//! transition happens here, on one task, in event arrival order; the
//! network work runs in spawned tasks that report back over channels.

use std::error::Error;
use std::io;
use std::time::Duration;

use ratatui::backend::CrosstermBackend;
use ratatui::crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::crossterm::execute;
use ratatui::crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::Terminal;
use reqwest::Client;
use tokio::sync::mpsc;
use tracing::debug;

use crate::api;
use crate::core::app::App;
use crate::core::channel::ChannelManager;
use crate::core::session::{AuthEvent, AuthScreen};
use crate::core::socket;
use crate::ui::renderer::{max_scroll_offset, ui};
use crate::utils::input::sanitize_text_input;
use crate::utils::url::websocket_url;

/// Run the interactive session against `server_url` until the person
/// quits.
pub async fn run_chat(server_url: String) -> Result<(), Box<dyn Error>> {
    let client = api::build_client()?;
    let mut app = App::new();
    let (auth_tx, mut auth_rx) = mpsc::unbounded_channel::<AuthEvent>();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_loop(
        &mut terminal,
        &mut app,
        &client,
        &server_url,
        &auth_tx,
        &mut auth_rx,
    )
    .await;

    // Tear the channel down before releasing the terminal so no event
    // can land in the log afterwards.
    app.unmount_channel();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    client: &Client,
    server_url: &str,
    auth_tx: &mpsc::UnboundedSender<AuthEvent>,
    auth_rx: &mut mpsc::UnboundedReceiver<AuthEvent>,
) -> Result<(), Box<dyn Error>> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if app.needs_channel() {
            mount_channel(app, server_url);
        }

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    let height = terminal.size().map(|size| size.height).unwrap_or_default();
                    handle_key(app, key.code, key.modifiers, client, server_url, auth_tx, height);
                }
            }
        }

        while let Ok(completion) = auth_rx.try_recv() {
            app.apply_auth_event(completion);
        }
        app.pump_channel_events();

        if app.exit_requested {
            return Ok(());
        }
    }
}

fn handle_key(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    client: &Client,
    server_url: &str,
    auth_tx: &mpsc::UnboundedSender<AuthEvent>,
    terminal_height: u16,
) {
    if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
        app.exit_requested = true;
        return;
    }

    match app.auth.screen {
        AuthScreen::Authenticated { .. } => {
            handle_chat_key(app, code, terminal_height);
        }
        _ => handle_credentials_key(app, code, client, server_url, auth_tx),
    }
}

fn handle_credentials_key(
    app: &mut App,
    code: KeyCode,
    client: &Client,
    server_url: &str,
    auth_tx: &mpsc::UnboundedSender<AuthEvent>,
) {
    match code {
        KeyCode::Char(c) if !c.is_control() => app.focused_value_mut().push(c),
        KeyCode::Backspace => {
            app.focused_value_mut().pop();
        }
        KeyCode::Tab => app.cycle_focus(),
        KeyCode::Enter => submit_credentials(app, client, server_url, auth_tx),
        KeyCode::Esc => {
            let switch = match app.auth.screen {
                AuthScreen::Registering => AuthEvent::SwitchToLogin,
                _ => AuthEvent::SwitchToRegister,
            };
            app.apply_auth_event(switch);
        }
        _ => {}
    }
}

fn handle_chat_key(app: &mut App, code: KeyCode, terminal_height: u16) {
    // Rows left for the transcript once the input box and title are cut.
    let available_height = terminal_height.saturating_sub(3).saturating_sub(1);
    match code {
        KeyCode::Char(c) if !c.is_control() => app.chat_input.push(c),
        KeyCode::Backspace => {
            app.chat_input.pop();
        }
        KeyCode::Enter => submit_chat(app),
        KeyCode::Up => {
            let max = max_scroll_offset(app, available_height);
            let current = if app.auto_scroll {
                max
            } else {
                app.scroll_offset.min(max)
            };
            app.scroll_offset = current.saturating_sub(1);
            app.auto_scroll = false;
        }
        KeyCode::Down => {
            let max = max_scroll_offset(app, available_height);
            let next = app.scroll_offset.saturating_add(1).min(max);
            app.scroll_offset = next;
            if next >= max {
                app.auto_scroll = true;
            }
        }
        _ => {}
    }
}

/// Submit whichever credential form is live. Inert while a request is
/// already in flight or while a required field is blank: no banner, no
/// network call.
fn submit_credentials(
    app: &mut App,
    client: &Client,
    server_url: &str,
    auth_tx: &mpsc::UnboundedSender<AuthEvent>,
) {
    if app.auth_in_flight {
        return;
    }

    match app.auth.screen {
        AuthScreen::Registering => {
            let credentials = app.form.clone();
            if credentials.username.trim().is_empty()
                || credentials.email.trim().is_empty()
                || credentials.password.is_empty()
            {
                return;
            }
            app.auth_in_flight = true;

            let client = client.clone();
            let base = server_url.to_string();
            let tx = auth_tx.clone();
            tokio::spawn(async move {
                let completion = match api::register(&client, &base, &credentials).await {
                    Ok(session) => AuthEvent::RegisterSucceeded(session),
                    Err(api::AuthError::Rejected(rejection)) => AuthEvent::RegisterFailed {
                        rejection,
                        attempted: credentials,
                    },
                    Err(e) => AuthEvent::RegisterFailed {
                        rejection: api::AuthRejection::Unknown(e.to_string()),
                        attempted: credentials,
                    },
                };
                let _ = tx.send(completion);
            });
        }
        AuthScreen::LoggingIn { .. } => {
            let email = app.form.email.clone();
            let password = app.form.password.clone();
            if email.trim().is_empty() || password.is_empty() {
                return;
            }
            app.auth_in_flight = true;

            let client = client.clone();
            let base = server_url.to_string();
            let tx = auth_tx.clone();
            tokio::spawn(async move {
                let completion = match api::login(&client, &base, &email, &password).await {
                    Ok(session) => AuthEvent::LoginSucceeded(session),
                    Err(api::AuthError::Rejected(rejection)) => AuthEvent::LoginFailed(rejection),
                    Err(e) => {
                        AuthEvent::LoginFailed(api::AuthRejection::Unknown(e.to_string()))
                    }
                };
                let _ = tx.send(completion);
            });
        }
        AuthScreen::Authenticated { .. } => {}
    }
}

fn submit_chat(app: &mut App) {
    let input = sanitize_text_input(&app.chat_input);
    let Some(channel) = app.channel.as_mut() else {
        return;
    };
    if channel.send(&input).is_some() {
        app.chat_input.clear();
        app.auto_scroll = true;
    }
}

fn mount_channel(app: &mut App, server_url: &str) {
    let Some(session) = app.auth.session() else {
        return;
    };
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let handle = socket::spawn(
        websocket_url(server_url),
        session.token.clone(),
        events_tx,
    );
    let manager = ChannelManager::open(session.user.username.clone(), handle);
    app.mount_channel(manager, events_rx);
    debug!("chat channel mounted");
}
