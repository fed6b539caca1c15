//! Screen rendering
//!
//! One entry point, [`ui`], dispatching to whichever of the three
//! screens the auth state machine has selected.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;

use crate::core::app::{App, FormField};
use crate::core::session::AuthScreen;

pub fn ui(f: &mut Frame, app: &App) {
    if app.auth.is_authenticated() {
        draw_chat(f, app);
    } else {
        let registering = matches!(app.auth.screen, AuthScreen::Registering);
        draw_credentials(f, app, registering);
    }
}

/// Transcript lines in log order. System notifications render centered
/// and dim; the local user's own messages sit flush right, everyone
/// else's flush left.
pub fn transcript_lines(app: &App) -> Vec<Line<'static>> {
    let Some(channel) = app.channel.as_ref() else {
        return Vec::new();
    };
    let me = channel.username().to_string();

    let mut lines = Vec::with_capacity(channel.messages().len());
    for message in channel.messages() {
        if message.is_system {
            lines.push(
                Line::from(Span::styled(
                    message.text.clone(),
                    Style::default()
                        .fg(Color::DarkGray)
                        .add_modifier(Modifier::ITALIC),
                ))
                .centered(),
            );
            continue;
        }

        let mine = message.is_from(&me);
        let name_style = if mine {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD)
        };
        let mut line = Line::from(vec![
            Span::styled(
                format!("[{}] ", message.time_label()),
                Style::default().fg(Color::DarkGray),
            ),
            Span::styled(format!("{}: ", message.username), name_style),
            Span::from(message.text.clone()),
        ]);
        if mine {
            line = line.right_aligned();
        }
        lines.push(line);
    }
    lines
}

/// Scroll limit for the transcript given the rows available to it.
pub fn max_scroll_offset(app: &App, available_height: u16) -> u16 {
    (transcript_lines(app).len() as u16).saturating_sub(available_height)
}

fn draw_chat(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)])
        .split(f.area());

    let lines = transcript_lines(app);
    let available_height = chunks[0].height.saturating_sub(1);
    let max_offset = (lines.len() as u16).saturating_sub(available_height);
    let offset = if app.auto_scroll {
        max_offset
    } else {
        app.scroll_offset.min(max_offset)
    };

    let (username, connected) = match app.channel.as_ref() {
        Some(channel) => (channel.username().to_string(), channel.is_connected()),
        None => (String::new(), false),
    };
    let status = if connected { "online" } else { "offline" };

    let transcript = Paragraph::new(lines)
        .block(Block::default().title(format!("Global Chat - {username} ({status})")))
        .wrap(Wrap { trim: true })
        .scroll((offset, 0));
    f.render_widget(transcript, chunks[0]);

    let input = Paragraph::new(app.chat_input.as_str())
        .style(Style::default().fg(Color::Yellow))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Type a message (Enter to send, Ctrl+C to quit)"),
        )
        .wrap(Wrap { trim: true });
    f.render_widget(input, chunks[1]);

    f.set_cursor_position((
        chunks[1].x + app.chat_input.chars().count() as u16 + 1,
        chunks[1].y + 1,
    ));
}

fn draw_credentials(f: &mut Frame, app: &App, registering: bool) {
    let height = if registering { 13 } else { 10 };
    let area = centered_rect(48, height, f.area());

    let card = Block::default().borders(Borders::ALL).title(if registering {
        " Join the chat "
    } else {
        " Welcome back "
    });
    let inner = card.inner(area);
    f.render_widget(card, area);

    let mut constraints = vec![Constraint::Length(1)];
    if registering {
        constraints.push(Constraint::Length(3));
    }
    constraints.extend([
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Length(1),
        Constraint::Min(0),
    ]);
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(inner);

    let banner = match &app.auth.error {
        Some(error) => {
            Line::from(Span::styled(error.clone(), Style::default().fg(Color::Red))).centered()
        }
        None => Line::from(""),
    };
    f.render_widget(Paragraph::new(banner), rows[0]);

    let mut row = 1;
    if registering {
        draw_field(
            f,
            rows[row],
            "Username",
            &app.form.username,
            app.focus == FormField::Username,
            false,
        );
        row += 1;
    }
    draw_field(
        f,
        rows[row],
        "Email",
        &app.form.email,
        app.focus == FormField::Email,
        false,
    );
    row += 1;
    draw_field(
        f,
        rows[row],
        "Password",
        &app.form.password,
        app.focus == FormField::Password,
        true,
    );
    row += 1;

    let status = if app.auth_in_flight {
        if registering {
            "Creating..."
        } else {
            "Logging in..."
        }
    } else if registering {
        "Enter create / Tab next field / Esc sign in instead"
    } else {
        "Enter log in / Tab next field / Esc create an account"
    };
    f.render_widget(
        Paragraph::new(
            Line::from(Span::styled(
                status.to_string(),
                Style::default().fg(Color::DarkGray),
            ))
            .centered(),
        ),
        rows[row],
    );
}

fn draw_field(f: &mut Frame, area: Rect, label: &str, value: &str, focused: bool, masked: bool) {
    let shown = if masked {
        "*".repeat(value.chars().count())
    } else {
        value.to_string()
    };
    let style = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    let field = Paragraph::new(shown).style(style).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(style)
            .title(label.to_string()),
    );
    f.render_widget(field, area);
}

fn centered_rect(width: u16, height: u16, r: Rect) -> Rect {
    let width = width.min(r.width);
    let height = height.min(r.height);
    Rect {
        x: r.x + (r.width - width) / 2,
        y: r.y + (r.height - height) / 2,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::channel::{ChannelEvent, ChannelHandle, ChannelManager};
    use crate::core::session::{AuthEvent, Session, User};
    use ratatui::layout::Alignment;
    use tokio::sync::mpsc;
    use tokio_util::sync::CancellationToken;

    fn chat_app() -> (App, mpsc::UnboundedReceiver<crate::core::wire::WireEvent>) {
        let mut app = App::new();
        app.apply_auth_event(AuthEvent::LoginSucceeded(Session {
            token: "t1".to_string(),
            user: User {
                id: 1,
                username: "al".to_string(),
                email: "a@x.com".to_string(),
            },
        }));

        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let (_events_tx, events_rx) = mpsc::unbounded_channel();
        let mut manager = ChannelManager::open(
            "al",
            ChannelHandle {
                outbound,
                cancel: CancellationToken::new(),
            },
        );
        manager.handle_event(ChannelEvent::Connected);
        app.mount_channel(manager, events_rx);
        (app, outbound_rx)
    }

    #[test]
    fn transcript_reflects_log_order_and_alignment() {
        let (mut app, _outbound_rx) = chat_app();
        {
            let channel = app.channel.as_mut().expect("mounted");
            channel.handle_event(ChannelEvent::SystemNotice("bob joined".to_string()));
            assert!(channel.send("hi").is_some());
        }

        let lines = transcript_lines(&app);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].alignment, Some(Alignment::Center));
        assert_eq!(lines[1].alignment, Some(Alignment::Right));
    }

    #[test]
    fn scroll_limit_tracks_the_transcript_length() {
        let (mut app, _outbound_rx) = chat_app();
        {
            let channel = app.channel.as_mut().expect("mounted");
            for _ in 0..5 {
                channel.handle_event(ChannelEvent::SystemNotice("tick".to_string()));
            }
        }

        assert_eq!(max_scroll_offset(&app, 3), 2);
        assert_eq!(max_scroll_offset(&app, 10), 0);
    }

    #[test]
    fn centered_rect_never_exceeds_the_frame() {
        let frame = Rect::new(0, 0, 20, 5);
        let rect = centered_rect(48, 13, frame);
        assert!(rect.width <= frame.width);
        assert!(rect.height <= frame.height);
    }
}
