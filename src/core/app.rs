//! Shell state for the interactive session
//!
//! Holds the auth flow, the form fields for the two credential screens,
//! and the mounted chat channel for the authenticated session. The event
//! loop in [`crate::ui::chat_loop`] owns an `App` and feeds it key
//! events and task completions; all mutation happens there, in arrival
//! order.

use std::mem::discriminant;

use tokio::sync::mpsc;

use crate::core::channel::{ChannelEvent, ChannelManager};
use crate::core::session::{AuthEvent, AuthFlow, AuthScreen, Credentials};

/// Which form field has focus on the credential screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Username,
    Email,
    Password,
}

impl FormField {
    /// Tab order on the register screen.
    fn next_register(self) -> Self {
        match self {
            FormField::Username => FormField::Email,
            FormField::Email => FormField::Password,
            FormField::Password => FormField::Username,
        }
    }

    /// Tab order on the login screen, which has no username field.
    fn next_login(self) -> Self {
        match self {
            FormField::Email => FormField::Password,
            _ => FormField::Email,
        }
    }
}

pub struct App {
    pub auth: AuthFlow,
    pub form: Credentials,
    pub focus: FormField,
    pub auth_in_flight: bool,
    pub channel: Option<ChannelManager>,
    pub channel_events: Option<mpsc::UnboundedReceiver<ChannelEvent>>,
    pub chat_input: String,
    pub scroll_offset: u16,
    pub auto_scroll: bool,
    pub exit_requested: bool,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    pub fn new() -> Self {
        Self {
            auth: AuthFlow::new(),
            form: Credentials::default(),
            focus: FormField::Username,
            auth_in_flight: false,
            channel: None,
            channel_events: None,
            chat_input: String::new(),
            scroll_offset: 0,
            auto_scroll: true,
            exit_requested: false,
        }
    }

    /// Apply an auth completion or switch, then sync the form state if
    /// the screen changed. A failure that stays on the same screen keeps
    /// whatever the person typed.
    pub fn apply_auth_event(&mut self, event: AuthEvent) {
        if matches!(
            event,
            AuthEvent::RegisterSucceeded(_)
                | AuthEvent::RegisterFailed { .. }
                | AuthEvent::LoginSucceeded(_)
                | AuthEvent::LoginFailed(_)
        ) {
            self.auth_in_flight = false;
        }

        let before = discriminant(&self.auth.screen);
        self.auth.apply(event);
        if discriminant(&self.auth.screen) != before {
            self.sync_form_with_screen();
        }
    }

    fn sync_form_with_screen(&mut self) {
        match &self.auth.screen {
            AuthScreen::Registering => {
                self.form = Credentials::default();
                self.focus = FormField::Username;
            }
            AuthScreen::LoggingIn { hint } => {
                self.form = Credentials::default();
                if let Some(hint) = hint {
                    self.form.email = hint.email.clone();
                    self.form.password = hint.password.clone();
                }
                self.focus = FormField::Email;
            }
            AuthScreen::Authenticated { .. } => {}
        }
    }

    /// The form field receiving typed characters on the current screen.
    pub fn focused_value_mut(&mut self) -> &mut String {
        match self.focus {
            FormField::Username => &mut self.form.username,
            FormField::Email => &mut self.form.email,
            FormField::Password => &mut self.form.password,
        }
    }

    pub fn cycle_focus(&mut self) {
        self.focus = match self.auth.screen {
            AuthScreen::Registering => self.focus.next_register(),
            _ => self.focus.next_login(),
        };
    }

    /// True once a session exists but its channel is not mounted yet.
    pub fn needs_channel(&self) -> bool {
        self.auth.is_authenticated() && self.channel.is_none()
    }

    pub fn mount_channel(
        &mut self,
        manager: ChannelManager,
        events: mpsc::UnboundedReceiver<ChannelEvent>,
    ) {
        self.channel = Some(manager);
        self.channel_events = Some(events);
    }

    /// Tear down the mounted channel. The connection closes exactly once
    /// and no further events are applied to the log.
    pub fn unmount_channel(&mut self) {
        if let Some(channel) = self.channel.as_mut() {
            channel.close();
        }
        self.channel = None;
        self.channel_events = None;
    }

    /// Drain and apply any channel events that arrived since last tick.
    pub fn pump_channel_events(&mut self) -> bool {
        let (Some(events), Some(channel)) = (self.channel_events.as_mut(), self.channel.as_mut())
        else {
            return false;
        };
        let mut received_any = false;
        while let Ok(event) = events.try_recv() {
            channel.handle_event(event);
            received_any = true;
        }
        received_any
    }
}
