//! Palaver is a full-screen terminal client for a single shared realtime
//! chat channel.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns the auth session state machine, the chat channel
//!   manager and its socket task, the wire protocol, and configuration.
//! - [`api`] defines the auth endpoint payloads and the HTTP calls that
//!   turn server responses into structured accept/reject outcomes.
//! - [`ui`] renders the terminal interface and runs the interactive event
//!   loop that drives user input and display updates.
//! - [`cli`] parses command-line arguments and boots the runtime.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`], which dispatches into
//! [`ui::chat_loop`] for the interactive session.

pub mod api;
pub mod cli;
pub mod core;
pub mod ui;
pub mod utils;
