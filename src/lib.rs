//! SmartSpark is a terminal chat client for a remote chat-completion API.
//!
//! - [`app`] owns conversation and UI state and every state transition.
//! - [`client`] speaks the backend's JSON-over-HTTP contract.
//! - [`preferences`] persists the theme in a small key-value file.
//! - [`ui`], [`handler`] and [`tui`] render state and feed terminal events back in.

pub mod app;
pub mod client;
pub mod config;
pub mod handler;
pub mod logging;
pub mod message;
pub mod preferences;
pub mod tui;
pub mod ui;

pub use app::{App, SEND_ERROR_MESSAGE};
pub use client::{ChatBackend, ChatClient, ChatRequest, ChatResponse, ClientError, ConversationRecord};
pub use config::Config;
pub use message::{Message, Role};
pub use preferences::{FilePreferences, MemoryPreferences, PreferenceStore, Theme};
