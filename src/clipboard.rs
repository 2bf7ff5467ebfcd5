//! Clipboard for yanked text.
//!
//! Uses the system clipboard through `arboard` when one is reachable. Over
//! SSH or on a headless box there is none, so the text is sent to the outer
//! terminal as an OSC 52 sequence instead.

use std::io::Write;

use anyhow::{Context, Result};
use base64::Engine as _;

/// Where copied text ends up.
pub enum Clipboard {
    /// OS clipboard.
    System(arboard::Clipboard),
    /// OSC 52 escape written to stdout.
    Osc52,
    /// In-memory history (tests, or when stdout is not a terminal).
    Memory(Vec<String>),
}

impl std::fmt::Debug for Clipboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::System(_) => f.write_str("Clipboard::System"),
            Self::Osc52 => f.write_str("Clipboard::Osc52"),
            Self::Memory(items) => f.debug_tuple("Clipboard::Memory").field(&items.len()).finish(),
        }
    }
}

impl Clipboard {
    /// System clipboard if available, OSC 52 otherwise.
    pub fn detect() -> Self {
        match arboard::Clipboard::new() {
            Ok(inner) => Self::System(inner),
            Err(e) => {
                log::info!("System clipboard unavailable ({e}); using OSC 52");
                Self::Osc52
            }
        }
    }

    /// Clipboard that only records what was copied.
    pub fn memory() -> Self {
        Self::Memory(Vec::new())
    }

    /// Copy `text`.
    pub fn set_text(&mut self, text: &str) -> Result<()> {
        match self {
            Self::System(inner) => inner
                .set_text(text.to_owned())
                .context("Failed to write system clipboard"),
            Self::Osc52 => {
                let mut out = std::io::stdout().lock();
                out.write_all(&osc52_sequence(text))
                    .and_then(|()| out.flush())
                    .context("Failed to write OSC 52 sequence")
            }
            Self::Memory(items) => {
                items.push(text.to_owned());
                Ok(())
            }
        }
    }

    /// Most recent copy, for the in-memory clipboard.
    pub fn last(&self) -> Option<&str> {
        match self {
            Self::Memory(items) => items.last().map(String::as_str),
            _ => None,
        }
    }
}

/// `ESC ] 52 ; c ; <base64> BEL`
pub fn osc52_sequence(text: &str) -> Vec<u8> {
    let encoded = base64::engine::general_purpose::STANDARD.encode(text.as_bytes());
    format!("\x1b]52;c;{encoded}\x07").into_bytes()
}
