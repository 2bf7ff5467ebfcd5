//! Key chords and PTY key encoding.
//!
//! [`KeyCombo`] parses the configurable prefix chord (`"ctrl+b"`,
//! `"alt+a"`, `"ctrl+space"`) and matches it against crossterm events.
//! [`key_to_pty_bytes`] turns a key event into the bytes an xterm would
//! send, honouring the application cursor mode (DECCKM) of the target
//! terminal.

// Rust guideline compliant 2026-02

use anyhow::{bail, Result};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// A key plus the modifiers that must be held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyCombo {
    /// Key.
    pub code: KeyCode,
    /// Required modifiers (Ctrl, Alt, Shift).
    pub modifiers: KeyModifiers,
}

impl KeyCombo {
    /// Parse a chord such as `"ctrl+b"` or `"ctrl+shift+a"`.
    ///
    /// Modifier names are case-insensitive; the last token is the key.
    pub fn parse(s: &str) -> Result<Self> {
        let tokens: Vec<&str> = s.split('+').map(str::trim).collect();
        let Some((key, mods)) = tokens.split_last() else {
            bail!("empty key chord");
        };
        if key.is_empty() {
            bail!("key chord {s:?} has no key");
        }

        let mut modifiers = KeyModifiers::NONE;
        for token in mods {
            modifiers |= match token.to_lowercase().as_str() {
                "ctrl" | "control" | "c" => KeyModifiers::CONTROL,
                "alt" | "meta" | "option" | "m" => KeyModifiers::ALT,
                "shift" | "s" => KeyModifiers::SHIFT,
                other => bail!("unrecognized modifier {other:?} in {s:?}"),
            };
        }

        let code = match key.to_lowercase().as_str() {
            "space" => KeyCode::Char(' '),
            "enter" | "return" => KeyCode::Enter,
            "tab" => KeyCode::Tab,
            "esc" | "escape" => KeyCode::Esc,
            "backspace" => KeyCode::Backspace,
            lower => {
                let mut chars = lower.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => KeyCode::Char(c),
                    _ => bail!("unsupported key {key:?} in {s:?}"),
                }
            }
        };
        Ok(Self { code, modifiers })
    }

    /// Whether `key` is this chord.
    ///
    /// Character keys compare case-insensitively and ignore Shift unless the
    /// chord asks for it, since terminals disagree on whether Ctrl+B arrives
    /// as `b` or `B`.
    pub fn matches(&self, key: &KeyEvent) -> bool {
        let relevant = KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SHIFT;
        match (self.code, key.code) {
            (KeyCode::Char(want), KeyCode::Char(got)) => {
                let mut mask = KeyModifiers::CONTROL | KeyModifiers::ALT;
                if self.modifiers.contains(KeyModifiers::SHIFT) {
                    mask |= KeyModifiers::SHIFT;
                }
                want.eq_ignore_ascii_case(&got) && (key.modifiers & mask) == self.modifiers
            }
            (want, got) => want == got && (key.modifiers & relevant) == self.modifiers,
        }
    }

    /// Bytes sent to the shell when the chord is forwarded literally.
    pub fn to_pty_bytes(&self) -> Option<Vec<u8>> {
        key_to_pty_bytes(self.code, self.modifiers, false)
    }

    /// Human-readable form for the dock and help overlay, e.g. `C-b`.
    pub fn label(&self) -> String {
        let mut out = String::new();
        if self.modifiers.contains(KeyModifiers::CONTROL) {
            out.push_str("C-");
        }
        if self.modifiers.contains(KeyModifiers::ALT) {
            out.push_str("M-");
        }
        if self.modifiers.contains(KeyModifiers::SHIFT) {
            out.push_str("S-");
        }
        match self.code {
            KeyCode::Char(' ') => out.push_str("Space"),
            KeyCode::Char(c) => out.push(c),
            other => out.push_str(&format!("{other:?}")),
        }
        out
    }
}

/// xterm modifier parameter: 1 + (shift | alt << 1 | ctrl << 2).
fn modifier_param(modifiers: KeyModifiers) -> u8 {
    let mut bits = 0;
    if modifiers.contains(KeyModifiers::SHIFT) {
        bits |= 1;
    }
    if modifiers.contains(KeyModifiers::ALT) {
        bits |= 2;
    }
    if modifiers.contains(KeyModifiers::CONTROL) {
        bits |= 4;
    }
    1 + bits
}

/// Cursor-style key (`A`..`D`, `H`, `F`): SS3 in application mode, CSI
/// otherwise, CSI with a modifier parameter when modified.
fn cursor_key(final_byte: u8, modifiers: KeyModifiers, app_cursor: bool) -> Vec<u8> {
    let param = modifier_param(modifiers);
    if param > 1 {
        format!("\x1b[1;{param}{}", final_byte as char).into_bytes()
    } else if app_cursor {
        vec![0x1b, b'O', final_byte]
    } else {
        vec![0x1b, b'[', final_byte]
    }
}

/// `CSI n ~` keys (PageUp, Delete, F5...).
fn tilde_key(n: u8, modifiers: KeyModifiers) -> Vec<u8> {
    let param = modifier_param(modifiers);
    if param > 1 {
        format!("\x1b[{n};{param}~").into_bytes()
    } else {
        format!("\x1b[{n}~").into_bytes()
    }
}

/// Converts a key event to bytes for forwarding to a PTY.
///
/// Returns `None` for keys that have no terminal encoding.
pub fn key_to_pty_bytes(code: KeyCode, modifiers: KeyModifiers, app_cursor: bool) -> Option<Vec<u8>> {
    let alt = modifiers.contains(KeyModifiers::ALT);
    let ctrl = modifiers.contains(KeyModifiers::CONTROL);

    let mut bytes = match code {
        KeyCode::Char(c) if ctrl => match c.to_ascii_lowercase() {
            // Ctrl+A = 1, Ctrl+B = 2, ...
            l @ 'a'..='z' => vec![(l as u8) & 0x1f],
            '@' | ' ' | '2' => vec![0],
            '[' | '3' => vec![0x1b],
            '\\' | '4' => vec![0x1c],
            ']' | '5' => vec![0x1d],
            '^' | '6' => vec![0x1e],
            '_' | '7' | '/' => vec![0x1f],
            '8' | '?' => vec![0x7f],
            other => other.to_string().into_bytes(),
        },
        KeyCode::Char(c) => c.to_string().into_bytes(),
        KeyCode::Backspace => vec![if ctrl { 0x08 } else { 0x7f }],
        KeyCode::Enter => vec![b'\r'],
        KeyCode::Esc => vec![0x1b],
        KeyCode::Tab => vec![b'\t'],
        KeyCode::BackTab => b"\x1b[Z".to_vec(),
        KeyCode::Up => return Some(cursor_key(b'A', modifiers, app_cursor)),
        KeyCode::Down => return Some(cursor_key(b'B', modifiers, app_cursor)),
        KeyCode::Right => return Some(cursor_key(b'C', modifiers, app_cursor)),
        KeyCode::Left => return Some(cursor_key(b'D', modifiers, app_cursor)),
        KeyCode::Home => return Some(cursor_key(b'H', modifiers, app_cursor)),
        KeyCode::End => return Some(cursor_key(b'F', modifiers, app_cursor)),
        KeyCode::Insert => return Some(tilde_key(2, modifiers)),
        KeyCode::Delete => return Some(tilde_key(3, modifiers)),
        KeyCode::PageUp => return Some(tilde_key(5, modifiers)),
        KeyCode::PageDown => return Some(tilde_key(6, modifiers)),
        KeyCode::F(n @ 1..=4) => {
            let final_byte = b'P' + (n - 1);
            let param = modifier_param(modifiers);
            return Some(if param > 1 {
                format!("\x1b[1;{param}{}", final_byte as char).into_bytes()
            } else {
                vec![0x1b, b'O', final_byte]
            });
        }
        KeyCode::F(n @ 5..=12) => {
            const CODES: [u8; 8] = [15, 17, 18, 19, 20, 21, 23, 24];
            return Some(tilde_key(CODES[usize::from(n - 5)], modifiers));
        }
        _ => return None,
    };

    if alt {
        bytes.insert(0, 0x1b);
    }
    Some(bytes)
}

/// Wrap pasted text for the shell, in bracketed-paste markers when the
/// program asked for them. Newlines become carriage returns, as a real
/// terminal sends them.
pub fn paste_bytes(text: &str, bracketed: bool) -> Vec<u8> {
    let body = text.replace("\r\n", "\r").replace('\n', "\r");
    if bracketed {
        let mut out = Vec::with_capacity(body.len() + 12);
        out.extend_from_slice(b"\x1b[200~");
        out.extend_from_slice(body.as_bytes());
        out.extend_from_slice(b"\x1b[201~");
        out
    } else {
        body.into_bytes()
    }
}
