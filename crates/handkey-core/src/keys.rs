//! Key-binding strings such as `"space"`, `"w"` or `"ctrl+shift+s"`
//!
//! The engine only validates and hands the parsed binding to the injection
//! collaborator; it never talks to the OS itself.

use crate::error::ModelError;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Modifier {
    Ctrl,
    Shift,
    Alt,
    Super,
}

impl Modifier {
    fn parse(token: &str) -> Option<Self> {
        match token {
            "ctrl" | "control" => Some(Modifier::Ctrl),
            "shift" => Some(Modifier::Shift),
            "alt" => Some(Modifier::Alt),
            "cmd" | "super" => Some(Modifier::Super),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Modifier::Ctrl => "ctrl",
            Modifier::Shift => "shift",
            Modifier::Alt => "alt",
            Modifier::Super => "super",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedKey {
    Space,
    Enter,
    Tab,
    Escape,
    Backspace,
    Delete,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
    PageUp,
    PageDown,
    CapsLock,
    /// Function keys F1-F12.
    F(u8),
}

impl NamedKey {
    fn parse(token: &str) -> Option<Self> {
        let key = match token {
            "space" => NamedKey::Space,
            "enter" | "return" => NamedKey::Enter,
            "tab" => NamedKey::Tab,
            "esc" | "escape" => NamedKey::Escape,
            "backspace" => NamedKey::Backspace,
            "delete" | "del" => NamedKey::Delete,
            "up" => NamedKey::Up,
            "down" => NamedKey::Down,
            "left" => NamedKey::Left,
            "right" => NamedKey::Right,
            "home" => NamedKey::Home,
            "end" => NamedKey::End,
            "page_up" | "pageup" => NamedKey::PageUp,
            "page_down" | "pagedown" => NamedKey::PageDown,
            "caps_lock" | "capslock" => NamedKey::CapsLock,
            _ => {
                let n: u8 = token.strip_prefix('f')?.parse().ok()?;
                if !(1..=12).contains(&n) {
                    return None;
                }
                NamedKey::F(n)
            }
        };
        Some(key)
    }
}

impl fmt::Display for NamedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NamedKey::Space => "space",
            NamedKey::Enter => "enter",
            NamedKey::Tab => "tab",
            NamedKey::Escape => "esc",
            NamedKey::Backspace => "backspace",
            NamedKey::Delete => "delete",
            NamedKey::Up => "up",
            NamedKey::Down => "down",
            NamedKey::Left => "left",
            NamedKey::Right => "right",
            NamedKey::Home => "home",
            NamedKey::End => "end",
            NamedKey::PageUp => "page_up",
            NamedKey::PageDown => "page_down",
            NamedKey::CapsLock => "caps_lock",
            NamedKey::F(n) => return write!(f, "f{}", n),
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    Named(NamedKey),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Char(c) => write!(f, "{}", c),
            Key::Named(named) => write!(f, "{}", named),
        }
    }
}

/// A parsed key binding. Keeps the string it was parsed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBinding {
    raw: String,
    pub modifiers: Vec<Modifier>,
    pub key: Key,
}

impl KeyBinding {
    pub fn parse(binding: &str) -> Result<Self, ModelError> {
        let invalid = |reason: &str| ModelError::InvalidKeyBinding {
            binding: binding.to_string(),
            reason: reason.to_string(),
        };

        let lowered = binding.trim().to_lowercase();
        if lowered.is_empty() {
            return Err(invalid("empty binding"));
        }

        // A bare "+" is the plus key, not a separator.
        let (mod_part, key_part) = match lowered.strip_suffix("++") {
            Some(rest) => (Some(rest), "+"),
            None if lowered == "+" => (None, "+"),
            None => match lowered.rsplit_once('+') {
                Some((mods, key)) => (Some(mods), key),
                None => (None, lowered.as_str()),
            },
        };

        let mut modifiers = Vec::new();
        for token in mod_part.into_iter().flat_map(|m| m.split('+')) {
            let token = token.trim();
            let modifier = Modifier::parse(token).ok_or_else(|| invalid(&format!("unknown modifier '{}'", token)))?;
            if !modifiers.contains(&modifier) {
                modifiers.push(modifier);
            }
        }
        modifiers.sort();

        let key_token = key_part.trim();
        let key = if let Some(named) = NamedKey::parse(key_token) {
            Key::Named(named)
        } else {
            let mut chars = key_token.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if !c.is_whitespace() => Key::Char(c),
                (None, _) => return Err(invalid("missing key")),
                _ => return Err(invalid(&format!("unknown key '{}'", key_token))),
            }
        };

        Ok(Self {
            raw: binding.to_string(),
            modifiers,
            key,
        })
    }

    /// The binding as originally written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn has_modifiers(&self) -> bool {
        !self.modifiers.is_empty()
    }
}

impl FromStr for KeyBinding {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Canonical form: sorted modifiers, lower-case key names.
impl fmt::Display for KeyBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for m in &self.modifiers {
            write!(f, "{}+", m.as_str())?;
        }
        write!(f, "{}", self.key)
    }
}
