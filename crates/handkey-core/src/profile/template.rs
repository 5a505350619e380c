//! Built-in profile templates
//!
//! A template is only a list of gesture names and suggested bindings. The
//! gestures still have to be recorded before they can match anything.

use super::{HandType, Profile};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A gesture slot waiting to be recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GesturePlaceholder {
    pub name: String,
    pub key_binding: String,
    pub hand_type: HandType,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateKind {
    Racing,
    MediaPlayer,
    GeneralGaming,
}

impl TemplateKind {
    pub const ALL: [TemplateKind; 3] = [TemplateKind::Racing, TemplateKind::MediaPlayer, TemplateKind::GeneralGaming];

    pub fn display_name(&self) -> &'static str {
        match self {
            TemplateKind::Racing => "Racing Game",
            TemplateKind::MediaPlayer => "Video Player",
            TemplateKind::GeneralGaming => "General Gaming",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            TemplateKind::Racing => "Profile for racing games with directional controls",
            TemplateKind::MediaPlayer => "Profile for video player controls",
            TemplateKind::GeneralGaming => "General gaming profile with common controls",
        }
    }

    /// (gesture name, suggested key binding, description)
    fn entries(&self) -> &'static [(&'static str, &'static str, &'static str)] {
        match self {
            TemplateKind::Racing => &[
                ("accelerate", "up", "Accelerate"),
                ("brake", "down", "Brake/Reverse"),
                ("turn_left", "left", "Turn Left"),
                ("turn_right", "right", "Turn Right"),
                ("nitro", "space", "Nitro Boost"),
                ("horn", "h", "Horn"),
            ],
            TemplateKind::MediaPlayer => &[
                ("play_pause", "space", "Play/Pause"),
                ("volume_up", "up", "Volume Up"),
                ("volume_down", "down", "Volume Down"),
                ("seek_forward", "right", "Seek Forward"),
                ("seek_backward", "left", "Seek Backward"),
                ("fullscreen", "f", "Toggle Fullscreen"),
            ],
            TemplateKind::GeneralGaming => &[
                ("jump", "space", "Jump"),
                ("move_forward", "w", "Move Forward"),
                ("move_backward", "s", "Move Backward"),
                ("move_left", "a", "Move Left"),
                ("move_right", "d", "Move Right"),
                ("action", "e", "Action/Interact"),
            ],
        }
    }

    pub fn placeholders(&self) -> Vec<GesturePlaceholder> {
        self.entries()
            .iter()
            .map(|(name, key, description)| GesturePlaceholder {
                name: name.to_string(),
                key_binding: key.to_string(),
                hand_type: HandType::Single,
                description: description.to_string(),
            })
            .collect()
    }

    /// Profile draft named after the template, with placeholders and no gestures.
    pub fn instantiate(&self) -> Profile {
        let mut profile = Profile::new(self.display_name(), self.description());
        profile.placeholders = self.placeholders();
        profile
    }
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for TemplateKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .to_ascii_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        match key.as_str() {
            "racing" | "racinggame" => Ok(TemplateKind::Racing),
            "media" | "mediaplayer" | "videoplayer" => Ok(TemplateKind::MediaPlayer),
            "gaming" | "generalgaming" => Ok(TemplateKind::GeneralGaming),
            _ => Err(format!("unknown template '{}'", s)),
        }
    }
}
