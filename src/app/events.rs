//! Zeiger-Events, die eine Edit-Session verarbeitet.
//!
//! Alle Positionen sind Screen-Pixel; die Umrechnung in Karten-Koordinaten
//! übernimmt die Session über ihren `ViewTransform`.

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Zustand der Modifier-Tasten beim Event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    /// Shift gedrückt
    pub shift: bool,
    /// Ctrl gedrückt
    pub ctrl: bool,
    /// Alt gedrückt
    pub alt: bool,
    /// Meta/Command gedrückt
    pub meta: bool,
}

impl Modifiers {
    /// Keine Modifier-Taste gedrückt.
    pub const NONE: Self = Self {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    /// Nur Shift gedrückt.
    pub const SHIFT: Self = Self {
        shift: true,
        ..Self::NONE
    };

    /// Ist irgendeine Modifier-Taste gedrückt?
    pub fn any(&self) -> bool {
        self.shift || self.ctrl || self.alt || self.meta
    }
}

/// Zeiger-Event in Screen-Pixeln.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PointerEvent {
    /// Zeiger bewegt ohne gedrückte Taste
    Move { pixel: DVec2 },
    /// Taste gedrückt
    Down { pixel: DVec2 },
    /// Zeiger bewegt mit gedrückter Taste
    Drag { pixel: DVec2 },
    /// Taste losgelassen
    Up {
        pixel: DVec2,
        #[serde(default)]
        modifiers: Modifiers,
    },
}

impl PointerEvent {
    /// Position des Events.
    pub fn pixel(&self) -> DVec2 {
        match *self {
            PointerEvent::Move { pixel }
            | PointerEvent::Down { pixel }
            | PointerEvent::Drag { pixel }
            | PointerEvent::Up { pixel, .. } => pixel,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_script_events() {
        let json = r#"[
            {"type": "move", "pixel": [15.0, 1.0]},
            {"type": "up", "pixel": [15.0, 1.0], "modifiers": {"shift": true}},
            {"type": "up", "pixel": [2.0, 3.0]}
        ]"#;
        let events: Vec<PointerEvent> = serde_json::from_str(json).expect("gültiges Skript");
        assert_eq!(
            events[0],
            PointerEvent::Move {
                pixel: DVec2::new(15.0, 1.0)
            }
        );
        assert_eq!(
            events[1],
            PointerEvent::Up {
                pixel: DVec2::new(15.0, 1.0),
                modifiers: Modifiers::SHIFT
            }
        );
        let PointerEvent::Up { modifiers, .. } = events[2] else {
            panic!("Up erwartet");
        };
        assert!(!modifiers.any());
        assert_eq!(events[2].pixel(), DVec2::new(2.0, 3.0));
    }
}
