//! Overlay-Schnittstelle für Editier-Marker und eine In-Memory-Umsetzung.

use indexmap::IndexMap;

use super::session::ChainId;
use crate::core::Vector2;

/// Schlüssel eines Markers im Overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerKey {
    /// Der aktive Vertex unter dem Zeiger
    Vertex,
    /// Tangenten-Arme einer Kette
    HandleLines(ChainId),
}

/// Darstellbarer Marker.
#[derive(Debug, Clone, PartialEq)]
pub enum Marker {
    /// Punkt-Marker (Position in Karten-Koordinaten, Größe in Pixeln)
    Vertex { coordinate: Vector2, size_px: f64 },
    /// Liniensegmente in Karten-Koordinaten
    HandleLines(Vec<[Vector2; 2]>),
}

/// Ziel für Editier-Marker (z.B. ein Karten-Layer).
pub trait Overlay {
    /// Zeigt einen Marker an oder ersetzt den vorhandenen.
    fn show(&mut self, key: MarkerKey, marker: Marker);

    /// Entfernt einen Marker; unbekannte Schlüssel werden ignoriert.
    fn hide(&mut self, key: MarkerKey);
}

/// Overlay, das Marker nur in Einfügereihenfolge sammelt.
#[derive(Debug, Clone, Default)]
pub struct MarkerOverlay {
    markers: IndexMap<MarkerKey, Marker>,
}

impl MarkerOverlay {
    /// Erstellt ein leeres Overlay.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marker zu einem Schlüssel.
    pub fn get(&self, key: MarkerKey) -> Option<&Marker> {
        self.markers.get(&key)
    }

    /// Position des Vertex-Markers, falls sichtbar.
    pub fn vertex(&self) -> Option<Vector2> {
        match self.markers.get(&MarkerKey::Vertex)? {
            Marker::Vertex { coordinate, .. } => Some(*coordinate),
            Marker::HandleLines(_) => None,
        }
    }

    /// Alle Marker in Einfügereihenfolge.
    pub fn iter(&self) -> impl Iterator<Item = (&MarkerKey, &Marker)> {
        self.markers.iter()
    }

    /// Anzahl sichtbarer Marker.
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    /// Keine Marker sichtbar?
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

impl Overlay for MarkerOverlay {
    fn show(&mut self, key: MarkerKey, marker: Marker) {
        self.markers.insert(key, marker);
    }

    fn hide(&mut self, key: MarkerKey) {
        self.markers.shift_remove(&key);
    }
}
