//! Pfad-Feature: Geometrie plus optionale Kurvenbeschreibung.
//!
//! Das JSON-Format lehnt sich an GeoJSON an:
//! `{"id": 1, "geometry": {"type": "LineString", "coordinates": [[x, y], …]}, "bezier": […]}`.
//! `bezier` enthält pro Segment die vier Kontrollpunkte und erlaubt eine
//! verlustfreie Wiederherstellung der Kette.

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

use super::math::Vector2;

/// Kontrollpunkte aller Segmente einer Kette, in Reihenfolge.
pub type CurveDescription = Vec<[Vector2; 4]>;

/// Geometrie eines Features.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum FeatureGeometry {
    /// Einzelpunkt (nicht editierbar als Kurve)
    Point(Vector2),
    /// Geordneter Linienzug
    LineString(Vec<Vector2>),
    /// Polygon aus Ringen (nicht editierbar als Kurve)
    Polygon(Vec<Vec<Vector2>>),
}

impl FeatureGeometry {
    /// Typname wie in GeoJSON.
    pub fn type_name(&self) -> &'static str {
        match self {
            FeatureGeometry::Point(_) => "Point",
            FeatureGeometry::LineString(_) => "LineString",
            FeatureGeometry::Polygon(_) => "Polygon",
        }
    }
}

/// Externes Pfad-Feature, das von einer Kette umhüllt wird.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathFeature {
    /// Feature-ID des Aufrufers
    #[serde(default)]
    pub id: u64,
    /// Geometrie (für Kurven nur `LineString`)
    pub geometry: FeatureGeometry,
    /// Persistierte Kontrollpunkte (Round-Trip)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bezier: Option<CurveDescription>,
}

impl PathFeature {
    /// Feature mit LineString-Geometrie und ohne Kurvenbeschreibung.
    pub fn line_string(id: u64, coordinates: Vec<Vector2>) -> Self {
        Self {
            id,
            geometry: FeatureGeometry::LineString(coordinates),
            bezier: None,
        }
    }

    /// Koordinaten des Linienzugs. Fehler bei anderen Geometrietypen.
    pub fn coordinates(&self) -> anyhow::Result<&[Vector2]> {
        match &self.geometry {
            FeatureGeometry::LineString(coords) => Ok(coords),
            other => bail!(
                "Feature {}: nur LineStrings werden unterstützt, gefunden: {}",
                self.id,
                other.type_name()
            ),
        }
    }

    /// Schreibt den geglätteten Linienzug zurück.
    pub fn set_coordinates(&mut self, coordinates: Vec<Vector2>) {
        self.geometry = FeatureGeometry::LineString(coordinates);
    }

    /// Parst ein Feature aus JSON.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("Fehler beim Parsen des Features")
    }

    /// Serialisiert das Feature als JSON.
    pub fn to_json(&self) -> anyhow::Result<String> {
        serde_json::to_string_pretty(self).context("Fehler beim Serialisieren des Features")
    }
}
