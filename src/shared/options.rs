//! Zentrale Konfiguration für den Bézier-Ketten-Editor.
//!
//! `EditorOptions` enthält alle zur Laufzeit änderbaren Werte.
//! Die `const`-Werte bleiben als Fallback/Default erhalten.

use serde::{Deserialize, Serialize};

use crate::core::segment::{CurveSettings, DEFAULT_COLLINEAR_TOLERANCE, DEFAULT_LUT_PRECISION};

// ── Interaktion ─────────────────────────────────────────────────────

/// Pick-Toleranz in Screen-Pixeln.
pub const PIXEL_TOLERANCE_PX: f64 = 10.0;

// ── Kurven ──────────────────────────────────────────────────────────

/// Anzahl LUT-Intervalle pro Segment.
pub const LUT_PRECISION: usize = DEFAULT_LUT_PRECISION;
/// Toleranz für die Gerade-Erkennung.
pub const COLLINEAR_TOLERANCE: f64 = DEFAULT_COLLINEAR_TOLERANCE;

// ── Overlay ─────────────────────────────────────────────────────────

/// Größe des Vertex-Markers in Screen-Pixeln.
pub const VERTEX_MARKER_SIZE_PX: f64 = 6.0;
/// Standard-Viewport für den Replay-Betrieb (Breite, Höhe).
pub const VIEWPORT_SIZE_PX: [f64; 2] = [1280.0, 720.0];

// ── Laufzeit-Optionen (serialisierbar) ─────────────────────────────

/// Alle zur Laufzeit änderbaren Editor-Optionen.
/// Wird als `bezier_chain_editor.toml` neben der Binary gespeichert.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EditorOptions {
    // ── Interaktion ─────────────────────────────────────────────
    /// Pick-Toleranz in Screen-Pixeln
    pub pixel_tolerance_px: f64,

    // ── Kurven ──────────────────────────────────────────────────
    /// LUT-Intervalle pro Segment
    pub lut_precision: usize,
    /// Absolute Toleranz des Kollinearitäts-Tests
    #[serde(default = "default_collinear_tolerance")]
    pub collinear_tolerance: f64,

    // ── Overlay ─────────────────────────────────────────────────
    /// Größe des Vertex-Markers in Screen-Pixeln
    #[serde(default = "default_vertex_marker_size_px")]
    pub vertex_marker_size_px: f64,
    /// Tangenten-Arme als Overlay anzeigen
    #[serde(default = "default_show_tangent_handles")]
    pub show_tangent_handles: bool,

    // ── Viewport ────────────────────────────────────────────────
    /// Viewport-Größe (Breite, Höhe) für den Replay-Betrieb
    #[serde(default = "default_viewport_size_px")]
    pub viewport_size_px: [f64; 2],
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            pixel_tolerance_px: PIXEL_TOLERANCE_PX,
            lut_precision: LUT_PRECISION,
            collinear_tolerance: COLLINEAR_TOLERANCE,
            vertex_marker_size_px: VERTEX_MARKER_SIZE_PX,
            show_tangent_handles: true,
            viewport_size_px: VIEWPORT_SIZE_PX,
        }
    }
}

/// Serde-Default für `collinear_tolerance` (Abwärtskompatibilität bestehender TOML-Dateien).
fn default_collinear_tolerance() -> f64 {
    COLLINEAR_TOLERANCE
}

fn default_vertex_marker_size_px() -> f64 {
    VERTEX_MARKER_SIZE_PX
}

fn default_show_tangent_handles() -> bool {
    true
}

fn default_viewport_size_px() -> [f64; 2] {
    VIEWPORT_SIZE_PX
}

impl EditorOptions {
    /// Lädt Optionen aus einer TOML-Datei. Bei Fehler: Standardwerte.
    pub fn load_from_file(path: &std::path::Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(opts) => {
                    log::info!("Optionen geladen aus: {}", path.display());
                    opts
                }
                Err(e) => {
                    log::warn!("Optionen-Datei fehlerhaft, verwende Standardwerte: {}", e);
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("Keine Optionen-Datei gefunden, verwende Standardwerte");
                Self::default()
            }
        }
    }

    /// Speichert Optionen als TOML-Datei.
    pub fn save_to_file(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        log::info!("Optionen gespeichert nach: {}", path.display());
        Ok(())
    }

    /// Ermittelt den Pfad zur Optionen-Datei neben der Binary.
    pub fn config_path() -> std::path::PathBuf {
        std::env::current_exe()
            .unwrap_or_else(|_| std::path::PathBuf::from("bezier-chain-editor"))
            .parent()
            .unwrap_or_else(|| std::path::Path::new("."))
            .join("bezier_chain_editor.toml")
    }

    /// Sampling-Parameter für neue Segmente.
    ///
    /// Eine LUT-Präzision von 0 wird auf 1 angehoben.
    pub fn curve_settings(&self) -> CurveSettings {
        CurveSettings {
            lut_precision: self.lut_precision.max(1),
            collinear_tolerance: self.collinear_tolerance.abs(),
        }
    }
}
