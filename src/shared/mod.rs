//! Geteilte Typen für layer-übergreifende Verträge.
//!
//! Enthält die Laufzeit-Optionen, die `core`-Parameter und `app`-Verhalten
//! gemeinsam steuern.

pub mod options;

pub use options::EditorOptions;
pub use options::{LUT_PRECISION, PIXEL_TOLERANCE_PX};
