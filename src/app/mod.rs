//! Application-Layer: Edit-Session, Zeiger-Events und Overlay.

pub mod events;
pub mod overlay;
/// Zeiger-Zustandsmaschine
///
/// Verbindet View-Transformation, Spatial-Index und Ketten zu einer
/// interaktiven Editier-Sitzung.
pub mod session;

pub use crate::core::Camera2D;
pub use events::{Modifiers, PointerEvent};
pub use overlay::{Marker, MarkerKey, MarkerOverlay, Overlay};
pub use session::{ChainId, EditSession, EditTarget, SessionState};
