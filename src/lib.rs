//! Bézier-Ketten-Editor Library.
//! Core-Funktionalität als Library exportiert für Tests und Wiederverwendung.

pub mod app;
pub mod core;
pub mod shared;

pub use app::{
    ChainId, EditSession, EditTarget, Marker, MarkerKey, MarkerOverlay, Modifiers, Overlay,
    PointerEvent, SessionState,
};
pub use core::{
    BoundingBox, Camera2D, ControlJoint, CurveChain, CurveSegment, CurveSettings, FeatureGeometry,
    Handle, HandleDescriptor, JointId, JointRole, PathFeature, SegmentId, SpatialIndex, Vector2,
    ViewTransform,
};
pub use shared::EditorOptions;
