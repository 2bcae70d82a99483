//! Core-Domänentypen: Bézier-Segmente, Gelenke, Ketten, Kamera, Spatial-Index.

pub mod camera;
/// Bézier-Kette über einem Pfad-Feature
///
/// Die Kette besitzt ihre Segmente und Gelenke und hält die Invariante
/// `S[i].p3 == S[i+1].p0` über alle Änderungen aufrecht.
pub mod chain;
pub mod feature;
pub mod handle;
pub mod joint;
pub mod math;
pub mod segment;
pub mod spatial;

pub use camera::{Camera2D, ViewTransform};
pub use chain::CurveChain;
pub use feature::{CurveDescription, FeatureGeometry, PathFeature};
pub use handle::{
    prefer, reduce_closest, Handle, HandleDescriptor, HandleProvider, JointId, JointRole,
    SegmentId,
};
pub use joint::{ControlJoint, JointPart, SegmentPart, SegmentStore};
pub use math::{BoundingBox, Vector2};
pub use segment::{ControlPointHit, CurvePointHit, CurveSegment, CurveSettings};
pub use spatial::SpatialIndex;
