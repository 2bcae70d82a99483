//! Gelenk zwischen zwei (oder am Rand einem) Segmenten.
//!
//! Das Gelenk hält nur Index-Referenzen auf seine Nachbarsegmente und leitet
//! Änderungen an beide Seiten weiter, damit geteilte Anker gleich bleiben.

use std::collections::HashMap;

use anyhow::ensure;

use super::handle::{Handle, HandleDescriptor, HandleProvider, JointId, JointRole, SegmentId};
use super::math::{squared_distance, BoundingBox, Vector2};
use super::segment::CurveSegment;

/// Segment-Arena einer Kette.
pub type SegmentStore = HashMap<SegmentId, CurveSegment>;

/// Verbindet `left` (endet hier) und `right` (beginnt hier).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlJoint {
    left: Option<SegmentId>,
    right: Option<SegmentId>,
}

impl ControlJoint {
    /// Erstellt ein Gelenk; mindestens eine Seite muss belegt sein.
    pub fn new(left: Option<SegmentId>, right: Option<SegmentId>) -> anyhow::Result<Self> {
        ensure!(
            left.is_some() || right.is_some(),
            "Gelenk braucht mindestens ein Nachbarsegment"
        );
        Ok(Self { left, right })
    }

    /// Inneres Gelenk zwischen zwei Segmenten.
    pub fn between(left: SegmentId, right: SegmentId) -> Self {
        Self {
            left: Some(left),
            right: Some(right),
        }
    }

    /// Linkes Nachbarsegment.
    pub fn left(&self) -> Option<SegmentId> {
        self.left
    }

    /// Rechtes Nachbarsegment.
    pub fn right(&self) -> Option<SegmentId> {
        self.right
    }

    /// Ersetzt das linke Nachbarsegment (nach Split/Merge).
    pub(crate) fn set_left(&mut self, left: SegmentId) {
        self.left = Some(left);
    }

    /// Randgelenke haben nur eine Seite.
    pub fn is_boundary(&self) -> bool {
        self.left.is_none() || self.right.is_none()
    }

    /// Alle vorhandenen Nachbarsegmente (links zuerst).
    pub fn segments(&self) -> Vec<SegmentId> {
        self.left.into_iter().chain(self.right).collect()
    }

    /// Logische Kontrollpunkte in der Reihenfolge Main, Right, Left.
    pub fn control_points(&self, segments: &SegmentStore) -> Vec<(JointRole, Vector2)> {
        let left = self.left.and_then(|id| segments.get(&id));
        let right = self.right.and_then(|id| segments.get(&id));

        let main = match (left, right) {
            (Some(l), Some(r)) => {
                debug_assert_eq!(l.end(), r.start(), "Nachbarsegmente müssen verbunden sein");
                Some(l.end())
            }
            (Some(l), None) => Some(l.end()),
            (None, Some(r)) => Some(r.start()),
            (None, None) => None,
        };

        let mut points = Vec::with_capacity(3);
        if let Some(main) = main {
            points.push((JointRole::Main, main));
        }
        if let Some(r) = right {
            points.push((JointRole::Right, r.control_points()[1]));
        }
        if let Some(l) = left {
            points.push((JointRole::Left, l.control_points()[2]));
        }
        points
    }

    /// Koordinate einer Rolle (falls die Seite existiert).
    pub fn control_point(&self, role: JointRole, segments: &SegmentStore) -> Option<Vector2> {
        self.control_points(segments)
            .into_iter()
            .find(|(r, _)| *r == role)
            .map(|(_, c)| c)
    }

    /// Verschiebt einen logischen Kontrollpunkt.
    ///
    /// `Main` setzt `left.p3` und `right.p0` auf dieselbe Koordinate,
    /// `Left`/`Right` ändern nur die jeweilige Tangente. Gibt die geänderten
    /// Segmente zurück.
    pub fn update_control_point(
        &self,
        role: JointRole,
        coordinate: Vector2,
        segments: &mut SegmentStore,
    ) -> Vec<SegmentId> {
        let mut touched = Vec::with_capacity(2);
        let mut apply = |id: Option<SegmentId>, index: usize| {
            let Some(id) = id else { return };
            if let Some(segment) = segments.get_mut(&id) {
                segment.change_control_point(index, coordinate);
                touched.push(id);
            }
        };
        match role {
            JointRole::Main => {
                apply(self.left, 3);
                apply(self.right, 0);
            }
            JointRole::Left => apply(self.left, 2),
            JointRole::Right => apply(self.right, 1),
        }
        touched
    }

    /// Setzt die Tangente der Rolle `Left`/`Right` auf das Sehnen-Drittel zurück.
    ///
    /// Liefert das geänderte Segment, `None` wenn die Seite fehlt. `Main` wird
    /// hier nicht behandelt, das Entfernen eines Gelenks ist Sache der Kette.
    pub fn reset_tangent(&self, role: JointRole, segments: &mut SegmentStore) -> Option<SegmentId> {
        let (id, index) = match role {
            JointRole::Left => (self.left?, 2),
            JointRole::Right => (self.right?, 1),
            JointRole::Main => return None,
        };
        let segment = segments.get_mut(&id)?;
        segment.reset_control_point(index);
        Some(id)
    }
}

/// Lesende Sicht auf ein Gelenk samt Segment-Arena.
pub struct JointPart<'a> {
    /// Identität des Gelenks
    pub id: JointId,
    /// Das Gelenk selbst
    pub joint: &'a ControlJoint,
    /// Arena der Kette
    pub segments: &'a SegmentStore,
}

impl JointPart<'_> {
    /// Handle auf den gemeinsamen Anker dieses Gelenks.
    pub fn main_handle(&self) -> Handle {
        Handle::Joint {
            joint: self.id,
            role: JointRole::Main,
        }
    }
}

impl HandleProvider for JointPart<'_> {
    fn closest_handle_point(&self, coordinate: Vector2) -> Option<HandleDescriptor> {
        let mut best: Option<HandleDescriptor> = None;
        for (role, point) in self.joint.control_points(self.segments) {
            let sq = squared_distance(point, coordinate);
            if best.is_some_and(|b| sq >= b.squared_distance) {
                continue;
            }
            best = Some(HandleDescriptor {
                handle: Handle::Joint {
                    joint: self.id,
                    role,
                },
                coordinate: point,
                squared_distance: sq,
                snapable: true,
            });
        }
        best
    }

    fn extent(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(
            self.joint
                .control_points(self.segments)
                .into_iter()
                .map(|(_, c)| c),
        )
    }
}

/// Lesende Sicht auf ein Segment samt Identität.
pub struct SegmentPart<'a> {
    /// Identität des Segments
    pub id: SegmentId,
    /// Das Segment selbst
    pub segment: &'a CurveSegment,
}

impl HandleProvider for SegmentPart<'_> {
    fn closest_handle_point(&self, coordinate: Vector2) -> Option<HandleDescriptor> {
        let hit = self.segment.closest_curve_point(coordinate);
        Some(HandleDescriptor {
            handle: Handle::Curve {
                segment: self.id,
                parameter: hit.parameter,
            },
            coordinate: hit.coordinate,
            squared_distance: hit.squared_distance,
            snapable: false,
        })
    }

    fn extent(&self) -> Option<BoundingBox> {
        Some(self.segment.extent())
    }
}
