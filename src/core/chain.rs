//! Kette verbundener kubischer Bézier-Segmente über einem Pfad-Feature.
//!
//! Segmente `S[0..n)` und Gelenke `J[0..=n]` liegen in einer Arena und werden
//! über IDs referenziert; `J[i]` verbindet `S[i-1]` und `S[i]`. Alle
//! Anker-Änderungen laufen über die Gelenke, dadurch gilt stets
//! `S[i].p3 == S[i+1].p0`.
//!
//! Jede Mutation aktualisiert sofort die Teil-Boxen und schreibt die
//! geglättete Geometrie samt Kurvenbeschreibung in das Feature zurück.

use std::cell::Cell;
use std::collections::HashMap;

use anyhow::{bail, ensure};
use indexmap::IndexMap;

use super::feature::{CurveDescription, PathFeature};
use super::handle::{
    reduce_closest, Handle, HandleDescriptor, HandleProvider, JointId, JointRole, SegmentId,
};
use super::joint::{ControlJoint, JointPart, SegmentPart, SegmentStore};
use super::math::{BoundingBox, Vector2};
use super::segment::{CurveSegment, CurveSettings};


/// Schlüssel eines Kettenteils in der Teil-Box-Tabelle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum PartKey {
    Segment(SegmentId),
    Joint(JointId),
}

/// Editierbare Bézier-Kette.
#[derive(Debug)]
pub struct CurveChain {
    feature: PathFeature,
    settings: CurveSettings,
    segments: SegmentStore,
    joints: HashMap<JointId, ControlJoint>,
    /// Segment-Reihenfolge entlang des Pfads
    segment_order: Vec<SegmentId>,
    /// Gelenk-Reihenfolge (immer ein Eintrag mehr als Segmente)
    joint_order: Vec<JointId>,
    /// Boxen aller Teile für den linearen Feinscan
    parts: IndexMap<PartKey, BoundingBox>,
    /// Memoisierte Vereinigung aller Teil-Boxen
    extent: Cell<Option<BoundingBox>>,
    next_id: u64,
}

impl CurveChain {
    /// Baut eine Kette aus einem LineString-Feature.
    ///
    /// Trägt das Feature eine Kurvenbeschreibung, werden die Segmente direkt
    /// daraus wiederhergestellt, sonst entsteht pro Koordinatenpaar ein gerades
    /// Segment mit Tangenten auf den Sehnen-Dritteln.
    pub fn from_feature(feature: PathFeature, settings: CurveSettings) -> anyhow::Result<Self> {
        let coordinates = feature.coordinates()?;
        ensure!(
            coordinates.len() >= 2,
            "Feature {}: mindestens zwei Koordinaten nötig, gefunden: {}",
            feature.id,
            coordinates.len()
        );

        let description = match &feature.bezier {
            Some(description) => {
                validate_description(description)?;
                description.clone()
            }
            None => coordinates
                .windows(2)
                .map(|pair| CurveSegment::from_line(pair[0], pair[1], settings).control_points())
                .collect(),
        };

        let mut chain = Self {
            feature,
            settings,
            segments: SegmentStore::new(),
            joints: HashMap::new(),
            segment_order: Vec::with_capacity(description.len()),
            joint_order: Vec::with_capacity(description.len() + 1),
            parts: IndexMap::new(),
            extent: Cell::new(None),
            next_id: 1,
        };

        for points in description {
            let id = SegmentId(chain.allocate_id());
            chain.segments.insert(id, CurveSegment::new(points, settings));
            chain.segment_order.push(id);
        }

        for i in 0..=chain.segment_order.len() {
            let left = i.checked_sub(1).map(|k| chain.segment_order[k]);
            let right = chain.segment_order.get(i).copied();
            let id = JointId(chain.allocate_id());
            chain.joints.insert(id, ControlJoint::new(left, right)?);
            chain.joint_order.push(id);
        }

        let all: Vec<SegmentId> = chain.segment_order.clone();
        chain.refresh_parts(&all);
        chain.regenerate_geometry();

        log::debug!(
            "Kette für Feature {} aufgebaut: {} Segment(e), {} Gelenk(e)",
            chain.feature.id,
            chain.segment_count(),
            chain.joint_count()
        );
        Ok(chain)
    }

    /// Sampling-Parameter der Segmente.
    pub fn settings(&self) -> CurveSettings {
        self.settings
    }

    /// Anzahl der Segmente.
    pub fn segment_count(&self) -> usize {
        self.segment_order.len()
    }

    /// Anzahl der Gelenke (Segmente + 1).
    pub fn joint_count(&self) -> usize {
        self.joint_order.len()
    }

    /// Segmente in Pfad-Reihenfolge.
    pub fn segments(&self) -> impl Iterator<Item = (SegmentId, &CurveSegment)> + '_ {
        self.segment_order
            .iter()
            .filter_map(|id| self.segments.get(id).map(|s| (*id, s)))
    }

    /// Gelenke in Pfad-Reihenfolge.
    pub fn joints(&self) -> impl Iterator<Item = (JointId, &ControlJoint)> + '_ {
        self.joint_order
            .iter()
            .filter_map(|id| self.joints.get(id).map(|j| (*id, j)))
    }

    /// Einzelnes Segment.
    pub fn segment(&self, id: SegmentId) -> Option<&CurveSegment> {
        self.segments.get(&id)
    }

    /// Lesende Sicht auf ein Gelenk.
    pub fn joint(&self, id: JointId) -> Option<JointPart<'_>> {
        self.joints.get(&id).map(|joint| JointPart {
            id,
            joint,
            segments: &self.segments,
        })
    }

    /// Das umhüllte Feature (nach der letzten Regeneration).
    pub fn feature(&self) -> &PathFeature {
        &self.feature
    }

    /// Gibt das Feature frei.
    pub fn into_feature(self) -> PathFeature {
        self.feature
    }

    /// Geglätteter Linienzug: LUTs aller Segmente ohne doppelte Gelenkpunkte.
    pub fn flattened(&self) -> Vec<Vector2> {
        let mut points = Vec::new();
        for (i, (_, segment)) in self.segments().enumerate() {
            let skip = usize::from(i > 0);
            points.extend(segment.lut().iter().skip(skip).copied());
        }
        points
    }

    /// Rohe Kontrollpunkte aller Segmente in Reihenfolge.
    pub fn description(&self) -> CurveDescription {
        self.segments().map(|(_, s)| s.control_points()).collect()
    }

    /// Tangenten-Arme aller Segmente (zwei pro Segment).
    pub fn handle_lines(&self) -> Vec<[Vector2; 2]> {
        self.segments()
            .flat_map(|(_, s)| s.handle_lines())
            .collect()
    }

    /// Aktuelle Koordinate eines logischen Kontrollpunkts.
    pub fn handle_coordinate(&self, handle: Handle) -> Option<Vector2> {
        match handle {
            Handle::Joint { joint, role } => self
                .joints
                .get(&joint)?
                .control_point(role, &self.segments),
            Handle::Curve { segment, parameter } => {
                Some(self.segments.get(&segment)?.evaluate(parameter))
            }
        }
    }

    /// Vereinigung aller Teil-Boxen (memoisiert).
    pub fn extent(&self) -> Option<BoundingBox> {
        if let Some(cached) = self.extent.get() {
            return Some(cached);
        }
        let union = self.parts.values().copied().reduce(BoundingBox::union);
        self.extent.set(union);
        union
    }

    /// Nächster editierbarer Punkt mit Tie-Break zwischen Gelenk- und
    /// Kurvenkandidaten.
    ///
    /// Mit `bbox` werden nur Teile betrachtet, deren Box sie schneidet.
    pub fn closest_handle<W>(
        &self,
        coordinate: Vector2,
        within_tolerance: W,
        bbox: Option<&BoundingBox>,
    ) -> Option<HandleDescriptor>
    where
        W: Fn(Vector2) -> bool,
    {
        let candidates = self
            .parts
            .iter()
            .filter(|(_, extent)| bbox.is_none_or(|b| b.intersects(extent)))
            .filter_map(|(key, _)| self.part_closest(*key, coordinate));
        reduce_closest(candidates, |d| d, within_tolerance)
    }

    /// Teilt ein Segment bei `t` und fügt dort ein neues Gelenk ein.
    ///
    /// Die linke Hälfte behält die ID des Segments. Liefert das neue Gelenk,
    /// `None` bei unbekanntem Segment.
    pub fn split_at(&mut self, segment: SegmentId, t: f64) -> Option<JointId> {
        let pos = self.segment_position(segment)?;
        let (left, right) = self.segments.get(&segment)?.split(t.clamp(0.0, 1.0));

        let right_id = SegmentId(self.allocate_id());
        let joint_id = JointId(self.allocate_id());

        self.segments.insert(segment, left);
        self.segments.insert(right_id, right);
        self.segment_order.insert(pos + 1, right_id);

        let next_joint = self.joint_order[pos + 1];
        if let Some(next) = self.joints.get_mut(&next_joint) {
            next.set_left(right_id);
        }
        self.joints
            .insert(joint_id, ControlJoint::between(segment, right_id));
        self.joint_order.insert(pos + 1, joint_id);

        self.refresh_parts(&[segment, right_id]);
        self.regenerate_geometry();

        log::debug!(
            "Segment {:?} bei t={:.4} geteilt, neues Gelenk {:?}",
            segment,
            t,
            joint_id
        );
        Some(joint_id)
    }

    /// Entfernt ein inneres Gelenk und verschmilzt seine Nachbarn.
    ///
    /// Das linke Segment übernimmt `p2`/`p3` des rechten (verlustbehaftet),
    /// Gelenk und rechtes Segment verschwinden. Randgelenke bleiben unverändert
    /// (`false`); bei nur einem Segment sind beide Gelenke Randgelenke.
    pub fn remove_joint(&mut self, joint: JointId) -> bool {
        let Some(pos) = self.joint_position(joint) else {
            return false;
        };
        let Some(current) = self.joints.get(&joint).copied() else {
            return false;
        };
        if current.is_boundary() {
            log::warn!("Gelenk {:?} liegt am Rand und kann nicht entfernt werden", joint);
            return false;
        }
        let (Some(left_id), Some(right_id)) = (current.left(), current.right()) else {
            return false;
        };
        let Some(right) = self.segments.get(&right_id).cloned() else {
            return false;
        };
        let Some(left) = self.segments.get_mut(&left_id) else {
            return false;
        };
        if let Err(e) = left.combine_with(&right) {
            log::warn!("Verschmelzen an Gelenk {:?} fehlgeschlagen: {:#}", joint, e);
            return false;
        }

        self.segments.remove(&right_id);
        self.segment_order.remove(pos);
        self.joints.remove(&joint);
        self.joint_order.remove(pos);

        if let Some(next) = self
            .joint_order
            .get(pos)
            .and_then(|id| self.joints.get_mut(id))
        {
            next.set_left(left_id);
        }

        self.parts.shift_remove(&PartKey::Segment(right_id));
        self.parts.shift_remove(&PartKey::Joint(joint));
        self.refresh_parts(&[left_id]);
        self.regenerate_geometry();

        log::debug!(
            "Gelenk {:?} entfernt, Segment {:?} reicht jetzt bis {:?}",
            joint,
            left_id,
            self.segments.get(&left_id).map(CurveSegment::end)
        );
        true
    }

    /// Verschiebt einen logischen Kontrollpunkt eines Gelenks.
    ///
    /// `false` bei unbekanntem Gelenk oder fehlender Seite.
    pub fn update_control_point(
        &mut self,
        joint: JointId,
        role: JointRole,
        coordinate: Vector2,
    ) -> bool {
        let Some(current) = self.joints.get(&joint).copied() else {
            return false;
        };
        let touched = current.update_control_point(role, coordinate, &mut self.segments);
        if touched.is_empty() {
            return false;
        }
        self.refresh_parts(&touched);
        self.regenerate_geometry();
        true
    }

    /// Setzt einen Kontrollpunkt zurück.
    ///
    /// `Left`/`Right` setzen die Tangente auf das Sehnen-Drittel, `Main`
    /// entfernt das Gelenk (siehe [`Self::remove_joint`]).
    pub fn reset_control_point(&mut self, joint: JointId, role: JointRole) -> bool {
        if role == JointRole::Main {
            return self.remove_joint(joint);
        }
        let Some(current) = self.joints.get(&joint).copied() else {
            return false;
        };
        let Some(touched) = current.reset_tangent(role, &mut self.segments) else {
            return false;
        };
        self.refresh_parts(&[touched]);
        self.regenerate_geometry();
        true
    }

    /// Verschiebt einen Handle und liefert den danach gültigen Handle.
    ///
    /// Gelenk-Handles bleiben dieselben. Ein Kurvenpunkt teilt zuerst sein
    /// Segment und wird zum `Main`-Handle des neuen Gelenks.
    pub fn move_handle(&mut self, handle: Handle, coordinate: Vector2) -> Handle {
        match handle {
            Handle::Joint { joint, role } => {
                self.update_control_point(joint, role, coordinate);
                handle
            }
            Handle::Curve { segment, parameter } => {
                let Some(joint) = self.split_at(segment, parameter) else {
                    return handle;
                };
                self.update_control_point(joint, JointRole::Main, coordinate);
                Handle::Joint {
                    joint,
                    role: JointRole::Main,
                }
            }
        }
    }

    /// Entfernt bzw. setzt einen Handle zurück.
    ///
    /// Liefert den Handle, falls er danach noch existiert: `None` nach einem
    /// Verschmelzen, sonst den unveränderten Handle. Kurvenpunkte haben
    /// nichts zu entfernen.
    pub fn remove_handle(&mut self, handle: Handle) -> Option<Handle> {
        match handle {
            Handle::Joint { joint, role } => {
                let changed = self.reset_control_point(joint, role);
                if changed && role == JointRole::Main {
                    None
                } else {
                    Some(handle)
                }
            }
            Handle::Curve { .. } => Some(handle),
        }
    }

    /// Schreibt geglätteten Linienzug und Kurvenbeschreibung ins Feature.
    pub fn regenerate_geometry(&mut self) {
        let flattened = self.flattened();
        let description = self.description();
        self.feature.set_coordinates(flattened);
        self.feature.bezier = Some(description);
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn segment_position(&self, id: SegmentId) -> Option<usize> {
        self.segment_order.iter().position(|s| *s == id)
    }

    fn joint_position(&self, id: JointId) -> Option<usize> {
        self.joint_order.iter().position(|j| *j == id)
    }

    fn part_closest(&self, key: PartKey, coordinate: Vector2) -> Option<HandleDescriptor> {
        match key {
            PartKey::Segment(id) => SegmentPart {
                id,
                segment: self.segments.get(&id)?,
            }
            .closest_handle_point(coordinate),
            PartKey::Joint(id) => self.joint(id)?.closest_handle_point(coordinate),
        }
    }

    /// Aktualisiert die Boxen der Segmente und ihrer angrenzenden Gelenke.
    fn refresh_parts(&mut self, segments: &[SegmentId]) {
        for &id in segments {
            let Some(pos) = self.segment_position(id) else {
                continue;
            };
            if let Some(segment) = self.segments.get(&id) {
                self.parts.insert(PartKey::Segment(id), segment.extent());
            }
            for joint_id in [self.joint_order[pos], self.joint_order[pos + 1]] {
                let extent = self.joint(joint_id).and_then(|part| part.extent());
                if let Some(extent) = extent {
                    self.parts.insert(PartKey::Joint(joint_id), extent);
                }
            }
        }
        self.extent.set(None);
    }
}

/// Prüft eine Kurvenbeschreibung auf Inhalt und Anker-Kontinuität.
fn validate_description(description: &CurveDescription) -> anyhow::Result<()> {
    if description.is_empty() {
        bail!("Kurvenbeschreibung ist leer");
    }
    for (i, pair) in description.windows(2).enumerate() {
        ensure!(
            pair[0][3] == pair[1][0],
            "Kurvenbeschreibung unterbrochen zwischen Segment {} und {}: {:?} != {:?}",
            i,
            i + 1,
            pair[0][3],
            pair[1][0]
        );
    }
    Ok(())
}
