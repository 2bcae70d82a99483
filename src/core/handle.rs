//! Logische Kontrollpunkte, Kandidaten-Deskriptoren und die Tie-Break-Reduktion.
//!
//! Segmente und Gelenke beantworten dieselben Fragen ("nächster editierbarer
//! Punkt", "Ausdehnung") über den Trait [`HandleProvider`].

use serde::{Deserialize, Serialize};

use super::math::{BoundingBox, Vector2};

/// Opaque Identität eines Segments innerhalb seiner Kette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SegmentId(pub(crate) u64);

/// Opaque Identität eines Gelenks innerhalb seiner Kette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JointId(pub(crate) u64);

/// Rolle eines Kontrollpunkts an einem Gelenk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JointRole {
    /// Gemeinsamer Anker (`left.p3 == right.p0`)
    Main,
    /// Eingehende Tangente des linken Segments (`left.p2`)
    Left,
    /// Ausgehende Tangente des rechten Segments (`right.p1`)
    Right,
}

/// Referenz auf einen logischen, editierbaren Punkt einer Kette.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Handle {
    /// Diskreter Kontrollpunkt an einem Gelenk
    Joint { joint: JointId, role: JointRole },
    /// Punkt im Kurveninneren; wird beim ersten Verschieben zum Gelenk
    Curve { segment: SegmentId, parameter: f64 },
}

impl Handle {
    /// Diskrete Kontrollpunkte sind "snapable", Kurvenpunkte nicht.
    pub fn is_snapable(&self) -> bool {
        matches!(self, Handle::Joint { .. })
    }
}

/// Bester Kandidat eines Providers für eine Anfrage-Koordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandleDescriptor {
    /// Logischer Punkt
    pub handle: Handle,
    /// Koordinate des Punkts
    pub coordinate: Vector2,
    /// Quadrierte Distanz zur Anfrage (Karteneinheiten)
    pub squared_distance: f64,
    /// Diskreter Kontrollpunkt (true) oder Kurveninneres (false)
    pub snapable: bool,
}

/// Gemeinsame Fähigkeit von Segmenten und Gelenken.
pub trait HandleProvider {
    /// Nächster editierbarer Punkt zu `coordinate`.
    fn closest_handle_point(&self, coordinate: Vector2) -> Option<HandleDescriptor>;

    /// Achsparallele Ausdehnung für die Kandidaten-Vorfilterung.
    fn extent(&self) -> Option<BoundingBox>;
}

/// Vergleicht zwei Kandidaten nach der Tie-Break-Regel.
///
/// Unterscheiden sich die `snapable`-Flags, gewinnt der snapable Kandidat,
/// sofern er `within_tolerance` besteht. Sonst entscheidet die quadrierte
/// Distanz; bei Gleichstand bleibt `prev`.
pub fn prefer<T, D, W>(prev: T, curr: T, descriptor: &D, within_tolerance: &W) -> T
where
    D: Fn(&T) -> &HandleDescriptor,
    W: Fn(Vector2) -> bool,
{
    let (p, c) = (descriptor(&prev), descriptor(&curr));
    if p.snapable != c.snapable {
        let curr_snaps = c.snapable;
        let snap = if curr_snaps { c } else { p };
        if within_tolerance(snap.coordinate) {
            return if curr_snaps { curr } else { prev };
        }
    }
    if c.squared_distance < p.squared_distance {
        curr
    } else {
        prev
    }
}

/// Reduziert Kandidaten auf den besten und prüft diesen abschließend gegen
/// `within_tolerance`.
pub fn reduce_closest<T, I, D, W>(candidates: I, descriptor: D, within_tolerance: W) -> Option<T>
where
    I: IntoIterator<Item = T>,
    D: Fn(&T) -> &HandleDescriptor,
    W: Fn(Vector2) -> bool,
{
    let best = candidates
        .into_iter()
        .reduce(|prev, curr| prefer(prev, curr, &descriptor, &within_tolerance))?;
    if within_tolerance(descriptor(&best).coordinate) {
        Some(best)
    } else {
        None
    }
}
