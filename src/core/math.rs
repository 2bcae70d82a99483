//! Vektor-Hilfsfunktionen und achsparallele Bounding-Box.
//!
//! `Vector2` ist ein Alias auf `glam::DVec2`; alle Operationen liefern neue
//! Werte (Value-Semantik), nichts wird in-place verändert.

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// 2D-Koordinate in Karteneinheiten.
pub type Vector2 = DVec2;

/// Lineare Interpolation `a·(1−t) + b·t`.
///
/// Im Gegensatz zu `DVec2::lerp` (`a + (b−a)·t`) liefert diese Form an den
/// Rändern bit-exakt `a` (t = 0) bzw. `b` (t = 1).
#[inline]
pub fn lerp(a: Vector2, b: Vector2, t: f64) -> Vector2 {
    a * (1.0 - t) + b * t
}

/// Quadrierte euklidische Distanz.
#[inline]
pub fn squared_distance(a: Vector2, b: Vector2) -> f64 {
    a.distance_squared(b)
}

/// Nächster Punkt auf der Strecke `start`–`end` zu `point`.
///
/// Degenerierte Strecken (start == end) liefern `start`.
pub fn closest_on_segment(point: Vector2, start: Vector2, end: Vector2) -> Vector2 {
    let delta = end - start;
    let len_sq = delta.length_squared();
    if len_sq == 0.0 {
        return start;
    }
    let along = (point - start).dot(delta) / len_sq;
    if along <= 0.0 {
        start
    } else if along >= 1.0 {
        end
    } else {
        start + delta * along
    }
}

/// Prüft, ob zwei Richtungsvektoren (nahezu) parallel sind.
///
/// Vergleicht den Betrag des 2D-Kreuzprodukts mit einer absoluten Toleranz.
#[inline]
pub fn are_parallel(a: Vector2, b: Vector2, tolerance: f64) -> bool {
    a.perp_dot(b).abs() < tolerance
}

/// Achsparallele Bounding-Box in Karteneinheiten.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Untere linke Ecke
    pub min: Vector2,
    /// Obere rechte Ecke
    pub max: Vector2,
}

impl BoundingBox {
    /// Erstellt eine Box aus zwei Ecken (Reihenfolge egal).
    pub fn new(a: Vector2, b: Vector2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Box um einen einzelnen Punkt (Ausdehnung 0).
    pub fn from_point(p: Vector2) -> Self {
        Self { min: p, max: p }
    }

    /// Kleinste Box, die alle Punkte enthält. `None` bei leerer Eingabe.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Vector2>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        Some(iter.fold(Self::from_point(first), |bbox, p| bbox.expanded_to(p)))
    }

    /// Quadratische Box mit halber Kantenlänge `half_size` um `center`.
    pub fn around(center: Vector2, half_size: f64) -> Self {
        let half = Vector2::splat(half_size.abs());
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Erweitert die Box so, dass `p` enthalten ist.
    pub fn expanded_to(self, p: Vector2) -> Self {
        Self {
            min: self.min.min(p),
            max: self.max.max(p),
        }
    }

    /// Vereinigung zweier Boxen.
    pub fn union(self, other: Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Schneiden sich die Boxen (Berührung zählt als Schnitt)?
    pub fn intersects(&self, other: &Self) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    /// Liegt `p` innerhalb der Box (Rand inklusive)?
    pub fn contains(&self, p: Vector2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Mittelpunkt der Box.
    pub fn center(&self) -> Vector2 {
        (self.min + self.max) * 0.5
    }

    /// Halbe Diagonale (Radius des Umkreises um den Mittelpunkt).
    pub fn half_diagonal(&self) -> f64 {
        (self.max - self.min).length() * 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_lerp_is_exact_at_bounds() {
        let a = Vector2::new(0.1, 0.7);
        let b = Vector2::new(13.3, -2.9);
        assert_eq!(lerp(a, b, 0.0), a);
        assert_eq!(lerp(a, b, 1.0), b);
    }

    #[test]
    fn test_closest_on_segment_clamps_to_ends() {
        let start = Vector2::new(0.0, 0.0);
        let end = Vector2::new(10.0, 0.0);

        assert_eq!(closest_on_segment(Vector2::new(-5.0, 3.0), start, end), start);
        assert_eq!(closest_on_segment(Vector2::new(15.0, 3.0), start, end), end);

        let mid = closest_on_segment(Vector2::new(4.0, 3.0), start, end);
        assert_relative_eq!(mid.x, 4.0);
        assert_relative_eq!(mid.y, 0.0);
    }

    #[test]
    fn test_closest_on_degenerate_segment() {
        let p = Vector2::new(2.0, 2.0);
        assert_eq!(closest_on_segment(Vector2::new(5.0, 5.0), p, p), p);
    }

    #[test]
    fn test_are_parallel() {
        assert!(are_parallel(
            Vector2::new(1.0, 1.0),
            Vector2::new(3.0, 3.0),
            0.01
        ));
        assert!(!are_parallel(
            Vector2::new(1.0, 0.0),
            Vector2::new(0.0, 1.0),
            0.01
        ));
    }

    #[test]
    fn test_bounding_box_from_points_and_union() {
        let bbox = BoundingBox::from_points([
            Vector2::new(3.0, -1.0),
            Vector2::new(-2.0, 4.0),
            Vector2::new(1.0, 1.0),
        ])
        .expect("Box erwartet");
        assert_eq!(bbox.min, Vector2::new(-2.0, -1.0));
        assert_eq!(bbox.max, Vector2::new(3.0, 4.0));

        let other = BoundingBox::new(Vector2::new(5.0, 5.0), Vector2::new(6.0, 7.0));
        let union = bbox.union(other);
        assert_eq!(union.max, Vector2::new(6.0, 7.0));
        assert!(!bbox.intersects(&other));
        assert!(union.intersects(&other));
    }

    #[test]
    fn test_empty_points_yield_no_box() {
        assert!(BoundingBox::from_points(std::iter::empty()).is_none());
    }
}
