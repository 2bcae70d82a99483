//! Ein einzelnes kubisches Bézier-Segment der Kette.
//!
//! Hält die vier Kontrollpunkte `[p0, p1, p2, p3]` (Anker, Tangente-aus,
//! Tangente-ein, Anker) und eine gecachte Lookup-Tabelle (LUT) für Rendering
//! und Nächster-Punkt-Suche. Die LUT wird nach jeder Änderung sofort neu
//! berechnet.

use anyhow::ensure;

use super::math::{are_parallel, closest_on_segment, lerp, squared_distance, BoundingBox, Vector2};

/// Standard-Auflösung der LUT (Anzahl Intervalle).
pub const DEFAULT_LUT_PRECISION: usize = 100;
/// Toleranz für den Kollinearitäts-Test (Betrag des Kreuzprodukts).
pub const DEFAULT_COLLINEAR_TOLERANCE: f64 = 0.01;

/// Parameter für Sampling und Gerade-Erkennung.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveSettings {
    /// Anzahl Intervalle der LUT (LUT-Länge = precision + 1)
    pub lut_precision: usize,
    /// Absolute Toleranz des Parallelitäts-Tests gegen die Sehne
    pub collinear_tolerance: f64,
}

impl Default for CurveSettings {
    fn default() -> Self {
        Self {
            lut_precision: DEFAULT_LUT_PRECISION,
            collinear_tolerance: DEFAULT_COLLINEAR_TOLERANCE,
        }
    }
}

/// Nächster Punkt auf dem Kurvenverlauf.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurvePointHit {
    /// Kurvenparameter t ∈ [0, 1]
    pub parameter: f64,
    /// Koordinate auf der (gesampelten) Kurve
    pub coordinate: Vector2,
    /// Quadrierte Distanz zur Anfrage-Koordinate
    pub squared_distance: f64,
}

/// Nächster roher Kontrollpunkt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlPointHit {
    /// Index des Kontrollpunkts (0..=3)
    pub index: usize,
    /// Koordinate des Kontrollpunkts
    pub coordinate: Vector2,
    /// Quadrierte Distanz zur Anfrage-Koordinate
    pub squared_distance: f64,
}

/// Kubisches Bézier-Segment mit gecachter LUT.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveSegment {
    points: [Vector2; 4],
    settings: CurveSettings,
    lut: Vec<Vector2>,
}

impl CurveSegment {
    /// Erstellt ein Segment aus vier Kontrollpunkten.
    pub fn new(points: [Vector2; 4], settings: CurveSettings) -> Self {
        let mut segment = Self {
            points,
            settings,
            lut: Vec::new(),
        };
        segment.refresh();
        segment
    }

    /// Gerades Segment mit Tangenten auf den Sehnen-Dritteln.
    pub fn from_line(start: Vector2, end: Vector2, settings: CurveSettings) -> Self {
        let third = (end - start) / 3.0;
        Self::new([start, start + third, end - third, end], settings)
    }

    /// Kopie der vier Kontrollpunkte.
    pub fn control_points(&self) -> [Vector2; 4] {
        self.points
    }

    /// Einzelner Kontrollpunkt (Index 0..=3).
    pub fn control_point(&self, index: usize) -> Option<Vector2> {
        self.points.get(index).copied()
    }

    /// Startanker p0.
    pub fn start(&self) -> Vector2 {
        self.points[0]
    }

    /// Endanker p3.
    pub fn end(&self) -> Vector2 {
        self.points[3]
    }

    /// Gecachte LUT (mindestens zwei Punkte).
    pub fn lut(&self) -> &[Vector2] {
        &self.lut
    }

    /// Die beiden Tangenten-Arme `[p0, p1]` und `[p2, p3]`.
    pub fn handle_lines(&self) -> [[Vector2; 2]; 2] {
        let [p0, p1, p2, p3] = self.points;
        [[p0, p1], [p2, p3]]
    }

    /// B(t) per De Casteljau.
    ///
    /// Nutzt dieselben Zwischenschritte wie [`Self::split`], daher gilt exakt
    /// `split(t).0.end() == evaluate(t)`.
    pub fn evaluate(&self, t: f64) -> Vector2 {
        de_casteljau(&self.points, t).point
    }

    /// True wenn alle Kontrollpunkte (innerhalb der Toleranz) auf der Sehne liegen.
    pub fn is_line(&self) -> bool {
        let [p0, p1, p2, p3] = self.points;
        let chord = p3 - p0;
        let tolerance = self.settings.collinear_tolerance;
        are_parallel(chord, p1 - p0, tolerance) && are_parallel(chord, p2 - p0, tolerance)
    }

    /// Gleichmäßiges Parameter-Sampling mit `n + 1` Punkten.
    ///
    /// Kollineare Segmente liefern unabhängig von `n` genau `[p0, p3]`,
    /// damit gerade Abschnitte nicht durch Sampling-Rauschen ausbeulen.
    pub fn sample_lut(&self, n: usize) -> Vec<Vector2> {
        if self.is_line() {
            return vec![self.points[0], self.points[3]];
        }
        let n = n.max(1);
        (0..=n)
            .map(|i| self.evaluate(i as f64 / n as f64))
            .collect()
    }

    /// Exakte Unterteilung bei `t` in zwei Segmente.
    pub fn split(&self, t: f64) -> (CurveSegment, CurveSegment) {
        let steps = de_casteljau(&self.points, t);
        let [p0, _, _, p3] = self.points;
        let left = CurveSegment::new([p0, steps.a, steps.d, steps.point], self.settings);
        let right = CurveSegment::new([steps.point, steps.e, steps.c, p3], self.settings);
        (left, right)
    }

    /// Ersetzt Kontrollpunkt `index`.
    ///
    /// Ein verschobener Anker (0 oder 3) nimmt seinen Tangentenpunkt (1 bzw. 2)
    /// um dasselbe Delta mit. Die Kontinuität zum Nachbarsegment stellt das
    /// Gelenk sicher, nicht das Segment.
    pub fn change_control_point(&mut self, index: usize, value: Vector2) {
        match index {
            0 => {
                let delta = value - self.points[0];
                self.points[1] += delta;
            }
            3 => {
                let delta = value - self.points[3];
                self.points[2] += delta;
            }
            1 | 2 => {}
            _ => return,
        }
        self.points[index] = value;
        self.refresh();
    }

    /// Setzt Tangentenpunkt 1 bzw. 2 auf das Sehnen-Drittel zurück.
    ///
    /// Andere Indizes werden ignoriert.
    pub fn reset_control_point(&mut self, index: usize) {
        if index != 1 && index != 2 {
            return;
        }
        let [p0, _, _, p3] = self.points;
        self.points[index] = p0 + (p3 - p0) * (index as f64 / 3.0);
        self.refresh();
    }

    /// Übernimmt die rechten Kontrollpunkte (p2, p3) von `other`.
    ///
    /// Kein echter Kurven-Fit: Das Ergebnis reicht vom eigenen Startanker bis
    /// zum Endanker von `other`, die Form der beiden Hälften geht verloren.
    /// `other` muss direkt an dieses Segment anschließen.
    pub fn combine_with(&mut self, other: &CurveSegment) -> anyhow::Result<()> {
        ensure!(
            self.points[3] == other.points[0],
            "Segmente sind nicht benachbart: Endanker {:?} != Startanker {:?}",
            self.points[3],
            other.points[0]
        );
        self.points[2] = other.points[2];
        self.points[3] = other.points[3];
        self.refresh();
        Ok(())
    }

    /// Nächster Punkt auf der Kurve (über die LUT-Polylinie).
    pub fn closest_curve_point(&self, coordinate: Vector2) -> CurvePointHit {
        let lut = &self.lut;
        let precision = lut.len().saturating_sub(1).max(1);

        let mut best: Option<(usize, Vector2, f64)> = None;
        for (i, pair) in lut.windows(2).enumerate() {
            let candidate = closest_on_segment(coordinate, pair[0], pair[1]);
            let sq = squared_distance(coordinate, candidate);
            if best.is_none_or(|(_, _, min)| sq < min) {
                best = Some((i, candidate, sq));
            }
        }

        let Some((index, closest, sq)) = best else {
            let p0 = self.points[0];
            return CurvePointHit {
                parameter: 0.0,
                coordinate: p0,
                squared_distance: squared_distance(coordinate, p0),
            };
        };

        let seg_len = lut[index].distance(lut[index + 1]);
        let fraction = if seg_len > 0.0 {
            lut[index].distance(closest) / seg_len
        } else {
            0.0
        };

        CurvePointHit {
            parameter: (index as f64 + fraction) / precision as f64,
            coordinate: closest,
            squared_distance: sq,
        }
    }

    /// Nächster der vier rohen Kontrollpunkte (nicht LUT).
    pub fn closest_control_point(&self, coordinate: Vector2) -> ControlPointHit {
        let mut best = ControlPointHit {
            index: 0,
            coordinate: self.points[0],
            squared_distance: squared_distance(coordinate, self.points[0]),
        };
        for (index, &point) in self.points.iter().enumerate().skip(1) {
            let sq = squared_distance(coordinate, point);
            if sq < best.squared_distance {
                best = ControlPointHit {
                    index,
                    coordinate: point,
                    squared_distance: sq,
                };
            }
        }
        best
    }

    /// Box der vier Kontrollpunkte.
    ///
    /// Konservative Obermenge der echten Kurven-Box (Convex-Hull-Eigenschaft),
    /// reicht für die Kandidaten-Vorfilterung.
    pub fn extent(&self) -> BoundingBox {
        let [p0, p1, p2, p3] = self.points;
        BoundingBox::from_point(p0)
            .expanded_to(p1)
            .expanded_to(p2)
            .expanded_to(p3)
    }

    fn refresh(&mut self) {
        self.lut = self.sample_lut(self.settings.lut_precision);
    }
}

/// Zwischenschritte einer De-Casteljau-Auswertung.
struct DeCasteljau {
    a: Vector2,
    c: Vector2,
    d: Vector2,
    e: Vector2,
    point: Vector2,
}

fn de_casteljau(points: &[Vector2; 4], t: f64) -> DeCasteljau {
    let [p0, p1, p2, p3] = *points;
    let a = lerp(p0, p1, t);
    let b = lerp(p1, p2, t);
    let c = lerp(p2, p3, t);
    let d = lerp(a, b, t);
    let e = lerp(b, c, t);
    DeCasteljau {
        a,
        c,
        d,
        e,
        point: lerp(d, e, t),
    }
}
