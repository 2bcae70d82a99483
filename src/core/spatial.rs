//! Spatial-Index (KD-Tree) über Bounding-Boxen mit expliziten Schlüsseln.
//!
//! Der KD-Tree speichert nur die Box-Mittelpunkte, jeden verschiedenen
//! Mittelpunkt genau einmal. Einträge mit gleichem Mittelpunkt teilen sich
//! einen Bucket; der Baumpunkt entsteht mit dem ersten und verschwindet mit
//! dem letzten Eintrag des Buckets.
//!
//! Eine Bereichsabfrage sucht mit dem Radius `halbe Diagonale der Anfrage +
//! größte halbe Diagonale aller Einträge` und filtert danach exakt per
//! Box-Schnitt. Dadurch bleibt jeder Eintrag einzeln änderbar, ohne den Baum
//! neu aufzubauen. Kosten: eine einzelne sehr große Box (z.B. eine lange
//! Kette) vergrößert den Radius jeder Abfrage, im Extremfall wird daraus ein
//! Scan über alle Mittelpunkte.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

use kiddo::{KdTree, SquaredEuclidean};

use super::math::BoundingBox;

/// Mittelpunkt als Bitmuster (Schlüssel der Buckets).
type CenterKey = [u64; 2];

#[derive(Debug, Clone, Copy)]
struct Entry {
    item: u64,
    bbox: BoundingBox,
    center: CenterKey,
}

/// Alle Einträge mit exakt demselben Mittelpunkt.
#[derive(Debug)]
struct Bucket<K> {
    /// Item des Baumpunkts
    point: u64,
    keys: Vec<K>,
}

/// Änderbarer Box-Index, adressiert über Schlüssel `K`.
#[derive(Debug)]
pub struct SpatialIndex<K> {
    tree: KdTree<f64, 2>,
    entries: HashMap<K, Entry>,
    buckets: HashMap<CenterKey, Bucket<K>>,
    centers_by_point: HashMap<u64, CenterKey>,
    /// Multimenge der halben Diagonalen (Bits des f64 → Anzahl)
    half_diagonals: BTreeMap<u64, usize>,
    next_item: u64,
    next_point: u64,
}

impl<K> Default for SpatialIndex<K>
where
    K: Copy + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> SpatialIndex<K>
where
    K: Copy + Eq + Hash,
{
    /// Erstellt einen leeren Spatial-Index.
    pub fn new() -> Self {
        Self {
            tree: KdTree::new(),
            entries: HashMap::new(),
            buckets: HashMap::new(),
            centers_by_point: HashMap::new(),
            half_diagonals: BTreeMap::new(),
            next_item: 0,
            next_point: 0,
        }
    }

    /// Gibt die Anzahl indexierter Einträge zurück.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Gibt `true` zurück, wenn keine Einträge im Index liegen.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Box eines Eintrags.
    pub fn get_bbox(&self, key: K) -> Option<BoundingBox> {
        self.entries.get(&key).map(|e| e.bbox)
    }

    /// Fügt einen Eintrag ein. Ein vorhandener Eintrag desselben Schlüssels
    /// wird ersetzt.
    pub fn insert(&mut self, bbox: BoundingBox, key: K) {
        self.remove(key);

        let item = self.next_item;
        self.next_item += 1;

        let point = center_of(&bbox);
        let center = center_key(point);
        match self.buckets.get_mut(&center) {
            Some(bucket) => bucket.keys.push(key),
            None => {
                let point_item = self.next_point;
                self.next_point += 1;
                self.tree.add(&point, point_item);
                self.centers_by_point.insert(point_item, center);
                self.buckets.insert(
                    center,
                    Bucket {
                        point: point_item,
                        keys: vec![key],
                    },
                );
            }
        }

        *self
            .half_diagonals
            .entry(bbox.half_diagonal().to_bits())
            .or_insert(0) += 1;
        self.entries.insert(key, Entry { item, bbox, center });
    }

    /// Entfernt einen Eintrag. Liefert seine Box, falls vorhanden.
    pub fn remove(&mut self, key: K) -> Option<BoundingBox> {
        let entry = self.entries.remove(&key)?;

        let emptied = match self.buckets.get_mut(&entry.center) {
            Some(bucket) => {
                bucket.keys.retain(|k| *k != key);
                bucket.keys.is_empty().then_some(bucket.point)
            }
            None => None,
        };
        if let Some(point_item) = emptied {
            self.tree.remove(&center_of(&entry.bbox), point_item);
            self.centers_by_point.remove(&point_item);
            self.buckets.remove(&entry.center);
        }

        let bits = entry.bbox.half_diagonal().to_bits();
        if let Some(count) = self.half_diagonals.get_mut(&bits) {
            *count -= 1;
            if *count == 0 {
                self.half_diagonals.remove(&bits);
            }
        }
        Some(entry.bbox)
    }

    /// Ersetzt die Box eines Eintrags (Entfernen + Einfügen).
    pub fn update(&mut self, bbox: BoundingBox, key: K) {
        self.insert(bbox, key);
    }

    /// Alle Schlüssel, deren Box `bbox` schneidet (Rand inklusive).
    pub fn query_range(&self, bbox: &BoundingBox) -> Vec<K> {
        if self.is_empty() {
            return Vec::new();
        }

        let radius = bbox.half_diagonal() + self.max_half_diagonal();
        let mut matches: Vec<(u64, K)> = self
            .tree
            .within::<SquaredEuclidean>(&center_of(bbox), radius * radius)
            .into_iter()
            .filter_map(|found| {
                let center = self.centers_by_point.get(&found.item)?;
                self.buckets.get(center)
            })
            .flat_map(|bucket| bucket.keys.iter())
            .filter_map(|key| {
                let entry = self.entries.get(key)?;
                // Exakte Box-Prüfung nach dem KD-Tree-Vorfilter
                entry.bbox.intersects(bbox).then_some((entry.item, *key))
            })
            .collect();

        // Einfügereihenfolge, unabhängig von der Baumstruktur
        matches.sort_unstable_by_key(|(item, _)| *item);
        matches.into_iter().map(|(_, key)| key).collect()
    }

    /// Alle Schlüssel in Einfügereihenfolge.
    pub fn query_all(&self) -> Vec<K> {
        let mut all: Vec<(u64, K)> = self
            .entries
            .iter()
            .map(|(key, entry)| (entry.item, *key))
            .collect();
        all.sort_unstable_by_key(|(item, _)| *item);
        all.into_iter().map(|(_, key)| key).collect()
    }

    /// Vereinigung aller Boxen, `None` bei leerem Index.
    pub fn total_extent(&self) -> Option<BoundingBox> {
        self.entries
            .values()
            .map(|e| e.bbox)
            .reduce(BoundingBox::union)
    }

    fn max_half_diagonal(&self) -> f64 {
        // Nicht-negative f64 sind über ihre Bits monoton geordnet
        self.half_diagonals
            .last_key_value()
            .map(|(bits, _)| f64::from_bits(*bits))
            .unwrap_or(0.0)
    }
}

fn center_of(bbox: &BoundingBox) -> [f64; 2] {
    let c = bbox.center();
    [c.x, c.y]
}

/// `+ 0.0` bildet -0.0 auf 0.0 ab, damit beide denselben Bucket treffen.
fn center_key(point: [f64; 2]) -> CenterKey {
    [(point[0] + 0.0).to_bits(), (point[1] + 0.0).to_bits()]
}
