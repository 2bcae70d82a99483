//! Edit-Session: Zeiger-Zustandsmaschine über allen registrierten Ketten.
//!
//! Die Session hält Ketten, den groben Spatial-Index (eine Box pro Kette),
//! die View-Transformation und das Overlay. Ein Zeiger-Move sucht den
//! nächsten editierbaren Punkt unter der Pixel-Toleranz, Down/Drag/Up
//! verschieben oder löschen ihn.

use std::fmt;

use anyhow::{anyhow, Context};
use glam::DVec2;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::events::{Modifiers, PointerEvent};
use super::overlay::{Marker, MarkerKey, MarkerOverlay, Overlay};
use crate::core::{
    reduce_closest, BoundingBox, Camera2D, CurveChain, Handle, HandleDescriptor, PathFeature,
    SpatialIndex, Vector2, ViewTransform,
};
use crate::shared::EditorOptions;

#[cfg(test)]
mod tests;

/// Identität einer Kette innerhalb der Session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChainId(u64);

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Logischer Punkt einer bestimmten Kette.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EditTarget {
    /// Besitzende Kette
    pub chain: ChainId,
    /// Punkt innerhalb der Kette
    pub handle: Handle,
}

/// Zustand der Zeiger-Interaktion.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SessionState {
    /// Kein Punkt unter dem Zeiger
    #[default]
    Idle,
    /// Zeiger liegt über einem editierbaren Punkt
    Hovering(EditTarget),
    /// Taste gedrückt; `moved` wird beim ersten Drag gesetzt
    Dragging { target: EditTarget, moved: bool },
}

impl SessionState {
    /// Aktuelles Ziel (Hover oder Drag).
    pub fn target(&self) -> Option<EditTarget> {
        match *self {
            SessionState::Idle => None,
            SessionState::Hovering(target) | SessionState::Dragging { target, .. } => Some(target),
        }
    }

    /// Läuft gerade ein Down-Up-Zyklus?
    pub fn is_dragging(&self) -> bool {
        matches!(self, SessionState::Dragging { .. })
    }
}

/// Zeiger-getriebener Bézier-Editor über mehreren Pfad-Features.
pub struct EditSession<V = Camera2D, O = MarkerOverlay> {
    view: V,
    overlay: O,
    options: EditorOptions,
    chains: IndexMap<ChainId, CurveChain>,
    index: SpatialIndex<ChainId>,
    state: SessionState,
    next_chain_id: u64,
}

impl<V, O> EditSession<V, O>
where
    V: ViewTransform,
    O: Overlay,
{
    /// Erstellt eine leere Session.
    pub fn new(view: V, overlay: O, options: EditorOptions) -> Self {
        Self {
            view,
            overlay,
            options,
            chains: IndexMap::new(),
            index: SpatialIndex::new(),
            state: SessionState::Idle,
            next_chain_id: 1,
        }
    }

    /// Aktive Optionen.
    pub fn options(&self) -> &EditorOptions {
        &self.options
    }

    /// View-Transformation.
    pub fn view(&self) -> &V {
        &self.view
    }

    /// View-Transformation (z.B. für Pan/Zoom zwischen Events).
    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    /// Overlay mit den aktuellen Markern.
    pub fn overlay(&self) -> &O {
        &self.overlay
    }

    /// Aktueller Interaktions-Zustand.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Kette zu einer ID.
    pub fn chain(&self, id: ChainId) -> Option<&CurveChain> {
        self.chains.get(&id)
    }

    /// Alle Ketten in Registrierungsreihenfolge.
    pub fn chains(&self) -> impl Iterator<Item = (ChainId, &CurveChain)> {
        self.chains.iter().map(|(id, chain)| (*id, chain))
    }

    /// Box der Kette im Spatial-Index (Stand des letzten Reindex).
    pub fn indexed_extent(&self, id: ChainId) -> Option<BoundingBox> {
        self.index.get_bbox(id)
    }

    /// Registriert ein Feature und baut seine Kette.
    pub fn add_feature(&mut self, feature: PathFeature) -> anyhow::Result<ChainId> {
        let feature_id = feature.id;
        let chain = CurveChain::from_feature(feature, self.options.curve_settings())
            .with_context(|| format!("Feature {} kann nicht editiert werden", feature_id))?;

        let id = ChainId(self.next_chain_id);
        self.next_chain_id += 1;

        if let Some(extent) = chain.extent() {
            self.index.insert(extent, id);
        }
        self.chains.insert(id, chain);
        self.sync_handle_lines(id);

        log::debug!("Feature {} als Kette {} registriert", feature_id, id);
        Ok(id)
    }

    /// Entfernt eine Kette und gibt ihr Feature zurück.
    pub fn remove_feature(&mut self, id: ChainId) -> Option<PathFeature> {
        let chain = self.chains.shift_remove(&id)?;
        self.index.remove(id);
        self.overlay.hide(MarkerKey::HandleLines(id));

        if self.state.target().is_some_and(|t| t.chain == id) {
            self.state = SessionState::Idle;
            self.overlay.hide(MarkerKey::Vertex);
        }

        log::debug!("Kette {} entfernt", id);
        Some(chain.into_feature())
    }

    /// Gibt alle Features in Registrierungsreihenfolge frei.
    pub fn into_features(self) -> Vec<PathFeature> {
        self.chains
            .into_values()
            .map(CurveChain::into_feature)
            .collect()
    }

    /// Verteilt ein Zeiger-Event an den passenden Handler.
    pub fn handle_event(&mut self, event: PointerEvent) -> anyhow::Result<()> {
        match event {
            PointerEvent::Move { pixel } => self.pointer_move(pixel),
            PointerEvent::Down { pixel } => {
                self.pointer_down(pixel);
            }
            PointerEvent::Drag { pixel } => self.pointer_drag(pixel)?,
            PointerEvent::Up { pixel, modifiers } => self.pointer_up(pixel, modifiers)?,
        }
        Ok(())
    }

    /// Zeiger-Move ohne Taste: bestimmt den Punkt unter dem Zeiger.
    ///
    /// Während eines Down-Up-Zyklus wird nichts neu bestimmt.
    pub fn pointer_move(&mut self, pixel: DVec2) {
        if self.state.is_dragging() {
            return;
        }

        match self.resolve_target(pixel) {
            Some((target, descriptor)) => {
                self.state = SessionState::Hovering(target);
                self.show_vertex(descriptor.coordinate);
            }
            None => {
                self.state = SessionState::Idle;
                self.overlay.hide(MarkerKey::Vertex);
            }
        }
    }

    /// Taste gedrückt: startet einen Drag, wenn ein Punkt anvisiert ist.
    pub fn pointer_down(&mut self, _pixel: DVec2) -> bool {
        let SessionState::Hovering(target) = self.state else {
            return false;
        };
        self.state = SessionState::Dragging {
            target,
            moved: false,
        };
        true
    }

    /// Drag: verschiebt das Ziel und bindet die Session an den neuen Handle.
    pub fn pointer_drag(&mut self, pixel: DVec2) -> anyhow::Result<()> {
        let SessionState::Dragging { target, .. } = self.state else {
            return Ok(());
        };

        let coordinate = self.view.pixel_to_map(pixel);
        let chain = self
            .chains
            .get_mut(&target.chain)
            .ok_or_else(|| anyhow!("Kette {} existiert nicht mehr", target.chain))?;

        let handle = chain.move_handle(target.handle, coordinate);
        if handle != target.handle {
            log::debug!(
                "Drag-Ziel in Kette {} gewechselt: {:?} -> {:?}",
                target.chain,
                target.handle,
                handle
            );
        }
        let marker = chain.handle_coordinate(handle);

        self.state = SessionState::Dragging {
            target: EditTarget {
                chain: target.chain,
                handle,
            },
            moved: true,
        };
        if let Some(coordinate) = marker {
            self.show_vertex(coordinate);
        }
        self.sync_handle_lines(target.chain);
        Ok(())
    }

    /// Taste losgelassen: Reindex der Kette, ohne Bewegung ggf. Löschen.
    ///
    /// Ein Klick ohne Modifier entfernt das Ziel (`Main` verschmilzt, Tangenten
    /// werden zurückgesetzt).
    pub fn pointer_up(&mut self, _pixel: DVec2, modifiers: Modifiers) -> anyhow::Result<()> {
        let SessionState::Dragging { target, moved } = self.state else {
            return Ok(());
        };
        self.state = SessionState::Idle;
        self.overlay.hide(MarkerKey::Vertex);

        let chain = self
            .chains
            .get_mut(&target.chain)
            .ok_or_else(|| anyhow!("Kette {} existiert nicht mehr", target.chain))?;

        if !moved && !modifiers.any() {
            match chain.remove_handle(target.handle) {
                Some(_) => log::debug!("Klick auf {:?}: zurückgesetzt", target.handle),
                None => log::debug!("Klick auf {:?}: Gelenk entfernt", target.handle),
            }
        }

        if let Some(extent) = chain.extent() {
            self.index.update(extent, target.chain);
        }
        self.sync_handle_lines(target.chain);
        Ok(())
    }

    /// Nächster editierbarer Punkt aller Ketten unter der Pixel-Toleranz.
    fn resolve_target(&self, pixel: DVec2) -> Option<(EditTarget, HandleDescriptor)> {
        let view = &self.view;
        let tolerance = self.options.pixel_tolerance_px;
        let coordinate = view.pixel_to_map(pixel);
        let bbox = BoundingBox::new(
            view.pixel_to_map(pixel + DVec2::new(-tolerance, tolerance)),
            view.pixel_to_map(pixel + DVec2::new(tolerance, -tolerance)),
        );
        let within = |candidate: Vector2| view.map_to_pixel(candidate).distance(pixel) <= tolerance;

        let candidates = self.index.query_range(&bbox).into_iter().filter_map(|id| {
            let chain = self.chains.get(&id)?;
            let descriptor = chain.closest_handle(coordinate, within, Some(&bbox))?;
            Some((id, descriptor))
        });

        reduce_closest(candidates, |(_, d)| d, within).map(|(chain, descriptor)| {
            (
                EditTarget {
                    chain,
                    handle: descriptor.handle,
                },
                descriptor,
            )
        })
    }

    fn show_vertex(&mut self, coordinate: Vector2) {
        self.overlay.show(
            MarkerKey::Vertex,
            Marker::Vertex {
                coordinate,
                size_px: self.options.vertex_marker_size_px,
            },
        );
    }

    fn sync_handle_lines(&mut self, id: ChainId) {
        let key = MarkerKey::HandleLines(id);
        match self.chains.get(&id) {
            Some(chain) if self.options.show_tangent_handles => {
                self.overlay.show(key, Marker::HandleLines(chain.handle_lines()));
            }
            _ => self.overlay.hide(key),
        }
    }
}
