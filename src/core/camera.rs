//! 2D-Kamera für Pan und Zoom sowie die Pixel↔Karte-Schnittstelle.

use glam::DVec2;

/// Umrechnung zwischen Bildschirm-Pixeln und Karten-Koordinaten.
pub trait ViewTransform {
    /// Pixel → Karte.
    fn pixel_to_map(&self, pixel: DVec2) -> DVec2;

    /// Karte → Pixel.
    fn map_to_pixel(&self, map: DVec2) -> DVec2;
}

/// 2D-Kamera mit Pan und Zoom über einem festen Viewport.
#[derive(Debug, Clone)]
pub struct Camera2D {
    /// Position der Kamera in Welt-Koordinaten
    pub position: DVec2,
    /// Zoom-Level (1.0 = normal, 2.0 = doppelt so groß)
    pub zoom: f64,
    /// Viewport-Größe in Pixeln
    pub viewport: DVec2,
}

impl Camera2D {
    /// Sichtbare Welt-Halbhöhe bei Zoom 1.0.
    pub const BASE_WORLD_EXTENT: f64 = 2048.0;
    /// Minimaler Zoom-Faktor.
    pub const ZOOM_MIN: f64 = 0.1;
    /// Maximaler Zoom-Faktor.
    pub const ZOOM_MAX: f64 = 100.0;

    /// Erstellt eine Kamera für einen Viewport (in Pixeln).
    pub fn new(viewport: DVec2) -> Self {
        Self {
            position: DVec2::ZERO,
            zoom: 1.0,
            viewport: viewport.max(DVec2::ONE),
        }
    }

    /// Zentriert die Kamera auf einen Punkt
    pub fn look_at(&mut self, target: DVec2) {
        self.position = target;
    }

    /// Verschiebt die Kamera (Pan)
    pub fn pan(&mut self, delta: DVec2) {
        self.position += delta;
    }

    /// Ändert den Zoom-Level
    pub fn zoom_by(&mut self, factor: f64) {
        self.zoom = (self.zoom * factor).clamp(Self::ZOOM_MIN, Self::ZOOM_MAX);
    }

    /// Ändert die Viewport-Größe (z.B. nach Fenster-Resize).
    pub fn resize(&mut self, viewport: DVec2) {
        self.viewport = viewport.max(DVec2::ONE);
    }

    /// Welt-Einheiten pro Pixel und Achse.
    fn world_scale(&self) -> DVec2 {
        let aspect = self.viewport.x / self.viewport.y;
        DVec2::new(aspect, 1.0) * Self::BASE_WORLD_EXTENT / self.zoom
    }

    /// Konvertiert Screen-Koordinaten zu Welt-Koordinaten.
    /// Berücksichtigt BASE_WORLD_EXTENT, Zoom und Aspekt-Ratio.
    pub fn screen_to_world(&self, screen_pos: DVec2) -> DVec2 {
        // Screen-Koordinaten zentrieren (-1 bis 1)
        let ndc = (screen_pos / self.viewport) * 2.0 - DVec2::ONE;
        // Y wird nicht negiert, Screen und Welt teilen die Y-Richtung
        ndc * self.world_scale() + self.position
    }

    /// Konvertiert Welt-Koordinaten zu Screen-Koordinaten.
    pub fn world_to_screen(&self, world_pos: DVec2) -> DVec2 {
        let ndc = (world_pos - self.position) / self.world_scale();
        (ndc + DVec2::ONE) * 0.5 * self.viewport
    }

    /// Berechnet den Umrechnungsfaktor von Screen-Pixeln zu Welt-Einheiten.
    pub fn world_per_pixel(&self) -> f64 {
        2.0 * Self::BASE_WORLD_EXTENT / (self.zoom * self.viewport.y)
    }
}

impl ViewTransform for Camera2D {
    fn pixel_to_map(&self, pixel: DVec2) -> DVec2 {
        self.screen_to_world(pixel)
    }

    fn map_to_pixel(&self, map: DVec2) -> DVec2 {
        self.world_to_screen(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_camera_pan() {
        let mut camera = Camera2D::new(DVec2::new(800.0, 600.0));
        camera.pan(DVec2::new(10.0, 5.0));
        assert_relative_eq!(camera.position.x, 10.0);
        assert_relative_eq!(camera.position.y, 5.0);
    }

    #[test]
    fn test_camera_zoom_is_clamped() {
        let mut camera = Camera2D::new(DVec2::new(800.0, 600.0));
        camera.zoom_by(2.0);
        assert_relative_eq!(camera.zoom, 2.0);

        camera.zoom_by(1000.0);
        assert_relative_eq!(camera.zoom, Camera2D::ZOOM_MAX);
    }

    #[test]
    fn test_screen_to_world_center() {
        let camera = Camera2D::new(DVec2::new(800.0, 600.0));
        // Bildschirm-Mitte → Welt-Ursprung
        let world = camera.screen_to_world(DVec2::new(400.0, 300.0));
        assert_relative_eq!(world.x, 0.0);
        assert_relative_eq!(world.y, 0.0);
    }

    #[test]
    fn test_world_to_screen_inverts_screen_to_world() {
        let mut camera = Camera2D::new(DVec2::new(1280.0, 720.0));
        camera.look_at(DVec2::new(-35.0, 120.0));
        camera.zoom_by(3.5);
        let pixel = DVec2::new(97.0, 411.0);
        let back = camera.map_to_pixel(camera.pixel_to_map(pixel));
        assert_relative_eq!(back.x, pixel.x, epsilon = 1e-9);
        assert_relative_eq!(back.y, pixel.y, epsilon = 1e-9);
    }

    #[test]
    fn test_square_viewport_is_one_to_one() {
        // 4096 px bei Zoom 1 entsprechen genau 4096 Welt-Einheiten
        let mut camera = Camera2D::new(DVec2::splat(4096.0));
        camera.look_at(DVec2::splat(2048.0));
        assert_eq!(
            camera.pixel_to_map(DVec2::new(15.0, 1.0)),
            DVec2::new(15.0, 1.0)
        );
        assert_relative_eq!(camera.world_per_pixel(), 1.0);
    }

    #[test]
    fn test_world_per_pixel_halves_with_zoom() {
        let mut camera = Camera2D::new(DVec2::new(800.0, 600.0));
        let wpp1 = camera.world_per_pixel();
        camera.zoom = 2.0;
        let wpp2 = camera.world_per_pixel();
        // Doppelter Zoom → halb so viele Welt-Einheiten pro Pixel
        assert_relative_eq!(wpp2, wpp1 / 2.0);
    }
}
