// Domain-to-screen mapping for the 2D flock view.
//
// View model:
//   - The whole domain is always visible, scaled uniformly to fit the window
//   - Leftover space is split evenly on both sides (letterboxing)
//   - Domain +y points down the screen, matching the heading convention

use glam::{DVec2, Vec2};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DomainView {
    /// Domain size in domain units.
    domain: DVec2,
    /// Screen points per domain unit.
    scale: f32,
    /// Screen position of the domain origin.
    offset: Vec2,
}

impl DomainView {
    pub fn new(domain_width: f64, domain_height: f64) -> Self {
        Self {
            domain: DVec2::new(domain_width, domain_height),
            scale: 1.0,
            offset: Vec2::ZERO,
        }
    }

    /// Refit to a viewport of `viewport` points. Call on every resize.
    pub fn fit(&mut self, viewport: Vec2) {
        let domain = self.domain.as_vec2();
        if viewport.x <= 0.0 || viewport.y <= 0.0 || domain.x <= 0.0 || domain.y <= 0.0 {
            return;
        }
        self.scale = (viewport.x / domain.x).min(viewport.y / domain.y);
        self.offset = (viewport - domain * self.scale) * 0.5;
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn to_screen(&self, point: DVec2) -> egui::Pos2 {
        let p = self.offset + point.as_vec2() * self.scale;
        egui::pos2(p.x, p.y)
    }

    /// Screen point reached by walking `length` domain units from `origin`
    /// along `heading` degrees.
    pub fn ray_end(&self, origin: DVec2, heading: f64, length: f64) -> egui::Pos2 {
        let rad = heading.to_radians();
        self.to_screen(origin + DVec2::new(rad.cos(), rad.sin()) * length)
    }

    /// On-screen rectangle covered by the domain.
    pub fn domain_rect(&self) -> egui::Rect {
        egui::Rect::from_min_max(self.to_screen(DVec2::ZERO), self.to_screen(self.domain))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_fit_is_identity() {
        let mut view = DomainView::new(1500.0, 1000.0);
        view.fit(Vec2::new(1500.0, 1000.0));
        assert_eq!(view.scale(), 1.0);
        assert_eq!(view.to_screen(DVec2::new(10.0, 20.0)), egui::pos2(10.0, 20.0));
    }

    #[test]
    fn wide_window_letterboxes_horizontally() {
        let mut view = DomainView::new(100.0, 100.0);
        view.fit(Vec2::new(400.0, 200.0));
        assert_eq!(view.scale(), 2.0);
        let rect = view.domain_rect();
        assert_eq!(rect.min, egui::pos2(100.0, 0.0));
        assert_eq!(rect.max, egui::pos2(300.0, 200.0));
    }

    #[test]
    fn degenerate_viewport_keeps_previous_fit() {
        let mut view = DomainView::new(100.0, 100.0);
        view.fit(Vec2::new(50.0, 50.0));
        view.fit(Vec2::new(0.0, 300.0));
        assert_eq!(view.scale(), 0.5);
    }

    #[test]
    fn ray_follows_heading() {
        let view = DomainView::new(100.0, 100.0);
        let end = view.ray_end(DVec2::new(10.0, 10.0), 90.0, 20.0);
        assert!((end.x - 10.0).abs() < 1e-4);
        assert!((end.y - 30.0).abs() < 1e-4);
    }
}
