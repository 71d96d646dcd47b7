//! ViewTransform - pan/zoom mapping between screen and world coordinates
//!
//! `screen = world * zoom + pan`. Layout positions are always world
//! coordinates; pointer input arrives in screen coordinates and is mapped
//! back before any hit testing or marquee comparison.

use egui::{Pos2, Rect, Vec2};

/// Current pan/zoom of a diagram view
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub pan: Vec2,
    pub zoom: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            pan: Vec2::ZERO,
            zoom: 1.0,
            min_zoom: 0.1,
            max_zoom: 5.0,
        }
    }
}

impl ViewTransform {
    pub fn new(pan: Vec2, zoom: f32) -> Self {
        Self {
            pan,
            zoom,
            ..Default::default()
        }
    }

    pub fn world_to_screen(&self, world: Pos2) -> Pos2 {
        (world.to_vec2() * self.zoom + self.pan).to_pos2()
    }

    pub fn screen_to_world(&self, screen: Pos2) -> Pos2 {
        ((screen.to_vec2() - self.pan) / self.zoom).to_pos2()
    }

    /// Map a screen rectangle (corners in any order) into world space
    pub fn screen_rect_to_world(&self, a: Pos2, b: Pos2) -> Rect {
        Rect::from_two_pos(self.screen_to_world(a), self.screen_to_world(b))
    }

    /// Zoom by factor, keeping `screen_pos` fixed over the same world point
    pub fn zoom_at(&mut self, factor: f32, screen_pos: Pos2) {
        let anchor = self.screen_to_world(screen_pos);
        self.zoom = (self.zoom * factor).clamp(self.min_zoom, self.max_zoom);
        self.pan = screen_pos.to_vec2() - anchor.to_vec2() * self.zoom;
    }

    /// Fit world bounds into the screen rect with padding, centered
    pub fn fit_to_bounds(&mut self, bounds: Rect, screen: Rect, padding: f32) {
        if bounds.is_negative() || bounds.width() < 1.0 || bounds.height() < 1.0 {
            return;
        }
        let avail_w = (screen.width() - 2.0 * padding).max(1.0);
        let avail_h = (screen.height() - 2.0 * padding).max(1.0);
        self.zoom = (avail_w / bounds.width())
            .min(avail_h / bounds.height())
            .clamp(self.min_zoom, self.max_zoom);
        self.pan = screen.center().to_vec2() - bounds.center().to_vec2() * self.zoom;
    }
}
