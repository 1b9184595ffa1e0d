use crate::overlay::{DiagnosticsOverlay, Severity};
use macroquad::prelude::*;
use shared::{Dummy, OwnerId, ARENA_EXTENT};

/// Margin around the arena in pixels.
const ARENA_MARGIN: f32 = 40.0;

pub struct Renderer {
    width: f32,
    height: f32,
}

impl Renderer {
    pub fn new(width: usize, height: usize) -> Result<Self, Box<dyn std::error::Error>> {
        Ok(Renderer {
            width: width as f32,
            height: height as f32,
        })
    }

    /// Draws the arena top-down: the world state as received, no local
    /// smoothing or prediction.
    pub fn render(&mut self, dummies: &[Dummy], local_id: Option<OwnerId>, overlay: &DiagnosticsOverlay) {
        clear_background(Color::from_rgba(26, 26, 26, 255));

        self.draw_arena();

        for dummy in dummies {
            let is_own = Some(dummy.owner) == local_id;
            self.draw_dummy(dummy, is_own);
        }

        self.draw_overlay(overlay);

        if local_id.is_none() {
            let text = "Connecting...";
            draw_text(text, self.width / 2.0 - 60.0, self.height / 2.0, 24.0, GRAY);
        }
    }

    /// Pixels per world unit, fitting the arena square into the window.
    fn scale(&self) -> f32 {
        (self.width.min(self.height) / 2.0 - ARENA_MARGIN) / ARENA_EXTENT
    }

    fn to_screen(&self, x: f32, y: f32) -> (f32, f32) {
        let scale = self.scale();
        (
            self.width / 2.0 + x * scale,
            self.height / 2.0 + y * scale,
        )
    }

    fn draw_arena(&self) {
        let scale = self.scale();
        let (left, top) = self.to_screen(-ARENA_EXTENT, -ARENA_EXTENT);
        let side = ARENA_EXTENT * 2.0 * scale;

        draw_rectangle(left, top, side, side, Color::from_rgba(38, 38, 38, 255));
        draw_rectangle_lines(left, top, side, side, 2.0, Color::from_rgba(68, 68, 68, 255));
    }

    fn draw_dummy(&self, dummy: &Dummy, is_own: bool) {
        let scale = self.scale();
        let (x, y) = self.to_screen(dummy.x, dummy.y);
        let radius = dummy.radius * scale;

        // Ground shadow stays put while the body lifts with jump height.
        if dummy.is_airborne() {
            draw_circle(x, y, radius * 0.8, Color::from_rgba(0, 0, 0, 120));
        }
        let body_y = y - dummy.height * scale * 0.5;

        let color = Color::new(dummy.color.r, dummy.color.g, dummy.color.b, 1.0);
        draw_circle(x, body_y, radius, color);

        if is_own {
            draw_circle_lines(x, body_y, radius + 2.0, 2.0, WHITE);
        }

        let label_x = x - dummy.name.len() as f32 * 3.0;
        draw_text(&dummy.name, label_x, body_y - radius - 6.0, 14.0, WHITE);
    }

    fn draw_overlay(&self, overlay: &DiagnosticsOverlay) {
        for (i, line) in overlay.lines().iter().enumerate() {
            let y = 20.0 + i as f32 * 18.0;
            draw_text(&line.text, 10.0, y, 16.0, severity_color(line.severity));
        }
    }
}

fn severity_color(severity: Severity) -> Color {
    match severity {
        Severity::Good => GREEN,
        Severity::Warning => YELLOW,
        Severity::Bad => RED,
        Severity::Neutral => WHITE,
    }
}
