//! On-screen diagnostics: frame rate, round-trip time and the replicated
//! dummy counter
//!
//! The overlay owns no rendering. It accumulates samples and produces a
//! small render model ([`OverlayLine`]s) that the renderer draws as text;
//! that keeps the load thresholds testable without a window.

/// How often the rolling FPS average refreshes, in seconds.
const FPS_UPDATE_INTERVAL: f32 = 0.5;

/// Rolling average frame rate over a fixed sampling interval.
///
/// Averaging the per-frame rate over half a second keeps the readout
/// steady enough to read while still reacting quickly when spawned dummies
/// drag the frame rate down.
pub struct FpsCounter {
    update_interval: f32,
    time_left: f32,
    accum: f32,
    frames: u32,
    fps: f32,
}

impl FpsCounter {
    pub fn new(update_interval: f32) -> Self {
        Self {
            update_interval,
            time_left: update_interval,
            accum: 0.0,
            frames: 0,
            fps: 0.0,
        }
    }

    /// Feeds one frame of `dt` seconds. Returns true when the rolling
    /// average was refreshed this frame.
    pub fn record_frame(&mut self, dt: f32) -> bool {
        if dt <= 0.0 {
            return false;
        }

        self.time_left -= dt;
        self.accum += 1.0 / dt;
        self.frames += 1;

        if self.time_left <= 0.0 {
            self.fps = self.accum / self.frames as f32;
            self.time_left = self.update_interval;
            self.accum = 0.0;
            self.frames = 0;
            true
        } else {
            false
        }
    }

    /// Latest rolling average, zero until the first interval completes.
    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Average frame time in milliseconds derived from the rolling FPS.
    pub fn frame_time_ms(&self) -> f32 {
        if self.fps > 0.0 {
            1000.0 / self.fps
        } else {
            0.0
        }
    }
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new(FPS_UPDATE_INTERVAL)
    }
}

/// Load classification used to color overlay lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Good,
    Warning,
    Bad,
    Neutral,
}

/// 50+ FPS is comfortable, below 30 the simulation is visibly struggling.
pub fn fps_severity(fps: f32) -> Severity {
    if fps >= 50.0 {
        Severity::Good
    } else if fps >= 30.0 {
        Severity::Warning
    } else {
        Severity::Bad
    }
}

/// At or under 20ms round-trip the connection is healthy, over 50ms it is
/// noticeably laggy.
pub fn ping_severity(rtt_ms: u64) -> Severity {
    if rtt_ms <= 20 {
        Severity::Good
    } else if rtt_ms <= 50 {
        Severity::Warning
    } else {
        Severity::Bad
    }
}

/// One line of overlay text plus the severity that decides its color.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayLine {
    pub text: String,
    pub severity: Severity,
}

/// Diagnostics readout fed from the frame loop (FPS), the network layer
/// (RTT samples) and world state broadcasts (dummy counter).
pub struct DiagnosticsOverlay {
    pub show_fps: bool,
    pub show_ping: bool,
    pub show_dummy_count: bool,
    visible: bool,
    fps: FpsCounter,
    rtt_ms: Option<u64>,
    dummy_count: u32,
}

impl DiagnosticsOverlay {
    pub fn new() -> Self {
        Self {
            show_fps: true,
            show_ping: true,
            show_dummy_count: true,
            visible: true,
            fps: FpsCounter::default(),
            rtt_ms: None,
            dummy_count: 0,
        }
    }

    pub fn toggle_visibility(&mut self) {
        self.visible = !self.visible;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn record_frame(&mut self, dt: f32) {
        self.fps.record_frame(dt);
    }

    pub fn record_rtt(&mut self, rtt_ms: u64) {
        self.rtt_ms = Some(rtt_ms);
    }

    pub fn record_dummy_count(&mut self, count: u32) {
        self.dummy_count = count;
    }

    pub fn fps(&self) -> f32 {
        self.fps.fps()
    }

    /// Builds the lines to draw this frame. Empty while the overlay is
    /// hidden.
    pub fn lines(&self) -> Vec<OverlayLine> {
        if !self.visible {
            return Vec::new();
        }

        let mut lines = Vec::new();

        if self.show_fps {
            let fps = self.fps.fps();
            let severity = fps_severity(fps);
            lines.push(OverlayLine {
                text: format!("FPS: {:.1}", fps),
                severity,
            });
            lines.push(OverlayLine {
                text: format!("Frame Time: {:.1} ms", self.fps.frame_time_ms()),
                severity,
            });
        }

        if self.show_ping {
            match self.rtt_ms {
                Some(rtt) => lines.push(OverlayLine {
                    text: format!("Ping (RTT): {} ms", rtt),
                    severity: ping_severity(rtt),
                }),
                None => lines.push(OverlayLine {
                    text: "Ping (RTT): --".to_string(),
                    severity: Severity::Neutral,
                }),
            }
        }

        if self.show_dummy_count {
            lines.push(OverlayLine {
                text: format!("Dummy Count: {}", self.dummy_count),
                severity: Severity::Neutral,
            });
        }

        lines
    }
}

impl Default for DiagnosticsOverlay {
    fn default() -> Self {
        Self::new()
    }
}
