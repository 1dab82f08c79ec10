use std::time::{Duration, Instant};
use winit::window::Window;

/// Longest step fed to animations; a stalled frame should not skip a transition.
const MAX_FRAME_DT: f32 = 0.1;

pub struct FrameTiming {
    last_frame_time: Option<Instant>,
    last_fps_time: Option<Instant>,
    frame_count: u32,
    pub frame_dt: f32,
    update_ms: f32,
    base_title: String,
}

impl FrameTiming {
    pub fn new(base_title: String) -> Self {
        Self {
            last_frame_time: None,
            last_fps_time: None,
            frame_count: 0,
            frame_dt: 1.0 / 60.0,
            update_ms: 0.0,
            base_title,
        }
    }

    pub fn set_base_title(&mut self, title: String) {
        self.base_title = title;
    }

    pub fn set_update_ms(&mut self, update_ms: f32) {
        self.update_ms = update_ms;
    }

    pub fn frame_duration(&self) -> Duration {
        Duration::from_secs_f32(self.frame_dt)
    }

    pub fn update(&mut self, window: Option<&Window>, now: Instant) {
        let dt_duration = if let Some(last) = self.last_frame_time {
            now.saturating_duration_since(last)
        } else {
            Duration::from_millis(16)
        };
        self.last_frame_time = Some(now);
        self.frame_dt = dt_duration.as_secs_f32().clamp(0.0, MAX_FRAME_DT);

        self.frame_count = self.frame_count.saturating_add(1);
        let fps_start = *self.last_fps_time.get_or_insert(now);
        let elapsed = now.saturating_duration_since(fps_start);
        if elapsed.as_secs_f32() >= 0.5 {
            let fps = self.frame_count as f32 / elapsed.as_secs_f32();
            if let Some(window) = window {
                window.set_title(&format!(
                    "{} - {:.1} fps (update {:.2} ms)",
                    self.base_title, fps, self.update_ms
                ));
            }
            self.frame_count = 0;
            self.last_fps_time = Some(now);
        }
    }
}
