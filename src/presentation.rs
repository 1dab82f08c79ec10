//! Narrow output surface for user-visible text, so transition and
//! interaction logic can run without a window.

use crate::config::ObjectInfo;
use std::time::Duration;

pub trait PresentationPort {
    /// Shows `text` next to the pointer at `at` (physical pixels).
    fn show_tooltip(&mut self, text: &str, at: [f32; 2]);
    /// Moves a visible tooltip to `at`; does nothing when none is shown.
    fn move_tooltip(&mut self, at: [f32; 2]);
    fn hide_tooltip(&mut self);
    /// Shows a short caption that hides itself after `ttl`.
    fn show_caption(&mut self, text: &str, ttl: Duration);
    /// Opens the detail overlay; it stays until dismissed.
    fn show_detail(&mut self, info: &ObjectInfo);
    fn show_status(&mut self, text: &str);
    fn hide_all(&mut self);
}

#[cfg(test)]
#[derive(Debug, Clone, PartialEq)]
pub enum PresentationEvent {
    Tooltip(String, [f32; 2]),
    MoveTooltip([f32; 2]),
    HideTooltip,
    Caption(String, Duration),
    Detail(String),
    Status(String),
    HideAll,
}

/// Records every call and mirrors the visible state.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingPresenter {
    pub events: Vec<PresentationEvent>,
    pub tooltip: Option<(String, [f32; 2])>,
    pub caption: Option<(String, Duration)>,
    pub detail: Option<ObjectInfo>,
    pub status: Option<String>,
}

#[cfg(test)]
impl PresentationPort for RecordingPresenter {
    fn show_tooltip(&mut self, text: &str, at: [f32; 2]) {
        self.events
            .push(PresentationEvent::Tooltip(text.to_string(), at));
        self.tooltip = Some((text.to_string(), at));
    }

    fn move_tooltip(&mut self, at: [f32; 2]) {
        self.events.push(PresentationEvent::MoveTooltip(at));
        if let Some((_, position)) = &mut self.tooltip {
            *position = at;
        }
    }

    fn hide_tooltip(&mut self) {
        self.events.push(PresentationEvent::HideTooltip);
        self.tooltip = None;
    }

    fn show_caption(&mut self, text: &str, ttl: Duration) {
        self.events
            .push(PresentationEvent::Caption(text.to_string(), ttl));
        self.caption = Some((text.to_string(), ttl));
    }

    fn show_detail(&mut self, info: &ObjectInfo) {
        self.events.push(PresentationEvent::Detail(info.title.clone()));
        self.detail = Some(info.clone());
    }

    fn show_status(&mut self, text: &str) {
        self.events.push(PresentationEvent::Status(text.to_string()));
        self.status = Some(text.to_string());
    }

    fn hide_all(&mut self) {
        self.events.push(PresentationEvent::HideAll);
        self.tooltip = None;
        self.caption = None;
        self.detail = None;
    }
}
