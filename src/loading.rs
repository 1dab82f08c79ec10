//! Background scene loading and the loading screen gate in front of it.

use crate::assets::{self, LoadEvent, SceneLoader, SceneSource};
use crate::controller::SceneRole;
use crate::presentation::PresentationPort;
use crate::scene::SceneGraph;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum GateState {
    Loading { progress: f32 },
    /// Loaded; counting towards the enter button.
    Loaded { elapsed: Duration },
    EnterReady,
    Entered,
    Failed(String),
}

/// Loading screen state. Hosted scenes wait for an explicit enter after a
/// fixed delay, the local portfolio enters as soon as it is loaded.
#[derive(Debug, Clone)]
pub struct LoadGate {
    state: GateState,
    enter_delay: Duration,
    auto_enter: bool,
}

impl LoadGate {
    pub fn hosted(enter_delay: Duration) -> Self {
        Self {
            state: GateState::Loading { progress: 0.0 },
            enter_delay,
            auto_enter: false,
        }
    }

    pub fn portfolio() -> Self {
        Self {
            state: GateState::Loading { progress: 0.0 },
            enter_delay: Duration::ZERO,
            auto_enter: true,
        }
    }

    pub fn state(&self) -> &GateState {
        &self.state
    }

    /// Whether the loading screen still covers the scene.
    pub fn is_blocking(&self) -> bool {
        match self.state {
            GateState::Entered => false,
            GateState::Failed(_) => !self.auto_enter,
            _ => true,
        }
    }

    pub fn can_enter(&self) -> bool {
        self.state == GateState::EnterReady
    }

    pub fn on_progress(&mut self, fraction: f32) {
        if let GateState::Loading { progress } = &mut self.state {
            *progress = fraction.clamp(0.0, 1.0).max(*progress);
        }
    }

    pub fn on_loaded(&mut self) {
        if !matches!(self.state, GateState::Loading { .. }) {
            return;
        }
        self.state = if self.auto_enter {
            GateState::Entered
        } else {
            GateState::Loaded {
                elapsed: Duration::ZERO,
            }
        };
    }

    /// Terminal; there is no retry.
    pub fn on_failed(&mut self, message: impl Into<String>) {
        if matches!(self.state, GateState::Loading { .. }) {
            self.state = GateState::Failed(message.into());
        }
    }

    pub fn tick(&mut self, dt: Duration) {
        if let GateState::Loaded { elapsed } = &mut self.state {
            *elapsed += dt;
            if *elapsed >= self.enter_delay {
                self.state = GateState::EnterReady;
            }
        }
    }

    /// Hides the loader. Ignored until the enter button is available.
    pub fn enter(&mut self) -> bool {
        if self.can_enter() {
            self.state = GateState::Entered;
            true
        } else {
            false
        }
    }

    pub fn status_text(&self) -> String {
        match &self.state {
            GateState::Loading { progress } => {
                format!("Loading... {:.0}%", progress * 100.0)
            }
            GateState::Loaded { .. } => "Loaded".to_string(),
            GateState::EnterReady => "Ready".to_string(),
            GateState::Entered => String::new(),
            GateState::Failed(message) => format!("Failed to load scene: {}", message),
        }
    }
}

/// One in-flight scene load plus its gate.
pub struct SceneSession {
    loader: SceneLoader,
    gate: LoadGate,
    role: SceneRole,
}

impl SceneSession {
    pub fn start(source: SceneSource, role: SceneRole, enter_delay: Duration) -> assets::Result<Self> {
        let gate = match role {
            SceneRole::Portfolio => LoadGate::portfolio(),
            SceneRole::Hosted => LoadGate::hosted(enter_delay),
        };
        Ok(Self {
            loader: SceneLoader::spawn(source)?,
            gate,
            role,
        })
    }

    pub fn role(&self) -> SceneRole {
        self.role
    }

    pub fn source(&self) -> &SceneSource {
        self.loader.source()
    }

    pub fn gate(&self) -> &LoadGate {
        &self.gate
    }

    pub fn gate_mut(&mut self) -> &mut LoadGate {
        &mut self.gate
    }

    /// Drains loader events and advances the gate clock. Returns the scene
    /// once it has finished loading.
    pub fn poll(&mut self, dt: Duration, presenter: &mut dyn PresentationPort) -> Option<SceneGraph> {
        let mut loaded = None;
        for event in self.loader.poll() {
            match event {
                LoadEvent::Progress(fraction) => {
                    self.gate.on_progress(fraction);
                    presenter.show_status(&self.gate.status_text());
                }
                LoadEvent::Loaded(scene) => {
                    log::info!("Scene {} loaded", self.loader.source().display_name());
                    self.gate.on_loaded();
                    presenter.show_status(&self.gate.status_text());
                    loaded = Some(scene);
                }
                LoadEvent::Failed(message) => {
                    log::error!("Error loading scene: {}", message);
                    self.gate.on_failed(message);
                    presenter.show_status(&self.gate.status_text());
                }
            }
        }
        self.gate.tick(dt);
        loaded
    }
}
