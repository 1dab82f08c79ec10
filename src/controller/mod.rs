//! Application state for one viewer session: camera, named views,
//! transitions, keyboard movement and the interaction registry.

pub mod movement;
pub mod transition;

use crate::config::{NamedView, PortfolioConfig};
use crate::interaction::effects::EffectSystem;
use crate::interaction::matching::InteractionCatalog;
use crate::interaction::InteractionRegistry;
use crate::presentation::PresentationPort;
use crate::render::pick::{pick_mesh, PickHit};
use crate::render::{CameraMode, CameraPose, CameraRig};
use crate::scene::SceneGraph;
use glam::{Vec2, Vec3};
use movement::{MoveKey, MovementInput};
use std::time::Duration;
use transition::{TransitionMachine, TransitionTarget};

/// How a loaded scene participates in interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneRole {
    /// The local portfolio scene: named views, bindings, welcome caption.
    Portfolio,
    /// A remotely hosted scene: framed and orbited, nothing bound.
    Hosted,
}

/// Discrete commands produced by the keyboard layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlAction {
    Move(MoveKey, bool),
    ToggleMode,
    ToggleHelpers,
    ResetView,
}

/// Pointer position in physical pixels within a viewport of the given size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pointer {
    pub position: Vec2,
    pub viewport: Vec2,
}

impl Pointer {
    pub fn ndc(&self) -> Vec2 {
        let size = self.viewport.max(Vec2::ONE);
        Vec2::new(
            self.position.x / size.x * 2.0 - 1.0,
            -(self.position.y / size.y) * 2.0 + 1.0,
        )
    }

    pub fn aspect(&self) -> f32 {
        self.viewport.x.max(1.0) / self.viewport.y.max(1.0)
    }
}

pub struct SceneController {
    config: PortfolioConfig,
    camera: CameraRig,
    transitions: TransitionMachine,
    movement: MovementInput,
    interaction: InteractionRegistry,
    effects: EffectSystem,
    scene: Option<SceneGraph>,
    role: SceneRole,
    current_view: Option<String>,
    helpers_visible: bool,
    welcome_in: Option<Duration>,
}

impl SceneController {
    pub fn new(config: PortfolioConfig) -> Self {
        let home = config
            .home()
            .map(|view| CameraPose::new(view.position, view.target))
            .unwrap_or(CameraPose::new([0.0, -5.0, 5.0], [0.0, 0.0, 0.0]));
        let camera = CameraRig::new(home, &config.camera);
        let interaction = InteractionRegistry::new(
            InteractionCatalog::from_config(&config),
            config.timings.object_transition_secs,
        );
        let current_view = config.home().map(|view| view.name.clone());
        Self {
            config,
            camera,
            transitions: TransitionMachine::new(),
            movement: MovementInput::default(),
            interaction,
            effects: EffectSystem::new(),
            scene: None,
            role: SceneRole::Portfolio,
            current_view,
            helpers_visible: true,
            welcome_in: None,
        }
    }

    pub fn config(&self) -> &PortfolioConfig {
        &self.config
    }

    pub fn camera(&self) -> &CameraRig {
        &self.camera
    }

    pub fn camera_mut(&mut self) -> &mut CameraRig {
        &mut self.camera
    }

    pub fn scene(&self) -> Option<&SceneGraph> {
        self.scene.as_ref()
    }

    pub fn effects(&self) -> &EffectSystem {
        &self.effects
    }

    pub fn interaction(&self) -> &InteractionRegistry {
        &self.interaction
    }

    pub fn views(&self) -> &[NamedView] {
        &self.config.views
    }

    pub fn current_view(&self) -> Option<&str> {
        self.current_view.as_deref()
    }

    pub fn is_transitioning(&self) -> bool {
        self.transitions.is_locked()
    }

    pub fn helpers_visible(&self) -> bool {
        self.helpers_visible
    }

    pub fn movement(&self) -> &MovementInput {
        &self.movement
    }

    /// Installs a freshly loaded scene, replacing any previous one.
    pub fn attach_scene(
        &mut self,
        scene: SceneGraph,
        role: SceneRole,
        presenter: &mut dyn PresentationPort,
    ) -> usize {
        presenter.hide_all();
        self.effects.clear();
        self.role = role;
        let bound = match role {
            SceneRole::Portfolio => {
                let bound = self.interaction.detect_interactive_objects(&scene);
                self.welcome_in = Some(self.config.timings.welcome_delay());
                bound
            }
            SceneRole::Hosted => {
                self.interaction.clear();
                self.welcome_in = None;
                self.camera.frame_bounds(&scene.bounds());
                if !self.camera.orbit_enabled() {
                    self.camera.toggle_mode();
                }
                self.current_view = None;
                0
            }
        };
        log::info!(
            "Attached scene {} ({} meshes, {} interactive)",
            scene.name(),
            scene.meshes().len(),
            bound
        );
        self.scene = Some(scene);
        bound
    }

    /// Flies to the named view; unknown names and requests during a
    /// transition are ignored.
    pub fn move_to_view(&mut self, name: &str) -> bool {
        let Some(view) = self.config.view(name) else {
            log::debug!("Ignoring unknown view '{}'", name);
            return false;
        };
        let destination = CameraPose::new(view.position, view.target);
        let accepted = self.transitions.request(
            TransitionTarget::View(view.name.clone()),
            self.camera.pose,
            destination,
            self.config.timings.view_transition_secs,
        );
        if accepted {
            self.current_view = Some(view.name.clone());
        }
        accepted
    }

    pub fn reset_to_home(&mut self) -> bool {
        let home = self.config.home_view.clone();
        self.move_to_view(&home)
    }

    pub fn handle_action(&mut self, action: ControlAction) {
        match action {
            ControlAction::Move(key, pressed) => self.movement.set(key, pressed),
            ControlAction::ToggleMode => {
                let mode = self.camera.toggle_mode();
                log::info!(
                    "{} mode",
                    match mode {
                        CameraMode::FreeFly => "Free-fly",
                        CameraMode::Orbit => "Orbit",
                    }
                );
            }
            ControlAction::ToggleHelpers => {
                self.helpers_visible = !self.helpers_visible;
                log::info!(
                    "Helpers {}. Press 'H' to toggle.",
                    if self.helpers_visible { "shown" } else { "hidden" }
                );
            }
            ControlAction::ResetView => {
                self.reset_to_home();
            }
        }
    }

    /// Drops held movement keys, e.g. when the window loses focus.
    pub fn release_movement(&mut self) {
        self.movement.clear();
    }

    fn pick(&self, pointer: &Pointer) -> Option<PickHit> {
        let scene = self.scene.as_ref()?;
        let (origin, dir) = self.camera.pick_ray(pointer.ndc(), pointer.aspect());
        pick_mesh(scene, origin, dir)
    }

    /// Updates hover for the mesh under the pointer. Returns whether any mesh is under it.
    pub fn pointer_moved(&mut self, pointer: Pointer, presenter: &mut dyn PresentationPort) -> bool {
        let hit = self.pick(&pointer);
        let binding = hit.and_then(|hit| self.interaction.binding_for_mesh(hit.mesh));
        if let Some(scene) = self.scene.as_mut() {
            self.interaction
                .set_hover(binding, pointer.position.to_array(), scene, presenter);
        }
        hit.is_some()
    }

    pub fn pointer_left(&mut self, presenter: &mut dyn PresentationPort) {
        if let Some(scene) = self.scene.as_mut() {
            self.interaction.set_hover(None, [0.0, 0.0], scene, presenter);
        }
    }

    /// Click on whatever is under the pointer. Bound objects start a focus
    /// transition, anything else gets a ripple.
    pub fn click(&mut self, pointer: Pointer) -> bool {
        let Some(hit) = self.pick(&pointer) else {
            return false;
        };
        if let Some(mesh) = self.scene.as_ref().and_then(|scene| scene.mesh(hit.mesh)) {
            log::debug!("Clicked object: {}", mesh.name);
        }
        match self.interaction.binding_for_mesh(hit.mesh) {
            Some(binding) => self.interaction.handle_click(
                binding,
                hit.point,
                self.camera.pose,
                &mut self.transitions,
                &mut self.effects,
            ),
            None => {
                let (_, right, up) = self.camera.basis();
                self.effects.spawn_ripple(hit.point, right, up);
                false
            }
        }
    }

    pub fn detail_dismissed(&mut self) {
        self.interaction.clear_selection();
    }

    pub fn orbit_drag(&mut self, delta: Vec2) {
        if self.camera.orbit_enabled() && !self.transitions.is_locked() {
            self.camera.orbit(delta);
        }
    }

    pub fn zoom(&mut self, scroll: f32) {
        if self.camera.orbit_enabled() && !self.transitions.is_locked() {
            self.camera.dolly(scroll);
        }
    }

    /// Advances one frame. Returns whether the camera moved.
    pub fn update(&mut self, dt: f32, presenter: &mut dyn PresentationPort) -> bool {
        let mut moved = false;
        if let Some(frame) = self.transitions.advance(dt) {
            self.camera.pose = frame.pose;
            moved = true;
            if let Some(target) = frame.completed {
                self.finish_transition(target, presenter);
            }
        } else {
            let delta = self.movement.displacement(self.config.movement.step);
            if delta != Vec3::ZERO {
                self.camera.translate(delta);
                moved = true;
            }
        }

        self.effects.update(dt);

        if let Some(remaining) = self.welcome_in {
            let step = Duration::from_secs_f32(dt.max(0.0));
            match remaining.checked_sub(step) {
                Some(left) if !left.is_zero() => self.welcome_in = Some(left),
                _ => {
                    self.welcome_in = None;
                    if let Some(home) = self.config.home() {
                        presenter.show_caption(&home.caption, self.config.timings.welcome());
                    }
                }
            }
        }
        moved
    }

    fn finish_transition(&mut self, target: TransitionTarget, presenter: &mut dyn PresentationPort) {
        match target {
            TransitionTarget::View(name) => {
                if let Some(view) = self.config.view(&name) {
                    presenter.show_caption(&view.caption, self.config.timings.caption());
                }
            }
            TransitionTarget::Object(index) => {
                if let Some(descriptor) = self.interaction.descriptor(index) {
                    presenter.show_detail(&descriptor.info);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentation::{PresentationEvent, RecordingPresenter};
    use crate::scene::{cuboid, Material, MeshId};

    const FRAME: f32 = 1.0 / 60.0;

    fn controller() -> SceneController {
        SceneController::new(PortfolioConfig::builtin().unwrap())
    }

    fn run_until_idle(
        controller: &mut SceneController,
        presenter: &mut RecordingPresenter,
    ) -> usize {
        let mut frames = 0;
        while controller.is_transitioning() && frames < 1000 {
            controller.update(FRAME, presenter);
            frames += 1;
        }
        frames
    }

    fn pointer_at(controller: &SceneController, world: Vec3) -> Pointer {
        let viewport = Vec2::new(1280.0, 720.0);
        let position = controller.camera().project(world, viewport).unwrap();
        Pointer { position, viewport }
    }

    #[test]
    fn every_view_lands_exactly_and_unlocks() {
        let mut controller = controller();
        let mut presenter = RecordingPresenter::default();
        let names: Vec<String> = controller.views().iter().map(|v| v.name.clone()).collect();
        // Start away from home so the home transition moves too.
        controller.camera_mut().translate(Vec3::new(1.0, 1.0, 1.0));
        for name in names {
            assert!(controller.move_to_view(&name), "view {name} rejected");
            run_until_idle(&mut controller, &mut presenter);
            let view = controller.config().view(&name).unwrap().clone();
            let pose = controller.camera().pose;
            assert!((pose.position - Vec3::from(view.position)).length() < 1e-5);
            assert!((pose.target - Vec3::from(view.target)).length() < 1e-5);
            assert!(!controller.is_transitioning());
            assert_eq!(
                presenter.caption,
                Some((view.caption.clone(), Duration::from_millis(3000)))
            );
            assert_eq!(controller.current_view(), Some(name.as_str()));
        }
    }

    #[test]
    fn second_move_during_transition_keeps_target() {
        let mut controller = controller();
        let mut presenter = RecordingPresenter::default();
        assert!(controller.move_to_view("desk"));
        controller.update(0.5, &mut presenter);
        assert!(!controller.move_to_view("about"));
        assert_eq!(controller.current_view(), Some("desk"));
        run_until_idle(&mut controller, &mut presenter);
        let desk = controller.config().view("desk").unwrap().position;
        assert!((controller.camera().pose.position - Vec3::from(desk)).length() < 1e-5);
    }

    #[test]
    fn unknown_view_is_silent_noop() {
        let mut controller = controller();
        let before = controller.camera().pose;
        assert!(!controller.move_to_view("basement"));
        assert!(!controller.is_transitioning());
        assert_eq!(controller.camera().pose, before);
    }

    #[test]
    fn movement_translates_camera_and_target_per_frame() {
        let mut controller = controller();
        let mut presenter = RecordingPresenter::default();
        let before = controller.camera().pose;
        controller.handle_action(ControlAction::Move(MoveKey::Forward, true));
        controller.handle_action(ControlAction::Move(MoveKey::Left, true));
        assert!(controller.update(FRAME, &mut presenter));
        let after = controller.camera().pose;
        let expected = Vec3::new(-0.5, 0.5, 0.0);
        assert!((after.position - before.position - expected).length() < 1e-5);
        assert!((after.target - before.target - expected).length() < 1e-5);

        controller.handle_action(ControlAction::Move(MoveKey::Forward, false));
        controller.handle_action(ControlAction::Move(MoveKey::Left, false));
        assert!(!controller.update(FRAME, &mut presenter));
    }

    #[test]
    fn mode_toggle_keeps_held_keys() {
        let mut controller = controller();
        controller.handle_action(ControlAction::Move(MoveKey::Up, true));
        controller.handle_action(ControlAction::ToggleMode);
        assert!(controller.camera().orbit_enabled());
        assert!(controller.movement().up);
        controller.handle_action(ControlAction::ToggleMode);
        assert!(!controller.camera().orbit_enabled());
    }

    #[test]
    fn orbit_input_only_in_orbit_mode() {
        let mut controller = controller();
        let before = controller.camera().pose;
        controller.orbit_drag(Vec2::new(50.0, 0.0));
        controller.zoom(3.0);
        assert_eq!(controller.camera().pose, before);
        controller.handle_action(ControlAction::ToggleMode);
        controller.orbit_drag(Vec2::new(50.0, 0.0));
        assert_ne!(controller.camera().pose, before);
    }

    #[test]
    fn helpers_toggle_and_reset() {
        let mut controller = controller();
        let mut presenter = RecordingPresenter::default();
        assert!(controller.helpers_visible());
        controller.handle_action(ControlAction::ToggleHelpers);
        assert!(!controller.helpers_visible());

        controller.camera_mut().translate(Vec3::new(3.0, 0.0, 0.0));
        controller.handle_action(ControlAction::ResetView);
        assert!(controller.is_transitioning());
        run_until_idle(&mut controller, &mut presenter);
        let home = controller.config().home().unwrap().position;
        assert!((controller.camera().pose.position - Vec3::from(home)).length() < 1e-5);
    }

    #[test]
    fn welcome_caption_follows_delay() {
        let mut controller = controller();
        let mut presenter = RecordingPresenter::default();
        let scene = SceneGraph::new("empty");
        controller.attach_scene(scene, SceneRole::Portfolio, &mut presenter);
        controller.update(0.5, &mut presenter);
        assert!(presenter.caption.is_none());
        controller.update(0.6, &mut presenter);
        assert_eq!(
            presenter.caption,
            Some(("Welcome to My 3D Portfolio".to_string(), Duration::from_millis(4000)))
        );
    }

    #[test]
    fn hosted_scene_binds_nothing_and_orbits() {
        let mut controller = controller();
        let mut presenter = RecordingPresenter::default();
        let mut scene = SceneGraph::new("remote");
        scene.push_mesh("computer_monitor", cuboid([0.0; 3], [1.0; 3]), Material::default());
        let bound = controller.attach_scene(scene, SceneRole::Hosted, &mut presenter);
        assert_eq!(bound, 0);
        assert!(controller.camera().orbit_enabled());
        assert!((controller.camera().pose.target - Vec3::splat(0.5)).length() < 1e-5);
        controller.update(5.0, &mut presenter);
        assert!(presenter.caption.is_none());
    }

    #[test]
    fn end_to_end_click_on_computer_shows_projects_detail() {
        let mut controller = controller();
        let mut presenter = RecordingPresenter::default();

        // A monitor straight ahead of the home camera.
        let home = controller.camera().pose;
        let ahead = home.position + (home.target - home.position).normalize() * 4.0;
        let mut scene = SceneGraph::new("portfolio");
        scene.push_mesh(
            "computer_monitor",
            cuboid((ahead - Vec3::splat(0.5)).to_array(), (ahead + Vec3::splat(0.5)).to_array()),
            Material::default(),
        );
        let bound = controller.attach_scene(scene, SceneRole::Portfolio, &mut presenter);
        assert_eq!(bound, 1);
        let binding = &controller.interaction().bindings()[0];
        let descriptor = controller.interaction().descriptor(binding.descriptor).unwrap();
        assert_eq!(descriptor.category, "projects");

        let pointer = pointer_at(&controller, ahead);
        assert!(controller.pointer_moved(pointer, &mut presenter));
        assert_eq!(presenter.tooltip.as_ref().map(|t| t.0.as_str()), Some("My Projects"));

        assert!(controller.click(pointer));
        assert!(controller.is_transitioning());
        // Further clicks are dropped while the lock is held.
        assert!(!controller.click(pointer));

        let mut elapsed = 0.0;
        while controller.is_transitioning() {
            controller.update(FRAME, &mut presenter);
            elapsed += FRAME;
            assert!(elapsed < 2.6);
        }
        assert!(elapsed >= 2.49);
        let detail = presenter.detail.clone().unwrap();
        assert_eq!(detail.title, "My Projects");
        assert_eq!(detail.content.len(), 3);
        assert!(presenter
            .events
            .iter()
            .any(|event| *event == PresentationEvent::Detail("My Projects".into())));
        let pose = controller.camera().pose;
        assert!((pose.position - Vec3::new(-1.0, 2.0, 1.5)).length() < 1e-5);

        controller.detail_dismissed();
        assert!(controller.interaction().selected().is_none());
    }

    #[test]
    fn tooltip_tracks_pointer_across_the_same_object() {
        let mut controller = controller();
        let mut presenter = RecordingPresenter::default();
        let home = controller.camera().pose;
        let ahead = home.position + (home.target - home.position).normalize() * 4.0;
        let mut scene = SceneGraph::new("portfolio");
        scene.push_mesh(
            "computer_monitor",
            cuboid((ahead - Vec3::splat(0.5)).to_array(), (ahead + Vec3::splat(0.5)).to_array()),
            Material::default(),
        );
        controller.attach_scene(scene, SceneRole::Portfolio, &mut presenter);

        let first = pointer_at(&controller, ahead);
        assert!(controller.pointer_moved(first, &mut presenter));
        let hovered_material = *controller.scene().unwrap().material(MeshId(0)).unwrap();

        let second = Pointer {
            position: first.position + Vec2::new(20.0, 10.0),
            viewport: first.viewport,
        };
        assert!(controller.pointer_moved(second, &mut presenter));
        assert_eq!(
            presenter.tooltip,
            Some(("My Projects".to_string(), second.position.to_array()))
        );
        assert_eq!(
            *controller.scene().unwrap().material(MeshId(0)).unwrap(),
            hovered_material
        );
    }

    #[test]
    fn clicking_empty_space_or_plain_mesh_does_not_lock() {
        let mut controller = controller();
        let mut presenter = RecordingPresenter::default();
        let home = controller.camera().pose;
        let ahead = home.position + (home.target - home.position).normalize() * 4.0;
        let mut scene = SceneGraph::new("portfolio");
        scene.push_mesh(
            "Wall",
            cuboid((ahead - Vec3::splat(0.5)).to_array(), (ahead + Vec3::splat(0.5)).to_array()),
            Material::default(),
        );
        controller.attach_scene(scene, SceneRole::Portfolio, &mut presenter);

        let miss = Pointer {
            position: Vec2::new(1.0, 1.0),
            viewport: Vec2::new(1280.0, 720.0),
        };
        assert!(!controller.click(miss));
        assert!(!controller.click(pointer_at(&controller, ahead)));
        assert!(!controller.is_transitioning());
        assert!(!controller.effects().is_empty());
    }
}
