//! Recognizes interactive meshes by name and drives hover highlighting and
//! click-to-focus for them.

pub mod effects;
pub mod matching;

use crate::config::ObjectDescriptor;
use crate::controller::transition::{TransitionMachine, TransitionTarget};
use crate::presentation::PresentationPort;
use crate::render::CameraPose;
use crate::scene::{Material, MeshId, SceneGraph};
use effects::EffectSystem;
use glam::Vec3;
use matching::InteractionCatalog;
use std::collections::HashMap;

const HOVER_EMISSIVE: [f32; 3] = [0x22 as f32 / 255.0, 0x22 as f32 / 255.0, 0x44 as f32 / 255.0];
const HOVER_BRIGHTEN: f32 = 1.2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindingId(pub usize);

/// A mesh recognized as one of the configured objects, with the material it
/// had before any highlighting.
#[derive(Debug, Clone)]
pub struct SceneObjectBinding {
    pub mesh: MeshId,
    pub descriptor: usize,
    pub original_material: Material,
}

pub struct InteractionRegistry {
    catalog: InteractionCatalog,
    bindings: Vec<SceneObjectBinding>,
    by_mesh: HashMap<MeshId, BindingId>,
    hovered: Option<BindingId>,
    selected: Option<BindingId>,
    focus_duration: f32,
}

impl InteractionRegistry {
    pub fn new(catalog: InteractionCatalog, focus_duration: f32) -> Self {
        Self {
            catalog,
            bindings: Vec::new(),
            by_mesh: HashMap::new(),
            hovered: None,
            selected: None,
            focus_duration,
        }
    }

    /// Scans every mesh once and binds those whose name matches a descriptor.
    /// Previous bindings and hover/selection are discarded.
    pub fn detect_interactive_objects(&mut self, scene: &SceneGraph) -> usize {
        self.clear();
        for mesh in scene.meshes() {
            if mesh.name.is_empty() {
                continue;
            }
            let Some(descriptor) = self.catalog.match_name(&mesh.name) else {
                continue;
            };
            let id = BindingId(self.bindings.len());
            self.bindings.push(SceneObjectBinding {
                mesh: mesh.id,
                descriptor,
                original_material: mesh.material,
            });
            self.by_mesh.insert(mesh.id, id);
            if let Some(descriptor) = self.catalog.descriptor(descriptor) {
                log::info!(
                    "Set up interactive object: {} ({})",
                    descriptor.key,
                    mesh.name
                );
            }
        }
        self.bindings.len()
    }

    pub fn clear(&mut self) {
        self.bindings.clear();
        self.by_mesh.clear();
        self.hovered = None;
        self.selected = None;
    }

    pub fn bindings(&self) -> &[SceneObjectBinding] {
        &self.bindings
    }

    pub fn binding_for_mesh(&self, mesh: MeshId) -> Option<BindingId> {
        self.by_mesh.get(&mesh).copied()
    }

    #[cfg(test)]
    pub fn descriptor_for(&self, binding: BindingId) -> Option<&ObjectDescriptor> {
        let binding = self.bindings.get(binding.0)?;
        self.catalog.descriptor(binding.descriptor)
    }

    pub fn descriptor(&self, index: usize) -> Option<&ObjectDescriptor> {
        self.catalog.descriptor(index)
    }

    pub fn hovered(&self) -> Option<BindingId> {
        self.hovered
    }

    pub fn selected(&self) -> Option<BindingId> {
        self.selected
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Moves the highlight to `binding`, or clears it for `None`. Hovering
    /// the already hovered binding only moves the tooltip with the pointer.
    pub fn set_hover(
        &mut self,
        binding: Option<BindingId>,
        pointer: [f32; 2],
        scene: &mut SceneGraph,
        presenter: &mut dyn PresentationPort,
    ) {
        match binding {
            Some(id) if self.hovered == Some(id) => presenter.move_tooltip(pointer),
            Some(id) => {
                let Some(entry) = self.bindings.get(id.0) else {
                    self.clear_hover(scene, presenter);
                    return;
                };
                let mesh = entry.mesh;
                let hover = hover_material(&entry.original_material);
                let title = self
                    .catalog
                    .descriptor(entry.descriptor)
                    .map(|descriptor| descriptor.info.title.clone())
                    .unwrap_or_default();
                self.clear_hover(scene, presenter);
                scene.set_material(mesh, hover);
                presenter.show_tooltip(&title, pointer);
                self.hovered = Some(id);
            }
            None => self.clear_hover(scene, presenter),
        }
    }

    fn clear_hover(&mut self, scene: &mut SceneGraph, presenter: &mut dyn PresentationPort) {
        let Some(id) = self.hovered.take() else {
            return;
        };
        if let Some(entry) = self.bindings.get(id.0) {
            scene.set_material(entry.mesh, entry.original_material);
        }
        presenter.hide_tooltip();
    }

    /// Starts the focus transition for `binding` unless one is already running.
    pub fn handle_click(
        &mut self,
        binding: BindingId,
        point: Vec3,
        camera: CameraPose,
        transitions: &mut TransitionMachine,
        effects: &mut EffectSystem,
    ) -> bool {
        if transitions.is_locked() {
            log::debug!("Ignoring click during camera transition");
            return false;
        }
        let Some(entry) = self.bindings.get(binding.0) else {
            return false;
        };
        let Some(descriptor) = self.catalog.descriptor(entry.descriptor) else {
            return false;
        };
        let destination = CameraPose::new(descriptor.position, descriptor.target);
        if !transitions.request(
            TransitionTarget::Object(entry.descriptor),
            camera,
            destination,
            self.focus_duration,
        ) {
            return false;
        }
        log::info!("Focusing {} ({})", descriptor.key, descriptor.category);
        self.selected = Some(binding);
        effects.spawn_burst(point);
        true
    }
}

/// Snapshot with added glow and brighter base colour.
pub fn hover_material(original: &Material) -> Material {
    let mut hover = *original;
    hover.emissive = HOVER_EMISSIVE;
    for channel in &mut hover.base_color[..3] {
        *channel *= HOVER_BRIGHTEN;
    }
    hover
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PortfolioConfig;
    use crate::presentation::{PresentationEvent, RecordingPresenter};
    use crate::scene::cuboid;

    fn registry() -> InteractionRegistry {
        let config = PortfolioConfig::builtin().unwrap();
        InteractionRegistry::new(
            InteractionCatalog::from_config(&config),
            config.timings.object_transition_secs,
        )
    }

    fn material(r: f32, g: f32, b: f32) -> Material {
        Material {
            base_color: [r, g, b, 1.0],
            emissive: [0.01, 0.02, 0.03],
        }
    }

    fn scene() -> SceneGraph {
        let mut scene = SceneGraph::new("room");
        scene.push_mesh("OfficeDesk01", cuboid([0.0; 3], [2.0, 1.0, 1.0]), material(0.3, 0.2, 0.1));
        scene.push_mesh("Bookshelf_A", cuboid([3.0, 0.0, 0.0], [4.0, 1.0, 2.0]), material(0.7, 0.1, 0.33));
        scene.push_mesh("Unrelated", cuboid([5.0, 0.0, 0.0], [6.0, 1.0, 1.0]), material(0.5, 0.5, 0.5));
        scene.push_mesh("", cuboid([7.0, 0.0, 0.0], [8.0, 1.0, 1.0]), material(0.5, 0.5, 0.5));
        scene
    }

    #[test]
    fn detect_binds_matching_meshes_only() {
        let mut registry = registry();
        let scene = scene();
        assert_eq!(registry.detect_interactive_objects(&scene), 2);
        let desk = registry.binding_for_mesh(MeshId(0)).unwrap();
        let books = registry.binding_for_mesh(MeshId(1)).unwrap();
        assert_eq!(registry.descriptor_for(desk).unwrap().key, "desk");
        assert_eq!(registry.descriptor_for(books).unwrap().category, "about");
        assert!(registry.binding_for_mesh(MeshId(2)).is_none());
        assert!(registry.binding_for_mesh(MeshId(3)).is_none());
        assert_eq!(registry.bindings()[1].original_material, material(0.7, 0.1, 0.33));
    }

    #[test]
    fn hover_same_binding_twice_keeps_material_and_follows_pointer() {
        let mut registry = registry();
        let mut scene = scene();
        let mut presenter = RecordingPresenter::default();
        registry.detect_interactive_objects(&scene);
        let desk = registry.binding_for_mesh(MeshId(0));

        registry.set_hover(desk, [10.0, 20.0], &mut scene, &mut presenter);
        let material_after_first = *scene.material(MeshId(0)).unwrap();
        let events_after_first = presenter.events.len();

        registry.set_hover(desk, [30.0, 40.0], &mut scene, &mut presenter);
        assert_eq!(*scene.material(MeshId(0)).unwrap(), material_after_first);
        assert_eq!(
            &presenter.events[events_after_first..],
            &[PresentationEvent::MoveTooltip([30.0, 40.0])]
        );
        assert_eq!(
            presenter.tooltip,
            Some(("My Workspace".to_string(), [30.0, 40.0]))
        );
        assert_eq!(registry.hovered(), desk);
    }

    #[test]
    fn placeholder_desk_binds_every_descriptor() {
        let mut registry = registry();
        let scene = crate::scene::placeholder_desk();
        assert_eq!(registry.detect_interactive_objects(&scene), 4);
        let mut keys: Vec<&str> = registry
            .bindings()
            .iter()
            .filter_map(|binding| registry.descriptor(binding.descriptor))
            .map(|descriptor| descriptor.key.as_str())
            .collect();
        keys.sort_unstable();
        assert_eq!(keys, ["artwork", "books", "computer", "desk"]);
    }

    #[test]
    fn hover_switch_restores_previous_material_bit_exact() {
        let mut registry = registry();
        let mut scene = scene();
        let mut presenter = RecordingPresenter::default();
        registry.detect_interactive_objects(&scene);
        let original = *scene.material(MeshId(0)).unwrap();
        let desk = registry.binding_for_mesh(MeshId(0));
        let books = registry.binding_for_mesh(MeshId(1));

        registry.set_hover(desk, [0.0, 0.0], &mut scene, &mut presenter);
        assert_ne!(*scene.material(MeshId(0)).unwrap(), original);
        registry.set_hover(books, [5.0, 5.0], &mut scene, &mut presenter);

        let restored = scene.material(MeshId(0)).unwrap();
        let bits = |m: &Material| {
            m.base_color
                .iter()
                .chain(m.emissive.iter())
                .map(|v| v.to_bits())
                .collect::<Vec<_>>()
        };
        assert_eq!(bits(restored), bits(&original));
        assert_eq!(
            *scene.material(MeshId(1)).unwrap(),
            hover_material(&material(0.7, 0.1, 0.33))
        );
        assert_eq!(
            presenter.events,
            vec![
                PresentationEvent::Tooltip("My Workspace".into(), [0.0, 0.0]),
                PresentationEvent::HideTooltip,
                PresentationEvent::Tooltip("About Me".into(), [5.0, 5.0]),
            ]
        );
    }

    #[test]
    fn hover_none_clears_and_restores() {
        let mut registry = registry();
        let mut scene = scene();
        let mut presenter = RecordingPresenter::default();
        registry.detect_interactive_objects(&scene);
        let original = *scene.material(MeshId(1)).unwrap();

        registry.set_hover(registry.binding_for_mesh(MeshId(1)), [1.0, 1.0], &mut scene, &mut presenter);
        registry.set_hover(None, [1.0, 1.0], &mut scene, &mut presenter);
        registry.set_hover(None, [1.0, 1.0], &mut scene, &mut presenter);

        assert_eq!(*scene.material(MeshId(1)).unwrap(), original);
        assert!(presenter.tooltip.is_none());
        assert!(registry.hovered().is_none());
    }

    #[test]
    fn hover_material_brightens_and_glows() {
        let hover = hover_material(&material(0.5, 0.25, 0.0));
        assert!((hover.base_color[0] - 0.6).abs() < 1e-6);
        assert!((hover.base_color[1] - 0.3).abs() < 1e-6);
        assert_eq!(hover.base_color[3], 1.0);
        assert_eq!(hover.emissive, HOVER_EMISSIVE);
    }

    #[test]
    fn click_is_ignored_while_transition_runs() {
        let mut registry = registry();
        let scene = scene();
        registry.detect_interactive_objects(&scene);
        let desk = registry.binding_for_mesh(MeshId(0)).unwrap();
        let mut transitions = TransitionMachine::new();
        let mut effects = EffectSystem::new();
        let camera = CameraPose::new([0.0, 0.0, 5.0], [0.0; 3]);

        transitions.request(
            TransitionTarget::View("home".into()),
            camera,
            CameraPose::new([1.0; 3], [0.0; 3]),
            2.0,
        );
        assert!(!registry.handle_click(desk, Vec3::ZERO, camera, &mut transitions, &mut effects));
        assert!(registry.selected().is_none());
        assert!(effects.is_empty());
        assert_eq!(
            transitions.active().unwrap().target,
            TransitionTarget::View("home".into())
        );
    }

    #[test]
    fn click_starts_focus_transition_and_burst() {
        let mut registry = registry();
        let scene = scene();
        registry.detect_interactive_objects(&scene);
        let books = registry.binding_for_mesh(MeshId(1)).unwrap();
        let mut transitions = TransitionMachine::new();
        let mut effects = EffectSystem::new();

        let accepted = registry.handle_click(
            books,
            Vec3::new(3.5, 0.0, 1.0),
            CameraPose::new([0.0, 0.0, 5.0], [0.0; 3]),
            &mut transitions,
            &mut effects,
        );
        assert!(accepted);
        assert_eq!(registry.selected(), Some(books));
        assert!(!effects.is_empty());
        let active = transitions.active().unwrap();
        assert_eq!(active.target, TransitionTarget::Object(3));
        assert_eq!(active.destination(), &CameraPose::new([1.0, 4.0, 2.0], [1.0, 1.0, 1.0]));
    }

    #[test]
    fn rescanning_discards_previous_state() {
        let mut registry = registry();
        let mut scene = scene();
        let mut presenter = RecordingPresenter::default();
        registry.detect_interactive_objects(&scene);
        registry.set_hover(registry.binding_for_mesh(MeshId(0)), [0.0; 2], &mut scene, &mut presenter);

        let mut other = SceneGraph::new("other");
        other.push_mesh("Laptop", cuboid([0.0; 3], [1.0; 3]), Material::default());
        assert_eq!(registry.detect_interactive_objects(&other), 1);
        assert!(registry.hovered().is_none());
        assert_eq!(registry.descriptor_for(BindingId(0)).unwrap().key, "computer");
    }
}
