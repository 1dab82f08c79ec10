use glam::Vec3;

/// Stable handle of a mesh within one loaded [`SceneGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(pub u32);

/// Surface parameters the renderer shades with. Compared by value so a
/// snapshot can be checked against the live material bit for bit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub base_color: [f32; 4],
    pub emissive: [f32; 3],
}

impl Default for Material {
    fn default() -> Self {
        Self {
            base_color: [0.8, 0.8, 0.8, 1.0],
            emissive: [0.0, 0.0, 0.0],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn empty() -> Self {
        Self {
            min: Vec3::splat(f32::INFINITY),
            max: Vec3::splat(f32::NEG_INFINITY),
        }
    }

    pub fn from_points(points: &[Vec3]) -> Self {
        let mut aabb = Self::empty();
        for point in points {
            aabb.grow(*point);
        }
        aabb
    }

    pub fn grow(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn extent(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }
}

/// Triangle soup in world space.
#[derive(Debug, Clone, Default)]
pub struct MeshGeometry {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

impl MeshGeometry {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn triangle(&self, index: usize) -> Option<[Vec3; 3]> {
        let base = index * 3;
        let tri = self.indices.get(base..base + 3)?;
        let a = self.positions.get(tri[0] as usize)?;
        let b = self.positions.get(tri[1] as usize)?;
        let c = self.positions.get(tri[2] as usize)?;
        Some([Vec3::from(*a), Vec3::from(*b), Vec3::from(*c)])
    }
}

#[derive(Debug, Clone)]
pub struct SceneMesh {
    pub id: MeshId,
    pub name: String,
    pub bounds: Aabb,
    pub geometry: MeshGeometry,
    pub material: Material,
}

/// Flattened renderable leaves of a loaded scene, baked to world space.
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    name: String,
    meshes: Vec<SceneMesh>,
}

impl SceneGraph {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            meshes: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn push_mesh(
        &mut self,
        name: impl Into<String>,
        geometry: MeshGeometry,
        material: Material,
    ) -> MeshId {
        let id = MeshId(self.meshes.len() as u32);
        let points: Vec<Vec3> = geometry.positions.iter().copied().map(Vec3::from).collect();
        self.meshes.push(SceneMesh {
            id,
            name: name.into(),
            bounds: Aabb::from_points(&points),
            geometry,
            material,
        });
        id
    }

    pub fn meshes(&self) -> &[SceneMesh] {
        &self.meshes
    }

    pub fn mesh(&self, id: MeshId) -> Option<&SceneMesh> {
        self.meshes.get(id.0 as usize)
    }

    pub fn material(&self, id: MeshId) -> Option<&Material> {
        self.mesh(id).map(|mesh| &mesh.material)
    }

    pub fn set_material(&mut self, id: MeshId, material: Material) {
        if let Some(mesh) = self.meshes.get_mut(id.0 as usize) {
            mesh.material = material;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    pub fn bounds(&self) -> Aabb {
        self.meshes
            .iter()
            .fold(Aabb::empty(), |acc, mesh| acc.union(&mesh.bounds))
    }

    pub fn triangle_count(&self) -> usize {
        self.meshes
            .iter()
            .map(|mesh| mesh.geometry.triangle_count())
            .sum()
    }
}

/// Axis-aligned box with outward normals.
pub fn cuboid(min: [f32; 3], max: [f32; 3]) -> MeshGeometry {
    let [x0, y0, z0] = min;
    let [x1, y1, z1] = max;
    let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
        ([1.0, 0.0, 0.0], [[x1, y0, z0], [x1, y1, z0], [x1, y1, z1], [x1, y0, z1]]),
        ([-1.0, 0.0, 0.0], [[x0, y0, z0], [x0, y0, z1], [x0, y1, z1], [x0, y1, z0]]),
        ([0.0, 1.0, 0.0], [[x0, y1, z0], [x0, y1, z1], [x1, y1, z1], [x1, y1, z0]]),
        ([0.0, -1.0, 0.0], [[x0, y0, z0], [x1, y0, z0], [x1, y0, z1], [x0, y0, z1]]),
        ([0.0, 0.0, 1.0], [[x0, y0, z1], [x1, y0, z1], [x1, y1, z1], [x0, y1, z1]]),
        ([0.0, 0.0, -1.0], [[x0, y0, z0], [x0, y1, z0], [x1, y1, z0], [x1, y0, z0]]),
    ];
    let mut geometry = MeshGeometry::default();
    for (normal, corners) in faces {
        let base = geometry.positions.len() as u32;
        for corner in corners {
            geometry.positions.push(corner);
            geometry.normals.push(normal);
        }
        geometry
            .indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }
    geometry
}

fn solid(r: f32, g: f32, b: f32) -> Material {
    Material {
        base_color: [r, g, b, 1.0],
        emissive: [0.0; 3],
    }
}

/// Box-built stand-in for the portfolio room, with one mesh per
/// recognized object name so hover and focus work without an asset.
pub fn placeholder_desk() -> SceneGraph {
    let mut scene = SceneGraph::new("placeholder desk");
    scene.push_mesh("Floor", cuboid([-6.0, -6.0, -0.05], [10.0, 12.0, 0.0]), solid(0.35, 0.33, 0.3));
    scene.push_mesh("BackWall", cuboid([-6.0, 4.05, 0.0], [10.0, 4.25, 3.5]), solid(0.55, 0.55, 0.58));
    scene.push_mesh("Desk_Top", cuboid([-2.0, 1.0, 0.9], [2.0, 3.0, 1.0]), solid(0.45, 0.3, 0.18));
    for (x, y) in [(-1.9, 1.1), (1.8, 1.1), (-1.9, 2.8), (1.8, 2.8)] {
        scene.push_mesh(
            "Leg",
            cuboid([x, y, 0.0], [x + 0.1, y + 0.1, 0.9]),
            solid(0.3, 0.2, 0.12),
        );
    }
    scene.push_mesh(
        "Computer_Monitor",
        cuboid([-1.5, 2.4, 1.05], [-0.5, 2.5, 1.7]),
        solid(0.1, 0.1, 0.12),
    );
    scene.push_mesh(
        "Artwork_Frame",
        cuboid([-3.3, 3.95, 1.4], [-2.1, 4.05, 2.4]),
        solid(0.7, 0.25, 0.2),
    );
    scene.push_mesh(
        "Books_Stack",
        cuboid([0.8, 2.1, 1.0], [1.3, 2.6, 1.35]),
        solid(0.2, 0.35, 0.6),
    );
    scene
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_mesh_assigns_sequential_ids_and_bounds() {
        let mut scene = SceneGraph::new("test");
        let a = scene.push_mesh("A", cuboid([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]), Material::default());
        let b = scene.push_mesh("B", cuboid([2.0, -1.0, 0.0], [3.0, 0.0, 4.0]), Material::default());
        assert_eq!(a, MeshId(0));
        assert_eq!(b, MeshId(1));
        assert_eq!(scene.mesh(b).unwrap().bounds.max, Vec3::new(3.0, 0.0, 4.0));

        let bounds = scene.bounds();
        assert_eq!(bounds.min, Vec3::new(0.0, -1.0, 0.0));
        assert_eq!(bounds.max, Vec3::new(3.0, 1.0, 4.0));
        assert_eq!(scene.triangle_count(), 24);
    }

    #[test]
    fn empty_bounds_report_empty() {
        assert!(Aabb::empty().is_empty());
        assert!(SceneGraph::new("none").bounds().is_empty());
        let aabb = Aabb::from_points(&[Vec3::ZERO, Vec3::new(2.0, 4.0, 6.0)]);
        assert!(!aabb.is_empty());
        assert_eq!(aabb.center(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(aabb.extent(), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn set_material_replaces_value() {
        let mut scene = SceneGraph::new("test");
        let id = scene.push_mesh("A", cuboid([0.0; 3], [1.0; 3]), Material::default());
        let red = Material {
            base_color: [1.0, 0.0, 0.0, 1.0],
            emissive: [0.0; 3],
        };
        scene.set_material(id, red);
        assert_eq!(scene.material(id), Some(&red));
        scene.set_material(MeshId(99), Material::default());
        assert_eq!(scene.meshes().len(), 1);
    }

    #[test]
    fn triangle_lookup_is_bounds_checked() {
        let geometry = cuboid([0.0; 3], [1.0; 3]);
        assert!(geometry.triangle(0).is_some());
        assert!(geometry.triangle(11).is_some());
        assert!(geometry.triangle(12).is_none());
    }
}
