//! CPU ray picking against the loaded scene: a slab test on each mesh
//! AABB rejects most meshes before the per-triangle test runs.

use crate::scene::{Aabb, MeshId, SceneGraph};
use glam::Vec3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickHit {
    pub mesh: MeshId,
    pub distance: f32,
    pub point: Vec3,
}

/// Nearest mesh hit along the ray, if any.
pub fn pick_mesh(scene: &SceneGraph, origin: Vec3, dir: Vec3) -> Option<PickHit> {
    if dir.length_squared() < 1e-12 {
        return None;
    }
    let mut best: Option<PickHit> = None;
    for mesh in scene.meshes() {
        let Some(box_t) = intersect_aabb(origin, dir, &mesh.bounds) else {
            continue;
        };
        if best.is_some_and(|hit| box_t > hit.distance) {
            continue;
        }
        for index in 0..mesh.geometry.triangle_count() {
            let Some([a, b, c]) = mesh.geometry.triangle(index) else {
                continue;
            };
            let Some(t) = intersect_triangle(origin, dir, a, b, c) else {
                continue;
            };
            if best.map_or(true, |hit| t < hit.distance) {
                best = Some(PickHit {
                    mesh: mesh.id,
                    distance: t,
                    point: origin + dir * t,
                });
            }
        }
    }
    best
}

/// Entry distance of the ray into the box (0 when starting inside).
pub fn intersect_aabb(origin: Vec3, dir: Vec3, aabb: &Aabb) -> Option<f32> {
    const EPSILON: f32 = 1e-8;
    if aabb.is_empty() {
        return None;
    }
    let inv = |d: f32| {
        if d.abs() < EPSILON {
            1.0 / EPSILON.copysign(d)
        } else {
            1.0 / d
        }
    };
    let inv_dir = Vec3::new(inv(dir.x), inv(dir.y), inv(dir.z));

    let t_min = (aabb.min - origin) * inv_dir;
    let t_max = (aabb.max - origin) * inv_dir;
    let t1 = t_min.min(t_max);
    let t2 = t_min.max(t_max);
    let t_near = t1.max_element();
    let t_far = t2.min_element();

    if t_near > t_far || t_far < 0.0 {
        return None;
    }
    Some(t_near.max(0.0))
}

/// Möller–Trumbore; double-sided, returns the hit distance.
pub fn intersect_triangle(origin: Vec3, dir: Vec3, v0: Vec3, v1: Vec3, v2: Vec3) -> Option<f32> {
    const EPSILON: f32 = 1e-7;
    let edge1 = v1 - v0;
    let edge2 = v2 - v0;
    let h = dir.cross(edge2);
    let a = edge1.dot(h);
    if a.abs() < EPSILON {
        return None;
    }
    let f = 1.0 / a;
    let s = origin - v0;
    let u = f * s.dot(h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }
    let q = s.cross(edge1);
    let v = f * dir.dot(q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }
    let t = f * edge2.dot(q);
    (t > EPSILON).then_some(t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{cuboid, Material};

    #[test]
    fn aabb_hit_and_miss() {
        let aabb = Aabb {
            min: Vec3::splat(-1.0),
            max: Vec3::splat(1.0),
        };
        let t = intersect_aabb(Vec3::new(0.0, 0.0, 5.0), -Vec3::Z, &aabb).unwrap();
        assert!((t - 4.0).abs() < 1e-5);
        assert!(intersect_aabb(Vec3::new(3.0, 0.0, 5.0), -Vec3::Z, &aabb).is_none());
        assert!(intersect_aabb(Vec3::new(0.0, 0.0, 5.0), Vec3::Z, &aabb).is_none());
        assert_eq!(intersect_aabb(Vec3::ZERO, Vec3::X, &aabb), Some(0.0));
    }

    #[test]
    fn triangle_hit_inside_and_miss_outside() {
        let (a, b, c) = (Vec3::ZERO, Vec3::X, Vec3::Y);
        let t = intersect_triangle(Vec3::new(0.2, 0.2, 1.0), -Vec3::Z, a, b, c).unwrap();
        assert!((t - 1.0).abs() < 1e-6);
        assert!(intersect_triangle(Vec3::new(0.8, 0.8, 1.0), -Vec3::Z, a, b, c).is_none());
        // Parallel ray.
        assert!(intersect_triangle(Vec3::new(0.2, 0.2, 1.0), Vec3::X, a, b, c).is_none());
    }

    #[test]
    fn nearest_mesh_wins() {
        let mut scene = SceneGraph::new("stack");
        let far = scene.push_mesh("far", cuboid([-1.0, -1.0, 0.0], [1.0, 1.0, 1.0]), Material::default());
        let near = scene.push_mesh("near", cuboid([-1.0, -1.0, 2.0], [1.0, 1.0, 3.0]), Material::default());

        let hit = pick_mesh(&scene, Vec3::new(0.1, 0.3, 10.0), -Vec3::Z).unwrap();
        assert_eq!(hit.mesh, near);
        assert!((hit.distance - 7.0).abs() < 1e-4);
        assert!((hit.point.z - 3.0).abs() < 1e-4);

        let hit = pick_mesh(&scene, Vec3::new(0.1, 0.3, 1.5), -Vec3::Z).unwrap();
        assert_eq!(hit.mesh, far);
    }

    #[test]
    fn empty_scene_or_zero_dir_misses() {
        let scene = SceneGraph::new("empty");
        assert!(pick_mesh(&scene, Vec3::ZERO, Vec3::X).is_none());
        let mut scene = SceneGraph::new("one");
        scene.push_mesh("box", cuboid([0.0; 3], [1.0; 3]), Material::default());
        assert!(pick_mesh(&scene, Vec3::new(0.5, 0.5, 5.0), Vec3::ZERO).is_none());
    }
}
