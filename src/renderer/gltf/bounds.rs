use glam::{Mat4, Vec3};

use crate::camera::Camera;
use crate::renderer::gltf::Document;

/// World-space axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Bounds {
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn diagonal(&self) -> Vec3 {
        self.max - self.min
    }

    fn extend(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    /// The distance used to size the projection and camera speed: the length
    /// of the diagonal, or 100 for an empty or degenerate box.
    pub fn max_distance(bounds: Option<Bounds>) -> f32 {
        match bounds.map(|bounds| bounds.diagonal().length()) {
            Some(distance) if distance > 0.0 => distance,
            _ => 100.0,
        }
    }

    /// A camera looking at the center of the box from one diagonal away. Flat
    /// scenes lying in the xy plane are looked at from the front instead.
    pub fn default_camera(&self) -> Camera {
        let up = Vec3::Y;
        let center = self.center();
        let diagonal = self.diagonal();
        let mut eye = if diagonal.z > 0.0 {
            center + diagonal
        } else {
            center + 2.0 * diagonal.cross(up)
        };
        // A point, or a flat scene whose diagonal is parallel to up.
        if eye.distance(center) <= f32::EPSILON * center.length().max(1.0) {
            eye = center + Vec3::Z * Bounds::max_distance(Some(*self));
        }
        Camera::new(eye, center, up)
    }
}

/// Bounds of the default scene, computed from the min/max of each primitive's
/// POSITION accessor. None if nothing in the scene has positions with bounds.
pub fn compute_scene_bounds(document: &Document) -> Option<Bounds> {
    let scene = &document.scenes[document.default_scene?];
    let mut bounds = None;
    for &node in &scene.nodes {
        extend_with_node(document, node, Mat4::IDENTITY, &mut bounds);
    }
    bounds
}

fn extend_with_node(
    document: &Document,
    node_index: usize,
    parent_matrix: Mat4,
    bounds: &mut Option<Bounds>,
) {
    let node = &document.nodes[node_index];
    let model_matrix = parent_matrix * node.transform.matrix();
    if let Some(mesh) = node.mesh {
        for primitive in &document.meshes[mesh].primitives {
            let Some(position) = primitive.attribute("POSITION") else {
                continue;
            };
            let accessor = &document.accessors[position];
            let (Some(min), Some(max)) = (&accessor.min, &accessor.max) else {
                continue;
            };
            if min.len() < 3 || max.len() < 3 {
                continue;
            }
            let (min, max) = (Vec3::from_slice(min), Vec3::from_slice(max));
            for corner in 0..8 {
                let local = Vec3::new(
                    if corner & 1 == 0 { min.x } else { max.x },
                    if corner & 2 == 0 { min.y } else { max.y },
                    if corner & 4 == 0 { min.z } else { max.z },
                );
                let world = model_matrix.transform_point3(local);
                match bounds {
                    Some(bounds) => bounds.extend(world),
                    None => {
                        *bounds = Some(Bounds {
                            min: world,
                            max: world,
                        })
                    }
                }
            }
        }
    }
    for &child in &node.children {
        extend_with_node(document, child, model_matrix, bounds);
    }
}
