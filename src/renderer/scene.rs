use nalgebra::{Point3, Vector3};
use thiserror::Error;

/// Precondition violations in scene data. Raised by [`Scene::validate`]
/// before any tracing touches the data, so a bad material index can
/// never turn into an out-of-bounds read mid-render.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SceneError {
    #[error("sphere {sphere} references material {material_index}, but the scene has {materials} materials")]
    InvalidMaterialIndex {
        sphere: usize,
        material_index: usize,
        materials: usize,
    },
    #[error("sphere {sphere} has non-positive radius")]
    NonPositiveRadius { sphere: usize },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sphere {
    pub position: Point3<f32>,
    pub radius: f32,
    /// Index into [`Scene::materials`]. Spheres never own material data.
    pub material_index: usize,
}

impl Default for Sphere {
    fn default() -> Self {
        Self {
            position: Point3::origin(),
            radius: 1.0,
            material_index: 0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Material {
    /// Linear RGB in [0, 1].
    pub albedo: Vector3<f32>,
    /// 0 = perfect mirror, 1 = fully perturbed reflection.
    pub roughness: f32,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            albedo: Vector3::new(1.0, 1.0, 1.0),
            roughness: 1.0,
        }
    }
}

/// Plain scene data, owned by the host and borrowed read-only by the
/// renderer for the duration of a single render call.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    pub spheres: Vec<Sphere>,
    pub materials: Vec<Material>,
}

impl Scene {
    /// Checks every sphere against the material table. Cheap enough to
    /// run on each render call.
    pub fn validate(&self) -> Result<(), SceneError> {
        for (index, sphere) in self.spheres.iter().enumerate() {
            if sphere.material_index >= self.materials.len() {
                return Err(SceneError::InvalidMaterialIndex {
                    sphere: index,
                    material_index: sphere.material_index,
                    materials: self.materials.len(),
                });
            }
            if sphere.radius <= 0.0 {
                return Err(SceneError::NonPositiveRadius { sphere: index });
            }
        }
        Ok(())
    }

    /// Appends a sphere, rejecting it up front if it would break the
    /// scene invariants. Returns its index.
    pub fn push_sphere(&mut self, sphere: Sphere) -> Result<usize, SceneError> {
        let index = self.spheres.len();
        if sphere.material_index >= self.materials.len() {
            return Err(SceneError::InvalidMaterialIndex {
                sphere: index,
                material_index: sphere.material_index,
                materials: self.materials.len(),
            });
        }
        if sphere.radius <= 0.0 {
            return Err(SceneError::NonPositiveRadius { sphere: index });
        }
        self.spheres.push(sphere);
        Ok(index)
    }

    /// Appends a material and returns its index for spheres to refer to.
    pub fn push_material(&mut self, material: Material) -> usize {
        self.materials.push(material);
        self.materials.len() - 1
    }
}
