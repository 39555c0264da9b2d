use nalgebra::{Point3, Vector3};

/// Origin plus direction. The direction is deliberately not a unit
/// vector: bounce rays reflect about a roughness-perturbed normal and
/// the intersection quadratic handles any length through its `a` term.
#[derive(Clone, Copy, Debug)]
pub struct Ray {
    pub origin: Point3<f32>,
    pub direction: Vector3<f32>,
}
