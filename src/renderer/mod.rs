use bytemuck::cast_slice;
use log::{debug, trace};
use nalgebra::{Point3, Unit, Vector3, Vector4};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use rayon::prelude::*;

use crate::camera::Camera;
use crate::renderer::ray::Ray;
use crate::renderer::scene::{Scene, SceneError, Sphere};
use crate::util::{random_vec, reflect};
use crate::vec4_to_rgba;

pub mod ray;
pub mod scene;

/// Energy kept after each bounce.
const BOUNCE_DECAY: f32 = 0.5;
/// Bounce origins step this far along the normal so the new ray cannot
/// re-hit the surface it just left.
const SURFACE_EPSILON: f32 = 1e-4;

fn sky_color() -> Vector3<f32> {
    Vector3::new(0.6, 0.7, 0.9)
}

pub struct Settings {
    /// Average frames while the scene and camera hold still.
    pub accumulate: bool,
    /// Trace-shade-reflect iterations per pixel.
    pub bounces: u32,
}

impl Settings {
    pub const DEFAULT_BOUNCES: u32 = 5;
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            accumulate: true,
            bounces: Self::DEFAULT_BOUNCES,
        }
    }
}

/// Owns the packed output image and the floating-point accumulation
/// buffer. Scene and camera are borrowed per call and never retained.
pub struct Renderer {
    width: u32,
    height: u32,
    image_data: Vec<u32>,
    accumulation: Vec<Vector4<f32>>,
    frame_index: u32,
    rng_seed: u64,
    pub settings: Settings,
}

impl Renderer {
    pub fn new(width: u32, height: u32) -> Self {
        let pixels = width as usize * height as usize;
        Self {
            width,
            height,
            image_data: vec![0; pixels],
            accumulation: vec![Vector4::zeros(); pixels],
            frame_index: 1,
            rng_seed: rand::random(),
            settings: Settings::default(),
        }
    }

    /// Reallocates both buffers and restarts accumulation. Unchanged
    /// dimensions are a no-op; zero-area viewports get empty buffers.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == self.width && height == self.height {
            return;
        }
        debug!("renderer buffers {}x{} -> {}x{}", self.width, self.height, width, height);

        self.width = width;
        self.height = height;

        let pixels = width as usize * height as usize;
        self.image_data = vec![0; pixels];
        self.accumulation = vec![Vector4::zeros(); pixels];
        self.frame_index = 1;
    }

    /// Restarts temporal accumulation. Call whenever the camera moved or
    /// the scene changed between frames.
    pub fn reset_frame_index(&mut self) {
        self.frame_index = 1;
    }

    pub fn frame_index(&self) -> u32 {
        self.frame_index
    }

    /// Fixes the random stream so every frame becomes a pure function of
    /// (scene, camera, seed, frame index).
    pub fn set_seed(&mut self, seed: u64) {
        self.rng_seed = seed;
    }

    /// Packed RGBA pixels, row-major, fully rewritten by each render.
    pub fn image_data(&self) -> &[u32] {
        &self.image_data
    }

    /// Same pixels as raw bytes, for hosts that upload or write out the
    /// image directly.
    pub fn image_bytes(&self) -> &[u8] {
        cast_slice(&self.image_data)
    }

    /// Renders one frame into the output buffer. Every pixel is
    /// independent: ray-gen from the camera cache, a bounded
    /// trace-shade-reflect loop against the scene, then accumulation,
    /// clamp and RGBA packing. All pixels are complete when this
    /// returns.
    pub fn render(&mut self, scene: &Scene, camera: &Camera) -> Result<(), SceneError> {
        scene.validate()?;

        let pixels = self.width as usize * self.height as usize;
        assert_eq!(
            camera.ray_directions().len(),
            pixels,
            "camera ray cache does not match the {}x{} output buffer",
            self.width,
            self.height,
        );

        if self.frame_index == 1 {
            self.accumulation.fill(Vector4::zeros());
        }

        let frame_index = self.frame_index;
        let bounces = self.settings.bounces;
        let seed = self.rng_seed;
        let accumulation = &mut self.accumulation;

        self.image_data
            .par_iter_mut()
            .zip(accumulation.par_iter_mut())
            .enumerate()
            .for_each(|(index, (pixel, accumulated))| {
                let mut rng =
                    SmallRng::seed_from_u64(seed ^ ((frame_index as u64) << 32) ^ index as u64);

                *accumulated += per_pixel(scene, camera, index, bounces, &mut rng);

                let averaged =
                    (*accumulated / frame_index as f32).map(|channel| channel.clamp(0.0, 1.0));
                *pixel = vec4_to_rgba(&averaged);
            });

        trace!("rendered frame {frame_index}");

        if self.settings.accumulate {
            self.frame_index += 1;
        } else {
            self.frame_index = 1;
        }
        Ok(())
    }
}

/// Traces one pixel's light path and returns its radiance for this
/// frame. Misses contribute the sky color scaled by the remaining
/// attenuation and end the path.
fn per_pixel(
    scene: &Scene,
    camera: &Camera,
    index: usize,
    bounces: u32,
    rng: &mut SmallRng,
) -> Vector4<f32> {
    let mut ray = Ray {
        origin: camera.position(),
        direction: camera.ray_directions()[index],
    };

    let light_direction = Vector3::new(-1.0, -1.0, -1.0).normalize();

    let mut color = Vector3::zeros();
    let mut multiplier = 1.0;

    for _ in 0..bounces {
        let Some(hit) = trace_ray(&ray, scene) else {
            color += sky_color() * multiplier;
            break;
        };

        // Scene::validate ran before any pixel work, so the index holds.
        let material = &scene.materials[hit.sphere.material_index];

        let light = hit.normal.dot(&-light_direction).max(0.0);
        color += material.albedo * light * multiplier;

        multiplier *= BOUNCE_DECAY;

        ray.origin = hit.position + hit.normal.into_inner() * SURFACE_EPSILON;
        // Roughness perturbs the normal before reflection, not the
        // reflected ray. The perturbed normal stays unnormalized.
        let microfacet =
            hit.normal.into_inner() + material.roughness * random_vec(rng, -0.5..0.5);
        ray.direction = reflect(&ray.direction, &microfacet);
    }

    Vector4::new(color.x, color.y, color.z, 1.0)
}

/// What a bounce needs to shade a hit and spawn the next ray.
pub struct HitPayload<'a> {
    pub distance: f32,
    pub position: Point3<f32>,
    pub normal: Unit<Vector3<f32>>,
    pub sphere: &'a Sphere,
}

/// Closed-form ray/sphere test against every sphere in the scene,
/// keeping the smallest positive root. Degenerate rays (`a == 0`) and
/// negative discriminants are misses.
pub fn trace_ray<'a>(ray: &Ray, scene: &'a Scene) -> Option<HitPayload<'a>> {
    let mut closest: Option<(&Sphere, f32)> = None;

    for sphere in &scene.spheres {
        let origin = ray.origin - sphere.position;

        let a = ray.direction.dot(&ray.direction);
        let b = 2.0 * origin.dot(&ray.direction);
        let c = origin.dot(&origin) - sphere.radius * sphere.radius;

        if a == 0.0 {
            continue;
        }

        let discriminant = b * b - 4.0 * a * c;
        if discriminant < 0.0 {
            continue;
        }

        let distance = (-b - discriminant.sqrt()) / (2.0 * a);
        if distance <= 0.0 {
            continue;
        }

        match closest {
            Some((_, best)) if best <= distance => {}
            _ => closest = Some((sphere, distance)),
        }
    }

    closest.map(|(sphere, distance)| closest_hit(ray, distance, sphere))
}

/// Resolves a hit distance into world position and geometric normal.
pub fn closest_hit<'a>(ray: &Ray, distance: f32, sphere: &'a Sphere) -> HitPayload<'a> {
    let local_origin = ray.origin - sphere.position;
    let local_position = local_origin + ray.direction * distance;

    HitPayload {
        distance,
        position: sphere.position + local_position,
        normal: Unit::new_normalize(local_position),
        sphere,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::scene::Material;

    fn one_sphere(position: Point3<f32>, radius: f32) -> Scene {
        let mut scene = Scene::default();
        scene.push_material(Material {
            albedo: Vector3::new(1.0, 1.0, 1.0),
            roughness: 0.0,
        });
        scene
            .push_sphere(Sphere {
                position,
                radius,
                material_index: 0,
            })
            .unwrap();
        scene
    }

    #[test]
    fn head_on_hit_distance_matches_analytic_root() {
        let scene = one_sphere(Point3::new(0.0, 0.0, -3.0), 1.0);
        let ray = Ray {
            origin: Point3::origin(),
            direction: Vector3::new(0.0, 0.0, -1.0),
        };

        let hit = trace_ray(&ray, &scene).unwrap();
        assert!((hit.distance - 2.0).abs() < 1e-6);
        assert!((hit.position - Point3::new(0.0, 0.0, -2.0)).norm() < 1e-6);
    }

    #[test]
    fn perpendicular_offset_beyond_radius_misses() {
        let scene = one_sphere(Point3::new(0.0, 0.0, -3.0), 1.0);
        let ray = Ray {
            origin: Point3::new(1.5, 0.0, 0.0),
            direction: Vector3::new(0.0, 0.0, -1.0),
        };
        assert!(trace_ray(&ray, &scene).is_none());
    }

    #[test]
    fn hit_normal_is_unit_length() {
        let scene = one_sphere(Point3::new(0.3, -0.2, -4.0), 0.7);
        let ray = Ray {
            origin: Point3::origin(),
            direction: Vector3::new(0.1, -0.05, -1.0),
        };

        let hit = trace_ray(&ray, &scene).unwrap();
        assert!((hit.normal.norm() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn closest_of_two_overlapping_spheres_wins() {
        let mut scene = Scene::default();
        scene.push_material(Material::default());
        scene
            .push_sphere(Sphere {
                position: Point3::new(0.0, 0.0, -5.0),
                radius: 1.0,
                material_index: 0,
            })
            .unwrap();
        scene
            .push_sphere(Sphere {
                position: Point3::new(0.0, 0.0, -3.0),
                radius: 1.0,
                material_index: 0,
            })
            .unwrap();

        let ray = Ray {
            origin: Point3::origin(),
            direction: Vector3::new(0.0, 0.0, -1.0),
        };

        let hit = trace_ray(&ray, &scene).unwrap();
        assert_eq!(hit.sphere.position, Point3::new(0.0, 0.0, -3.0));
        assert!((hit.distance - 2.0).abs() < 1e-6);
    }

    #[test]
    fn degenerate_direction_is_a_miss() {
        let scene = one_sphere(Point3::origin(), 1.0);
        let ray = Ray {
            origin: Point3::new(0.0, 0.0, 6.0),
            direction: Vector3::zeros(),
        };
        assert!(trace_ray(&ray, &scene).is_none());
    }

    #[test]
    fn ray_starting_past_sphere_misses() {
        // Both roots negative: sphere is behind the origin.
        let scene = one_sphere(Point3::new(0.0, 0.0, 3.0), 1.0);
        let ray = Ray {
            origin: Point3::origin(),
            direction: Vector3::new(0.0, 0.0, -1.0),
        };
        assert!(trace_ray(&ray, &scene).is_none());
    }
}
