use log::debug;
use nalgebra::{Matrix4, Perspective3, Point3, Unit, UnitQuaternion, Vector2, Vector3, Vector4};
use rayon::prelude::*;

use crate::input::{CursorMode, InputSnapshot, Key, MouseButton};

/// Raw mouse pixels to radians-ish units, applied before the rotation
/// speed.
const MOUSE_SENSITIVITY: f32 = 0.002;

/// Fly camera. Owns the view/projection pair plus a per-pixel cache of
/// world-space ray directions, row-major with `index = x + y * width`.
/// The cache is recomputed on every movement or resize, so it is always
/// valid when the renderer reads it.
pub struct Camera {
    projection: Matrix4<f32>,
    view: Matrix4<f32>,
    inverse_projection: Matrix4<f32>,
    inverse_view: Matrix4<f32>,

    vertical_fov: f32,
    near: f32,
    far: f32,

    position: Point3<f32>,
    forward: Unit<Vector3<f32>>,

    ray_directions: Vec<Vector3<f32>>,

    viewport_width: u32,
    viewport_height: u32,

    /// Cursor state requested from the host: locked while the look
    /// button is held, normal otherwise.
    pub cursor_request: CursorMode,
}

impl Camera {
    /// `vertical_fov` is in degrees. The camera starts at (0, 0, 6)
    /// looking down -Z with an empty ray cache; call [`Camera::resize`]
    /// before the first render.
    pub fn new(vertical_fov: f32, near: f32, far: f32) -> Self {
        let position = Point3::new(0.0, 0.0, 6.0);
        let forward = Unit::new_unchecked(Vector3::new(0.0, 0.0, -1.0));

        let view = Matrix4::look_at_rh(&position, &(position + forward.into_inner()), &Vector3::y_axis());
        let inverse_view = view.try_inverse().unwrap();

        Self {
            projection: Matrix4::identity(),
            view,
            inverse_projection: Matrix4::identity(),
            inverse_view,
            vertical_fov,
            near,
            far,
            position,
            forward,
            ray_directions: vec![],
            viewport_width: 0,
            viewport_height: 0,
            cursor_request: CursorMode::Normal,
        }
    }

    pub fn position(&self) -> Point3<f32> {
        self.position
    }

    pub fn forward(&self) -> Unit<Vector3<f32>> {
        self.forward
    }

    /// World-space ray direction per pixel, one entry per pixel of the
    /// current viewport.
    pub fn ray_directions(&self) -> &[Vector3<f32>] {
        &self.ray_directions
    }

    pub fn viewport_size(&self) -> (u32, u32) {
        (self.viewport_width, self.viewport_height)
    }

    /// Applies one frame of host input. Translation runs at a fixed
    /// speed scaled by `ts` (seconds); opposite keys on one axis are
    /// exclusive, first of the pair wins. Returns true iff the camera
    /// moved, in which case the view matrix and ray cache were rebuilt
    /// and the caller should reset any accumulation.
    pub fn on_update(&mut self, ts: f32, input: &InputSnapshot) -> bool {
        if !input.mouse_down(MouseButton::Right) {
            self.cursor_request = CursorMode::Normal;
            return false;
        }
        self.cursor_request = CursorMode::Locked;

        let delta = input.mouse_delta * MOUSE_SENSITIVITY;

        let up: Unit<Vector3<f32>> = Vector3::y_axis();
        let right = Unit::new_normalize(self.forward.cross(&up));
        let speed = self.movement_speed();
        let mut moved = false;

        if input.key_down(Key::W) {
            self.position += self.forward.into_inner() * speed * ts;
            moved = true;
        } else if input.key_down(Key::S) {
            self.position -= self.forward.into_inner() * speed * ts;
            moved = true;
        }
        if input.key_down(Key::A) {
            self.position -= right.into_inner() * speed * ts;
            moved = true;
        } else if input.key_down(Key::D) {
            self.position += right.into_inner() * speed * ts;
            moved = true;
        }
        if input.key_down(Key::Q) {
            self.position -= up.into_inner() * speed * ts;
            moved = true;
        } else if input.key_down(Key::E) {
            self.position += up.into_inner() * speed * ts;
            moved = true;
        }

        if delta.x != 0.0 || delta.y != 0.0 {
            let pitch = delta.y * self.rotation_speed();
            let yaw = delta.x * self.rotation_speed();

            let rotation = UnitQuaternion::from_axis_angle(&right, -pitch)
                * UnitQuaternion::from_axis_angle(&up, -yaw);
            self.forward = rotation * self.forward;
            self.forward.renormalize_fast();

            moved = true;
        }

        if moved {
            self.recalculate_view();
            self.recalculate_ray_directions();
        }
        moved
    }

    /// No-op when the size is unchanged. A zero-area viewport just
    /// empties the ray cache.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == self.viewport_width && height == self.viewport_height {
            return;
        }
        debug!("camera viewport {}x{} -> {}x{}", self.viewport_width, self.viewport_height, width, height);

        self.viewport_width = width;
        self.viewport_height = height;

        if width == 0 || height == 0 {
            self.ray_directions.clear();
            return;
        }

        self.recalculate_projection();
        self.recalculate_ray_directions();
    }

    /// Scene-editor hook; rebuilds the view matrix and ray cache.
    pub fn set_position(&mut self, position: Point3<f32>) {
        self.position = position;
        self.recalculate_view();
        self.recalculate_ray_directions();
    }

    /// Scene-editor hook; rebuilds the view matrix and ray cache.
    pub fn set_direction(&mut self, forward: Unit<Vector3<f32>>) {
        self.forward = forward;
        self.recalculate_view();
        self.recalculate_ray_directions();
    }

    pub fn rotation_speed(&self) -> f32 {
        0.3
    }

    pub fn movement_speed(&self) -> f32 {
        5.0
    }

    fn recalculate_projection(&mut self) {
        let aspect = self.viewport_width as f32 / self.viewport_height as f32;
        self.projection =
            Perspective3::new(aspect, self.vertical_fov.to_radians(), self.near, self.far)
                .to_homogeneous();
        self.inverse_projection = self.projection.try_inverse().unwrap();
    }

    fn recalculate_view(&mut self) {
        let target = self.position + self.forward.into_inner();
        self.view = Matrix4::look_at_rh(&self.position, &target, &Vector3::y_axis());
        self.inverse_view = self.view.try_inverse().unwrap();
    }

    /// One flat parallel map over the pixel range. Per pixel: viewport
    /// coordinate to NDC in [-1, 1]^2 (no half-pixel offset), unproject
    /// to the far plane, normalize in view space, then rotate into world
    /// space through the inverse view matrix with w = 0 so translation
    /// does not apply.
    fn recalculate_ray_directions(&mut self) {
        let (width, height) = (self.viewport_width, self.viewport_height);

        self.ray_directions = (0..width as usize * height as usize)
            .into_par_iter()
            .map(|index| {
                let x = index as u32 % width;
                let y = index as u32 / width;

                let coord = Vector2::new(
                    x as f32 / width as f32,
                    y as f32 / height as f32,
                ) * 2.0
                    - Vector2::new(1.0, 1.0);

                let target = self.inverse_projection * Vector4::new(coord.x, coord.y, 1.0, 1.0);
                let direction = (target.xyz() / target.w).normalize();

                (self.inverse_view
                    * Vector4::new(direction.x, direction.y, direction.z, 0.0))
                .xyz()
            })
            .collect();
    }
}
