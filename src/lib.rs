//! A small CPU ray tracer: sphere scenes, a fly camera with a cached
//! per-pixel ray grid, multi-bounce shading and temporal accumulation.
//!
//! The crate is host-agnostic. A windowing shell polls input, fills an
//! [`InputSnapshot`] once per frame, drives [`Camera::on_update`] and
//! [`Renderer::render`], then presents [`Renderer::image_bytes`] however
//! it likes (blit, texture upload, file dump).

use nalgebra::Vector4;

pub mod camera;
pub mod input;
pub mod renderer;
mod util;

pub use camera::Camera;
pub use input::{CursorMode, InputSnapshot, Key, MouseButton};
pub use renderer::scene::{Material, Scene, SceneError, Sphere};
pub use renderer::{Renderer, Settings};

/// Packs a clamped linear color into `0xAABBGGRR`: R in bits 0-7, G in
/// 8-15, B in 16-23, A in 24-31. Channels quantize by truncation, so the
/// input must already be in `[0, 1]`.
pub fn vec4_to_rgba(color: &Vector4<f32>) -> u32 {
    let r = (color.x * 255.0) as u8 as u32;
    let g = (color.y * 255.0) as u8 as u32;
    let b = (color.z * 255.0) as u8 as u32;
    let a = (color.w * 255.0) as u8 as u32;

    (a << 24) | (b << 16) | (g << 8) | r
}

/// Inverse of [`vec4_to_rgba`], up to the 1/255 quantization step.
pub fn rgba_to_vec4(pixel: u32) -> Vector4<f32> {
    Vector4::new(
        (pixel & 0xFF) as f32 / 255.0,
        ((pixel >> 8) & 0xFF) as f32 / 255.0,
        ((pixel >> 16) & 0xFF) as f32 / 255.0,
        ((pixel >> 24) & 0xFF) as f32 / 255.0,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_channel_order() {
        assert_eq!(vec4_to_rgba(&Vector4::new(1.0, 0.0, 0.0, 1.0)), 0xFF0000FF);
        assert_eq!(vec4_to_rgba(&Vector4::new(0.0, 0.0, 1.0, 0.0)), 0x00FF0000);
    }

    #[test]
    fn pack_unpack_round_trip() {
        for step in 0..=32 {
            let v = step as f32 / 32.0;
            let color = Vector4::new(v, 1.0 - v, v * 0.5, 1.0);
            let back = rgba_to_vec4(vec4_to_rgba(&color));
            for channel in 0..4 {
                assert!(
                    (back[channel] - color[channel]).abs() <= 1.0 / 255.0,
                    "channel {channel}: {} vs {}",
                    back[channel],
                    color[channel]
                );
            }
        }
    }
}
