use nalgebra::Vector3;
use rand::distributions::uniform::{SampleRange, SampleUniform};
use rand::Rng;

/// Vector with each component drawn independently from `range`. The rng
/// comes from the caller so seeded runs stay reproducible.
pub fn random_vec<T, R, G>(rng: &mut G, range: R) -> Vector3<T>
where
    T: SampleUniform,
    R: SampleRange<T> + Clone,
    G: Rng,
{
    Vector3::new(
        rng.gen_range(range.clone()),
        rng.gen_range(range.clone()),
        rng.gen_range(range),
    )
}

/// Mirror `incident` about `normal`. `normal` is not required to be unit
/// length; the roughness model feeds a perturbed, unnormalized normal in
/// on purpose.
pub fn reflect(incident: &Vector3<f32>, normal: &Vector3<f32>) -> Vector3<f32> {
    incident - 2.0 * incident.dot(normal) * normal
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn reflect_off_flat_normal() {
        let out = reflect(&Vector3::new(1.0, -1.0, 0.0), &Vector3::new(0.0, 1.0, 0.0));
        assert_eq!(out, Vector3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn random_vec_respects_range_and_seed() {
        let mut a = SmallRng::seed_from_u64(7);
        let mut b = SmallRng::seed_from_u64(7);
        let va: Vector3<f32> = random_vec(&mut a, -0.5..0.5);
        let vb: Vector3<f32> = random_vec(&mut b, -0.5..0.5);
        assert_eq!(va, vb);
        for i in 0..3 {
            assert!((-0.5..0.5).contains(&va[i]));
        }
    }
}
