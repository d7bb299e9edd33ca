use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal, NormalError};

/// Zero-centred (or biased) Gaussian noise source.
#[derive(Clone, Debug)]
pub(crate) struct GaussianNoise {
    normal: Normal<f64>,
}

impl GaussianNoise {
    /// `Normal` alone lets a negative deviation through, so it is rejected here.
    pub(crate) fn new(mean: f64, stdev: f64) -> Result<Self, NormalError> {
        if !(stdev.is_finite() && stdev >= 0.0) {
            return Err(NormalError::BadVariance);
        }
        Ok(Self {
            normal: Normal::new(mean, stdev)?,
        })
    }

    pub(crate) fn draw_sample(&self, rng: &mut StdRng) -> f64 {
        self.normal.sample(rng)
    }

    pub(crate) fn add_noise(&self, rng: &mut StdRng, data: f64) -> f64 {
        data + self.draw_sample(rng)
    }

    pub(crate) fn add_noise_xyz(&self, rng: &mut StdRng, data: [f64; 3]) -> [f64; 3] {
        data.map(|d| self.add_noise(rng, d))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_gaussian_new() {
        let noise = GaussianNoise::new(0.0, 1.0).unwrap();
        assert_eq!(noise.normal.mean(), 0.0);
        assert_eq!(noise.normal.std_dev(), 1.0);
    }

    #[test]
    fn test_gaussian_rejects_invalid_stdev() {
        assert!(GaussianNoise::new(0.0, f64::NAN).is_err());
        assert!(GaussianNoise::new(0.0, f64::INFINITY).is_err());
        assert_eq!(
            GaussianNoise::new(0.0, -1.0).unwrap_err(),
            NormalError::BadVariance
        );
    }

    #[test]
    fn test_zero_stdev_is_identity() {
        let mut rng = StdRng::seed_from_u64(7);
        let noise = GaussianNoise::new(0.0, 0.0).unwrap();
        assert_eq!(noise.add_noise_xyz(&mut rng, [1.0, 2.0, 3.0]), [1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_seeded_noise_is_reproducible() {
        let noise = GaussianNoise::new(0.0, 0.5).unwrap();
        let mut rng1 = StdRng::seed_from_u64(42);
        let mut rng2 = StdRng::seed_from_u64(42);
        assert_eq!(noise.add_noise(&mut rng1, 5.0), noise.add_noise(&mut rng2, 5.0));
    }
}
