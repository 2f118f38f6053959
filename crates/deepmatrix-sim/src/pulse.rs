use deepmatrix_core::constants::{
    POINT_SIZE_MAX, POINT_SIZE_MIN, PULSE_COUNTDOWN_MAX, PULSE_COUNTDOWN_MIN, PULSE_SPEED_MAX,
    PULSE_SPEED_MIN,
};
use deepmatrix_core::math::ease;
use rand::Rng;

/// Slow random walk of one point cluster's rendered size.
#[derive(Debug, Clone, Copy)]
pub struct ClusterPulse {
    pub size: f32,
    pub target: f32,
    pub pulse_speed: f32,
    /// Nominal frames until the next target is picked.
    pub countdown: f32,
}

impl ClusterPulse {
    fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let size = rng.random_range(POINT_SIZE_MIN..=POINT_SIZE_MAX);
        Self {
            size,
            target: rng.random_range(POINT_SIZE_MIN..=POINT_SIZE_MAX),
            pulse_speed: rng.random_range(PULSE_SPEED_MIN..=PULSE_SPEED_MAX),
            countdown: rng.random_range(PULSE_COUNTDOWN_MIN..=PULSE_COUNTDOWN_MAX),
        }
    }

    fn step<R: Rng + ?Sized>(&mut self, factor: f32, rng: &mut R) {
        self.size = ease(self.size, self.target, self.pulse_speed, factor);
        self.countdown -= factor;
        if self.countdown <= 0.0 {
            self.target = rng.random_range(POINT_SIZE_MIN..=POINT_SIZE_MAX);
            self.countdown = rng.random_range(PULSE_COUNTDOWN_MIN..=PULSE_COUNTDOWN_MAX);
        }
    }
}

/// Independent size pulses for every cluster of the lattice.
#[derive(Debug, Clone, Default)]
pub struct PulseField {
    clusters: Vec<ClusterPulse>,
    sizes: Vec<f32>,
}

impl PulseField {
    pub fn new<R: Rng + ?Sized>(cluster_count: usize, rng: &mut R) -> Self {
        let clusters: Vec<ClusterPulse> =
            (0..cluster_count).map(|_| ClusterPulse::random(rng)).collect();
        let sizes = clusters.iter().map(|c| c.size).collect();
        Self { clusters, sizes }
    }

    pub fn step<R: Rng + ?Sized>(&mut self, factor: f32, rng: &mut R) {
        for (cluster, size) in self.clusters.iter_mut().zip(self.sizes.iter_mut()) {
            cluster.step(factor, rng);
            *size = cluster.size;
        }
    }

    /// Current size per cluster, in CSS pixels.
    pub fn sizes(&self) -> &[f32] {
        &self.sizes
    }

    pub fn clusters(&self) -> &[ClusterPulse] {
        &self.clusters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_sizes_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(12);
        let mut field = PulseField::new(16, &mut rng);
        for _ in 0..2_000 {
            field.step(1.0, &mut rng);
            for &s in field.sizes() {
                assert!((POINT_SIZE_MIN..=POINT_SIZE_MAX).contains(&s), "size {s}");
            }
        }
    }

    #[test]
    fn test_size_eases_by_pulse_speed() {
        let mut rng = StdRng::seed_from_u64(13);
        let mut pulse = ClusterPulse {
            size: 1.0,
            target: 3.0,
            pulse_speed: 0.25,
            countdown: 100.0,
        };
        pulse.step(1.0, &mut rng);
        assert!((pulse.size - 1.5).abs() < 1e-6);
        assert_eq!(pulse.countdown, 99.0);
    }

    #[test]
    fn test_countdown_rerolls_target() {
        let mut rng = StdRng::seed_from_u64(14);
        let mut pulse = ClusterPulse {
            size: 2.0,
            target: 2.0,
            pulse_speed: 0.02,
            countdown: 0.5,
        };
        pulse.step(1.0, &mut rng);
        assert!(pulse.countdown >= PULSE_COUNTDOWN_MIN);
        assert!((POINT_SIZE_MIN..=POINT_SIZE_MAX).contains(&pulse.target));
    }

    #[test]
    fn test_field_matches_cluster_count() {
        let mut rng = StdRng::seed_from_u64(15);
        let field = PulseField::new(6, &mut rng);
        assert_eq!(field.sizes().len(), 6);
        assert_eq!(field.clusters().len(), 6);
    }
}
