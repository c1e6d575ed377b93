use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::surface::{SurfaceClass, damage_multiplier};
use crate::world::{EntityId, WorldQuery};

use super::config::WeaponConfig;

/// Resolved result of one shot attempt. Transient: consumed immediately by
/// damage application and trace construction, never persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FireOutcome {
    pub hit: bool,
    pub target: Option<EntityId>,
    pub impact_point: Vec3,
    pub surface: SurfaceClass,
    pub damage: f32,
}

impl FireOutcome {
    pub fn miss(end_point: Vec3) -> Self {
        Self {
            hit: false,
            target: None,
            impact_point: end_point,
            surface: SurfaceClass::Default,
            damage: 0.0,
        }
    }
}

/// Performs the single ray query for a shot, including per-shot spread.
pub struct HitScanResolver {
    rng: ChaCha8Rng,
}

impl HitScanResolver {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Perturbs `direction` uniformly within a cone of the given half-angle.
    /// Sampled fresh for every shot.
    pub fn sample_spread(&mut self, direction: Vec3, half_angle_deg: f32) -> Vec3 {
        let axis = direction.normalize();
        if half_angle_deg <= 0.0 {
            return axis;
        }

        // Uniform over the spherical cap: cos(theta) uniform in
        // [cos(half_angle), 1], azimuth uniform in [0, tau).
        let half_angle = half_angle_deg.to_radians();
        let u: f32 = self.rng.gen_range(0.0..1.0);
        let cos_theta = 1.0 - u * (1.0 - half_angle.cos());
        let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
        let phi: f32 = self.rng.gen_range(0.0..std::f32::consts::TAU);

        let tangent = axis.any_orthonormal_vector();
        let bitangent = axis.cross(tangent);
        (axis * cos_theta + (tangent * phi.cos() + bitangent * phi.sin()) * sin_theta).normalize()
    }

    /// Resolves one shot. An absent world query is a collaborator failure:
    /// logged, and degraded to an explicit miss at max range.
    pub fn resolve(
        &mut self,
        world: Option<&dyn WorldQuery>,
        origin: Vec3,
        aim_direction: Vec3,
        config: &WeaponConfig,
        exclude: &[EntityId],
    ) -> FireOutcome {
        let direction = self.sample_spread(aim_direction, config.bullet_spread_deg);
        let end = origin + direction * config.max_range;

        let Some(world) = world else {
            log::warn!("world query unavailable, resolving shot as a miss");
            return FireOutcome::miss(end);
        };

        match world.trace(origin, end, exclude) {
            Some(hit) => FireOutcome {
                hit: true,
                target: Some(hit.entity),
                impact_point: hit.point,
                surface: hit.surface,
                damage: config.base_damage * damage_multiplier(hit.surface),
            },
            None => FireOutcome::miss(end),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::RayHit;

    struct FixedHit(RayHit);

    impl WorldQuery for FixedHit {
        fn trace(&self, _origin: Vec3, _end: Vec3, _exclude: &[EntityId]) -> Option<RayHit> {
            Some(self.0)
        }
    }

    struct NoHit;

    impl WorldQuery for NoHit {
        fn trace(&self, _origin: Vec3, _end: Vec3, _exclude: &[EntityId]) -> Option<RayHit> {
            None
        }
    }

    #[test]
    fn zero_spread_keeps_the_aim_direction() {
        let mut resolver = HitScanResolver::new(1);
        let dir = resolver.sample_spread(Vec3::new(0.0, 0.0, 3.0), 0.0);
        assert!((dir - Vec3::Z).length() < 1e-6);
    }

    #[test]
    fn spread_stays_within_the_cone() {
        let mut resolver = HitScanResolver::new(2);
        let half_angle_deg = 5.0f32;
        let min_dot = (half_angle_deg.to_radians()).cos() - 1e-4;

        for _ in 0..1000 {
            let dir = resolver.sample_spread(Vec3::X, half_angle_deg);
            assert!(dir.dot(Vec3::X) >= min_dot, "direction {dir:?} left the cone");
            assert!((dir.length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn spread_is_resampled_per_shot() {
        let mut resolver = HitScanResolver::new(3);
        let a = resolver.sample_spread(Vec3::X, 5.0);
        let b = resolver.sample_spread(Vec3::X, 5.0);
        assert_ne!(a, b);
    }

    #[test]
    fn miss_ends_at_max_range() {
        let mut resolver = HitScanResolver::new(4);
        let config = WeaponConfig {
            bullet_spread_deg: 0.0,
            max_range: 100.0,
            ..Default::default()
        };

        let outcome = resolver.resolve(Some(&NoHit), Vec3::ZERO, Vec3::Y, &config, &[]);
        assert!(!outcome.hit);
        assert_eq!(outcome.target, None);
        assert!((outcome.impact_point - Vec3::new(0.0, 100.0, 0.0)).length() < 1e-3);
        assert_eq!(outcome.damage, 0.0);
    }

    #[test]
    fn vulnerable_hit_quadruples_damage() {
        let mut resolver = HitScanResolver::new(5);
        let config = WeaponConfig {
            bullet_spread_deg: 0.0,
            ..Default::default()
        };
        let world = FixedHit(RayHit {
            entity: 9,
            point: Vec3::new(5.0, 0.0, 0.0),
            surface: SurfaceClass::FleshVulnerable,
        });

        let outcome = resolver.resolve(Some(&world), Vec3::ZERO, Vec3::X, &config, &[]);
        assert!(outcome.hit);
        assert_eq!(outcome.target, Some(9));
        assert_eq!(outcome.damage, 80.0);
    }

    #[test]
    fn absent_world_degrades_to_a_miss() {
        let mut resolver = HitScanResolver::new(6);
        let config = WeaponConfig {
            bullet_spread_deg: 0.0,
            max_range: 50.0,
            ..Default::default()
        };

        let outcome = resolver.resolve(None, Vec3::ZERO, Vec3::X, &config, &[]);
        assert!(!outcome.hit);
        assert!((outcome.impact_point.x - 50.0).abs() < 1e-3);
    }
}
