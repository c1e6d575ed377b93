use serde::{Deserialize, Serialize};

/// Tuning for one weapon archetype. Defaults match the reference rifle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeaponConfig {
    /// Damage per shot before surface multipliers. Positive.
    pub base_damage: f32,
    /// Cone half-angle for bullet spread, degrees. Non-negative.
    pub bullet_spread_deg: f32,
    /// Shots per minute. Positive.
    pub rate_of_fire: f32,
    /// Hit-scan range in world units.
    pub max_range: f32,
}

impl Default for WeaponConfig {
    fn default() -> Self {
        Self {
            base_damage: 20.0,
            bullet_spread_deg: 1.0,
            rate_of_fire: 600.0,
            max_range: 10_000.0,
        }
    }
}

impl WeaponConfig {
    /// Minimum seconds between shots.
    pub fn min_interval(&self) -> f32 {
        60.0 / self.rate_of_fire
    }
}
