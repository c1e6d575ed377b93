use glam::Vec3;

use crate::surface::{SurfaceClass, impact_effect_kind};

/// Cosmetic playback capability. Implemented outside the core; the weapon
/// only decides when to invoke it and with what.
pub trait CosmeticPlayback {
    /// Muzzle flash, tracer towards `end_point`, camera shake.
    fn play_fire_effects(&mut self, end_point: Vec3);

    /// Surface-appropriate impact particles at the struck point.
    fn play_impact_effects(&mut self, surface: SurfaceClass, impact_point: Vec3);
}

/// Playback that reports to the log. Stands in for a real effect spawner on
/// headless participants.
#[derive(Debug)]
pub struct LogPlayback {
    label: &'static str,
}

impl LogPlayback {
    pub fn new(label: &'static str) -> Self {
        Self { label }
    }
}

impl CosmeticPlayback for LogPlayback {
    fn play_fire_effects(&mut self, end_point: Vec3) {
        log::debug!("[{}] fire effects, tracer to {:.1?}", self.label, end_point);
    }

    fn play_impact_effects(&mut self, surface: SurfaceClass, impact_point: Vec3) {
        log::debug!(
            "[{}] {:?} impact effect at {:.1?}",
            self.label,
            impact_effect_kind(surface),
            impact_point,
        );
    }
}

/// Playback that records every call, for assertions.
#[derive(Debug, Default)]
pub struct RecordingPlayback {
    pub fire_effects: Vec<Vec3>,
    pub impact_effects: Vec<(SurfaceClass, Vec3)>,
}

impl RecordingPlayback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.fire_effects.clear();
        self.impact_effects.clear();
    }
}

impl CosmeticPlayback for RecordingPlayback {
    fn play_fire_effects(&mut self, end_point: Vec3) {
        self.fire_effects.push(end_point);
    }

    fn play_impact_effects(&mut self, surface: SurfaceClass, impact_point: Vec3) {
        self.impact_effects.push((surface, impact_point));
    }
}
