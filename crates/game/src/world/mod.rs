mod combat;

pub use combat::CombatWorld;

use glam::Vec3;

use crate::surface::SurfaceClass;

pub type EntityId = u32;

/// Result of a single weapon ray query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub entity: EntityId,
    pub point: Vec3,
    pub surface: SurfaceClass,
}

/// World query capability: "is there a surface along this ray, and if so
/// where and what". Entities in `exclude` are invisible to the query;
/// unknown ids in the set are ignored.
pub trait WorldQuery {
    fn trace(&self, origin: Vec3, end: Vec3, exclude: &[EntityId]) -> Option<RayHit>;
}
