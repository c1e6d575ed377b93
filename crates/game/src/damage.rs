use std::collections::HashMap;

use glam::Vec3;

use crate::surface::SurfaceClass;
use crate::world::EntityId;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DamageKind {
    #[default]
    Bullet,
}

/// Impact metadata forwarded to the damage collaborator alongside the amount.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImpactInfo {
    pub point: Vec3,
    pub surface: SurfaceClass,
}

#[derive(Debug, thiserror::Error)]
pub enum DamageError {
    #[error("unknown damage target: entity {0}")]
    UnknownTarget(EntityId),
}

/// Damage application capability. Callers treat failures as the
/// collaborator's concern: log and continue, the shot still happened.
pub trait DamageSink {
    #[allow(clippy::too_many_arguments)]
    fn apply(
        &mut self,
        target: EntityId,
        amount: f32,
        direction: Vec3,
        impact: ImpactInfo,
        instigator: EntityId,
        causer: EntityId,
        kind: DamageKind,
    ) -> Result<(), DamageError>;
}

/// Authoritative per-entity health. Only the authoritative shot-resolution
/// path writes to it.
#[derive(Debug, Default)]
pub struct HealthRegistry {
    health: HashMap<EntityId, f32>,
}

impl HealthRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, entity: EntityId, max_health: f32) {
        self.health.insert(entity, max_health);
    }

    pub fn health(&self, entity: EntityId) -> Option<f32> {
        self.health.get(&entity).copied()
    }

    pub fn is_alive(&self, entity: EntityId) -> bool {
        self.health(entity).is_some_and(|h| h > 0.0)
    }
}

impl DamageSink for HealthRegistry {
    fn apply(
        &mut self,
        target: EntityId,
        amount: f32,
        _direction: Vec3,
        impact: ImpactInfo,
        instigator: EntityId,
        _causer: EntityId,
        kind: DamageKind,
    ) -> Result<(), DamageError> {
        let health = self
            .health
            .get_mut(&target)
            .ok_or(DamageError::UnknownTarget(target))?;

        *health = (*health - amount).max(0.0);
        log::info!(
            "entity {target} took {amount:.1} {kind:?} damage from entity {instigator} ({:?} at {:.1?}), {:.1} health left",
            impact.surface,
            impact.point,
            *health,
        );
        if *health <= 0.0 {
            log::info!("entity {target} was killed by entity {instigator}");
        }
        Ok(())
    }
}

/// Record of one damage application, as a sink saw it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AppliedDamage {
    pub target: EntityId,
    pub amount: f32,
    pub direction: Vec3,
    pub impact: ImpactInfo,
    pub instigator: EntityId,
    pub causer: EntityId,
    pub kind: DamageKind,
}

/// Sink that only records. Tests assert against it; non-authoritative
/// participants hold one to prove their fire path never applies damage.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub applied: Vec<AppliedDamage>,
}

impl DamageSink for RecordingSink {
    fn apply(
        &mut self,
        target: EntityId,
        amount: f32,
        direction: Vec3,
        impact: ImpactInfo,
        instigator: EntityId,
        causer: EntityId,
        kind: DamageKind,
    ) -> Result<(), DamageError> {
        self.applied.push(AppliedDamage {
            target,
            amount,
            direction,
            impact,
            instigator,
            causer,
            kind,
        });
        Ok(())
    }
}
