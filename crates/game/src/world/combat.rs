use glam::Vec3;
use rapier3d::prelude::*;

use crate::surface::SurfaceClass;

use super::{EntityId, RayHit, WorldQuery};

fn pack_user_data(entity: EntityId, surface: SurfaceClass) -> u128 {
    ((entity as u128) << 8) | surface.to_bits() as u128
}

fn unpack_entity(user_data: u128) -> EntityId {
    (user_data >> 8) as EntityId
}

fn unpack_surface(user_data: u128) -> SurfaceClass {
    SurfaceClass::from_bits((user_data & 0xff) as u8)
}

/// Physics-backed combat geometry. Every collider carries its entity id and
/// surface classification in `user_data` so a ray hit resolves both without
/// a side table.
pub struct CombatWorld {
    pipeline: PhysicsPipeline,
    integration_parameters: IntegrationParameters,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    pub bodies: RigidBodySet,
    pub colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    gravity: Vector,
    next_entity_id: EntityId,
}

impl Default for CombatWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl CombatWorld {
    const TICK_RATE: Real = 1.0 / 60.0;

    pub fn new() -> Self {
        let mut integration_parameters = IntegrationParameters::default();
        integration_parameters.dt = Self::TICK_RATE;

        Self {
            pipeline: PhysicsPipeline::new(),
            integration_parameters,
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            gravity: Vector::new(0.0, -9.81, 0.0),
            next_entity_id: 1,
        }
    }

    /// Must run at least once after registering geometry so the broad phase
    /// sees it; the tick loop calls this every step.
    pub fn step(&mut self) {
        self.pipeline.step(
            self.gravity,
            &self.integration_parameters,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            &(),
            &(),
        );
    }

    fn allocate_id(&mut self) -> EntityId {
        let id = self.next_entity_id;
        self.next_entity_id += 1;
        id
    }

    /// Static box target with a surface classification.
    pub fn add_target(
        &mut self,
        position: Vec3,
        half_extents: Vec3,
        surface: SurfaceClass,
    ) -> EntityId {
        let id = self.allocate_id();
        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            .translation(Vector::new(position.x, position.y, position.z))
            .user_data(pack_user_data(id, surface))
            .build();
        self.colliders.insert(collider);
        id
    }

    /// Kinematic shooter body. Registered so the firer can be excluded from
    /// its own shots.
    pub fn add_shooter(&mut self, position: Vec3, radius: Real, height: Real) -> EntityId {
        let id = self.allocate_id();
        let body = RigidBodyBuilder::kinematic_position_based()
            .translation(Vector::new(position.x, position.y, position.z))
            .lock_rotations()
            .build();
        let handle = self.bodies.insert(body);

        let collider = ColliderBuilder::cylinder(height / 2.0, radius)
            .user_data(pack_user_data(id, SurfaceClass::FleshDefault))
            .build();
        self.colliders
            .insert_with_parent(collider, handle, &mut self.bodies);

        id
    }

    pub fn add_ground(&mut self, y: Real, half_size: Real) -> EntityId {
        let id = self.allocate_id();
        let collider = ColliderBuilder::cuboid(half_size, 0.1, half_size)
            .translation(Vector::new(0.0, y, 0.0))
            .user_data(pack_user_data(id, SurfaceClass::Default))
            .build();
        self.colliders.insert(collider);
        id
    }
}

impl WorldQuery for CombatWorld {
    fn trace(&self, origin: Vec3, end: Vec3, exclude: &[EntityId]) -> Option<RayHit> {
        let span = end - origin;
        let length = span.length();
        if length <= f32::EPSILON {
            return None;
        }
        let direction = span / length;

        let predicate = |_handle: ColliderHandle, collider: &Collider| {
            !exclude.contains(&unpack_entity(collider.user_data))
        };
        let filter = QueryFilter::default().predicate(&predicate);
        let query = self.broad_phase.as_query_pipeline(
            self.narrow_phase.query_dispatcher(),
            &self.bodies,
            &self.colliders,
            filter,
        );

        let ray = Ray::new(
            Vector::new(origin.x, origin.y, origin.z),
            Vector::new(direction.x, direction.y, direction.z),
        );

        query.cast_ray(&ray, length, true).map(|(handle, toi)| {
            let collider = &self.colliders[handle];
            RayHit {
                entity: unpack_entity(collider.user_data),
                point: origin + direction * toi,
                surface: unpack_surface(collider.user_data),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world_with_wall(surface: SurfaceClass) -> (CombatWorld, EntityId) {
        let mut world = CombatWorld::new();
        let wall = world.add_target(Vec3::new(10.0, 0.0, 0.0), Vec3::new(0.5, 5.0, 5.0), surface);
        world.step();
        (world, wall)
    }

    #[test]
    fn trace_reports_entity_point_and_surface() {
        let (world, wall) = world_with_wall(SurfaceClass::FleshVulnerable);

        let hit = world
            .trace(Vec3::ZERO, Vec3::new(100.0, 0.0, 0.0), &[])
            .expect("wall should block the ray");

        assert_eq!(hit.entity, wall);
        assert_eq!(hit.surface, SurfaceClass::FleshVulnerable);
        assert!((hit.point.x - 9.5).abs() < 1e-3);
    }

    #[test]
    fn excluded_entities_are_invisible() {
        let (world, wall) = world_with_wall(SurfaceClass::Default);

        assert!(
            world
                .trace(Vec3::ZERO, Vec3::new(100.0, 0.0, 0.0), &[wall])
                .is_none()
        );
        // Unknown ids in the exclude set are simply ignored.
        assert!(
            world
                .trace(Vec3::ZERO, Vec3::new(100.0, 0.0, 0.0), &[9999])
                .is_some()
        );
    }

    #[test]
    fn shooter_does_not_block_its_own_shot() {
        let mut world = CombatWorld::new();
        let shooter = world.add_shooter(Vec3::ZERO, 0.3, 1.8);
        let wall = world.add_target(
            Vec3::new(5.0, 0.0, 0.0),
            Vec3::new(0.5, 5.0, 5.0),
            SurfaceClass::Default,
        );
        world.step();

        let hit = world
            .trace(Vec3::ZERO, Vec3::new(100.0, 0.0, 0.0), &[shooter])
            .expect("wall should still be visible");
        assert_eq!(hit.entity, wall);
    }

    #[test]
    fn zero_length_ray_misses() {
        let (world, _) = world_with_wall(SurfaceClass::Default);
        assert!(world.trace(Vec3::ZERO, Vec3::ZERO, &[]).is_none());
    }

    #[test]
    fn ray_stops_at_max_range() {
        let (world, _) = world_with_wall(SurfaceClass::Default);
        // Wall face is at x = 9.5; a 5-unit ray falls short.
        assert!(
            world
                .trace(Vec3::ZERO, Vec3::new(5.0, 0.0, 0.0), &[])
                .is_none()
        );
    }
}
