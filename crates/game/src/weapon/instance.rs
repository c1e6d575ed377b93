use glam::Vec3;

use crate::damage::{DamageKind, DamageSink, ImpactInfo};
use crate::effects::CosmeticPlayback;
use crate::net::{
    BroadcastChannel, Packet, PacketHeader, ParticipantId, ReliableChannel, TraceState,
    WeaponPacket,
};
use crate::timer::{TIME_EPSILON, TimerHandle, TimerQueue};
use crate::world::{EntityId, WorldQuery};

use super::config::WeaponConfig;
use super::resolver::{FireOutcome, HitScanResolver};
use super::scheduler::{FireScheduler, FireState};

/// Which side of the authority boundary this weapon instance lives on.
/// Always an explicit field, never ambient context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Authoritative,
    Remote,
}

/// What became of one shot attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShotDisposition {
    /// Authoritative path: the shot resolved here and is binding.
    Resolved(FireOutcome),
    /// Remote path: a trigger was forwarded to the authority and a predicted
    /// trace was played locally. No damage decision was made.
    Forwarded,
    /// The authoritative rate gate refused the attempt: the minimum interval
    /// has not elapsed on this side's own clock.
    Throttled,
}

/// One equipped weapon. Created on equip, dropped on unequip; the owner
/// reference is just an entity id, never ownership.
pub struct Weapon {
    entity: EntityId,
    owner: EntityId,
    owner_participant: ParticipantId,
    role: Role,
    config: WeaponConfig,
    resolver: HitScanResolver,
    scheduler: FireScheduler,
    last_fire_time: f32,
    trace: Option<TraceState>,
    send_sequence: u32,
}

impl Weapon {
    pub fn new(
        entity: EntityId,
        owner: EntityId,
        owner_participant: ParticipantId,
        role: Role,
        config: WeaponConfig,
        seed: u64,
    ) -> Self {
        // A freshly equipped weapon may fire immediately.
        let last_fire_time = -config.min_interval();
        Self {
            entity,
            owner,
            owner_participant,
            role,
            config,
            resolver: HitScanResolver::new(seed),
            scheduler: FireScheduler::new(),
            last_fire_time,
            trace: None,
            send_sequence: 0,
        }
    }

    pub fn entity(&self) -> EntityId {
        self.entity
    }

    pub fn owner(&self) -> EntityId {
        self.owner
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn config(&self) -> &WeaponConfig {
        &self.config
    }

    pub fn last_fire_time(&self) -> f32 {
        self.last_fire_time
    }

    pub fn set_last_fire_time(&mut self, t: f32) {
        self.last_fire_time = t;
    }

    /// The committed trace of the most recent authoritative shot.
    pub fn trace(&self) -> Option<TraceState> {
        self.trace
    }

    pub fn fire_state(&self) -> FireState {
        self.scheduler.state()
    }

    /// Trigger pressed. Periodic shot attempts begin after the no-banking
    /// first delay; idempotent while already firing.
    pub fn start_firing(&mut self, timers: &mut TimerQueue, now: f32) {
        self.scheduler
            .start_firing(timers, now, self.last_fire_time, self.config.min_interval());
    }

    /// Trigger released. Cancels any pending shot attempt immediately.
    pub fn stop_firing(&mut self, timers: &mut TimerQueue) {
        self.scheduler.stop_firing(timers);
    }

    /// Whether a due timer belongs to this weapon's trigger.
    pub fn owns_timer(&self, handle: TimerHandle) -> bool {
        self.scheduler.owns(handle)
    }

    fn next_header(&mut self) -> PacketHeader {
        let header = PacketHeader::new(self.send_sequence);
        self.send_sequence = self.send_sequence.wrapping_add(1);
        header
    }

    /// One shot attempt, routed through the authority gate. Exactly one
    /// participant resolves the shot and applies damage; every other
    /// participant only ever sees the resulting trace state.
    #[allow(clippy::too_many_arguments)]
    pub fn fire(
        &mut self,
        now: f32,
        origin: Vec3,
        aim_direction: Vec3,
        world: Option<&dyn WorldQuery>,
        sink: &mut dyn DamageSink,
        playback: &mut dyn CosmeticPlayback,
        requests: &mut dyn ReliableChannel,
        broadcast: &mut dyn BroadcastChannel,
    ) -> ShotDisposition {
        match self.role {
            Role::Remote => self.fire_remote(now, origin, aim_direction, world, playback, requests),
            Role::Authoritative => {
                self.fire_authoritative(now, origin, aim_direction, world, sink, playback, broadcast)
            }
        }
    }

    /// Non-authoritative path: forward a trigger signal, then play a locally
    /// predicted trace. The prediction may diverge from the authoritative
    /// result; that is accepted and never reconciled.
    fn fire_remote(
        &mut self,
        now: f32,
        origin: Vec3,
        aim_direction: Vec3,
        world: Option<&dyn WorldQuery>,
        playback: &mut dyn CosmeticPlayback,
        requests: &mut dyn ReliableChannel,
    ) -> ShotDisposition {
        let header = self.next_header();
        let request = Packet::new(
            header,
            WeaponPacket::FireRequest {
                weapon_id: self.entity,
            },
        );
        if let Err(err) = requests.send(request) {
            log::error!("weapon {}: failed to forward fire request: {err}", self.entity);
        }

        let exclude = [self.owner, self.entity];
        let outcome = self
            .resolver
            .resolve(world, origin, aim_direction, &self.config, &exclude);

        playback.play_fire_effects(outcome.impact_point);
        if outcome.hit {
            playback.play_impact_effects(outcome.surface, outcome.impact_point);
        }

        // Local trigger clock only; the authoritative copy keeps its own.
        self.last_fire_time = now;
        ShotDisposition::Forwarded
    }

    /// Authoritative path: rate-gate on our own clock, resolve, apply
    /// damage, commit and broadcast the trace, play local effects without
    /// waiting for the replication round-trip.
    fn fire_authoritative(
        &mut self,
        now: f32,
        origin: Vec3,
        aim_direction: Vec3,
        world: Option<&dyn WorldQuery>,
        sink: &mut dyn DamageSink,
        playback: &mut dyn CosmeticPlayback,
        broadcast: &mut dyn BroadcastChannel,
    ) -> ShotDisposition {
        if now + TIME_EPSILON < self.last_fire_time + self.config.min_interval() {
            log::debug!(
                "weapon {}: attempt at t={now:.3} inside the {:.3}s interval, throttled",
                self.entity,
                self.config.min_interval(),
            );
            return ShotDisposition::Throttled;
        }

        let exclude = [self.owner, self.entity];
        let outcome = self
            .resolver
            .resolve(world, origin, aim_direction, &self.config, &exclude);

        if let Some(target) = outcome.target {
            let direction = (outcome.impact_point - origin).normalize_or_zero();
            let impact = ImpactInfo {
                point: outcome.impact_point,
                surface: outcome.surface,
            };
            // Fire and forget: a sink failure never aborts the shot's
            // bookkeeping.
            if let Err(err) = sink.apply(
                target,
                outcome.damage,
                direction,
                impact,
                self.owner,
                self.entity,
                DamageKind::Bullet,
            ) {
                log::warn!("weapon {}: damage application failed: {err}", self.entity);
            }
        }

        self.last_fire_time = now;

        let trace = TraceState::from_end_point(outcome.surface, outcome.impact_point);
        self.trace = Some(trace);
        let header = self.next_header();
        broadcast.broadcast(
            Packet::new(
                header,
                WeaponPacket::TraceUpdate {
                    weapon_id: self.entity,
                    trace,
                },
            ),
            self.owner_participant,
        );

        playback.play_fire_effects(outcome.impact_point);
        if outcome.hit {
            playback.play_impact_effects(outcome.surface, outcome.impact_point);
        }

        ShotDisposition::Resolved(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::damage::{DamageError, RecordingSink};
    use crate::effects::RecordingPlayback;
    use crate::net::{LocalBroadcast, NullRequests, reliable_pipe};
    use crate::surface::SurfaceClass;
    use crate::world::RayHit;

    struct FixedHit(RayHit);

    impl WorldQuery for FixedHit {
        fn trace(&self, _origin: Vec3, _end: Vec3, _exclude: &[EntityId]) -> Option<RayHit> {
            Some(self.0)
        }
    }

    fn vulnerable_world() -> FixedHit {
        FixedHit(RayHit {
            entity: 9,
            point: Vec3::new(20.0, 0.0, 0.0),
            surface: SurfaceClass::FleshVulnerable,
        })
    }

    fn zero_spread_config() -> WeaponConfig {
        WeaponConfig {
            bullet_spread_deg: 0.0,
            ..Default::default()
        }
    }

    fn authoritative_weapon() -> Weapon {
        Weapon::new(100, 1, 2, Role::Authoritative, zero_spread_config(), 7)
    }

    #[test]
    fn authoritative_fire_applies_damage_commits_and_broadcasts() {
        let mut weapon = authoritative_weapon();
        let world = vulnerable_world();
        let mut sink = RecordingSink::default();
        let mut playback = RecordingPlayback::new();
        let mut requests = NullRequests;
        let mut broadcast = LocalBroadcast::new();
        let mut owner_inbox = broadcast.subscribe(2);
        let mut observer_inbox = broadcast.subscribe(3);

        let disposition = weapon.fire(
            0.0,
            Vec3::ZERO,
            Vec3::X,
            Some(&world),
            &mut sink,
            &mut playback,
            &mut requests,
            &mut broadcast,
        );

        let ShotDisposition::Resolved(outcome) = disposition else {
            panic!("expected a resolved shot, got {disposition:?}");
        };
        assert!(outcome.hit);
        assert_eq!(outcome.damage, 80.0);

        assert_eq!(sink.applied.len(), 1);
        assert_eq!(sink.applied[0].target, 9);
        assert_eq!(sink.applied[0].amount, 80.0);
        assert_eq!(sink.applied[0].instigator, 1);
        assert_eq!(sink.applied[0].causer, 100);

        let trace = weapon.trace().expect("trace should be committed");
        assert_eq!(trace.surface, SurfaceClass::FleshVulnerable);
        assert_eq!(weapon.last_fire_time(), 0.0);

        // Owner already played its effects; only the observer gets the push.
        assert!(owner_inbox.drain().is_empty());
        let pushed = observer_inbox.drain();
        assert_eq!(pushed.len(), 1);
        assert!(matches!(
            pushed[0].payload,
            WeaponPacket::TraceUpdate { weapon_id: 100, trace: t } if t == trace
        ));

        assert_eq!(playback.fire_effects.len(), 1);
        assert_eq!(playback.impact_effects.len(), 1);
    }

    #[test]
    fn remote_fire_forwards_a_trigger_and_predicts_locally() {
        let mut weapon = Weapon::new(100, 1, 2, Role::Remote, zero_spread_config(), 7);
        let world = vulnerable_world();
        let mut sink = RecordingSink::default();
        let mut playback = RecordingPlayback::new();
        let (mut tx, mut rx) = reliable_pipe();
        let mut broadcast = LocalBroadcast::new();
        let mut observer_inbox = broadcast.subscribe(3);

        let disposition = weapon.fire(
            0.0,
            Vec3::ZERO,
            Vec3::X,
            Some(&world),
            &mut sink,
            &mut playback,
            &mut tx,
            &mut broadcast,
        );

        assert_eq!(disposition, ShotDisposition::Forwarded);

        let forwarded = rx.drain();
        assert_eq!(forwarded.len(), 1);
        assert!(matches!(
            forwarded[0].payload,
            WeaponPacket::FireRequest { weapon_id: 100 }
        ));

        // Prediction is cosmetic only: no damage, no commit, no broadcast.
        assert!(sink.applied.is_empty());
        assert!(weapon.trace().is_none());
        assert!(observer_inbox.drain().is_empty());
        assert_eq!(playback.fire_effects.len(), 1);
        assert_eq!(playback.impact_effects.len(), 1);
    }

    #[test]
    fn rate_gate_throttles_early_attempts() {
        let mut weapon = authoritative_weapon();
        let world = vulnerable_world();
        let mut sink = RecordingSink::default();
        let mut playback = RecordingPlayback::new();
        let mut requests = NullRequests;
        let mut broadcast = LocalBroadcast::new();

        let first = weapon.fire(
            0.0,
            Vec3::ZERO,
            Vec3::X,
            Some(&world),
            &mut sink,
            &mut playback,
            &mut requests,
            &mut broadcast,
        );
        assert!(matches!(first, ShotDisposition::Resolved(_)));

        let early = weapon.fire(
            0.05,
            Vec3::ZERO,
            Vec3::X,
            Some(&world),
            &mut sink,
            &mut playback,
            &mut requests,
            &mut broadcast,
        );
        assert_eq!(early, ShotDisposition::Throttled);
        assert_eq!(sink.applied.len(), 1);

        let on_time = weapon.fire(
            0.1,
            Vec3::ZERO,
            Vec3::X,
            Some(&world),
            &mut sink,
            &mut playback,
            &mut requests,
            &mut broadcast,
        );
        assert!(matches!(on_time, ShotDisposition::Resolved(_)));
        assert_eq!(sink.applied.len(), 2);
    }

    #[test]
    fn miss_commits_a_trace_at_max_range_without_damage() {
        struct Empty;
        impl WorldQuery for Empty {
            fn trace(&self, _o: Vec3, _e: Vec3, _x: &[EntityId]) -> Option<RayHit> {
                None
            }
        }

        let mut weapon = authoritative_weapon();
        let mut sink = RecordingSink::default();
        let mut playback = RecordingPlayback::new();
        let mut requests = NullRequests;
        let mut broadcast = LocalBroadcast::new();

        let disposition = weapon.fire(
            0.0,
            Vec3::ZERO,
            Vec3::X,
            Some(&Empty),
            &mut sink,
            &mut playback,
            &mut requests,
            &mut broadcast,
        );

        let ShotDisposition::Resolved(outcome) = disposition else {
            panic!("expected a resolved miss");
        };
        assert!(!outcome.hit);
        assert!(sink.applied.is_empty());

        let trace = weapon.trace().unwrap();
        assert_eq!(trace.surface, SurfaceClass::Default);
        assert_eq!(trace.decode_end_point().x, 10_000.0);

        assert_eq!(playback.fire_effects.len(), 1);
        assert!(playback.impact_effects.is_empty());
    }

    #[test]
    fn sink_failure_does_not_abort_the_shot() {
        struct FailingSink;
        impl DamageSink for FailingSink {
            fn apply(
                &mut self,
                target: EntityId,
                _amount: f32,
                _direction: Vec3,
                _impact: ImpactInfo,
                _instigator: EntityId,
                _causer: EntityId,
                _kind: DamageKind,
            ) -> Result<(), DamageError> {
                Err(DamageError::UnknownTarget(target))
            }
        }

        let mut weapon = authoritative_weapon();
        let world = vulnerable_world();
        let mut sink = FailingSink;
        let mut playback = RecordingPlayback::new();
        let mut requests = NullRequests;
        let mut broadcast = LocalBroadcast::new();
        let mut observer_inbox = broadcast.subscribe(3);

        let disposition = weapon.fire(
            0.0,
            Vec3::ZERO,
            Vec3::X,
            Some(&world),
            &mut sink,
            &mut playback,
            &mut requests,
            &mut broadcast,
        );

        assert!(matches!(disposition, ShotDisposition::Resolved(_)));
        assert!(weapon.trace().is_some());
        assert_eq!(weapon.last_fire_time(), 0.0);
        assert_eq!(observer_inbox.drain().len(), 1);
        assert_eq!(playback.fire_effects.len(), 1);
    }
}
