use std::collections::VecDeque;

use glam::Vec3;

use crate::damage::{HealthRegistry, RecordingSink};
use crate::effects::CosmeticPlayback;
use crate::net::{
    LocalBroadcast, NullRequests, Packet, ParticipantId, ReliableReceiver, ReliableSender,
    TraceInbox, TraceState, WeaponPacket,
};
use crate::timer::TimerQueue;
use crate::weapon::{FireOutcome, ShotDisposition, Weapon};
use crate::world::{CombatWorld, WorldQuery};

/// Structural validation of a forwarded fire request, distinct from its
/// execution. Rejection is a signal, never an abort.
pub fn validate_fire_request(packet: &Packet, weapon_id: u32) -> bool {
    packet.header.is_valid()
        && matches!(
            packet.payload,
            WeaponPacket::FireRequest { weapon_id: id } if id == weapon_id
        )
}

/// What happened on the authoritative side, for logs and tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HostEvent {
    ShotResolved { time: f32, outcome: FireOutcome },
    ShotThrottled { time: f32 },
    RequestRejected { sequence: u32 },
}

/// The authoritative participant: owns the world, the health registry and
/// the binding copy of the weapon. Forwarded fire requests are processed in
/// arrival order; the weapon's own rate gate serializes them to at most one
/// resolution per interval.
pub struct AuthorityHost<P: CosmeticPlayback> {
    id: ParticipantId,
    pub weapon: Weapon,
    pub world: CombatWorld,
    pub health: HealthRegistry,
    pub timers: TimerQueue,
    pub broadcast: LocalBroadcast,
    pub playback: P,
    inbound: ReliableReceiver,
    requests: NullRequests,
    eye_origin: Vec3,
    aim_direction: Vec3,
    events: VecDeque<HostEvent>,
}

impl<P: CosmeticPlayback> AuthorityHost<P> {
    pub fn new(
        id: ParticipantId,
        weapon: Weapon,
        world: CombatWorld,
        inbound: ReliableReceiver,
        broadcast: LocalBroadcast,
        playback: P,
    ) -> Self {
        Self {
            id,
            weapon,
            world,
            health: HealthRegistry::new(),
            timers: TimerQueue::new(),
            broadcast,
            playback,
            inbound,
            requests: NullRequests,
            eye_origin: Vec3::ZERO,
            aim_direction: Vec3::X,
            events: VecDeque::new(),
        }
    }

    pub fn id(&self) -> ParticipantId {
        self.id
    }

    /// Where the authoritative copy of the owner is looking from.
    pub fn set_view(&mut self, eye_origin: Vec3, aim_direction: Vec3) {
        self.eye_origin = eye_origin;
        self.aim_direction = aim_direction;
    }

    pub fn start_firing(&mut self, now: f32) {
        self.weapon.start_firing(&mut self.timers, now);
    }

    pub fn stop_firing(&mut self) {
        self.weapon.stop_firing(&mut self.timers);
    }

    /// One simulation tick: step the world, execute forwarded requests in
    /// arrival order, then the host's own trigger timers.
    pub fn update(&mut self, now: f32) {
        self.world.step();

        for packet in self.inbound.drain() {
            if !validate_fire_request(&packet, self.weapon.entity()) {
                log::warn!(
                    "host {}: rejected malformed fire request (sequence {})",
                    self.id,
                    packet.header.sequence,
                );
                self.events.push_back(HostEvent::RequestRejected {
                    sequence: packet.header.sequence,
                });
                continue;
            }
            self.fire_once(now);
        }

        for handle in self.timers.poll(now) {
            if self.weapon.owns_timer(handle) {
                self.fire_once(now);
            }
        }
    }

    fn fire_once(&mut self, now: f32) {
        let disposition = self.weapon.fire(
            now,
            self.eye_origin,
            self.aim_direction,
            Some(&self.world as &dyn WorldQuery),
            &mut self.health,
            &mut self.playback,
            &mut self.requests,
            &mut self.broadcast,
        );
        match disposition {
            ShotDisposition::Resolved(outcome) => {
                self.events.push_back(HostEvent::ShotResolved { time: now, outcome });
            }
            ShotDisposition::Throttled => {
                self.events.push_back(HostEvent::ShotThrottled { time: now });
            }
            ShotDisposition::Forwarded => {}
        }
    }

    pub fn drain_events(&mut self) -> Vec<HostEvent> {
        self.events.drain(..).collect()
    }
}

/// A non-authoritative participant. Its fire path only ever forwards a
/// trigger and plays a prediction; its observer path replays whatever trace
/// the authority pushes, without re-deriving anything.
pub struct RemoteClient<P: CosmeticPlayback> {
    id: ParticipantId,
    pub weapon: Weapon,
    /// Client-side geometry replica for prediction. Absent means predicted
    /// shots degrade to misses at max range.
    pub world: Option<CombatWorld>,
    /// Proves the remote path never applies damage: stays empty.
    pub predicted_sink: RecordingSink,
    pub timers: TimerQueue,
    pub playback: P,
    requests: ReliableSender,
    traces: TraceInbox,
    null_broadcast: LocalBroadcast,
    eye_origin: Vec3,
    aim_direction: Vec3,
    replica_trace: Option<TraceState>,
    replays: u64,
}

impl<P: CosmeticPlayback> RemoteClient<P> {
    pub fn new(
        id: ParticipantId,
        weapon: Weapon,
        requests: ReliableSender,
        traces: TraceInbox,
        playback: P,
    ) -> Self {
        Self {
            id,
            weapon,
            world: None,
            predicted_sink: RecordingSink::default(),
            timers: TimerQueue::new(),
            playback,
            requests,
            traces,
            null_broadcast: LocalBroadcast::new(),
            eye_origin: Vec3::ZERO,
            aim_direction: Vec3::X,
            replica_trace: None,
            replays: 0,
        }
    }

    pub fn id(&self) -> ParticipantId {
        self.id
    }

    pub fn set_view(&mut self, eye_origin: Vec3, aim_direction: Vec3) {
        self.eye_origin = eye_origin;
        self.aim_direction = aim_direction;
    }

    /// Read-only replica of the last authoritative trace received.
    pub fn replica_trace(&self) -> Option<TraceState> {
        self.replica_trace
    }

    /// How many authoritative traces this observer has replayed.
    pub fn replays(&self) -> u64 {
        self.replays
    }

    pub fn start_firing(&mut self, now: f32) {
        self.weapon.start_firing(&mut self.timers, now);
    }

    pub fn stop_firing(&mut self) {
        self.weapon.stop_firing(&mut self.timers);
    }

    /// One simulation tick: run the trigger, then replay any received
    /// authoritative traces.
    pub fn update(&mut self, now: f32) {
        if let Some(world) = self.world.as_mut() {
            world.step();
        }

        for handle in self.timers.poll(now) {
            if self.weapon.owns_timer(handle) {
                self.fire_once(now);
            }
        }

        for packet in self.traces.drain() {
            self.handle_trace_update(packet);
        }
    }

    fn fire_once(&mut self, now: f32) {
        let world = self.world.as_ref().map(|w| w as &dyn WorldQuery);
        self.weapon.fire(
            now,
            self.eye_origin,
            self.aim_direction,
            world,
            &mut self.predicted_sink,
            &mut self.playback,
            &mut self.requests,
            &mut self.null_broadcast,
        );
    }

    fn handle_trace_update(&mut self, packet: Packet) {
        if !packet.header.is_valid() {
            log::warn!("client {}: discarded trace update with bad header", self.id);
            return;
        }
        let WeaponPacket::TraceUpdate { weapon_id, trace } = packet.payload else {
            log::debug!("client {}: ignored non-trace packet on trace channel", self.id);
            return;
        };
        if weapon_id != self.weapon.entity() {
            return;
        }

        // Every received update is a fresh authoritative commit. Replay uses
        // the transmitted state and nothing else; damage is never rederived.
        let end_point = trace.decode_end_point();
        self.playback.play_fire_effects(end_point);
        self.playback.play_impact_effects(trace.surface, end_point);
        self.replica_trace = Some(trace);
        self.replays += 1;
    }
}
