pub mod damage;
pub mod effects;
pub mod net;
pub mod participant;
pub mod surface;
pub mod timer;
pub mod weapon;
pub mod world;

pub use damage::{
    AppliedDamage, DamageError, DamageKind, DamageSink, HealthRegistry, ImpactInfo, RecordingSink,
};
pub use effects::{CosmeticPlayback, LogPlayback, RecordingPlayback};
pub use net::{
    BroadcastChannel, ChannelError, DropSimulation, LocalBroadcast, NullRequests, Packet,
    PacketError, PacketHeader, ParticipantId, ReliableChannel, ReliableReceiver, ReliableSender,
    TraceInbox, TraceState, WeaponPacket, PROTOCOL_MAGIC, PROTOCOL_VERSION, reliable_pipe,
};
pub use participant::{AuthorityHost, HostEvent, RemoteClient, validate_fire_request};
pub use surface::{
    ImpactEffectKind, SurfaceClass, VULNERABLE_DAMAGE_MULTIPLIER, damage_multiplier,
    impact_effect_kind,
};
pub use timer::{Clock, SimClock, TIME_EPSILON, TimerHandle, TimerQueue};
pub use weapon::{
    FireOutcome, FireScheduler, FireState, HitScanResolver, Role, ShotDisposition, Weapon,
    WeaponConfig,
};
pub use world::{CombatWorld, EntityId, RayHit, WorldQuery};
