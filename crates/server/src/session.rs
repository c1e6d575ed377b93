use std::time::{Duration, Instant};

use glam::Vec3;

use longshot::{
    AuthorityHost, Clock, CombatWorld, DropSimulation, EntityId, HostEvent, LocalBroadcast,
    LogPlayback, RemoteClient, Role, SimClock, SurfaceClass, Weapon, WeaponConfig, reliable_pipe,
};

const HOST: u32 = 0;
const SHOOTER: u32 = 2;
const OBSERVER: u32 = 3;
const WEAPON_ID: u32 = 100;

const EYE_HEIGHT: f32 = 1.6;

pub struct DemoConfig {
    pub tick_rate: u32,
    pub duration_secs: f32,
    pub seed: u64,
    pub loss_percent: f32,
}

/// Shooting range shared by the authority and the shooter's replica: the
/// firing body at the origin, a vulnerable wall 10 units down +X and a
/// default-surface ground plane.
fn build_range() -> (CombatWorld, EntityId, EntityId) {
    let mut world = CombatWorld::new();
    world.add_ground(-1.0, 100.0);
    let shooter = world.add_shooter(Vec3::ZERO, 0.3, 1.8);
    let wall = world.add_target(
        Vec3::new(10.0, 0.0, 0.0),
        Vec3::new(0.5, 5.0, 5.0),
        SurfaceClass::FleshVulnerable,
    );
    (world, shooter, wall)
}

/// One authority and two remotes wired over in-memory channels: the shooter
/// holds the trigger, the observer only replays broadcast traces.
pub struct DemoSession {
    config: DemoConfig,
    host: AuthorityHost<LogPlayback>,
    shooter: RemoteClient<LogPlayback>,
    observer: RemoteClient<LogPlayback>,
    wall: EntityId,
    clock: SimClock,
    resolved: u32,
    throttled: u32,
    rejected: u32,
}

impl DemoSession {
    pub fn new(config: DemoConfig) -> Self {
        let (host_world, shooter_entity, wall) = build_range();
        let (replica_world, _, _) = build_range();

        let (request_tx, request_rx) = reliable_pipe();
        let mut broadcast = if config.loss_percent > 0.0 {
            LocalBroadcast::with_drop_simulation(DropSimulation::new(
                config.loss_percent,
                config.seed,
            ))
        } else {
            LocalBroadcast::new()
        };
        let shooter_inbox = broadcast.subscribe(SHOOTER);
        let observer_inbox = broadcast.subscribe(OBSERVER);

        let eye = Vec3::new(0.0, EYE_HEIGHT, 0.0);

        let authoritative = Weapon::new(
            WEAPON_ID,
            shooter_entity,
            SHOOTER,
            Role::Authoritative,
            WeaponConfig::default(),
            config.seed,
        );
        let mut host = AuthorityHost::new(
            HOST,
            authoritative,
            host_world,
            request_rx,
            broadcast,
            LogPlayback::new("host"),
        );
        host.health.register(wall, 200.0);
        host.set_view(eye, Vec3::X);

        let predicted = Weapon::new(
            WEAPON_ID,
            shooter_entity,
            SHOOTER,
            Role::Remote,
            WeaponConfig::default(),
            config.seed.wrapping_add(1),
        );
        let mut shooter = RemoteClient::new(
            SHOOTER,
            predicted,
            request_tx.clone(),
            shooter_inbox,
            LogPlayback::new("shooter"),
        );
        shooter.world = Some(replica_world);
        shooter.set_view(eye, Vec3::X);

        let observed = Weapon::new(
            WEAPON_ID,
            shooter_entity,
            SHOOTER,
            Role::Remote,
            WeaponConfig::default(),
            config.seed.wrapping_add(2),
        );
        let observer = RemoteClient::new(
            OBSERVER,
            observed,
            request_tx,
            observer_inbox,
            LogPlayback::new("observer"),
        );

        Self {
            config,
            host,
            shooter,
            observer,
            wall,
            clock: SimClock::new(),
            resolved: 0,
            throttled: 0,
            rejected: 0,
        }
    }

    /// Fixed-tick run loop. The trigger is held for the first half of the
    /// run, released, then pressed again at the three-quarter mark to show
    /// that idle time banks no shots.
    pub fn run(&mut self) {
        let tick_duration = Duration::from_secs_f64(1.0 / self.config.tick_rate as f64);
        let dt = 1.0 / self.config.tick_rate as f32;
        let total_ticks = (self.config.duration_secs / dt).ceil() as u64;
        let release_tick = total_ticks / 2;
        let press_again_tick = total_ticks * 3 / 4;

        self.shooter.start_firing(self.clock.now());
        log::info!("trigger pressed at t={:.3}", self.clock.now());

        let mut last_tick_time = Instant::now();
        let mut accumulator = Duration::ZERO;
        let mut tick = 0u64;

        while tick < total_ticks {
            let now = Instant::now();
            accumulator += now - last_tick_time;
            last_tick_time = now;

            while accumulator >= tick_duration && tick < total_ticks {
                accumulator -= tick_duration;
                self.step(dt);
                tick += 1;

                if tick == release_tick {
                    self.shooter.stop_firing();
                    log::info!("trigger released at t={:.3}", self.clock.now());
                }
                if tick == press_again_tick {
                    self.shooter.start_firing(self.clock.now());
                    log::info!("trigger pressed again at t={:.3}", self.clock.now());
                }
            }

            std::thread::sleep(Duration::from_millis(1));
        }
    }

    fn step(&mut self, dt: f32) {
        let now = self.clock.now();
        self.shooter.update(now);
        self.host.update(now);
        self.observer.update(now);

        for event in self.host.drain_events() {
            match event {
                HostEvent::ShotResolved { time, outcome } => {
                    self.resolved += 1;
                    match outcome.target {
                        Some(target) => log::info!(
                            "shot at t={time:.3} hit entity {target} for {:.0} ({:?})",
                            outcome.damage,
                            outcome.surface,
                        ),
                        None => log::info!("shot at t={time:.3} missed"),
                    }
                }
                HostEvent::ShotThrottled { time } => {
                    self.throttled += 1;
                    log::debug!("shot attempt at t={time:.3} throttled");
                }
                HostEvent::RequestRejected { sequence } => {
                    self.rejected += 1;
                    log::warn!("rejected fire request (sequence {sequence})");
                }
            }
        }

        self.clock.advance(dt);
    }

    pub fn log_summary(&self) {
        log::info!(
            "resolved {} shots ({} throttled, {} rejected)",
            self.resolved,
            self.throttled,
            self.rejected,
        );
        match self.host.health.health(self.wall) {
            Some(health) => log::info!("wall health: {health:.0}"),
            None => log::info!("wall health: unregistered"),
        }
        log::info!(
            "observer replayed {} traces, shooter replayed {} (owner is skipped)",
            self.observer.replays(),
            self.shooter.replays(),
        );
    }
}
