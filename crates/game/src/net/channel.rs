use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::protocol::Packet;

pub type ParticipantId = u32;

#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("channel closed")]
    Closed,
}

/// Requester-to-authority channel. The transport guarantees delivery and
/// ordering; a dropped fire request would be a missed shot.
pub trait ReliableChannel {
    fn send(&mut self, packet: Packet) -> Result<(), ChannelError>;
}

/// Authority-to-observers channel. Best effort: a dropped update costs one
/// cosmetic replay and nothing else, so there are no acks and no retries.
pub trait BroadcastChannel {
    fn broadcast(&mut self, packet: Packet, exclude: ParticipantId);
}

/// Loss model for the best-effort side, seeded for reproducible runs.
#[derive(Debug)]
pub struct DropSimulation {
    loss_percent: f32,
    rng: ChaCha8Rng,
}

impl DropSimulation {
    pub fn new(loss_percent: f32, seed: u64) -> Self {
        Self {
            loss_percent,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn should_drop(&mut self) -> bool {
        self.loss_percent > 0.0 && self.rng.gen_range(0.0..100.0) < self.loss_percent
    }
}

type SharedQueue = Rc<RefCell<VecDeque<Packet>>>;

/// In-memory reliable pipe for the single-threaded simulation. The sender
/// half lives with the requester, the receiver half with the authority.
pub fn reliable_pipe() -> (ReliableSender, ReliableReceiver) {
    let queue: SharedQueue = Rc::new(RefCell::new(VecDeque::new()));
    (
        ReliableSender {
            queue: Rc::clone(&queue),
        },
        ReliableReceiver { queue },
    )
}

#[derive(Debug, Clone)]
pub struct ReliableSender {
    queue: SharedQueue,
}

impl ReliableChannel for ReliableSender {
    fn send(&mut self, packet: Packet) -> Result<(), ChannelError> {
        self.queue.borrow_mut().push_back(packet);
        Ok(())
    }
}

#[derive(Debug)]
pub struct ReliableReceiver {
    queue: SharedQueue,
}

impl ReliableReceiver {
    /// Drains in arrival order.
    pub fn drain(&mut self) -> Vec<Packet> {
        self.queue.borrow_mut().drain(..).collect()
    }
}

/// Reliable channel for a participant that is itself the authority: nothing
/// to forward to, so sends are discarded. The authoritative fire path never
/// invokes it.
#[derive(Debug, Default)]
pub struct NullRequests;

impl ReliableChannel for NullRequests {
    fn send(&mut self, _packet: Packet) -> Result<(), ChannelError> {
        Ok(())
    }
}

/// In-memory fan-out for trace updates, with optional loss simulation.
#[derive(Debug)]
pub struct LocalBroadcast {
    subscribers: Vec<(ParticipantId, SharedQueue)>,
    drop_simulation: Option<DropSimulation>,
}

impl Default for LocalBroadcast {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalBroadcast {
    pub fn new() -> Self {
        Self {
            subscribers: Vec::new(),
            drop_simulation: None,
        }
    }

    pub fn with_drop_simulation(drop_simulation: DropSimulation) -> Self {
        Self {
            subscribers: Vec::new(),
            drop_simulation: Some(drop_simulation),
        }
    }

    pub fn subscribe(&mut self, id: ParticipantId) -> TraceInbox {
        let queue: SharedQueue = Rc::new(RefCell::new(VecDeque::new()));
        self.subscribers.push((id, Rc::clone(&queue)));
        TraceInbox { queue }
    }
}

impl BroadcastChannel for LocalBroadcast {
    fn broadcast(&mut self, packet: Packet, exclude: ParticipantId) {
        for (id, queue) in &self.subscribers {
            if *id == exclude {
                continue;
            }
            if let Some(sim) = self.drop_simulation.as_mut() {
                if sim.should_drop() {
                    log::trace!("dropped trace update for participant {id}");
                    continue;
                }
            }
            queue.borrow_mut().push_back(packet.clone());
        }
    }
}

/// Observer-side receive queue for trace updates.
#[derive(Debug)]
pub struct TraceInbox {
    queue: SharedQueue,
}

impl TraceInbox {
    pub fn drain(&mut self) -> Vec<Packet> {
        self.queue.borrow_mut().drain(..).collect()
    }
}
