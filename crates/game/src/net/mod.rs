mod channel;
mod protocol;

pub use channel::{
    BroadcastChannel, ChannelError, DropSimulation, LocalBroadcast, NullRequests, ParticipantId,
    ReliableChannel, ReliableReceiver, ReliableSender, TraceInbox, reliable_pipe,
};
pub use protocol::{
    Packet, PacketError, PacketHeader, TraceState, WeaponPacket, PROTOCOL_MAGIC, PROTOCOL_VERSION,
};
