use glam::Vec3;
use rkyv::{Archive, Deserialize, Serialize, rancor};

use crate::surface::SurfaceClass;

pub const PROTOCOL_MAGIC: u32 = 0x4C4E4753;
pub const PROTOCOL_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[rkyv(compare(PartialEq), derive(Debug))]
pub struct PacketHeader {
    pub magic: u32,
    pub version: u32,
    pub sequence: u32,
}

impl PacketHeader {
    pub fn new(sequence: u32) -> Self {
        Self {
            magic: PROTOCOL_MAGIC,
            version: PROTOCOL_VERSION,
            sequence,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.magic == PROTOCOL_MAGIC && self.version == PROTOCOL_VERSION
    }
}

/// The only state that crosses the authority boundary per shot: surface
/// classification and the trace end point, quantized to whole world units
/// (cosmetic precision). Deliberately has no field for damage or for the
/// struck entity, so neither can reach a non-authoritative observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[rkyv(compare(PartialEq), derive(Debug))]
pub struct TraceState {
    pub surface: SurfaceClass,
    pub end_point: [i16; 3],
}

impl TraceState {
    pub fn from_end_point(surface: SurfaceClass, end: Vec3) -> Self {
        Self {
            surface,
            end_point: [
                quantize_coord(end.x),
                quantize_coord(end.y),
                quantize_coord(end.z),
            ],
        }
    }

    pub fn decode_end_point(&self) -> Vec3 {
        Vec3::new(
            self.end_point[0] as f32,
            self.end_point[1] as f32,
            self.end_point[2] as f32,
        )
    }
}

fn quantize_coord(v: f32) -> i16 {
    v.round().clamp(i16::MIN as f32, i16::MAX as f32) as i16
}

/// A fire request is a pure trigger signal: it carries the weapon address
/// and nothing the authority would have to trust.
#[derive(Debug, Clone, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub enum WeaponPacket {
    FireRequest { weapon_id: u32 },
    TraceUpdate { weapon_id: u32, trace: TraceState },
}

#[derive(Debug, Clone, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct Packet {
    pub header: PacketHeader,
    pub payload: WeaponPacket,
}

#[derive(Debug, thiserror::Error)]
pub enum PacketError {
    #[error("serialization failed: {0}")]
    Serialize(rancor::Error),
    #[error("deserialization failed: {0}")]
    Deserialize(rancor::Error),
}

impl Packet {
    pub fn new(header: PacketHeader, payload: WeaponPacket) -> Self {
        Self { header, payload }
    }

    pub fn serialize(&self) -> Result<Vec<u8>, PacketError> {
        rkyv::to_bytes::<rancor::Error>(self)
            .map(|aligned| aligned.into_vec())
            .map_err(PacketError::Serialize)
    }

    pub fn deserialize(data: &[u8]) -> Result<Self, PacketError> {
        rkyv::from_bytes::<Self, rancor::Error>(data).map_err(PacketError::Deserialize)
    }
}
