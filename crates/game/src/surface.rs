use rkyv::{Archive, Deserialize, Serialize};

/// Multiplier applied to base damage for a vulnerable flesh hit.
pub const VULNERABLE_DAMAGE_MULTIPLIER: f32 = 4.0;

/// Classification of the surface a shot struck. Crosses the wire inside a
/// trace update, so it carries rkyv derives like the other protocol types.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[rkyv(compare(PartialEq), derive(Debug))]
pub enum SurfaceClass {
    #[default]
    Default,
    FleshDefault,
    FleshVulnerable,
}

impl SurfaceClass {
    pub fn to_bits(self) -> u8 {
        match self {
            Self::Default => 0,
            Self::FleshDefault => 1,
            Self::FleshVulnerable => 2,
        }
    }

    /// Unknown classifications fall back to `Default`.
    pub fn from_bits(bits: u8) -> Self {
        match bits {
            1 => Self::FleshDefault,
            2 => Self::FleshVulnerable,
            _ => Self::Default,
        }
    }
}

/// Damage multiplier for a struck surface. Total over the enum, no side
/// effects: only vulnerable flesh changes the outcome.
pub fn damage_multiplier(surface: SurfaceClass) -> f32 {
    match surface {
        SurfaceClass::FleshVulnerable => VULNERABLE_DAMAGE_MULTIPLIER,
        SurfaceClass::Default | SurfaceClass::FleshDefault => 1.0,
    }
}

/// Which impact effect the playback layer should select for a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImpactEffectKind {
    Default,
    Flesh,
}

pub fn impact_effect_kind(surface: SurfaceClass) -> ImpactEffectKind {
    match surface {
        SurfaceClass::FleshDefault | SurfaceClass::FleshVulnerable => ImpactEffectKind::Flesh,
        SurfaceClass::Default => ImpactEffectKind::Default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [SurfaceClass; 3] = [
        SurfaceClass::Default,
        SurfaceClass::FleshDefault,
        SurfaceClass::FleshVulnerable,
    ];

    #[test]
    fn only_vulnerable_flesh_multiplies() {
        for surface in ALL {
            let expected = if surface == SurfaceClass::FleshVulnerable {
                4.0
            } else {
                1.0
            };
            assert_eq!(damage_multiplier(surface), expected);
        }
    }

    #[test]
    fn flesh_surfaces_share_the_flesh_effect() {
        assert_eq!(
            impact_effect_kind(SurfaceClass::Default),
            ImpactEffectKind::Default
        );
        assert_eq!(
            impact_effect_kind(SurfaceClass::FleshDefault),
            ImpactEffectKind::Flesh
        );
        assert_eq!(
            impact_effect_kind(SurfaceClass::FleshVulnerable),
            ImpactEffectKind::Flesh
        );
    }

    #[test]
    fn bits_round_trip_and_unknown_defaults() {
        for surface in ALL {
            assert_eq!(SurfaceClass::from_bits(surface.to_bits()), surface);
        }
        assert_eq!(SurfaceClass::from_bits(200), SurfaceClass::Default);
    }
}
