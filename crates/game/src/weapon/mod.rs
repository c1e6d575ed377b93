mod config;
mod instance;
mod resolver;
mod scheduler;

pub use config::WeaponConfig;
pub use instance::{Role, ShotDisposition, Weapon};
pub use resolver::{FireOutcome, HitScanResolver};
pub use scheduler::{FireScheduler, FireState};
