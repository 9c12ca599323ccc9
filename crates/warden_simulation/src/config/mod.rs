//! Archetype configuration (immutable tuning records).
//!
//! Architecture:
//! - `CombatantConfig` - plain serde struct, loaded once, shared via `Arc`
//! - `Archetype` component - name + shared config (no per-agent copies)
//! - `ArchetypeRegistry` resource - presets + JSON loading, default fallback
//!
//! Все под-записи `#[serde(default)]`: частичный JSON добирает значения из defaults.

use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::combat::{AttackStyle, DamageProfile, DamageType};
use crate::perception::VisionMode;
use crate::spatial::Layers;

pub mod archetype;

pub use archetype::{Archetype, ArchetypeRegistry};

/// Margin kept between stopping distance and attack range.
pub const STOP_RANGE_MARGIN: f32 = 0.05;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse archetype config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Closed float interval used for random draws (dwell, look-around).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FloatRange {
    pub min: f32,
    pub max: f32,
}

impl FloatRange {
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn sample(&self, rng: &mut dyn RngCore) -> f32 {
        if self.max <= self.min {
            return self.min;
        }
        let unit = (rng.next_u32() >> 8) as f32 / (1u32 << 24) as f32;
        self.min + (self.max - self.min) * unit
    }

    fn validate(&self, field: &'static str) -> Result<(), ConfigError> {
        if self.min > self.max {
            return Err(ConfigError::Invalid {
                field,
                reason: format!("min {} > max {}", self.min, self.max),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementTuning {
    pub patrol_speed: f32,
    pub chase_speed: f32,
    /// ± random offset applied to chase speed on entering Chase
    pub speed_jitter: f32,
    pub acceleration: f32,
    /// Degrees per second
    pub angular_speed: f32,
    pub stopping_distance: f32,
}

impl Default for MovementTuning {
    fn default() -> Self {
        Self {
            patrol_speed: 2.8,
            chase_speed: 3.5,
            speed_jitter: 0.3,
            acceleration: 8.0,
            angular_speed: 120.0,
            stopping_distance: 1.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionTuning {
    pub mode: VisionMode,
    /// Full cone angle in degrees (Cone mode only)
    pub field_of_view: f32,
    pub eye_height: f32,
    /// Height of the aimed point on the target
    pub torso_height: f32,
    /// Seconds between sensor evaluations
    pub check_interval: f32,
    pub occluder_mask: Layers,
}

impl Default for VisionTuning {
    fn default() -> Self {
        Self {
            mode: VisionMode::LineOfSight,
            field_of_view: 110.0,
            eye_height: 1.6,
            torso_height: 1.5,
            check_interval: 0.15,
            occluder_mask: Layers::SOLID,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InvestigateTuning {
    /// Added to patrol speed while walking to the last known position
    pub speed_bonus: f32,
    pub look_around_time: FloatRange,
    /// Yaw sweep amplitude range in degrees
    pub look_around_angle: FloatRange,
}

impl Default for InvestigateTuning {
    fn default() -> Self {
        Self {
            speed_bonus: 0.2,
            look_around_time: FloatRange::new(0.5, 1.2),
            look_around_angle: FloatRange::new(-75.0, 75.0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatrolTuning {
    pub enabled: bool,
    pub base_wait: f32,
    pub tolerance: f32,
    pub dwell_time: FloatRange,
    pub wander_radius: f32,
    /// Radius around the centre for `PatrolMode::Wander`
    pub area_radius: f32,
    pub chance_skip_point: f32,
    pub chance_reverse: f32,
    pub sample_attempts: u32,
    pub sample_distance: f32,
    /// Forced re-attempt interval after a navigation failure
    pub retry_interval: f32,
}

impl Default for PatrolTuning {
    fn default() -> Self {
        Self {
            enabled: true,
            base_wait: 0.5,
            tolerance: 0.25,
            dwell_time: FloatRange::new(0.6, 2.0),
            wander_radius: 1.2,
            area_radius: 8.0,
            chance_skip_point: 0.15,
            chance_reverse: 0.10,
            sample_attempts: 8,
            sample_distance: 2.0,
            retry_interval: 0.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeleeTuning {
    pub damage: f32,
    pub damage_type: DamageType,
    pub radius: f32,
    /// Extra reach tolerated when the windup ends
    pub reach_slack: f32,
    pub hit_window: f32,
    pub light_windup: f32,
    pub heavy_windup: f32,
    /// Local-space socket the hit sphere is centred on (agent origin if absent)
    pub socket_offset: Option<[f32; 3]>,
    pub hit_mask: Layers,
}

impl Default for MeleeTuning {
    fn default() -> Self {
        Self {
            damage: 15.0,
            damage_type: DamageType::Physical,
            radius: 1.0,
            reach_slack: 0.25,
            hit_window: 0.25,
            light_windup: 0.2,
            heavy_windup: 0.4,
            socket_offset: Some([0.0, 1.0, -0.8]),
            hit_mask: Layers::DAMAGEABLE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RangedTuning {
    pub damage: f32,
    pub damage_type: DamageType,
    pub cast_time: f32,
    pub projectile_speed: f32,
    pub lifetime: f32,
    pub muzzle_height: f32,
    /// Re-aim toward the tracked target every tick
    pub homing: bool,
    pub hit_mask: Layers,
}

impl Default for RangedTuning {
    fn default() -> Self {
        Self {
            damage: 10.0,
            damage_type: DamageType::Magic,
            cast_time: 0.3,
            projectile_speed: 12.0,
            lifetime: 5.0,
            muzzle_height: 1.5,
            homing: false,
            hit_mask: Layers::PROJECTILE_TARGETS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HearingTuning {
    pub hears_threats: bool,
    pub hears_allies: bool,
    pub cooldown: f32,
}

impl Default for HearingTuning {
    fn default() -> Self {
        Self {
            hears_threats: true,
            hears_allies: true,
            cooldown: 0.1,
        }
    }
}

/// Present only on archetypes that raise ally calls (scouts).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertTuning {
    pub cooldown: f32,
    pub radius: f32,
}

impl Default for AlertTuning {
    fn default() -> Self {
        Self {
            cooldown: 1.5,
            radius: 80.0,
        }
    }
}

/// Immutable tuning record shared by every agent of one archetype.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatantConfig {
    pub max_health: f32,
    pub detection_radius: f32,
    pub attack_range: f32,
    pub attack_cooldown: f32,
    pub stagger_duration: f32,
    pub suspicion_duration: f32,
    pub attack_style: AttackStyle,
    pub movement: MovementTuning,
    pub vision: VisionTuning,
    pub investigate: InvestigateTuning,
    pub patrol: PatrolTuning,
    pub melee: MeleeTuning,
    pub ranged: RangedTuning,
    pub hearing: HearingTuning,
    pub alert: Option<AlertTuning>,
    pub damage: DamageProfile,
}

impl Default for CombatantConfig {
    fn default() -> Self {
        Self {
            max_health: 100.0,
            detection_radius: 15.0,
            attack_range: 2.0,
            attack_cooldown: 1.5,
            stagger_duration: 0.25,
            suspicion_duration: 4.0,
            attack_style: AttackStyle::MeleeLight,
            movement: MovementTuning::default(),
            vision: VisionTuning::default(),
            investigate: InvestigateTuning::default(),
            patrol: PatrolTuning::default(),
            melee: MeleeTuning::default(),
            ranged: RangedTuning::default(),
            hearing: HearingTuning::default(),
            alert: None,
            damage: DamageProfile::default(),
        }
    }
}

impl CombatantConfig {
    /// Low-threat sentry: light strikes, wide cone, raises ally calls.
    pub fn scout() -> Self {
        Self {
            max_health: 60.0,
            vision: VisionTuning {
                mode: VisionMode::Cone,
                ..VisionTuning::default()
            },
            hearing: HearingTuning {
                hears_allies: false,
                ..HearingTuning::default()
            },
            alert: Some(AlertTuning::default()),
            ..Self::default()
        }
    }

    /// Heavy melee unit: slow windup, answers ally calls, dies to artifacts.
    pub fn heavy() -> Self {
        let mut damage = DamageProfile::default();
        damage.multipliers.set(DamageType::Physical, 0.75);
        damage.instant_kill = Some(DamageType::Artifact);

        Self {
            max_health: 200.0,
            attack_style: AttackStyle::MeleeHeavy,
            stagger_duration: 0.15,
            melee: MeleeTuning {
                damage: 25.0,
                radius: 1.2,
                ..MeleeTuning::default()
            },
            movement: MovementTuning {
                patrol_speed: 2.2,
                chase_speed: 3.0,
                ..MovementTuning::default()
            },
            damage,
            ..Self::default()
        }
    }

    /// Ranged caster: keeps distance and fires bolts.
    pub fn caster() -> Self {
        let mut damage = DamageProfile::default();
        damage.multipliers.set(DamageType::Magic, 0.0);
        damage.multipliers.set(DamageType::Fire, 1.5);

        Self {
            max_health: 80.0,
            attack_range: 10.0,
            attack_cooldown: 2.0,
            attack_style: AttackStyle::Ranged,
            movement: MovementTuning {
                stopping_distance: 8.0,
                ..MovementTuning::default()
            },
            ranged: RangedTuning {
                homing: true,
                ..RangedTuning::default()
            },
            damage,
            ..Self::default()
        }
    }

    /// Stopping distance clamped to `[0, attack_range - margin]`.
    pub fn clamped_stopping_distance(&self) -> f32 {
        let ceiling = (self.attack_range - STOP_RANGE_MARGIN).max(0.0);
        self.movement.stopping_distance.clamp(0.0, ceiling)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("max_health", self.max_health)?;
        positive("detection_radius", self.detection_radius)?;
        positive("attack_range", self.attack_range)?;
        non_negative("attack_cooldown", self.attack_cooldown)?;
        non_negative("stagger_duration", self.stagger_duration)?;
        non_negative("suspicion_duration", self.suspicion_duration)?;
        positive("vision.check_interval", self.vision.check_interval)?;
        if !(0.0..=360.0).contains(&self.vision.field_of_view) {
            return Err(ConfigError::Invalid {
                field: "vision.field_of_view",
                reason: format!("{} is outside 0..=360", self.vision.field_of_view),
            });
        }
        probability("patrol.chance_skip_point", self.patrol.chance_skip_point)?;
        probability("patrol.chance_reverse", self.patrol.chance_reverse)?;
        non_negative("patrol.area_radius", self.patrol.area_radius)?;
        self.patrol.dwell_time.validate("patrol.dwell_time")?;
        self.investigate
            .look_around_time
            .validate("investigate.look_around_time")?;
        self.investigate
            .look_around_angle
            .validate("investigate.look_around_angle")?;
        positive("ranged.projectile_speed", self.ranged.projectile_speed)?;
        Ok(())
    }
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("expected a positive value, got {}", value),
        })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("expected a non-negative value, got {}", value),
        })
    }
}

fn probability(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("probability {} is outside 0..=1", value),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_defaults_match_tuning_table() {
        let config = CombatantConfig::default();
        assert_eq!(config.max_health, 100.0);
        assert_eq!(config.attack_range, 2.0);
        assert_eq!(config.attack_cooldown, 1.5);
        assert_eq!(config.detection_radius, 15.0);
        assert_eq!(config.vision.field_of_view, 110.0);
        assert_eq!(config.patrol.chance_skip_point, 0.15);
        assert_eq!(config.patrol.chance_reverse, 0.10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_stopping_distance_clamped_below_attack_range() {
        let mut config = CombatantConfig::default();
        config.movement.stopping_distance = 5.0;
        assert!((config.clamped_stopping_distance() - 1.95).abs() < 1e-6);

        config.movement.stopping_distance = -1.0;
        assert_eq!(config.clamped_stopping_distance(), 0.0);

        config.attack_range = 0.01;
        config.movement.stopping_distance = 1.0;
        assert_eq!(config.clamped_stopping_distance(), 0.0);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let json = r#"{ "attack_range": 3.0, "patrol": { "chance_skip_point": 0.0 } }"#;
        let config = CombatantConfig::from_json(json).expect("valid json");

        assert_eq!(config.attack_range, 3.0);
        assert_eq!(config.patrol.chance_skip_point, 0.0);
        assert_eq!(config.patrol.chance_reverse, 0.10);
        assert_eq!(config.movement.chase_speed, 3.5);
    }

    #[test]
    fn test_json_damage_table() {
        let json = r#"{ "damage": { "multipliers": { "Fire": 2.0 }, "instant_kill": "Artifact" } }"#;
        let config = CombatantConfig::from_json(json).expect("valid json");

        assert_eq!(config.damage.multipliers.get(DamageType::Fire), 2.0);
        assert_eq!(config.damage.multipliers.get(DamageType::Magic), 1.0);
        assert_eq!(config.damage.instant_kill, Some(DamageType::Artifact));
    }

    #[test]
    fn test_invalid_probability_rejected() {
        let json = r#"{ "patrol": { "chance_reverse": 1.5 } }"#;
        let err = CombatantConfig::from_json(json).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid { field: "patrol.chance_reverse", .. }
        ));
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let err = CombatantConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_float_range_sample_bounds() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let range = FloatRange::new(0.6, 2.0);
        for _ in 0..200 {
            let value = range.sample(&mut rng);
            assert!((0.6..=2.0).contains(&value));
        }
        assert_eq!(FloatRange::new(1.0, 1.0).sample(&mut rng), 1.0);
    }

    #[test]
    fn test_presets_are_valid() {
        assert!(CombatantConfig::scout().validate().is_ok());
        assert!(CombatantConfig::heavy().validate().is_ok());
        assert!(CombatantConfig::caster().validate().is_ok());
        assert!(CombatantConfig::scout().alert.is_some());
        assert_eq!(
            CombatantConfig::heavy().damage.instant_kill,
            Some(DamageType::Artifact)
        );
    }
}
