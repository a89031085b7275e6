//! Live movement configuration, presets, and the snapshot store.
//!
//! A [`Configuration`] can only be built through validation, so every value
//! that exists is a complete, valid tuple. The [`ConfigStore`] swaps whole
//! snapshots under a short write lock; readers clone an `Arc` and keep it
//! for as long as they need (the engine keeps one per target).

use std::str::FromStr;
use std::sync::{Arc, RwLock};

use glider_common::error::{GliderError, GliderResult};
use serde::{Deserialize, Serialize};

use crate::easing::EasingKind;

pub const MIN_STRENGTH: i32 = 1;
pub const MAX_STRENGTH: i32 = 100;

/// Movement parameters applied to each target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawConfiguration", into = "RawConfiguration")]
pub struct Configuration {
    strength: u8,
    hold_time_ms: u32,
    speed: u32,
    easing: EasingKind,
    smooth: bool,
}

/// Unvalidated wire form of [`Configuration`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct RawConfiguration {
    strength: i32,
    hold_time_ms: i32,
    speed: i32,
    easing: EasingKind,
    smooth: bool,
}

impl TryFrom<RawConfiguration> for Configuration {
    type Error = GliderError;

    fn try_from(raw: RawConfiguration) -> Result<Self, Self::Error> {
        Configuration::new(
            raw.strength,
            raw.hold_time_ms,
            raw.speed,
            raw.easing,
            raw.smooth,
        )
    }
}

impl From<Configuration> for RawConfiguration {
    fn from(config: Configuration) -> Self {
        Self {
            strength: i32::from(config.strength),
            hold_time_ms: config.hold_time_ms as i32,
            speed: config.speed as i32,
            easing: config.easing,
            smooth: config.smooth,
        }
    }
}

impl Configuration {
    /// Validate every field and build a configuration.
    pub fn new(
        strength: i32,
        hold_time_ms: i32,
        speed: i32,
        easing: EasingKind,
        smooth: bool,
    ) -> GliderResult<Self> {
        if !(MIN_STRENGTH..=MAX_STRENGTH).contains(&strength) {
            return Err(GliderError::validation(
                "strength",
                format!("must be in [{MIN_STRENGTH}, {MAX_STRENGTH}], got {strength}"),
            ));
        }
        if hold_time_ms <= 0 {
            return Err(GliderError::validation(
                "hold_time_ms",
                format!("must be positive, got {hold_time_ms}"),
            ));
        }
        if speed <= 0 {
            return Err(GliderError::validation(
                "speed",
                format!("must be positive, got {speed}"),
            ));
        }
        Ok(Self {
            strength: strength as u8,
            hold_time_ms: hold_time_ms as u32,
            speed: speed as u32,
            easing,
            smooth,
        })
    }

    /// Validate a configuration given the numeric easing id used at the
    /// external interface.
    pub fn from_ids(
        strength: i32,
        hold_time_ms: i32,
        speed: i32,
        easing_id: i32,
        smooth: bool,
    ) -> GliderResult<Self> {
        let easing = EasingKind::try_from(easing_id)?;
        Self::new(strength, hold_time_ms, speed, easing, smooth)
    }

    /// Same configuration with a different speed.
    pub fn with_speed(self, speed: i32) -> GliderResult<Self> {
        Self::new(
            i32::from(self.strength),
            self.hold_time_ms as i32,
            speed,
            self.easing,
            self.smooth,
        )
    }

    pub fn strength(&self) -> u8 {
        self.strength
    }

    pub fn hold_time_ms(&self) -> u32 {
        self.hold_time_ms
    }

    pub fn speed(&self) -> u32 {
        self.speed
    }

    pub fn easing(&self) -> EasingKind {
        self.easing
    }

    pub fn smooth(&self) -> bool {
        self.smooth
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Preset::Default.configuration()
    }
}

/// Named, fixed configurations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    Default = 1,
    Fast = 2,
    Smooth = 3,
}

impl Preset {
    pub const ALL: [Preset; 3] = [Preset::Default, Preset::Fast, Preset::Smooth];

    pub fn name(self) -> &'static str {
        match self {
            Preset::Default => "default",
            Preset::Fast => "fast",
            Preset::Smooth => "smooth",
        }
    }

    /// The configuration this preset stands for.
    ///
    /// | preset  | strength | hold ms | speed | easing      | smooth |
    /// |---------|----------|---------|-------|-------------|--------|
    /// | default | 50       | 100     | 10    | sinusoidal  | yes    |
    /// | fast    | 30       | 50      | 40    | quadratic   | yes    |
    /// | smooth  | 90       | 150     | 5     | cubic       | yes    |
    pub const fn configuration(self) -> Configuration {
        match self {
            Preset::Default => Configuration {
                strength: 50,
                hold_time_ms: 100,
                speed: 10,
                easing: EasingKind::Sinusoidal,
                smooth: true,
            },
            Preset::Fast => Configuration {
                strength: 30,
                hold_time_ms: 50,
                speed: 40,
                easing: EasingKind::Quadratic,
                smooth: true,
            },
            Preset::Smooth => Configuration {
                strength: 90,
                hold_time_ms: 150,
                speed: 5,
                easing: EasingKind::Cubic,
                smooth: true,
            },
        }
    }
}

impl TryFrom<i32> for Preset {
    type Error = GliderError;

    fn try_from(id: i32) -> Result<Self, Self::Error> {
        match id {
            1 => Ok(Preset::Default),
            2 => Ok(Preset::Fast),
            3 => Ok(Preset::Smooth),
            other => Err(GliderError::validation(
                "preset",
                format!("expected 1 (default), 2 (fast) or 3 (smooth), got {other}"),
            )),
        }
    }
}

impl FromStr for Preset {
    type Err = GliderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        if let Some(preset) = Preset::ALL.iter().find(|p| p.name() == needle) {
            return Ok(*preset);
        }
        match needle.parse::<i32>() {
            Ok(id) => Preset::try_from(id),
            Err(_) => Err(GliderError::validation(
                "preset",
                format!("unknown preset '{s}'"),
            )),
        }
    }
}

impl std::fmt::Display for Preset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A configuration together with the store version that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigSnapshot {
    pub version: u64,
    pub config: Configuration,
}

/// Holds the active configuration as an atomically replaced snapshot.
#[derive(Debug)]
pub struct ConfigStore {
    current: RwLock<Arc<ConfigSnapshot>>,
}

impl ConfigStore {
    pub fn new(initial: Configuration) -> Self {
        Self {
            current: RwLock::new(Arc::new(ConfigSnapshot {
                version: 0,
                config: initial,
            })),
        }
    }

    /// The current snapshot. Cheap: clones an `Arc`.
    pub fn snapshot(&self) -> Arc<ConfigSnapshot> {
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    /// The current configuration value.
    pub fn current(&self) -> Configuration {
        self.snapshot().config
    }

    /// Replace the configuration wholesale. Returns the new version.
    pub fn replace(&self, config: Configuration) -> u64 {
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        let version = guard.version + 1;
        *guard = Arc::new(ConfigSnapshot { version, config });
        version
    }

    /// Derive a new configuration from the current one and install it.
    ///
    /// The write lock is held across `f`, so concurrent updates cannot be
    /// lost. If `f` fails nothing changes.
    pub fn update<F>(&self, f: F) -> GliderResult<u64>
    where
        F: FnOnce(Configuration) -> GliderResult<Configuration>,
    {
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        let config = f(guard.config)?;
        let version = guard.version + 1;
        *guard = Arc::new(ConfigSnapshot { version, config });
        Ok(version)
    }

    /// Install a preset.
    pub fn apply_preset(&self, preset: Preset) -> u64 {
        self.replace(preset.configuration())
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new(Configuration::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_rejects_each_field() {
        assert!(Configuration::new(0, 100, 5, EasingKind::Linear, true)
            .unwrap_err()
            .is_validation());
        assert!(Configuration::new(101, 100, 5, EasingKind::Linear, true).is_err());
        assert!(Configuration::new(50, 0, 5, EasingKind::Linear, true).is_err());
        assert!(Configuration::new(50, 100, 0, EasingKind::Linear, true).is_err());
        assert!(Configuration::new(50, 100, -3, EasingKind::Linear, true).is_err());
        assert!(Configuration::from_ids(50, 100, 5, 6, true).is_err());
        assert!(Configuration::new(1, 1, 1, EasingKind::Linear, false).is_ok());
        assert!(Configuration::new(100, 1, 1, EasingKind::Linear, false).is_ok());
    }

    #[test]
    fn test_presets_are_valid_tuples() {
        for preset in Preset::ALL {
            let c = preset.configuration();
            let rebuilt = Configuration::new(
                i32::from(c.strength()),
                c.hold_time_ms() as i32,
                c.speed() as i32,
                c.easing(),
                c.smooth(),
            )
            .unwrap();
            assert_eq!(rebuilt, c, "{preset}");
        }
    }

    #[test]
    fn test_preset_ids() {
        assert_eq!(Preset::try_from(2).unwrap(), Preset::Fast);
        assert!(Preset::try_from(4).unwrap_err().is_validation());
        assert_eq!("smooth".parse::<Preset>().unwrap(), Preset::Smooth);
        assert_eq!("1".parse::<Preset>().unwrap(), Preset::Default);
    }

    #[test]
    fn test_store_versions_increase() {
        let store = ConfigStore::default();
        assert_eq!(store.snapshot().version, 0);
        let v1 = store.apply_preset(Preset::Fast);
        let v2 = store.apply_preset(Preset::Fast);
        assert_eq!((v1, v2), (1, 2));
        assert_eq!(store.current(), Preset::Fast.configuration());
    }

    #[test]
    fn test_failed_update_leaves_store_untouched() {
        let store = ConfigStore::new(Preset::Smooth.configuration());
        let before = store.snapshot();

        let result = store.update(|c| c.with_speed(0));
        assert!(result.unwrap_err().is_validation());

        let after = store.snapshot();
        assert_eq!(*before, *after);
    }

    #[test]
    fn test_held_snapshot_is_not_affected_by_replace() {
        let store = ConfigStore::new(Preset::Default.configuration());
        let held = store.snapshot();
        store.apply_preset(Preset::Fast);
        assert_eq!(held.config, Preset::Default.configuration());
        assert_eq!(store.current(), Preset::Fast.configuration());
    }

    #[test]
    fn test_serde_validates() {
        let json = r#"{"strength":0,"hold_time_ms":100,"speed":5,"easing":"linear","smooth":true}"#;
        assert!(serde_json::from_str::<Configuration>(json).is_err());

        let json = r#"{"strength":70,"hold_time_ms":100,"speed":5,"easing":"cubic","smooth":false}"#;
        let config: Configuration = serde_json::from_str(json).unwrap();
        assert_eq!(config.easing(), EasingKind::Cubic);
        assert!(!config.smooth());
    }
}
