//! Persisted device configuration: device name, active light count and
//! per-channel names.

use super::settings::{default_light_name, DEFAULT_DEVICE_NAME, MAX_LIGHTS, MAX_NAME_LEN};
use crate::storage::{ConfigStore, Namespace, NamespaceHandle, OpenMode, Storage, StorageError};
use log::warn;
use std::fmt;

const DEVICE_KEY: &str = "device";
const NUM_LIGHTS_KEY: &str = "numLights";

/// Storage key (and `/saveConfig` parameter) for the name of light `index`.
pub fn light_name_key(index: usize) -> String {
    format!("light{}", index)
}

/// Device identity and light layout, as loaded at boot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceConfig {
    pub device_name: String,
    /// Active channels, `1..=MAX_LIGHTS`.
    pub num_lights: usize,
    /// Names of all `MAX_LIGHTS` channels, active or not.
    pub light_names: Vec<String>,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            device_name: DEFAULT_DEVICE_NAME.to_string(),
            num_lights: MAX_LIGHTS,
            light_names: (0..MAX_LIGHTS).map(default_light_name).collect(),
        }
    }
}

impl DeviceConfig {
    /// Load from the `config` namespace. Missing keys take their defaults
    /// and an out-of-range light count is clamped.
    pub fn load<S: Storage>(store: &ConfigStore<S>) -> Self {
        let device_name = store.get_str(Namespace::Config, DEVICE_KEY, DEFAULT_DEVICE_NAME);
        let raw_count = store.get_i32(Namespace::Config, NUM_LIGHTS_KEY, MAX_LIGHTS as i32);
        let num_lights = raw_count.clamp(1, MAX_LIGHTS as i32) as usize;
        if num_lights as i32 != raw_count {
            warn!("Stored light count {} out of range, using {}", raw_count, num_lights);
        }

        let light_names = (0..MAX_LIGHTS)
            .map(|i| store.get_str(Namespace::Config, &light_name_key(i), &default_light_name(i)))
            .collect();

        Self {
            device_name,
            num_lights,
            light_names,
        }
    }

    /// Names of the active channels.
    pub fn active_names(&self) -> &[String] {
        &self.light_names[..self.num_lights]
    }
}

/// Changes requested through `/saveConfig`. Absent fields stay as they are.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigUpdate {
    pub device_name: Option<String>,
    pub num_lights: Option<usize>,
    pub light_names: [Option<String>; MAX_LIGHTS],
}

impl ConfigUpdate {
    /// Build from decoded query parameters.
    ///
    /// A `numLights` that is not an integer in `1..=MAX_LIGHTS` is dropped
    /// without complaint and leaves any earlier valid count in place.
    /// Otherwise later duplicates of a parameter win.
    pub fn from_params<'a>(params: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut update = Self::default();
        for (key, value) in params {
            if key == DEVICE_KEY {
                update.device_name = Some(value.to_string());
            } else if key == NUM_LIGHTS_KEY {
                if let Some(n) = value
                    .trim()
                    .parse::<usize>()
                    .ok()
                    .filter(|n| (1..=MAX_LIGHTS).contains(n))
                {
                    update.num_lights = Some(n);
                }
            } else if let Some(index) = key
                .strip_prefix("light")
                .and_then(|i| i.parse::<usize>().ok())
                .filter(|i| *i < MAX_LIGHTS)
            {
                update.light_names[index] = Some(value.to_string());
            }
        }
        update
    }

    /// Whether the update changes nothing.
    pub fn is_empty(&self) -> bool {
        self.device_name.is_none()
            && self.num_lights.is_none()
            && self.light_names.iter().all(Option::is_none)
    }

    /// The configuration that results from applying this update to `current`.
    pub fn merged(&self, current: &DeviceConfig) -> DeviceConfig {
        let mut next = current.clone();
        if let Some(name) = &self.device_name {
            next.device_name = name.clone();
        }
        if let Some(n) = self.num_lights {
            next.num_lights = n;
        }
        for (slot, name) in next.light_names.iter_mut().zip(&self.light_names) {
            if let Some(name) = name {
                *slot = name.clone();
            }
        }
        next
    }

    /// Check every supplied name, and that the resulting active names are
    /// distinct.
    pub fn validate(&self, current: &DeviceConfig) -> Result<(), NameError> {
        if let Some(name) = &self.device_name {
            validate_name(name)?;
        }
        for name in self.light_names.iter().flatten() {
            validate_light_name(name)?;
        }

        let next = self.merged(current);
        let active = next.active_names();
        for (i, name) in active.iter().enumerate() {
            if active[..i].contains(name) {
                return Err(NameError::Duplicate(name.clone()));
            }
        }
        Ok(())
    }

    /// Write the supplied fields in one `config` session.
    pub fn apply<S: Storage>(&self, store: &ConfigStore<S>) -> Result<(), StorageError> {
        store.with_namespace(Namespace::Config, OpenMode::ReadWrite, |ns| {
            if let Some(name) = &self.device_name {
                ns.set_str(DEVICE_KEY, name)?;
            }
            if let Some(n) = self.num_lights {
                ns.set_i32(NUM_LIGHTS_KEY, n as i32)?;
            }
            for (i, name) in self.light_names.iter().enumerate() {
                if let Some(name) = name {
                    ns.set_str(&light_name_key(i), name)?;
                }
            }
            Ok(())
        })
    }
}

/// Validate a device name: non-blank, bounded, printable.
pub fn validate_name(name: &str) -> Result<(), NameError> {
    if name.trim().is_empty() {
        return Err(NameError::Empty);
    }
    if name.len() > MAX_NAME_LEN {
        return Err(NameError::TooLong {
            len: name.len(),
            max: MAX_NAME_LEN,
        });
    }
    if let Some(c) = name.chars().find(|c| c.is_control()) {
        return Err(NameError::InvalidChar(c));
    }
    Ok(())
}

/// Validate a light name. Light names become URL path segments, so `/` is
/// rejected on top of the device-name rules.
pub fn validate_light_name(name: &str) -> Result<(), NameError> {
    validate_name(name)?;
    if name.contains('/') {
        return Err(NameError::InvalidChar('/'));
    }
    Ok(())
}

/// Why a device or light name was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    /// Name is empty or whitespace.
    Empty,
    /// Name exceeds maximum length.
    TooLong { len: usize, max: usize },
    /// Name contains a character that cannot be used.
    InvalidChar(char),
    /// Two active lights would share a name.
    Duplicate(String),
}

impl fmt::Display for NameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "name cannot be empty"),
            Self::TooLong { len, max } => {
                write!(f, "name too long: {} bytes (max {})", len, max)
            }
            Self::InvalidChar(c) => write!(f, "name contains invalid character {:?}", c),
            Self::Duplicate(name) => write!(f, "duplicate light name '{}'", name),
        }
    }
}

impl std::error::Error for NameError {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn store() -> ConfigStore<MemoryStorage> {
        ConfigStore::new(MemoryStorage::new())
    }

    fn update(params: &[(&str, &str)]) -> ConfigUpdate {
        ConfigUpdate::from_params(params.iter().copied())
    }

    // ==================== Load Tests ====================

    #[test]
    fn test_load_defaults() {
        let config = DeviceConfig::load(&store());
        assert_eq!(config, DeviceConfig::default());
        assert_eq!(config.device_name, "esp-light");
        assert_eq!(config.active_names().len(), MAX_LIGHTS);
        assert_eq!(config.light_names[2], "Light 3");
    }

    #[test]
    fn test_load_clamps_light_count() {
        let store = store();
        store.set_i32(Namespace::Config, "numLights", 9).unwrap();
        assert_eq!(DeviceConfig::load(&store).num_lights, MAX_LIGHTS);
        store.set_i32(Namespace::Config, "numLights", 0).unwrap();
        assert_eq!(DeviceConfig::load(&store).num_lights, 1);
    }

    #[test]
    fn test_load_keeps_inactive_names() {
        let store = store();
        store.set_i32(Namespace::Config, "numLights", 2).unwrap();
        store.set_str(Namespace::Config, "light3", "Porch").unwrap();
        let config = DeviceConfig::load(&store);
        assert_eq!(config.active_names(), ["Light 1".to_string(), "Light 2".to_string()]);
        assert_eq!(config.light_names[3], "Porch");
    }

    // ==================== Update Tests ====================

    #[test]
    fn test_update_parsing() {
        let u = update(&[("device", "Den"), ("numLights", "2"), ("light1", "Lamp"), ("light7", "x")]);
        assert_eq!(u.device_name.as_deref(), Some("Den"));
        assert_eq!(u.num_lights, Some(2));
        assert_eq!(u.light_names[1].as_deref(), Some("Lamp"));
        assert!(u.light_names[0].is_none());
    }

    #[test]
    fn test_out_of_range_count_ignored() {
        assert_eq!(update(&[("numLights", "0")]).num_lights, None);
        assert_eq!(update(&[("numLights", "5")]).num_lights, None);
        assert_eq!(update(&[("numLights", "many")]).num_lights, None);
        assert!(update(&[("numLights", "99")]).is_empty());
    }

    #[test]
    fn test_bad_count_keeps_earlier_valid_one() {
        assert_eq!(update(&[("numLights", "2"), ("numLights", "x")]).num_lights, Some(2));
        assert_eq!(update(&[("numLights", "2"), ("numLights", "3")]).num_lights, Some(3));
    }

    #[test]
    fn test_apply_and_reload() {
        let store = store();
        let u = update(&[("device", "Den"), ("numLights", "3"), ("light0", "Desk")]);
        u.validate(&DeviceConfig::default()).unwrap();
        u.apply(&store).unwrap();

        let config = DeviceConfig::load(&store);
        assert_eq!(config.device_name, "Den");
        assert_eq!(config.num_lights, 3);
        assert_eq!(config.light_names[0], "Desk");
        assert_eq!(config.light_names[1], "Light 2");
    }

    // ==================== Name Validation Tests ====================

    #[test]
    fn test_light_name_rules() {
        assert!(validate_light_name("Kitchen").is_ok());
        assert!(validate_light_name("Living Room").is_ok());
        assert_eq!(validate_light_name("  "), Err(NameError::Empty));
        assert_eq!(validate_light_name("a/b"), Err(NameError::InvalidChar('/')));
        assert_eq!(validate_light_name("a\nb"), Err(NameError::InvalidChar('\n')));
        assert!(matches!(
            validate_light_name(&"x".repeat(33)),
            Err(NameError::TooLong { .. })
        ));
    }

    #[test]
    fn test_device_name_may_contain_slash() {
        assert!(validate_name("den/left").is_ok());
    }

    #[test]
    fn test_duplicate_active_names_rejected() {
        let u = update(&[("light1", "Light 1")]);
        assert_eq!(
            u.validate(&DeviceConfig::default()),
            Err(NameError::Duplicate("Light 1".into()))
        );
    }

    #[test]
    fn test_duplicate_inactive_name_allowed() {
        let u = update(&[("numLights", "2"), ("light3", "Light 1")]);
        assert!(u.validate(&DeviceConfig::default()).is_ok());
    }
}
