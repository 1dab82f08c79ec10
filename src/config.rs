use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::time::Duration;

const BUILTIN_CONFIG: &str = include_str!("../assets/portfolio.json");

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// A named camera pose reachable from the navigation bar.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NamedView {
    pub name: String,
    #[serde(default)]
    pub label: String,
    pub position: [f32; 3],
    pub target: [f32; 3],
    pub caption: String,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ObjectInfo {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub content: Vec<String>,
}

/// Semantic object recognized by mesh name.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ObjectDescriptor {
    pub key: String,
    pub category: String,
    pub position: [f32; 3],
    pub target: [f32; 3],
    pub info: ObjectInfo,
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Timings {
    pub view_transition_secs: f32,
    pub object_transition_secs: f32,
    pub caption_ms: u64,
    pub welcome_delay_ms: u64,
    pub welcome_ms: u64,
    pub enter_gate_ms: u64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            view_transition_secs: 2.0,
            object_transition_secs: 2.5,
            caption_ms: 3000,
            welcome_delay_ms: 1000,
            welcome_ms: 4000,
            enter_gate_ms: 4000,
        }
    }
}

impl Timings {
    pub fn caption(&self) -> Duration {
        Duration::from_millis(self.caption_ms)
    }

    pub fn welcome_delay(&self) -> Duration {
        Duration::from_millis(self.welcome_delay_ms)
    }

    pub fn welcome(&self) -> Duration {
        Duration::from_millis(self.welcome_ms)
    }

    pub fn enter_gate(&self) -> Duration {
        Duration::from_millis(self.enter_gate_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct MovementSettings {
    /// World units per active axis per frame.
    pub step: f32,
}

impl Default for MovementSettings {
    fn default() -> Self {
        Self { step: 0.5 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    pub fov_deg: f32,
    pub near: f32,
    pub far: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub max_polar_angle: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            fov_deg: 75.0,
            near: 0.1,
            far: 1000.0,
            min_distance: 1.0,
            max_distance: 20.0,
            max_polar_angle: std::f32::consts::PI / 1.8,
        }
    }
}

/// Static data loaded once at startup: views, recognized objects and tuning.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PortfolioConfig {
    pub scene_path: String,
    pub home_view: String,
    pub views: Vec<NamedView>,
    pub objects: Vec<ObjectDescriptor>,
    #[serde(default)]
    pub synonyms: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub timings: Timings,
    #[serde(default)]
    pub movement: MovementSettings,
    #[serde(default)]
    pub camera: CameraSettings,
}

impl PortfolioConfig {
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_CONFIG)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: PortfolioConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn view(&self, name: &str) -> Option<&NamedView> {
        self.views.iter().find(|view| view.name == name)
    }

    pub fn home(&self) -> Option<&NamedView> {
        self.view(&self.home_view)
    }

    pub fn synonyms_for(&self, key: &str) -> &[String] {
        self.synonyms
            .get(key)
            .map(|values| values.as_slice())
            .unwrap_or(&[])
    }

    fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        for view in &self.views {
            if !names.insert(view.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate view name '{}'",
                    view.name
                )));
            }
        }
        if self.home().is_none() {
            return Err(ConfigError::Invalid(format!(
                "home view '{}' is not defined",
                self.home_view
            )));
        }
        let mut keys = HashSet::new();
        for object in &self.objects {
            if object.key.trim().is_empty() {
                return Err(ConfigError::Invalid("object key is empty".to_string()));
            }
            if !keys.insert(object.key.to_lowercase()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate object key '{}'",
                    object.key
                )));
            }
        }
        if !(self.timings.view_transition_secs > 0.0 && self.timings.object_transition_secs > 0.0)
        {
            return Err(ConfigError::Invalid(
                "transition durations must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

pub fn load_config_from_file(path: &Path) -> Result<PortfolioConfig> {
    let json = std::fs::read_to_string(path)?;
    PortfolioConfig::from_json(&json)
}

/// Loads `path` when given, falling back to the built-in config on any error.
pub fn load_or_builtin(path: Option<&Path>) -> Result<PortfolioConfig> {
    if let Some(path) = path {
        match load_config_from_file(path) {
            Ok(config) => {
                log::info!("Loaded config from {}", path.display());
                return Ok(config);
            }
            Err(err) => {
                log::error!("Failed to load config {}: {}", path.display(), err);
            }
        }
    }
    PortfolioConfig::builtin()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_config_parses_and_has_home() {
        let config = PortfolioConfig::builtin().unwrap();
        assert_eq!(config.home_view, "home");
        assert!(config.home().is_some());
        assert_eq!(config.views.len(), 4);
        let keys: Vec<&str> = config.objects.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["desk", "computer", "artwork", "books"]);
        assert_eq!(config.movement.step, 0.5);
        assert_eq!(config.timings.caption_ms, 3000);
        assert!(config.synonyms_for("books").iter().any(|s| s == "shelf"));
        assert!(config.synonyms_for("missing").is_empty());
    }

    #[test]
    fn missing_home_view_is_rejected() {
        let mut config = PortfolioConfig::builtin().unwrap();
        config.home_view = "nowhere".to_string();
        let json = serde_json::to_string(&config).unwrap();
        let err = PortfolioConfig::from_json(&json).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn duplicate_object_keys_are_rejected() {
        let mut config = PortfolioConfig::builtin().unwrap();
        let mut dup = config.objects[0].clone();
        dup.key = "DESK".to_string();
        config.objects.push(dup);
        let json = serde_json::to_string(&config).unwrap();
        assert!(matches!(
            PortfolioConfig::from_json(&json),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn optional_sections_fall_back_to_defaults() {
        let json = r#"{
            "scene_path": "scene.glb",
            "home_view": "home",
            "views": [{ "name": "home", "position": [0, 0, 5], "target": [0, 0, 0], "caption": "Hi" }],
            "objects": []
        }"#;
        let config = PortfolioConfig::from_json(json).unwrap();
        assert_eq!(config.timings, Timings::default());
        assert_eq!(config.camera, CameraSettings::default());
        assert_eq!(config.views[0].label, "");
    }

    #[test]
    fn load_from_file_roundtrip() {
        let config = PortfolioConfig::builtin().unwrap();
        let mut path = std::env::temp_dir();
        path.push(format!("deskfolio_config_{}.json", std::process::id()));
        std::fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();

        let loaded = load_config_from_file(&path).unwrap();
        assert_eq!(loaded, config);

        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn unreadable_file_falls_back_to_builtin() {
        let path = std::env::temp_dir().join("deskfolio_definitely_missing.json");
        let config = load_or_builtin(Some(&path)).unwrap();
        assert_eq!(config, PortfolioConfig::builtin().unwrap());
    }
}
