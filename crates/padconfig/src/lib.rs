use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};

/// Largest edge accepted for the preview window.
pub const MAX_SURFACE_EDGE: u32 = 16_384;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Window size written as `WIDTHxHEIGHT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn as_tuple(self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl Default for SurfaceSize {
    fn default() -> Self {
        Self::new(1280, 720)
    }
}

impl fmt::Display for SurfaceSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for SurfaceSize {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase();
        let (width, height) = normalized
            .split_once('x')
            .ok_or_else(|| format!("invalid size '{raw}'; expected WIDTHxHEIGHT"))?;
        let parse_edge = |value: &str| -> Result<u32, String> {
            let edge: u32 = value
                .trim()
                .parse()
                .map_err(|_| format!("invalid size '{raw}'; '{value}' is not a whole number"))?;
            if edge == 0 || edge > MAX_SURFACE_EDGE {
                return Err(format!(
                    "invalid size '{raw}'; each edge must be between 1 and {MAX_SURFACE_EDGE}"
                ));
            }
            Ok(edge)
        };
        Ok(Self::new(parse_edge(width)?, parse_edge(height)?))
    }
}

impl Serialize for SurfaceSize {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SurfaceSize {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PadConfig {
    pub version: u32,
    #[serde(default)]
    pub render: RenderSettings,
    #[serde(default)]
    pub shaders: ShaderSettings,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RenderSettings {
    /// Wrap period for `iTime`. Zero freezes time; absent runs unbounded.
    #[serde(
        default,
        deserialize_with = "deserialize_duration_opt",
        serialize_with = "serialize_duration_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub loop_period: Option<Duration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub perf_cycle: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<SurfaceSize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth_buffer: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ShaderSettings {
    #[serde(default)]
    pub roots: Vec<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl Default for PadConfig {
    fn default() -> Self {
        Self {
            version: 1,
            render: RenderSettings::default(),
            shaders: ShaderSettings::default(),
        }
    }
}

fn serialize_duration_opt<S>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(duration) if duration.is_zero() => serializer.serialize_u64(0),
        Some(duration) => serializer.collect_str(&humantime::format_duration(*duration)),
        None => serializer.serialize_none(),
    }
}

/// Loop periods are written either as plain seconds (`10`, `2.5`) or as a
/// humantime string (`"1m 30s"`).
#[derive(Deserialize)]
#[serde(untagged)]
enum PeriodRepr {
    Seconds(f64),
    Text(String),
}

impl PeriodRepr {
    fn into_duration(self) -> Result<Duration, String> {
        match self {
            PeriodRepr::Seconds(secs) if secs.is_finite() && secs >= 0.0 => {
                Ok(Duration::from_secs_f64(secs))
            }
            PeriodRepr::Seconds(secs) => Err(format!("loop period {secs} must be non-negative")),
            PeriodRepr::Text(text) => match text.trim() {
                "0" => Ok(Duration::ZERO),
                trimmed => humantime::parse_duration(trimmed)
                    .map_err(|err| format!("invalid loop period '{trimmed}': {err}")),
            },
        }
    }
}

fn deserialize_duration_opt<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<PeriodRepr>::deserialize(deserializer)?
        .map(PeriodRepr::into_duration)
        .transpose()
        .map_err(de::Error::custom)
}

impl PadConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: PadConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Loads `path` when it exists, otherwise returns the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.is_file() {
            Self::from_path(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loop period in seconds as consumed by the render loop.
    pub fn loop_period_secs(&self) -> Option<f32> {
        self.render.loop_period.map(|period| period.as_secs_f32())
    }

    pub fn perf_cycle(&self) -> u32 {
        self.render.perf_cycle.unwrap_or(0)
    }

    pub fn size(&self) -> SurfaceSize {
        self.render.size.unwrap_or_default()
    }

    pub fn depth_buffer(&self) -> bool {
        self.render.depth_buffer.unwrap_or(false)
    }

    pub fn default_shader(&self) -> Option<&str> {
        self.shaders.default.as_deref()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 1 {
            return Err(ConfigError::Invalid(format!(
                "unsupported config version {}; expected 1",
                self.version
            )));
        }

        for root in &self.shaders.roots {
            if root.as_os_str().is_empty() {
                return Err(ConfigError::Invalid(
                    "shaders.roots may not contain an empty path".into(),
                ));
            }
        }

        if let Some(name) = &self.shaders.default {
            if name.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "shaders.default may not be empty".into(),
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
version = 1

[render]
loop_period = "5s"
perf_cycle = 120
size = "800x600"
depth_buffer = true

[shaders]
roots = ["~/shaders", "/usr/share/shaderpad/shaders"]
default = "plasma"
"#;

    #[test]
    fn parses_sample_config() {
        let config = PadConfig::from_toml_str(SAMPLE).expect("parse config");
        assert_eq!(config.render.loop_period, Some(Duration::from_secs(5)));
        assert_eq!(config.loop_period_secs(), Some(5.0));
        assert_eq!(config.perf_cycle(), 120);
        assert_eq!(config.size(), SurfaceSize::new(800, 600));
        assert!(config.depth_buffer());
        assert_eq!(config.shaders.roots.len(), 2);
        assert_eq!(config.default_shader(), Some("plasma"));
    }

    #[test]
    fn empty_sections_fall_back_to_defaults() {
        let config = PadConfig::from_toml_str("version = 1").expect("parse config");
        assert_eq!(config.loop_period_secs(), None);
        assert_eq!(config.perf_cycle(), 0);
        assert_eq!(config.size(), SurfaceSize::new(1280, 720));
        assert!(!config.depth_buffer());
        assert!(config.shaders.roots.is_empty());
    }

    #[test]
    fn zero_loop_period_is_kept() {
        let config = PadConfig::from_toml_str(
            r#"
version = 1
[render]
loop_period = 0
"#,
        )
        .expect("parse config");
        assert_eq!(config.loop_period_secs(), Some(0.0));

        let config = PadConfig::from_toml_str(
            r#"
version = 1
[render]
loop_period = 2.5
"#,
        )
        .expect("parse config");
        assert_eq!(config.loop_period_secs(), Some(2.5));
    }

    #[test]
    fn rejects_unsupported_version() {
        let err = PadConfig::from_toml_str("version = 2").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_negative_loop_period() {
        let err = PadConfig::from_toml_str(
            r#"
version = 1
[render]
loop_period = -3
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn rejects_blank_default_shader() {
        let err = PadConfig::from_toml_str(
            r#"
version = 1
[shaders]
default = "  "
"#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn parses_surface_sizes() {
        assert_eq!("1920x1080".parse(), Ok(SurfaceSize::new(1920, 1080)));
        assert_eq!(" 64X32 ".parse(), Ok(SurfaceSize::new(64, 32)));
        assert!("0x720".parse::<SurfaceSize>().is_err());
        assert!("1280".parse::<SurfaceSize>().is_err());
        assert!("wide x tall".parse::<SurfaceSize>().is_err());
        assert!("99999x10".parse::<SurfaceSize>().is_err());
        assert_eq!(SurfaceSize::new(800, 600).to_string(), "800x600");
    }

    #[test]
    fn serialized_config_parses_back() {
        let config = PadConfig::from_toml_str(SAMPLE).expect("parse config");
        let rendered = toml::to_string(&config).expect("serialize");
        assert!(rendered.contains("loop_period = \"5s\""));
        assert!(rendered.contains("size = \"800x600\""));
        let reparsed = PadConfig::from_toml_str(&rendered).expect("reparse");
        assert_eq!(reparsed.render.loop_period, config.render.loop_period);
        assert_eq!(reparsed.size(), config.size());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config =
            PadConfig::load_or_default(Path::new("/nonexistent/shaderpad.toml")).expect("default");
        assert_eq!(config.version, 1);
    }
}
