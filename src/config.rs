use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::calibration::CalibrationVariant;
use crate::playback::Sensor;
use crate::plotter::RenderMode;
use crate::spectrum::TagAlignment;
use crate::types::{Measurement, MAX_OBJECTS};

/// 配置管理模块
/// 集中管理校准与频谱分析的配置项，提供默认值和配置验证

/// 休斯顿当地重力加速度 (NOAA 重力预测)
pub const DEFAULT_GRAVITY: f64 = 9.79281;

/// 主配置结构
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub calibration: CalibrationConfig,
    pub spectrum: SpectrumConfig,
    pub render: RenderConfig,
}

/// 校准配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// "full" 或 "bias-only"
    pub variant: String,
    pub gravity: f64,
    /// 初始猜测，缺省时偏置取 0、比例因子取 1
    pub initial_guess: Option<Vec<f64>>,
    pub max_iterations: usize,
    /// 残差最大绝对值的收敛阈值，相对 g²
    pub tolerance: f64,
    pub measurements: Vec<Measurement>,
}

/// 频谱分析配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectrumConfig {
    /// "wf" 或 "nf"
    pub sensor: String,
    pub object_id: usize,
    /// "position" 或 "timestamp"
    pub tag_alignment: String,
}

/// 输出图像配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// "heatmap"、"animation" 或 "none"
    pub mode: String,
    pub output: Option<String>,
    pub heatmap_vmax: f64,
    pub animation_ylim: f64,
    pub frame_duration_ms: u32,
    pub frame_width: u32,
    pub frame_height: u32,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            variant: "full".to_string(),
            gravity: DEFAULT_GRAVITY,
            initial_guess: None,
            max_iterations: 50,
            tolerance: 1e-9,
            // 六个朝向下的静止读数
            measurements: vec![
                Measurement::new(0.13028911, 0.12664859, 9.98692131),
                Measurement::new(-9.50260544, 0.07374427, -2.35186720),
                Measurement::new(0.17701271, 7.17228413, -6.64125538),
                Measurement::new(8.29341698, 4.16669178, -3.09963512),
                Measurement::new(3.54227853, 5.16701508, 7.60187197),
                Measurement::new(2.97791672, -2.96459055, 9.08387566),
            ],
        }
    }
}

impl Default for SpectrumConfig {
    fn default() -> Self {
        Self {
            sensor: "wf".to_string(),
            object_id: 1,
            tag_alignment: "position".to_string(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            mode: "animation".to_string(),
            output: None,
            heatmap_vmax: 100.0,
            animation_ylim: 50.0,
            frame_duration_ms: 100,
            frame_width: 640,
            frame_height: 480,
        }
    }
}

impl CalibrationConfig {
    pub fn variant(&self) -> Result<CalibrationVariant, ConfigError> {
        self.variant.parse()
    }
}

impl SpectrumConfig {
    pub fn sensor(&self) -> Result<Sensor, ConfigError> {
        self.sensor.parse()
    }

    pub fn tag_alignment(&self) -> Result<TagAlignment, ConfigError> {
        self.tag_alignment.parse()
    }
}

impl RenderConfig {
    pub fn mode(&self) -> Result<RenderMode, ConfigError> {
        self.mode.parse()
    }

    /// 输出文件路径，未配置时按模式取默认文件名
    pub fn output_path(&self) -> Result<Option<PathBuf>, ConfigError> {
        let path = match (&self.output, self.mode()?) {
            (_, RenderMode::None) => None,
            (Some(path), _) => Some(PathBuf::from(path)),
            (None, RenderMode::Heatmap) => Some(PathBuf::from("heatmap.png")),
            (None, RenderMode::Animation) => Some(PathBuf::from("out.gif")),
        };
        Ok(path)
    }
}

impl AppConfig {
    /// 从文件加载配置
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::IoError)?;

        let config: AppConfig = toml::from_str(&content).map_err(ConfigError::ParseError)?;

        config.validate()?;
        Ok(config)
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self).map_err(ConfigError::SerializeError)?;

        std::fs::write(path, content).map_err(ConfigError::IoError)?;

        Ok(())
    }

    /// 验证配置的有效性
    ///
    /// 所有枚举型选项在这里解析，任何处理开始之前就报告 `UnsupportedOption`。
    pub fn validate(&self) -> Result<(), ConfigError> {
        let variant = self.calibration.variant()?;
        self.spectrum.sensor()?;
        self.spectrum.tag_alignment()?;
        self.render.mode()?;

        if !self.calibration.gravity.is_finite() || self.calibration.gravity <= 0.0 {
            return Err(ConfigError::ValidationError("Gravity must be a positive number".to_string()));
        }

        if self.calibration.max_iterations == 0 {
            return Err(ConfigError::ValidationError("Maximum iterations must be at least 1".to_string()));
        }

        if !self.calibration.tolerance.is_finite() || self.calibration.tolerance <= 0.0 {
            return Err(ConfigError::ValidationError("Solver tolerance must be positive".to_string()));
        }

        if let Some(guess) = &self.calibration.initial_guess {
            if guess.len() != variant.unknown_count() {
                return Err(ConfigError::ValidationError(format!(
                    "Initial guess has {} values, {} variant needs {}",
                    guess.len(),
                    variant,
                    variant.unknown_count()
                )));
            }
        }

        if self.spectrum.object_id >= MAX_OBJECTS {
            return Err(ConfigError::ValidationError(format!(
                "Object id must be below {}, got {}",
                MAX_OBJECTS, self.spectrum.object_id
            )));
        }

        if self.render.heatmap_vmax <= 0.0 || self.render.animation_ylim <= 0.0 {
            return Err(ConfigError::ValidationError("Plot intensity limits must be positive".to_string()));
        }

        if self.render.frame_width == 0 || self.render.frame_height == 0 {
            return Err(ConfigError::ValidationError("Frame dimensions must be positive".to_string()));
        }

        Ok(())
    }
}

/// 配置错误类型
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(std::io::Error),
    #[error("Parse error: {0}")]
    ParseError(toml::de::Error),
    #[error("Serialize error: {0}")]
    SerializeError(toml::ser::Error),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Unsupported value {value:?} for option `{option}`")]
    UnsupportedOption { option: &'static str, value: String },
}

impl ConfigError {
    pub fn unsupported(option: &'static str, value: &str) -> Self {
        ConfigError::UnsupportedOption {
            option,
            value: value.to_string(),
        }
    }
}
