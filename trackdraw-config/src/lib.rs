use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

pub const CONFIG_ENV: &str = "TRACKDRAW_CONFIG";

/// 应用配置的根结构。缺省值即固定的输入/输出路径与颜色。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub paths: PathConfig,
    #[serde(default)]
    pub style: StyleConfig,
}

impl AppConfig {
    /// 从显式路径加载配置。
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// 自动发现配置文件：优先读取环境变量 `TRACKDRAW_CONFIG`，否则寻找 `./config/default.toml`。
    /// 若文件缺失，则返回默认配置。
    pub fn discover() -> Result<Self, ConfigError> {
        if let Some(path) = env::var_os(CONFIG_ENV) {
            return Self::from_file(PathBuf::from(path));
        }

        let default_path = env::current_dir()
            .map(|dir| dir.join("config").join("default.toml"))
            .map_err(|source| ConfigError::Context {
                message: "获取当前工作目录失败".to_string(),
                source,
            })?;

        if default_path.exists() {
            Self::from_file(default_path)
        } else {
            Ok(Self::default())
        }
    }

    /// 模板与输出不能是同一文件。
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.paths.template == self.paths.output {
            return Err(ConfigError::Invalid(format!(
                "输出路径 {:?} 与模板路径相同",
                self.paths.output
            )));
        }
        Ok(())
    }
}

/// 日志配置，支持设置默认等级。
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

/// 输入数据、DXF 模板与输出文件的位置，相对路径以当前工作目录为基准。
#[derive(Debug, Clone, Deserialize)]
pub struct PathConfig {
    #[serde(default = "PathConfig::default_track_data")]
    pub track_data: PathBuf,
    #[serde(default = "PathConfig::default_template")]
    pub template: PathBuf,
    #[serde(default = "PathConfig::default_output")]
    pub output: PathBuf,
}

impl PathConfig {
    fn default_track_data() -> PathBuf {
        PathBuf::from("OutputData").join("pipeTrack2D.txt")
    }

    fn default_template() -> PathBuf {
        PathBuf::from("InputData").join("stmConfig.dxf")
    }

    fn default_output() -> PathBuf {
        PathBuf::from("OutputData").join("stmConfig.dxf")
    }
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            track_data: Self::default_track_data(),
            template: Self::default_template(),
            output: Self::default_output(),
        }
    }
}

/// 图元颜色（ACI 索引）与图层。
#[derive(Debug, Clone, Deserialize)]
pub struct StyleConfig {
    #[serde(default = "StyleConfig::default_line_color")]
    pub line_color: u8,
    #[serde(default = "StyleConfig::default_dot_color")]
    pub dot_color: u8,
    #[serde(default = "StyleConfig::default_layer")]
    pub layer: String,
}

impl StyleConfig {
    fn default_line_color() -> u8 {
        3
    }

    fn default_dot_color() -> u8 {
        1
    }

    fn default_layer() -> String {
        "0".to_string()
    }
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            line_color: Self::default_line_color(),
            dot_color: Self::default_dot_color(),
            layer: Self::default_layer(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件 {path:?} 失败: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("解析配置文件 {path:?} 失败: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{message}")]
    Context {
        message: String,
        #[source]
        source: std::io::Error,
    },
    #[error("配置无效: {0}")]
    Invalid(String),
}
