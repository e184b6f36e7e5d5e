//! # Config 模块
//!
//! 宿主配置管理，集中管理所有配置项。
//!
//! ## 配置优先级
//!
//! 1. 命令行参数（最高）
//! 2. 配置文件 (config.json)
//! 3. 默认值（最低）

use std::fs;
use std::path::{Path, PathBuf};

use overlay_runtime::OverlayConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::Level;

/// 宿主配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostConfig {
    /// 模板文档路径（元素树 JSON）
    #[serde(default = "default_document_path")]
    pub document_path: PathBuf,

    /// 日志级别（trace/debug/info/warn/error）
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// 调度引擎配置
    #[serde(default)]
    pub overlay: OverlayConfig,
}

// 默认值函数
fn default_document_path() -> PathBuf {
    PathBuf::from("overlay-host/assets/lower_third.json")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            document_path: default_document_path(),
            log_level: default_log_level(),
            overlay: OverlayConfig::default(),
        }
    }
}

impl HostConfig {
    /// 读取配置文件
    ///
    /// 文件不存在或解析失败时返回错误，调用方决定是否回退到默认配置。
    pub fn try_load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| ConfigError::ParseFailed(e.to_string()))
    }

    /// 加载配置文件
    ///
    /// 如果文件不存在或解析失败，返回默认配置并记录警告。
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::try_load(path) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "配置文件加载成功");
                config
            }
            Err(e) => {
                tracing::warn!("{e}，使用默认配置");
                Self::default()
            }
        }
    }

    /// 保存配置到文件
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializationFailed(e.to_string()))?;

        fs::write(path, json).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// 解析日志级别
    pub fn level(&self) -> Result<Level, ConfigError> {
        self.log_level
            .parse()
            .map_err(|_| ConfigError::ValidationFailed(format!("无效的日志级别: {}", self.log_level)))
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.level()?;

        if self.document_path.as_os_str().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "必须配置 document_path（模板文档路径）".to_string(),
            ));
        }

        if !self.document_path.exists() {
            return Err(ConfigError::ValidationFailed(format!(
                "模板文档不存在: {:?}",
                self.document_path
            )));
        }

        Ok(())
    }
}

/// 配置错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// 配置文件不存在
    #[error("配置文件不存在: {0:?}")]
    NotFound(PathBuf),
    /// 解析失败
    #[error("配置文件解析失败: {0}")]
    ParseFailed(String),
    /// 序列化失败
    #[error("配置序列化失败: {0}")]
    SerializationFailed(String),
    /// IO 错误
    #[error("配置 IO 错误: {0}")]
    IoError(String),
    /// 验证失败
    #[error("配置验证失败: {0}")]
    ValidationFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HostConfig::default();
        assert_eq!(config.log_level, "info");
        assert_eq!(config.level().unwrap(), Level::INFO);
        assert!(!config.overlay.debug);
    }

    #[test]
    fn test_config_serialization() {
        let mut config = HostConfig::default();
        config.overlay.strict_stage_zero = true;
        let json = serde_json::to_string_pretty(&config).unwrap();

        // 反序列化
        let loaded: HostConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let loaded: HostConfig =
            serde_json::from_str(r#"{"overlay": {"replay_signals": true}}"#).unwrap();
        assert!(loaded.overlay.replay_signals);
        assert_eq!(loaded.document_path, default_document_path());
    }

    #[test]
    fn test_config_validation() {
        let mut config = HostConfig::default();

        // 无效日志级别
        config.log_level = "loud".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationFailed(_))
        ));

        // 文档不存在
        config.log_level = "debug".to_string();
        config.document_path = PathBuf::from("definitely/missing.json");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            HostConfig::try_load("definitely/missing/config.json"),
            Err(ConfigError::NotFound(_))
        ));
        assert_eq!(
            HostConfig::load("definitely/missing/config.json"),
            HostConfig::default()
        );
    }
}
