//! 配置
//!
//! 所有可调参数集中在一个 JSON 文件里，缺失的字段使用默认值。
//! 默认路径为 `<配置目录>/xiangqi-opponent/config.json`。

use std::path::{Path, PathBuf};

use anyhow::Context;
use chess_ai::{AiConfig, ArbiterConfig, RemoteConfig};
use chess_core::Side;
use serde::{Deserialize, Serialize};

/// 完整配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// AI 执哪一方
    pub ai_side: Side,
    /// 默认日志过滤规则，`RUST_LOG` 优先
    pub log_filter: String,
    /// 本地搜索
    pub ai: AiConfig,
    /// 远程查询
    pub remote: RemoteConfig,
    /// 决策器
    pub arbiter: ArbiterConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            ai_side: Side::Black,
            log_filter: "info".to_string(),
            ai: AiConfig::default(),
            remote: RemoteConfig::default(),
            arbiter: ArbiterConfig::default(),
        }
    }
}

impl GameConfig {
    /// 获取默认配置文件路径
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut path| {
            path.push("xiangqi-opponent");
            path.push("config.json");
            path
        })
    }

    /// 加载配置，未指定路径时使用默认路径
    pub fn load(path: Option<&Path>) -> Self {
        match path.map(Path::to_path_buf).or_else(Self::default_path) {
            Some(path) => Self::load_from(&path),
            None => {
                tracing::warn!("无法获取配置目录，使用默认配置");
                Self::default()
            }
        }
    }

    /// 从文件加载配置，文件缺失或格式错误时使用默认配置
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            tracing::info!("配置文件不存在，使用默认配置: {:?}", path);
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(config) => {
                    tracing::info!("已加载配置: {:?}", path);
                    config
                }
                Err(e) => {
                    tracing::warn!("配置文件格式无效: {}，使用默认配置", e);
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("无法读取配置文件: {}，使用默认配置", e);
                Self::default()
            }
        }
    }

    /// 保存配置到文件
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("无法创建配置目录: {:?}", parent))?;
        }

        let content = serde_json::to_string_pretty(self).context("序列化配置失败")?;
        std::fs::write(path, content).with_context(|| format!("写入配置文件失败: {:?}", path))?;

        tracing::info!("配置已保存: {:?}", path);
        Ok(())
    }
}
