use std::path::PathBuf;

use crate::auth::JwtConfig;
use crate::core::Result;

/// 服务器配置
///
/// # 环境变量
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | HTTP_PORT | 3000 | HTTP 服务端口 |
/// | ENVIRONMENT | development | 运行环境 |
/// | LOG_LEVEL | info | 日志级别 (RUST_LOG 优先) |
/// | LOG_DIR | - | 日志目录，存在时按天滚动写入文件 |
/// | ROLES_FILE | - | 角色快照 (JSON)，未设置时使用内置角色 |
/// | USERS_FILE | - | 用户种子 (JSON)，未设置时只有 1 号管理员 |
/// | ACTIVITY_BUFFER | 1024 | 活动日志通道容量 |
/// | ACTIVITY_RETENTION | 1000 | 内存中保留的活动条目数 |
/// | IDENTITY_EVENT_BUFFER | 256 | 身份变更事件通道容量 |
///
/// JWT 相关变量见 [`JwtConfig::from_env`]。
#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    /// 运行环境: development | staging | production
    pub environment: String,
    pub log_level: String,
    pub log_dir: Option<String>,
    pub roles_file: Option<PathBuf>,
    pub users_file: Option<PathBuf>,
    pub activity_buffer: usize,
    pub activity_retention: usize,
    pub identity_event_buffer: usize,
    /// JWT 认证配置
    pub jwt: JwtConfig,
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值；JWT 密钥不合法时返回错误
    pub fn from_env() -> Result<Self> {
        let mut config = Self::with_jwt(JwtConfig::from_env()?);
        config.http_port = env_parse("HTTP_PORT", config.http_port);
        config.environment = std::env::var("ENVIRONMENT").unwrap_or(config.environment);
        config.log_level = std::env::var("LOG_LEVEL").unwrap_or(config.log_level);
        config.log_dir = std::env::var("LOG_DIR").ok();
        config.roles_file = std::env::var("ROLES_FILE").ok().map(PathBuf::from);
        config.users_file = std::env::var("USERS_FILE").ok().map(PathBuf::from);
        config.activity_buffer = env_parse("ACTIVITY_BUFFER", config.activity_buffer);
        config.activity_retention = env_parse("ACTIVITY_RETENTION", config.activity_retention);
        config.identity_event_buffer =
            env_parse("IDENTITY_EVENT_BUFFER", config.identity_event_buffer);
        Ok(config)
    }

    /// Defaults with the given JWT configuration, no environment lookups
    ///
    /// 常用于测试场景
    pub fn with_jwt(jwt: JwtConfig) -> Self {
        Self {
            http_port: 3000,
            environment: "development".to_string(),
            log_level: "info".to_string(),
            log_dir: None,
            roles_file: None,
            users_file: None,
            activity_buffer: 1024,
            activity_retention: 1000,
            identity_event_buffer: 256,
            jwt,
        }
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 是否开发环境
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::with_jwt(JwtConfig::with_secret("x".repeat(32)));
        assert_eq!(config.http_port, 3000);
        assert!(config.is_development());
        assert!(!config.is_production());
        assert_eq!(config.identity_event_buffer, 256);
        assert!(config.roles_file.is_none());
    }
}
