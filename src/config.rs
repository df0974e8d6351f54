use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;
use crate::services::batcher::BATCH_SIZE;
use crate::services::segmenter::MIN_WORDS;

/// 默认配置文件路径
pub const DEFAULT_CONFIG_FILE: &str = "docx_suggester.toml";

/// 未配置 API Key 时 `.env` 模板中的占位值
const API_KEY_PLACEHOLDER: &str = "your_openai_api_key_here";

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 上传文件存放目录
    pub upload_dir: PathBuf,
    /// HTTP 监听地址
    pub bind_addr: String,
    /// 对外可访问的地址（用于生成下载链接）
    pub public_base_url: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    pub llm_temperature: f32,
    pub llm_max_tokens: u32,
    // --- 分析配置 ---
    /// 每个批次发送给 LLM 的段落数
    pub batch_size: usize,
    /// 少于该词数的段落不参与分析
    pub min_words: usize,
    /// 同时进行的 LLM 请求数
    pub max_concurrent_windows: usize,
    /// 远程下载超时（秒）
    pub download_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("uploads"),
            bind_addr: "0.0.0.0:8787".to_string(),
            public_base_url: "http://localhost:8787".to_string(),
            verbose_logging: false,
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4o".to_string(),
            llm_temperature: 0.3,
            llm_max_tokens: 2000,
            batch_size: BATCH_SIZE,
            min_words: MIN_WORDS,
            max_concurrent_windows: 4,
            download_timeout_secs: 30,
        }
    }
}

/// TOML 配置文件中允许出现的字段，全部可选
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    upload_dir: Option<PathBuf>,
    bind_addr: Option<String>,
    public_base_url: Option<String>,
    verbose_logging: Option<bool>,
    llm_api_key: Option<String>,
    llm_api_base_url: Option<String>,
    llm_model_name: Option<String>,
    llm_temperature: Option<f32>,
    llm_max_tokens: Option<u32>,
    batch_size: Option<usize>,
    min_words: Option<usize>,
    max_concurrent_windows: Option<usize>,
    download_timeout_secs: Option<u64>,
}

impl Config {
    /// 按 默认值 → TOML 文件 → 环境变量 的顺序加载配置
    pub fn load() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let path = std::env::var("DOCX_SUGGESTER_CONFIG")
            .unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        let base = Self::from_file_or_default(Path::new(&path))?;

        Ok(base.with_env())
    }

    /// 只使用默认值和环境变量
    pub fn from_env() -> Self {
        Self::default().with_env()
    }

    /// 读取 TOML 配置文件，文件不存在时返回默认配置
    pub fn from_file_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.display().to_string(),
            source,
        })?;

        Self::from_toml_str(&content).map_err(|source| ConfigError::TomlParseFailed {
            path: path.display().to_string(),
            source,
        })
    }

    /// 从 TOML 文本构建配置，未出现的字段使用默认值
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        let file: FileConfig = toml::from_str(content)?;
        let default = Self::default();

        Ok(Self {
            upload_dir: file.upload_dir.unwrap_or(default.upload_dir),
            bind_addr: file.bind_addr.unwrap_or(default.bind_addr),
            public_base_url: file.public_base_url.unwrap_or(default.public_base_url),
            verbose_logging: file.verbose_logging.unwrap_or(default.verbose_logging),
            llm_api_key: file.llm_api_key.unwrap_or(default.llm_api_key),
            llm_api_base_url: file.llm_api_base_url.unwrap_or(default.llm_api_base_url),
            llm_model_name: file.llm_model_name.unwrap_or(default.llm_model_name),
            llm_temperature: file.llm_temperature.unwrap_or(default.llm_temperature),
            llm_max_tokens: file.llm_max_tokens.unwrap_or(default.llm_max_tokens),
            batch_size: file.batch_size.unwrap_or(default.batch_size),
            min_words: file.min_words.unwrap_or(default.min_words),
            max_concurrent_windows: file
                .max_concurrent_windows
                .unwrap_or(default.max_concurrent_windows),
            download_timeout_secs: file
                .download_timeout_secs
                .unwrap_or(default.download_timeout_secs),
        })
    }

    /// 用环境变量覆盖当前配置，解析失败的值保留原值
    pub fn with_env(self) -> Self {
        Self {
            upload_dir: std::env::var("UPLOAD_DIR").map(PathBuf::from).unwrap_or(self.upload_dir),
            bind_addr: std::env::var("BIND_ADDR").unwrap_or(self.bind_addr),
            public_base_url: std::env::var("NGROK_URL").unwrap_or(self.public_base_url),
            verbose_logging: env_parse("VERBOSE_LOGGING").unwrap_or(self.verbose_logging),
            llm_api_key: std::env::var("OPENAI_API_KEY").unwrap_or(self.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(self.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(self.llm_model_name),
            llm_temperature: env_parse("LLM_TEMPERATURE").unwrap_or(self.llm_temperature),
            llm_max_tokens: env_parse("LLM_MAX_TOKENS").unwrap_or(self.llm_max_tokens),
            batch_size: env_parse("BATCH_SIZE").unwrap_or(self.batch_size),
            min_words: env_parse("MIN_WORDS").unwrap_or(self.min_words),
            max_concurrent_windows: env_parse("MAX_CONCURRENT_WINDOWS")
                .unwrap_or(self.max_concurrent_windows),
            download_timeout_secs: env_parse("DOWNLOAD_TIMEOUT_SECS")
                .unwrap_or(self.download_timeout_secs),
        }
    }

    /// 是否配置了可用的 LLM（否则使用规则兜底）
    pub fn oracle_configured(&self) -> bool {
        let key = self.llm_api_key.trim();
        !key.is_empty() && key != API_KEY_PLACEHOLDER
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.batch_size, BATCH_SIZE);
        assert_eq!(config.min_words, MIN_WORDS);
        assert_eq!((BATCH_SIZE, MIN_WORDS), (5, 10));
        assert!(!config.oracle_configured());
    }

    #[test]
    fn test_placeholder_key_is_not_configured() {
        let config = Config {
            llm_api_key: "your_openai_api_key_here".to_string(),
            ..Config::default()
        };
        assert!(!config.oracle_configured());

        let config = Config {
            llm_api_key: "sk-test".to_string(),
            ..Config::default()
        };
        assert!(config.oracle_configured());
    }

    #[test]
    fn test_toml_overlay_keeps_missing_fields() {
        let config = Config::from_toml_str(
            r#"
            upload_dir = "/tmp/docs"
            batch_size = 3
            "#,
        )
        .unwrap();

        assert_eq!(config.upload_dir, PathBuf::from("/tmp/docs"));
        assert_eq!(config.batch_size, 3);
        assert_eq!(config.min_words, 10);
        assert_eq!(config.llm_model_name, "gpt-4o");
    }

    #[test]
    fn test_toml_rejects_unknown_fields() {
        assert!(Config::from_toml_str("unknown_field = 1").is_err());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let config =
            Config::from_file_or_default(Path::new("/definitely/not/here.toml")).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:8787");
    }
}
