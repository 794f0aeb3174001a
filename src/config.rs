use crate::cli::Args;
use crate::preprocessing::PreprocessConfig;

/// Runtime configuration shared by the server and CLI commands
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub default_language: String,
    pub max_file_size: usize,
    pub default_max_width: i64,
    pub tessdata_path: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9292,
            default_language: "eng".to_string(),
            max_file_size: 50 * 1024 * 1024,
            default_max_width: i64::from(PreprocessConfig::DEFAULT_MAX_WIDTH),
            tessdata_path: None,
        }
    }
}

impl From<&Args> for Config {
    fn from(args: &Args) -> Self {
        Self {
            host: args.host.clone(),
            port: args.port,
            default_language: args.default_language.clone(),
            max_file_size: args.max_file_size,
            default_max_width: args.max_width,
            tessdata_path: args.tessdata_path.clone(),
        }
    }
}
