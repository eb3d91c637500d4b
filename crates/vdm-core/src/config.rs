use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Global configuration loaded from `~/.config/vdm/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VdmConfig {
    /// Default directory for downloads when the caller gives none.
    /// None = current working directory at submit time.
    #[serde(default)]
    pub download_dir: Option<PathBuf>,
    /// yt-dlp binary to invoke (name resolved via PATH, or absolute path).
    pub ytdlp_bin: PathBuf,
    /// Extra arguments appended to every yt-dlp invocation (format
    /// selection, rate limits, etc.).
    #[serde(default)]
    pub ytdlp_args: Vec<String>,
}

impl Default for VdmConfig {
    fn default() -> Self {
        Self {
            download_dir: None,
            ytdlp_bin: PathBuf::from("yt-dlp"),
            ytdlp_args: Vec::new(),
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("vdm")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<VdmConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = VdmConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: VdmConfig = toml::from_str(&data)?;
    Ok(cfg)
}
