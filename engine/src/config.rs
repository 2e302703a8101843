use std::{
    fs,
    path::{Path, PathBuf},
};

use color_eyre::{
    Result,
    eyre::{WrapErr as _, eyre},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::caption::Provider;

pub const CONFIG_FILE_NAME: &str = "meme_forge.ron";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub provider: Provider,
    pub api_key: String,
    /// Provider default when unset
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub templates_dir: PathBuf,
    pub tag_index: PathBuf,
    pub output_dir: PathBuf,
    pub font_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: Provider::default(),
            api_key: String::new(),
            model: None,
            base_url: None,
            templates_dir: "./meme_templates".into(),
            tag_index: "meme_tags.json".into(),
            output_dir: "./generated_memes".into(),
            font_path: "arial.ttf".into(),
        }
    }
}

impl Config {
    /// Fills an empty API key from the provider's environment variable,
    /// after reading a `.env` file if there is one.
    pub fn with_env_key(mut self) -> Self {
        let _ = dotenvy::dotenv();
        if self.api_key.trim().is_empty() {
            if let Ok(key) = std::env::var(self.provider.key_env_var()) {
                self.api_key = key;
            }
        }
        self
    }

    pub fn model_name(&self) -> &str {
        self.model
            .as_deref()
            .unwrap_or(self.provider.default_model())
    }
}

/// Command line overrides shared by the binaries
#[derive(Debug, Default, Clone, clap::Args)]
pub struct ConfigOverrides {
    #[arg(long)]
    pub provider: Option<Provider>,
    #[arg(long)]
    pub api_key: Option<String>,
    #[arg(long)]
    pub model: Option<String>,
    #[arg(long)]
    pub base_url: Option<String>,
    #[arg(long)]
    pub templates_dir: Option<PathBuf>,
    #[arg(long)]
    pub tag_index: Option<PathBuf>,
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
    #[arg(long)]
    pub font_path: Option<PathBuf>,
}

impl ConfigOverrides {
    pub fn apply(self, mut cfg: Config) -> Config {
        let Self {
            provider,
            api_key,
            model,
            base_url,
            templates_dir,
            tag_index,
            output_dir,
            font_path,
        } = self;

        if let Some(p) = provider {
            if p != cfg.provider {
                cfg.api_key.clear();
                cfg.model = None;
                cfg.base_url = None;
            }
            cfg.provider = p;
        }
        cfg.api_key = api_key.unwrap_or(cfg.api_key);
        cfg.model = model.or(cfg.model);
        cfg.base_url = base_url.or(cfg.base_url);
        cfg.templates_dir = templates_dir.unwrap_or(cfg.templates_dir);
        cfg.tag_index = tag_index.unwrap_or(cfg.tag_index);
        cfg.output_dir = output_dir.unwrap_or(cfg.output_dir);
        cfg.font_path = font_path.unwrap_or(cfg.font_path);
        cfg
    }
}

pub fn load_ron_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let src = fs::read_to_string(path)?;
    Ok(ron::from_str(&src)?)
}

pub fn save_ron_file<T: Serialize>(path: &Path, x: &T) -> Result<()> {
    let pretty = ron::ser::PrettyConfig::default();
    Ok(fs::write(path, ron::ser::to_string_pretty(x, pretty)?)?)
}

pub fn config_path() -> Result<PathBuf> {
    Ok(dirs::config_local_dir()
        .ok_or(eyre!("Couldn't get config dir"))?
        .join(CONFIG_FILE_NAME))
}

/// `None` if there is no config file yet
pub fn load_config() -> Result<Option<Config>> {
    load_config_from(&config_path()?)
}

pub fn load_config_from(path: &Path) -> Result<Option<Config>> {
    if !path.exists() {
        Ok(None)
    } else {
        load_ron_file(path)
            .wrap_err_with(|| format!("Couldn't read config {path:?}"))
            .map(Some)
    }
}

pub fn save_config(cfg: &Config) -> Result<()> {
    save_config_to(&config_path()?, cfg)
}

pub fn save_config_to(path: &Path, cfg: &Config) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    save_ron_file(path, cfg)
}
