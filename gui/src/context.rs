use std::{path::PathBuf, sync::Arc};

use color_eyre::Result;
use engine::{
    MemeContext,
    config::{Config, ConfigOverrides, save_config_to},
};

pub struct Context {
    /// The config as stored on disk, this is what the options menu edits
    pub saved: Config,
    /// `saved` with the command line overrides applied
    pub config: Config,
    pub memes: Arc<MemeContext>,
    overrides: ConfigOverrides,
    config_path: PathBuf,
}

impl Context {
    pub fn new(saved: Config, overrides: ConfigOverrides, config_path: PathBuf) -> Self {
        let config = overrides.clone().apply(saved.clone());
        let memes = Arc::new(MemeContext::from_config(&config.clone().with_env_key()));
        Self {
            saved,
            config,
            memes,
            overrides,
            config_path,
        }
    }

    /// Writes `saved` to the config file, then rebuilds catalog and caption
    /// model with this run's overrides on top.
    pub fn save_config(&mut self, saved: Config) -> Result<()> {
        save_config_to(&self.config_path, &saved)?;
        let overrides = std::mem::take(&mut self.overrides);
        let config_path = std::mem::take(&mut self.config_path);
        *self = Self::new(saved, overrides, config_path);
        Ok(())
    }

    /// Hint shown before the first request when the setup can't work yet
    pub fn startup_problem(&self) -> Option<String> {
        if self.memes.catalog().is_empty() {
            Some(format!(
                "no templates found. Put some .jpg or .png files into {:?}.",
                self.config.templates_dir
            ))
        } else {
            self.memes.caption_error().map(ToString::to_string)
        }
    }
}
