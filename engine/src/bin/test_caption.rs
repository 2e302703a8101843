use clap::Parser;
use color_eyre::{Result, eyre::eyre};
use engine::{
    caption::{CaptionModel as _, normalize_caption},
    config::{ConfigOverrides, load_config},
};

#[derive(clap::Parser)]
struct Cli {
    topic: String,

    #[command(flatten)]
    overrides: ConfigOverrides,
}

#[tokio::main]
async fn main() -> Result<()> {
    pretty_env_logger::init();
    color_eyre::install()?;

    let Cli { topic, overrides } = Cli::parse();
    let cfg = overrides
        .apply(load_config()?.unwrap_or_default())
        .with_env_key();
    let model = cfg
        .provider
        .make(&cfg.api_key, cfg.model.as_deref(), cfg.base_url.as_deref())?;

    let raw = model
        .get_caption(&topic)
        .await
        .map_err(|e| eyre!("{} ({}) failed: {e}", cfg.provider, cfg.model_name()))?;
    println!("raw:        {raw:?}");
    println!("normalized: {:?}", normalize_caption(&raw));

    Ok(())
}
