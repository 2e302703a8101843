use std::{process::ExitCode, sync::Arc};

use clap::Parser;
use color_eyre::Result;
use engine::{
    MemeContext,
    config::{ConfigOverrides, load_config},
};

/// Generates a single meme for a topic and prints where it was written
#[derive(clap::Parser)]
struct Cli {
    topic: String,

    #[command(flatten)]
    overrides: ConfigOverrides,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    pretty_env_logger::init();
    color_eyre::install()?;

    let Cli { topic, overrides } = Cli::parse();
    let cfg = overrides
        .apply(load_config()?.unwrap_or_default())
        .with_env_key();
    let ctx = Arc::new(MemeContext::from_config(&cfg));

    match ctx.generate(topic).await {
        Ok(meme) => {
            println!("{}", meme.path.display());
            eprintln!("{} ({}: \"{}\")", meme.message(), meme.template, meme.caption);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            eprintln!("{e}");
            Ok(ExitCode::FAILURE)
        }
    }
}
