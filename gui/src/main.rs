use clap::Parser;
use color_eyre::Result;
use engine::config::{config_path, load_config_from};
use meme_forge::{Gui, cli::Cli};

pub fn main() -> Result<()> {
    pretty_env_logger::init();
    color_eyre::install()?;
    let Cli { overrides } = Cli::parse();
    let path = config_path()?;
    let cfg = load_config_from(&path)?;
    iced::application(
        move || Gui::new(cfg.clone(), overrides.clone(), path.clone()),
        Gui::update,
        Gui::view,
    )
    .title(engine::APP_NAME)
    .run()?;
    Ok(())
}
