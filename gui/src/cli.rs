use engine::config::ConfigOverrides;

#[derive(Debug, clap::Parser)]
pub struct Cli {
    /// Values given here are used for this run only and are not saved
    #[command(flatten)]
    pub overrides: ConfigOverrides,
}
