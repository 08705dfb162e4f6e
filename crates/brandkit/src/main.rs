use crate::prelude::*;
use clap::Parser;

mod agent;
mod assets;
mod context;
mod corpus;
mod error;
mod generate;
mod index;
mod prelude;
mod web;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Generate a brand name, slogan, concept, logo and color palette \
                  from a business description"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Whether to display additional information.
    #[clap(long, env = "BRANDKIT_VERBOSE", global = true, default_value = "false")]
    verbose: bool,
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Start the web UI
    Serve(crate::web::ServeOptions),

    /// Generate branding assets for one description
    Generate(crate::generate::GenerateOptions),

    /// Build or refresh the corpus index
    Index(crate::index::IndexOptions),
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    color_eyre::install()?;

    let app = App::parse();

    match app.command {
        SubCommands::Serve(options) => crate::web::run(options, app.global).await,
        SubCommands::Generate(options) => crate::generate::run(options, app.global).await,
        SubCommands::Index(options) => crate::index::run(options, app.global).await,
    }
    .map_err(|err: color_eyre::eyre::Report| eyre!(err))
}
