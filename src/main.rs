mod cmd;

use std::path::PathBuf;

use crate::cmd::CliCommand;

use clap::Parser;
use log::error;
use piano_overlay::config::PianoConfig;

#[derive(Parser)]
#[clap(version, about, long_about = None)]
struct Cli {
  /// INI configuration file. Built-in defaults are used if omitted.
  #[clap(long, short, value_parser, global = true)]
  config: Option<PathBuf>,

  #[clap(subcommand)]
  command: CliCommand,
}

#[tokio::main]
async fn main() {
  let cli = Cli::parse();

  // the log level comes from the config file, so any problem loading it is printed without a logger
  let config = match &cli.config {
    Some(path) => PianoConfig::load(path).unwrap_or_else(|err| {
      eprintln!("unable to load config: {err:?}");
      std::process::exit(2);
    }),
    None => PianoConfig::default(),
  };

  let env = env_logger::Env::default().filter_or("RUST_LOG", config.log_filter());
  env_logger::init_from_env(env);

  if let Err(err) = cli.command.run(&config).await {
    error!("{err:?}");
    std::process::exit(1);
  }
}
