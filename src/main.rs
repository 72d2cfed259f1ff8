use anyhow::{Context, Result};
use clap::crate_version;
use env_logger::Builder;
use log::LevelFilter;

use normal_tree::tree_framework::tree_command::TREE_COMMAND;

pub fn main() -> Result<()> {
    let command = TREE_COMMAND.build_cli();
    let command = command.version(crate_version!());
    let cli_matches = match command.try_get_matches() {
        Ok(matches) => matches,
        Err(error) if !error.use_stderr() => error.exit(),
        Err(error) => {
            let _ = error.print();
            std::process::exit(1);
        }
    };

    //logging is off unless asked for by -v or RUST_LOG
    let mut builder = Builder::new();
    builder.filter_level(LevelFilter::Off).parse_default_env();
    if let Some(level) = TREE_COMMAND.log_level(&cli_matches) {
        builder.filter_level(level);
    }
    builder.init();

    log::info!("normal-tree starting");

    TREE_COMMAND.execute(&cli_matches).context("executing normal-tree")?;
    Ok(())
}
