use anyhow::Result;
use clap::Parser as ClapParser;
use indicatif::MultiProgress;
use indicatif_log_bridge::LogWrapper;

use cli::command::{Cli, Commands, LogFormat};
use cli::convert::{cmd_compress, cmd_decompress};
use cli::extract::cmd_extract;
use cli::info::cmd_info;
use cli::render::cmd_render;

mod cli;
mod input;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let base_level = cli.loglevel.to_level_filter();

    let multi = MultiProgress::new();

    let mut env_builder = env_logger::Builder::from_default_env();
    env_builder.filter_level(base_level);
    match cli.log_format {
        LogFormat::Plain => {
            env_builder.format_timestamp_secs();
        }
        LogFormat::Json => {
            env_builder.format(|buf, record| {
                use std::io::Write;
                writeln!(
                    buf,
                    "{{\"ts\":{},\"lvl\":\"{}\",\"msg\":{:?}}}",
                    buf.timestamp(),
                    record.level(),
                    record.args().to_string()
                )
            });
        }
    }

    let pb = if cli.progress {
        let logger = env_builder.build();
        LogWrapper::new(multi.clone(), logger).try_init()?;
        Some(&multi)
    } else {
        env_builder.try_init()?;
        None
    };

    log::debug!(
        "{} {} ({}), swapdoodle {}, built {}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        option_env!("VERGEN_GIT_DESCRIBE").unwrap_or("unknown"),
        env!("SWAPDOODLE_VERSION"),
        env!("BUILD_TIMESTAMP"),
    );

    match cli.command {
        Commands::Info(ref args) => cmd_info(args, &cli)?,
        Commands::Decompress(ref args) => cmd_decompress(args, &cli)?,
        Commands::Compress(ref args) => cmd_compress(args, &cli)?,
        Commands::Extract(ref args) => cmd_extract(args, &cli)?,
        Commands::Render(ref args) => cmd_render(args, &cli, pb)?,
    }

    Ok(())
}
