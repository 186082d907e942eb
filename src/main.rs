use std::process::ExitCode;
use std::time::Instant;

use anyhow::Result;
use tracing::{error, info};

use addrgrs::logging::{self, format_elapsed};
use addrgrs::{Args, SourceToken, pipeline};

#[cfg(not(windows))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn main() -> ExitCode {
    let (args, tokens) = match Args::try_parse_with_tokens(std::env::args_os()) {
        Ok(parsed) => parsed,
        Err(e) => {
            let _ = e.print();
            return if e.exit_code() == 0 {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            };
        }
    };

    logging::init(args.verbose);

    match run(args, tokens) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args, tokens: Vec<SourceToken>) -> Result<()> {
    let command_line = std::env::args().collect::<Vec<_>>().join(" ");
    let config = args.into_config(tokens, command_line)?;

    for source in &config.sources {
        info!("{} {} {}", source.filename, source.sample, source.read_group);
    }

    let start = Instant::now();
    let stdout = std::io::stdout().lock();
    let (summary, _) = pipeline::run(&config, stdout)?;

    for (read_group, count) in &summary.per_read_group {
        info!("  {}: {} records", read_group, count);
    }
    info!(
        "wrote {} records in {}",
        summary.records,
        format_elapsed(start.elapsed())
    );

    Ok(())
}
