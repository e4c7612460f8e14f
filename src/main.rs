use clap::Parser;
use log::error;
use std::path::PathBuf;
use std::process::ExitCode;
use widetable::{DEFAULT_KEEP_LAST_N, DocumentConfig, WideTable, WideTableError};

#[derive(Parser, Debug)]
#[command(version, about = "Paginate wide tables into PDF", long_about = None)]
struct Args {
    /// Table configuration (JSON)
    config: PathBuf,

    /// Output PDF path [default: the config path with a .pdf extension]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write JSON-lines pagination events to this file
    #[arg(long)]
    debug_log: Option<PathBuf>,

    /// Page sets kept in memory before a new one is opened
    #[arg(long, default_value_t = DEFAULT_KEEP_LAST_N)]
    keep_page_sets: usize,
}

fn run(args: &Args) -> Result<PathBuf, WideTableError> {
    let text = std::fs::read_to_string(&args.config).map_err(|err| {
        WideTableError::InvalidConfiguration(format!("{}: {err}", args.config.display()))
    })?;
    let config = DocumentConfig::from_json(&text)?;
    let mut builder = WideTable::builder().keep_last_n(args.keep_page_sets);
    if let Some(path) = &args.debug_log {
        builder = builder.debug_log(path);
    }
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| args.config.with_extension("pdf"));
    let outcome = builder.build()?.render_to_path(&config, &output)?;
    Ok(outcome.output)
}

fn main() -> ExitCode {
    if std::env::var("RUST_LOG").is_err() {
        unsafe {
            std::env::set_var("RUST_LOG", "widetable=info");
        }
    }
    env_logger::init();

    let args = Args::parse();
    match run(&args) {
        Ok(path) => {
            println!("{}", path.display());
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{} failed: {err}", err.stage());
            eprintln!("widetable: {} stage failed: {err}", err.stage());
            ExitCode::FAILURE
        }
    }
}
