use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use log::{debug, error};

use torrentinfo::{select_view, Config, Renderer, Torrent, ViewMode};

/// Print information about torrent files
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Show basic file information (default)
    #[arg(short, long)]
    basic: bool,

    /// Only show top level files/directories
    #[arg(short, long)]
    top: bool,

    /// Show files within the torrent
    #[arg(short, long)]
    files: bool,

    /// Dump the whole file hierarchy
    #[arg(short, long)]
    dump: bool,

    /// Only print out ascii
    #[arg(short, long)]
    ascii: bool,

    /// No ANSI colour
    #[arg(short = 'n', long = "nocolour")]
    nocolour: bool,

    /// Print the selected view as JSON
    #[arg(long)]
    json: bool,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Config file to use instead of ./torrentinfo.toml
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Torrent files to process
    #[arg(required = true, value_name = "FILENAME")]
    filenames: Vec<PathBuf>,
}

impl Args {
    fn mode(&self, fallback: ViewMode) -> ViewMode {
        if self.basic {
            ViewMode::Basic
        } else if self.dump {
            ViewMode::FullDump
        } else if self.files {
            ViewMode::WithFiles
        } else if self.top {
            ViewMode::TopLevelOnly
        } else {
            fallback
        }
    }

    fn load_config(&self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load_from(path)
                .with_context(|| format!("Could not load config {}", path.display()))?,
            None => Config::load().context("Could not load torrentinfo.toml")?,
        };
        if self.ascii {
            config.ascii_only = true;
        }
        if self.nocolour {
            config.colour = false;
        }
        Ok(config)
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = match args.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = match args.load_config() {
        Ok(config) => config,
        Err(e) => {
            error!("{:#}", e);
            return ExitCode::FAILURE;
        }
    };
    let mode = args.mode(config.view);
    let renderer = Renderer::from(&config);
    debug!("using {:?} view with {:?}", mode, config);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut failed = false;

    for path in &args.filenames {
        if let Err(e) = show(&mut out, path, mode, &config, &renderer, args.json) {
            if let Err(flush) = out.flush() {
                error!("Could not write to stdout: {}", flush);
            }
            eprintln!("error: {:#}", e);
            failed = true;
        }
    }

    if let Err(e) = out.flush() {
        error!("Could not write to stdout: {}", e);
        failed = true;
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

/// Runs one file through the pipeline and prints the chosen view.
fn show<W: Write>(
    out: &mut W,
    path: &Path,
    mode: ViewMode,
    config: &Config,
    renderer: &Renderer,
    json: bool,
) -> anyhow::Result<()> {
    let torrent = Torrent::from_file(path, config.decode_options())
        .with_context(|| format!("Could not parse {} as a valid torrent file", path.display()))?;

    let payload = select_view(
        mode,
        &torrent.metadata,
        &torrent.files.entries,
        &torrent.hierarchy,
    );

    if json {
        renderer.render_json(
            out,
            &path.display().to_string(),
            &payload,
            &torrent.files.warnings,
        )?;
        return Ok(());
    }

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    renderer.header(out, &file_name)?;
    renderer.render(out, &payload)?;
    writeln!(out)?;
    Ok(())
}
