use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use linecycle::{
    files, scrub_file, Blacklist, FilePersister, IteratorBuilder, Registry, Seeds,
    DEFAULT_MAX_LINES_FOR_SLICE,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "linecycle", about = "Cursor-based cyclic iteration over line files")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Pull a batch of lines from a file.
    Next {
        /// Line file to iterate.
        file: PathBuf,
        /// Number of lines to pull.
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,
        /// Wrap around at the end of the file instead of failing.
        #[arg(long)]
        round_robin: bool,
        /// File of lines that must never be emitted.
        #[arg(long)]
        blacklist: Option<PathBuf>,
        /// File of seed lines planted into the output.
        #[arg(long, requires = "plant_every")]
        seeds: Option<PathBuf>,
        /// Plant one seed every N output lines.
        #[arg(long, requires = "seeds")]
        plant_every: Option<usize>,
        /// Checkpoint file used to resume where the last run stopped.
        #[arg(long)]
        checkpoint: Option<PathBuf>,
    },
    /// Count the lines of a file.
    Count {
        /// Line file to count.
        file: PathBuf,
    },
    /// Copy a file, dropping blacklisted lines.
    Scrub {
        /// File of lines to drop.
        #[arg(long)]
        blacklist: PathBuf,
        /// Input line file.
        input: PathBuf,
        /// Output line file.
        output: PathBuf,
    },
    /// Load every file of a directory and list the resulting iterators.
    List {
        /// Directory of line files.
        dir: PathBuf,
        /// Files with more lines than this are streamed.
        #[arg(long, default_value_t = DEFAULT_MAX_LINES_FOR_SLICE)]
        max_lines: usize,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Next {
            file,
            count,
            round_robin,
            blacklist,
            seeds,
            plant_every,
            checkpoint,
        } => run_next(file, count, round_robin, blacklist, seeds.zip(plant_every), checkpoint)?,
        Commands::Count { file } => {
            let lines = files::count_lines(&file)
                .with_context(|| format!("failed to count lines of {}", file.display()))?;
            println!("{lines}");
        }
        Commands::Scrub {
            blacklist,
            input,
            output,
        } => {
            let blacklist = Blacklist::from_file(&blacklist)
                .with_context(|| format!("failed to load blacklist {}", blacklist.display()))?;
            let kept = scrub_file(&blacklist, &input, &output)
                .with_context(|| format!("failed to scrub {}", input.display()))?;
            println!("kept {kept} lines");
        }
        Commands::List { dir, max_lines } => run_list(dir, max_lines)?,
    }

    Ok(())
}

fn run_next(
    file: PathBuf,
    count: usize,
    round_robin: bool,
    blacklist: Option<PathBuf>,
    seeds: Option<(PathBuf, usize)>,
    checkpoint: Option<PathBuf>,
) -> Result<()> {
    let mut builder = IteratorBuilder::new().stream(&file, round_robin);

    if let Some(path) = blacklist {
        let blacklist = Blacklist::from_file(&path)
            .with_context(|| format!("failed to load blacklist {}", path.display()))?;
        builder = builder.blacklist(Arc::new(blacklist));
    }
    if let Some((path, every)) = seeds {
        builder = builder.seeds(every, Seeds::File(path));
    }
    if let Some(path) = checkpoint {
        let store = FilePersister::open(&path)
            .with_context(|| format!("failed to open checkpoint file {}", path.display()))?;
        builder = builder.persist_to(Arc::new(store));
    }

    let iter = builder
        .build()
        .with_context(|| format!("failed to open iterator over {}", file.display()))?;
    let batch = iter
        .next(count)
        .with_context(|| format!("failed to pull {count} lines from {}", iter.name()))?;

    for line in batch {
        println!("{line}");
    }
    Ok(())
}

fn run_list(dir: PathBuf, max_lines: usize) -> Result<()> {
    let mut registry = Registry::new();
    registry
        .smart_add_dir(&dir, false, max_lines)
        .with_context(|| format!("failed to load {}", dir.display()))?;

    for name in registry.names() {
        let iter = registry.get(&name)?;
        let kind = if iter.len() > max_lines { "stream" } else { "slice" };
        println!("{name}\t{}\t{kind}", iter.len());
    }
    Ok(())
}
