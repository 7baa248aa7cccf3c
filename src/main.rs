//! Command-line interface for ecospold

#[cfg(feature = "cli")]
use clap::{Args, Parser, Subcommand};

#[cfg(feature = "cli")]
use std::fs;
#[cfg(feature = "cli")]
use std::path::{Path, PathBuf};
#[cfg(feature = "cli")]
use std::sync::Arc;

#[cfg(feature = "cli")]
use ecospold::{to_json, Config, Context, FileReport, Generation, Loader, SaveOptions};

#[cfg(feature = "cli")]
#[derive(Parser, Debug)]
#[command(name = "ecospold")]
#[command(author, version, about = "EcoSpold dataset validation and conversion tool", long_about = None)]
struct Cli {
    /// Configuration file (defaults to the built-in configuration)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Args, Debug, Clone, Copy)]
struct GenerationArg {
    /// Read EcoSpold 2 instead of EcoSpold 1
    #[arg(long)]
    v2: bool,
}

#[cfg(feature = "cli")]
impl GenerationArg {
    fn generation(self) -> Generation {
        if self.v2 {
            Generation::V2
        } else {
            Generation::V1
        }
    }
}

#[cfg(feature = "cli")]
#[derive(Subcommand, Debug)]
enum Commands {
    /// Check a file, a directory or a ZIP archive for conformance
    Validate {
        /// File, directory or archive
        #[arg(value_name = "PATH")]
        path: PathBuf,

        #[command(flatten)]
        generation: GenerationArg,

        /// Treat PATH as a ZIP archive
        #[arg(long)]
        archive: bool,
    },

    /// Load a dataset and print a summary
    Parse {
        /// Dataset file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        #[command(flatten)]
        generation: GenerationArg,
    },

    /// Convert a dataset to JSON
    #[command(name = "to-json")]
    ToJson {
        /// Dataset file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        #[command(flatten)]
        generation: GenerationArg,

        /// Pretty print the output
        #[arg(short, long)]
        pretty: bool,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Write registry defaults into absent fields and save the result
    #[command(name = "fill-defaults")]
    FillDefaults {
        /// Dataset file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output file
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        #[command(flatten)]
        generation: GenerationArg,

        /// Create missing output directories
        #[arg(long)]
        create_dirs: bool,
    },
}

#[cfg(feature = "cli")]
type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[cfg(feature = "cli")]
fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = context(cli.config.as_deref()).and_then(|ctx| match cli.command {
        Commands::Validate {
            path,
            generation,
            archive,
        } => cmd_validate(ctx, &path, generation.generation(), archive),
        Commands::Parse { file, generation } => cmd_parse(ctx, &file, generation.generation()),
        Commands::ToJson {
            file,
            generation,
            pretty,
            output,
        } => cmd_to_json(ctx, &file, generation.generation(), pretty, output),
        Commands::FillDefaults {
            file,
            output,
            generation,
            create_dirs,
        } => cmd_fill_defaults(ctx, &file, &output, generation.generation(), create_dirs),
    });

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(feature = "cli")]
fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();
}

#[cfg(feature = "cli")]
fn context(config: Option<&Path>) -> CliResult<Arc<Context>> {
    let config = match config {
        Some(path) => Config::load(path)?,
        None => Config::embedded()?,
    };
    Ok(Arc::new(Context::new(config)?))
}

#[cfg(feature = "cli")]
fn print_report(report: &FileReport) {
    if report.is_valid() {
        println!("✓ {}", report.path.display());
        return;
    }
    println!("✗ {}", report.path.display());
    for issue in &report.issues {
        println!("    - {}", issue);
    }
}

#[cfg(feature = "cli")]
fn cmd_validate(
    ctx: Arc<Context>,
    path: &Path,
    generation: Generation,
    archive: bool,
) -> CliResult<bool> {
    let loader = Loader::new(ctx, generation);
    let reports = if archive {
        loader.validate_archive(path)?
    } else if path.is_dir() {
        loader.validate_directory(path)?
    } else {
        vec![loader.validate_file(path)?]
    };

    for report in &reports {
        print_report(report);
    }
    let invalid = reports.iter().filter(|r| !r.is_valid()).count();
    println!();
    println!("{} file(s) checked, {} invalid", reports.len(), invalid);
    Ok(invalid == 0)
}

#[cfg(feature = "cli")]
fn cmd_parse(ctx: Arc<Context>, file: &Path, generation: Generation) -> CliResult<bool> {
    let dataset = Loader::new(ctx, generation).load(file)?;
    let document = dataset.document();
    let root = dataset.root();

    println!("File: {}", file.display());
    println!("Generation: {}", dataset.generation());
    println!("Root: <{}> ({})", root.tag(), root.element_type().name);
    println!("Elements: {}", document.descendants(document.root()).len());

    for field in root.fields().iter().filter(|f| f.element_type().is_some()) {
        let count = root.children(field.name)?.len();
        if count > 0 {
            println!("  {}: {}", field.name, count);
        }
    }

    if dataset.is_valid() {
        println!("Valid: yes");
    } else {
        println!("Valid: no ({} issue(s))", dataset.issues().len());
        for issue in dataset.issues() {
            println!("    - {}", issue);
        }
    }
    Ok(true)
}

#[cfg(feature = "cli")]
fn cmd_to_json(
    ctx: Arc<Context>,
    file: &Path,
    generation: Generation,
    pretty: bool,
    output: Option<PathBuf>,
) -> CliResult<bool> {
    let dataset = Loader::new(ctx, generation).load(file)?;
    let root = dataset.root();
    let value = serde_json::json!({ root.tag(): to_json(&root) });

    let json_str = if pretty {
        serde_json::to_string_pretty(&value)?
    } else {
        serde_json::to_string(&value)?
    };

    if let Some(output_path) = output {
        fs::write(output_path, &json_str)?;
    } else {
        println!("{}", json_str);
    }
    Ok(true)
}

#[cfg(feature = "cli")]
fn cmd_fill_defaults(
    ctx: Arc<Context>,
    file: &Path,
    output: &Path,
    generation: Generation,
    create_dirs: bool,
) -> CliResult<bool> {
    let mut dataset = Loader::new(ctx, generation).load(file)?;
    let written = dataset.fill_defaults()?;

    let options = SaveOptions::new().with_create_dirs(create_dirs);
    ecospold::save(&dataset, output, &options)?;
    println!("{} default value(s) written to {}", written, output.display());
    Ok(true)
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Rebuild with --features cli");
    std::process::exit(1);
}
