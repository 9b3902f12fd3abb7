use clap::{Args, Parser, Subcommand};
use miette::{IntoDiagnostic, Result, WrapErr};
use pywrap_binding::{printer, Output, Registry};
use pywrap_build::{ConfigOverrides, ProjectConfig};
use pywrap_clang::Discovery;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Configuration file picked up from the working directory.
const DEFAULT_CONFIG: &str = "pywrap.toml";

#[derive(Parser)]
#[command(name = "pywrap")]
#[command(author, version, about = "Generate CPython extension bindings for annotated C++ declarations")]
struct Cli {
    /// Raise the log level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the binding sources and write them below the output directory
    Generate(PipelineArgs),

    /// Print the generated Bindings.cpp to stdout instead of writing files
    Dump(PipelineArgs),
}

#[derive(Args)]
struct PipelineArgs {
    /// Sources to scan; replaces the configured list
    sources: Vec<PathBuf>,

    /// Project configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Extension name
    #[arg(long)]
    name: Option<String>,

    /// Output directory
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Include directory
    #[arg(short = 'I', value_name = "DIR")]
    includes: Vec<String>,

    /// Preprocessor definition
    #[arg(short = 'D', value_name = "DEF")]
    defines: Vec<String>,

    /// C++ standard
    #[arg(long)]
    std: Option<String>,
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Generate(args) => {
            let config = load_config(args)?;
            let output = run(&config)?;
            let written = output
                .write_to(&config.extension.output)
                .wrap_err("Failed to write generated sources")?;
            for path in written {
                println!("Wrote {}", path.display());
            }
        }

        Commands::Dump(args) => {
            let config = load_config(args)?;
            let output = run(&config)?;
            print!("{}", output.bindings_source);
        }
    }

    Ok(())
}

/// Log to stderr; `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Defaults, then the configuration file, then the command line.
fn load_config(args: PipelineArgs) -> Result<ProjectConfig> {
    let path = args
        .config
        .clone()
        .or_else(|| Some(PathBuf::from(DEFAULT_CONFIG)).filter(|p| p.exists()));

    let mut config = match &path {
        Some(path) => ProjectConfig::from_file(path)
            .into_diagnostic()
            .wrap_err_with(|| format!("Failed to load {}", path.display()))?,
        None => ProjectConfig::default(),
    };

    config.apply(ConfigOverrides {
        name: args.name,
        output: args.output,
        std: args.std,
        includes: args.includes,
        defines: args.defines,
        sources: args
            .sources
            .iter()
            .map(|s| s.to_string_lossy().into_owned())
            .collect(),
    });
    config
        .load_compile_commands()
        .into_diagnostic()
        .wrap_err("Failed to load compile commands")?;
    config.validate().into_diagnostic()?;
    Ok(config)
}

/// Discover, register and render; nothing touches the disk here.
fn run(config: &ProjectConfig) -> Result<Output> {
    let mut roots = config.compiler.includes.clone();
    if let Ok(cwd) = std::env::current_dir() {
        roots.push(cwd.to_string_lossy().into_owned());
    }
    let discovery = Discovery::new()?.with_include_roots(roots);
    let args = config.clang_args();

    let mut registry = Registry::new(&config.extension.name);
    for source in &config.sources {
        let decls = discovery
            .parse_file(Path::new(source), &args)
            .wrap_err_with(|| format!("Failed to scan {}", source))?;
        for decl in &decls {
            registry.register(decl)?;
        }
    }

    tracing::info!(
        extension = %config.extension.name,
        modules = registry.modules().count(),
        "generated bindings"
    );
    Ok(printer::print(&registry))
}
