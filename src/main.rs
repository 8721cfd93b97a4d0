//! # lottiegen
//!
//! Compiles a Lottie JSON file into a class that instantiates the animation
//! as a tree of composition objects.
//!
//! ```text
//! lottiegen heart_eyes.json --target cx --output HeartEyes.cpp
//! ```
//!
//! Unsupported features are printed to stderr, one per line. With
//! `--strict` the first of them fails the run.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use lottie_compiler::{compile, CompilerConfig, Target};
use tracing::info;

#[derive(Parser)]
#[command(name = "lottiegen")]
#[command(about = "Compiles Lottie animations into composition instantiator classes")]
#[command(version)]
struct Cli {
    /// Lottie JSON file to compile
    input: PathBuf,

    /// What to write
    #[arg(short, long, value_enum)]
    target: Option<Target>,

    /// Name of the generated class (defaults to the input file name)
    #[arg(short, long)]
    class_name: Option<String>,

    /// Fail on the first unsupported feature
    #[arg(long)]
    strict: bool,

    /// Write descriptive comments on the generated objects
    #[arg(long)]
    annotate: bool,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// JSON configuration file supplying defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// The configuration file, if any, overridden by the flags.
    fn resolve_config(&self) -> Result<CompilerConfig> {
        let mut config = match &self.config {
            Some(path) => CompilerConfig::load(path)?,
            None => CompilerConfig::default(),
        };
        if let Some(target) = self.target {
            config.target = target;
        }
        if let Some(class_name) = &self.class_name {
            config.class_name = Some(class_name.clone());
        }
        config.strict |= self.strict;
        config.annotate |= self.annotate;
        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "lottiegen=debug,lottie_compiler=debug,lottie_core=debug,lottie_codegen=debug"
    } else {
        "lottiegen=info"
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();

    let config = cli.resolve_config()?;
    let class_name = config.class_name_for(&cli.input);

    let json_text = std::fs::read_to_string(&cli.input)
        .with_context(|| format!("Failed to read {}", cli.input.display()))?;
    let output = compile(&json_text, &config, &class_name)?;

    let stderr = std::io::stderr();
    let mut stderr = stderr.lock();
    for issue in &output.issues {
        writeln!(stderr, "{issue}")?;
    }

    if let Some(code) = output.code {
        match &cli.output {
            Some(path) => {
                std::fs::write(path, &code.text)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                info!(path = %path.display(), "wrote {}", code.file_name);
            }
            None => {
                let stdout = std::io::stdout();
                let mut stdout = stdout.lock();
                stdout.write_all(code.text.as_bytes())?;
                stdout.flush()?;
            }
        }
    }
    Ok(())
}
