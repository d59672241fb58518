use std::fs;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use cmdtreegen::error::IoSnafu;
use cmdtreegen::{AssembleOptions, CompileOptions, CompileResult, reader, template};
use snafu::ResultExt;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "cmdtreegen")]
#[command(about = "Generate a C command console from an XML command description")]
struct Cli {
  /// XML command description
  spec: PathBuf,

  /// Console source file to write
  #[arg(short, long, default_value = "console.c")]
  output: PathBuf,

  /// Put method stubs in a separate header/source pair
  #[arg(long)]
  externalize: bool,

  /// Stub header path (default: <output stem>_stubs.h)
  #[arg(long, requires = "externalize")]
  header: Option<PathBuf>,

  /// Stub source path (default: <output stem>_stubs.c)
  #[arg(long, requires = "externalize")]
  source: Option<PathBuf>,

  /// Liquid template replacing the built-in console template
  #[arg(long)]
  template: Option<PathBuf>,

  /// Print an outline of every command tree to stderr
  #[arg(long)]
  dump_tree: bool,
}

fn main() {
  tracing_subscriber::registry()
    .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "cmdtreegen=info".into()))
    .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
    .init();

  let cli = Cli::parse();
  if let Err(err) = run(cli) {
    eprintln!("{err}");
    process::exit(1);
  }
}

fn run(cli: Cli) -> CompileResult<()> {
  let source = fs::read_to_string(&cli.spec).context(IoSnafu {
    path: cli.spec.clone(),
  })?;
  let console_template = match &cli.template {
    Some(path) => Some(fs::read_to_string(path).context(IoSnafu { path: path.clone() })?),
    None => None,
  };

  info!("Reading command description from {}", cli.spec.display());
  let commands = reader::read_spec(&source)?;

  let options = CompileOptions {
    externalize_stubs: cli.externalize,
  };
  let compilation = cmdtreegen::compile(&commands, &options)?;
  info!(
    nodes = compilation.forest.len(),
    trees = compilation.forest.trees().len(),
    stubs = compilation.stubs.len(),
    "Built command forest"
  );
  if cli.dump_tree {
    eprint!("{}", compilation.forest.outline(&compilation.interner));
  }

  let assemble = AssembleOptions {
    output: cli.output,
    header: cli.header,
    source: cli.source,
    template: console_template,
    generated_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
  };
  let output = template::assemble(&compilation.fragments(), options.externalize_stubs, &assemble)?;
  output.write_all()?;

  for document in output.documents() {
    info!("Wrote {}", document.path.display());
  }
  Ok(())
}
