//! `inlinify`: inline a document's CSS from the command line.

use std::error::Error;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use clap::Parser;
use inlinify::{InlineConfig, Inliner, OutputMethod};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "inlinify", version, about = "Move CSS into inline style attributes")]
struct Args {
    /// Input document (stdin when omitted)
    input: Option<PathBuf>,

    /// Write the result here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Extra stylesheet, applied after the document's own (repeatable)
    #[arg(long = "css", value_name = "PATH")]
    css: Vec<String>,

    /// Rewrite relative links against this URL
    #[arg(long)]
    base_url: Option<String>,

    /// Leave <style> and <link> elements in place
    #[arg(long)]
    keep_style_tags: bool,

    /// Strip class attributes after inlining
    #[arg(long)]
    remove_classes: bool,

    /// Treat the input as XHTML
    #[arg(long)]
    xml: bool,

    /// Resolve elements on a single thread
    #[arg(long)]
    sequential: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => InlineConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => InlineConfig::default(),
    };
    config.external_stylesheets.extend(args.css);
    if args.base_url.is_some() {
        config.base_url = args.base_url;
    }
    config.keep_style_tags |= args.keep_style_tags;
    config.remove_classes |= args.remove_classes;
    config.parallel &= !args.sequential;
    if args.xml {
        config.method = OutputMethod::Xml;
    }
    if config.base_path.is_none() {
        config.base_path = args
            .input
            .as_ref()
            .and_then(|p| p.parent())
            .map(PathBuf::from);
    }

    let html = match &args.input {
        Some(path) => std::fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let output = Inliner::new(config)?.transform_with_report(&html)?;
    for diagnostic in &output.diagnostics {
        tracing::warn!("{diagnostic}");
    }

    match &args.output {
        Some(path) => std::fs::write(path, output.html)?,
        None => io::stdout().write_all(output.html.as_bytes())?,
    }
    Ok(())
}
