//! Command line front end for the RTF to XAML converter
//!
//! # Usage
//!
//! ```bash
//! # Print the markup of a document
//! rtf2xaml letter.rtf
//!
//! # Write markup to a file and pictures to a directory
//! rtf2xaml letter.rtf -o letter.xaml --images ./letter_images
//!
//! # Options from a YAML file, overridden on the command line
//! rtf2xaml letter.rtf --config options.yaml --force-paragraph
//! ```

use clap::Parser;
use rtfxaml::rtf::Lexer;
use rtfxaml::xaml::{ConvertOptions, DirectoryImageSink, RtfToXamlReader};
use std::path::PathBuf;

/// Convert an RTF document to XAML flow content
#[derive(Parser, Debug)]
#[command(name = "rtf2xaml")]
#[command(version, about, long_about = None)]
struct Args {
    /// RTF input file
    input: PathBuf,

    /// Output file (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Directory receiving embedded pictures
    #[arg(long)]
    images: Option<PathBuf>,

    /// Always produce a Section with paragraphs
    #[arg(long)]
    force_paragraph: bool,

    /// Maximum group nesting depth
    #[arg(long)]
    max_group_depth: Option<usize>,

    /// YAML file with conversion options
    #[arg(long)]
    config: Option<PathBuf>,
}

fn load_options(args: &Args) -> Result<ConvertOptions, Box<dyn std::error::Error>> {
    let mut options = match &args.config {
        Some(path) => serde_saphyr::from_str(&std::fs::read_to_string(path)?)?,
        None => ConvertOptions::default(),
    };
    if args.force_paragraph {
        options = options.with_force_paragraph(true);
    }
    if let Some(depth) = args.max_group_depth {
        options = options.with_max_group_depth(depth);
    }
    Ok(options)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let options = load_options(&args)?;
    let input = std::fs::read(&args.input)?;
    let mut lexer = Lexer::new(&input);

    let xaml = match &args.images {
        Some(directory) => {
            std::fs::create_dir_all(directory)?;
            let mut sink = DirectoryImageSink::new(directory);
            RtfToXamlReader::new(options)
                .with_image_sink(&mut sink)
                .process(&mut lexer)?
        },
        None => RtfToXamlReader::new(options).process(&mut lexer)?,
    };

    match &args.output {
        Some(path) => std::fs::write(path, xaml)?,
        None => println!("{}", xaml),
    }
    Ok(())
}
