use clap::{Parser, ValueEnum};
use pdf_glyphs::{Confidence, DocumentFont, FontExtractor};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// One line per font
    Summary,
    /// Per-code table of text, width and confidence for every font
    Table,
    /// Debug output of each font model and its errors
    Debug,
}

#[derive(Parser)]
#[command(name = "pdf-glyphs")]
#[command(about = "Decode the embedded fonts of a PDF and identify their glyphs", long_about = None)]
struct Args {
    /// PDF file to decode fonts from
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Password for encrypted PDFs
    #[arg(short, long)]
    password: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Directory to load reference fonts from instead of the system font paths
    #[arg(long, value_name = "DIR")]
    font_dir: Vec<PathBuf>,

    /// Number of fonts decoded in parallel
    #[arg(short, long)]
    threads: Option<usize>,
}

fn confidence_label(confidence: Option<Confidence>) -> String {
    match confidence {
        None => "-".to_string(),
        Some(Confidence::Declared) => "declared".to_string(),
        Some(Confidence::Verified(s)) => format!("verified {:.2}", s),
        Some(Confidence::Corrected(s)) => format!("corrected {:.2}", s),
        Some(Confidence::Recognized(s)) => format!("recognized {:.2}", s),
        Some(Confidence::BelowConfidence(s)) => format!("low {:.2}", s),
        Some(Confidence::Unmatched) => "unmatched".to_string(),
    }
}

fn print_summary(font: &DocumentFont) {
    let model = &font.model;
    let status = match &font.result {
        Ok(()) if model.is_verified() => "verified".to_string(),
        Ok(()) => "decoded".to_string(),
        Err(e) => format!("failed: {}", e),
    };
    let (family, style) = model.style();
    println!(
        "{} {} ({:?}) base {} via {:?}, {:?} {:?}, {} codes used, {}",
        font.resource_name,
        model.name(),
        model.kind(),
        model.base_font().name(),
        model.fallback_step(),
        family,
        style,
        model.usage().codes().len(),
        status
    );
}

fn print_table(font: &DocumentFont) {
    print_summary(font);
    let model = &font.model;
    if model.has_implicit_spaces() {
        println!("  (word gaps are encoded as wide glyph advances)");
    }
    for code in model.usage().codes() {
        let confidence = model.resolution(code).map(|r| r.confidence);
        println!(
            "  {:>6} {:<8} {:>7.1} {}",
            code,
            format!("{:?}", model.resolve_unicode(code)),
            model.resolve_width(code),
            confidence_label(confidence)
        );
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = pdf_glyphs::DecoderConfig::builder();
    for dir in args.font_dir {
        config = config.reference_dir(dir);
    }
    if let Some(threads) = args.threads {
        config = config.threads(threads);
    }

    let mut builder = FontExtractor::builder().config(config.build());
    if let Some(password) = args.password {
        builder = builder.password(password);
    }

    let doc = match builder.build().from_path(&args.file) {
        Ok(doc) => doc,
        Err(e) => {
            eprintln!("Error decoding fonts from {:?}: {}", args.file, e);
            std::process::exit(1);
        }
    };

    for font in doc.fonts() {
        match args.format {
            OutputFormat::Summary => print_summary(font),
            OutputFormat::Table => print_table(font),
            OutputFormat::Debug => {
                println!("{:#?}", font.model);
                println!("  metrics: {:?}", font.model.metrics());
                if let Some(e) = font.model.error() {
                    println!("  error: {:?}", e);
                }
            }
        }
    }
}
