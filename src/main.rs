//! flashdeck - flashcard PDF generator

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};

use flashdeck::{
    CommandBackend, DeckAssembler, DeckOptions, Deck, FlashdeckError, TemplateOptions,
};

#[derive(Parser)]
#[command(name = "flashdeck")]
#[command(version, about = "Turn tab-separated front/back pairs into a linked PDF flashcard deck", long_about = None)]
#[command(after_help = "EXAMPLES:
    flashdeck deck words.tsv --toc              Deck with a table of contents
    flashdeck deck words.tsv --randomize --seed 7
    flashdeck deck words.tsv --list             Show parsed cards
    flashdeck template --count 40 -o blank.pdf  Empty template")]
struct Cli {
    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate a deck from a .txt, .csv or .tsv file
    Deck(DeckArgs),
    /// Generate a blank template
    Template(TemplateArgs),
}

#[derive(Args)]
struct EngineArgs {
    /// TeX to SVG command
    #[arg(long, value_name = "CMD", default_value = "tex2svg")]
    typesetter: String,

    /// SVG to PNG command
    #[arg(long, value_name = "CMD", default_value = "rsvg-convert")]
    rasterizer: String,
}

#[derive(Args)]
struct DeckArgs {
    /// Tab-separated card file
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output PDF (default: derived from the title)
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// JSON options file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[arg(long)]
    title: Option<String>,

    /// Shuffle the cards
    #[arg(long)]
    randomize: bool,

    /// Seed for --randomize
    #[arg(long)]
    seed: Option<u64>,

    /// Swap front and back
    #[arg(long)]
    flip: bool,

    /// Include a table of contents
    #[arg(long)]
    toc: bool,

    /// Drop the card read from this 0-based line (repeatable)
    #[arg(long, value_name = "INDEX")]
    delete: Vec<usize>,

    /// Print the cards instead of generating
    #[arg(long)]
    list: bool,

    #[command(flatten)]
    engines: EngineArgs,
}

#[derive(Args)]
struct TemplateArgs {
    /// Number of blank cards (1-500)
    #[arg(long)]
    count: Option<usize>,

    #[arg(long)]
    title: Option<String>,

    /// Output PDF (default: derived from the title)
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// JSON options file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(flatten)]
    engines: EngineArgs,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.quiet { "warn" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    let result = match cli.command {
        Command::Deck(args) => run_deck(args),
        Command::Template(args) => run_template(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run_deck(args: DeckArgs) -> Result<(), FlashdeckError> {
    let mut options = match &args.config {
        Some(path) => DeckOptions::from_json_file(path)?,
        None => DeckOptions::default(),
    };
    if let Some(title) = args.title {
        options.title = title;
    }
    options.randomize |= args.randomize;
    options.flip |= args.flip;
    options.include_toc |= args.toc;
    if args.seed.is_some() {
        options.seed = args.seed;
    }

    let mut deck = Deck::from_path(&args.input)?;
    for index in &args.delete {
        deck.delete(*index);
    }

    if args.list {
        for card in deck.cards() {
            println!("{}\t{}\t{}", card.original_index, card.front, card.back);
        }
        println!("{} cards", deck.len());
        return Ok(());
    }

    let backend = CommandBackend::new(args.engines.typesetter, args.engines.rasterizer);
    let assembled = DeckAssembler::new(&backend).assemble(&deck, &options)?;
    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(options.output_filename()));
    let written = assembled.canvas.save(&output, &assembled.metadata())?;

    log::info!(
        "Links: {} committed, {} dropped; {} formulas fell back to text",
        assembled.report.committed,
        assembled.report.dropped,
        assembled.formula_fallbacks
    );
    log::info!("Written {} bytes to {}", written, output.display());
    Ok(())
}

fn run_template(args: TemplateArgs) -> Result<(), FlashdeckError> {
    let mut options = match &args.config {
        Some(path) => TemplateOptions::from_json_file(path)?,
        None => TemplateOptions::default(),
    };
    if let Some(title) = args.title {
        options.title = title;
    }
    if let Some(count) = args.count {
        options.card_count = count;
    }

    let backend = CommandBackend::new(args.engines.typesetter, args.engines.rasterizer);
    let assembled = DeckAssembler::new(&backend).assemble_template(&options)?;
    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(options.output_filename()));
    let written = assembled.canvas.save(&output, &assembled.metadata())?;

    log::info!(
        "Template with {} cards: {} links; written {} bytes to {}",
        options.card_count,
        assembled.report.committed,
        written,
        output.display()
    );
    Ok(())
}
