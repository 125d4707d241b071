use anyhow::Context;
use clap::{command, value_parser, Arg, ArgAction};
use itertools::Itertools;
use sl_automata_learning::{GenerationConfig, SlGrammar};
use tracing::{debug, info, Level};

fn main() -> anyhow::Result<()> {
    let matches = command!()
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(ArgAction::SetTrue)
                .conflicts_with("debug"),
        )
        .arg(
            Arg::new("debug")
                .short('d')
                .long("debug")
                .help("Turn on debugging information")
                .action(ArgAction::SetTrue)
                .conflicts_with("verbose"),
        )
        .arg(
            Arg::new("window")
                .short('k')
                .long("window")
                .help("Size of the n-grams")
                .value_parser(value_parser!(usize))
                .default_value("2"),
        )
        .arg(
            Arg::new("alphabet")
                .short('a')
                .long("alphabet")
                .help("Symbols of the language, taken from the words if omitted"),
        )
        .arg(
            Arg::new("negative")
                .long("negative")
                .help("Print the forbidden instead of the allowed n-grams")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("samples")
                .short('n')
                .long("samples")
                .help("Number of words to generate")
                .value_parser(value_parser!(usize))
                .default_value("0"),
        )
        .arg(
            Arg::new("distinct")
                .long("distinct")
                .help("Only generate distinct words")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .help("Seed for generating words")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("words")
                .help("The words to learn from")
                .num_args(1..)
                .required(true),
        )
        .get_matches();

    let level = if matches.get_flag("verbose") {
        Level::TRACE
    } else if matches.get_flag("debug") {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = tracing_subscriber::fmt()
        .compact()
        .with_level(true)
        .with_max_level(level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let k = *matches.get_one::<usize>("window").context("window has a default")?;
    let words: Vec<String> = matches
        .get_many::<String>("words")
        .context("at least one word is required")?
        .cloned()
        .collect();
    let alphabet = matches
        .get_one::<String>("alphabet")
        .map(|a| a.chars().collect_vec())
        .unwrap_or_default();

    let mut config = GenerationConfig::default();
    if let Some(seed) = matches.get_one::<u64>("seed") {
        config = config.with_seed(*seed);
    }

    let mut sl = SlGrammar::new(alphabet, k)?
        .with_config(config)
        .with_data(words);
    if sl.alphabet().is_empty() {
        debug!("No alphabet specified, extracting it from the words");
        sl.extract_alphabet()?;
    }
    sl.learn()?;
    sl.clean()?;
    info!("Learned {} n-grams", sl.grammar().len());

    if matches.get_flag("negative") {
        sl.change_polarity()?;
    }
    for ngram in sl.grammar() {
        println!("{}", ngram.iter().join(""));
    }

    let samples = *matches.get_one::<usize>("samples").context("samples has a default")?;
    if samples > 0 {
        for word in sl.generate_sample(samples, !matches.get_flag("distinct"))? {
            println!("{word}");
        }
    }
    Ok(())
}
