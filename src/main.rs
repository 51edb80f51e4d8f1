//! Command-line front end: merges tracks and channels in a MIDI file and
//! ensures only one note at a time is played.

use std::fs;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use monomid::{Options, Policy, Verification};

/// Merges tracks and channels in a MIDI file and ensures only one note at a
/// time is played.
#[derive(Debug, Parser)]
#[command(name = "monomid")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input MIDI file.
    #[arg(short, long)]
    input: PathBuf,

    /// Output MIDI file.
    #[arg(short, long, default_value = "output.mid")]
    output: PathBuf,

    /// Tracks that should be included in processing.
    /// If not given, all tracks will be included.
    #[arg(short = 'A', long = "add-tracks", num_args = 0.., value_name = "TRACK")]
    add_tracks: Option<Vec<usize>>,

    /// Tracks that should not be included in processing.
    #[arg(short = 'R', long = "remove-tracks", num_args = 0.., value_name = "TRACK")]
    remove_tracks: Vec<usize>,

    /// Channels that should be included in processing.
    /// If not given, all channels will be included.
    #[arg(short = 'a', long = "add-channels", num_args = 0.., value_name = "CHANNEL",
          value_parser = clap::value_parser!(u8).range(0..16))]
    add_channels: Option<Vec<u8>>,

    /// Channels that should not be included in processing.
    #[arg(short = 'r', long = "remove-channels", num_args = 0.., value_name = "CHANNEL",
          value_parser = clap::value_parser!(u8).range(0..16))]
    remove_channels: Vec<u8>,

    /// Which note wins when several sound at once.
    #[arg(long, value_enum, default_value = "highest")]
    policy: PolicyArg,

    /// Channel all output events are mapped to.
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..16))]
    target_channel: u8,

    /// Treat a single note left sounding at the end as an error instead of a
    /// warning.
    #[arg(long)]
    strict: bool,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum PolicyArg {
    /// The highest pitch wins.
    Highest,
    /// The lowest pitch wins.
    Lowest,
    /// The note that arrived last wins.
    Latest,
    /// The note that arrived first wins.
    Earliest,
}

impl From<PolicyArg> for Policy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Highest => Policy::Highest,
            PolicyArg::Lowest => Policy::Lowest,
            PolicyArg::Latest => Policy::Latest,
            PolicyArg::Earliest => Policy::Earliest,
        }
    }
}

fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let bytes = match fs::read(&cli.input) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Error reading file '{}': {}", cli.input.display(), e);
            process::exit(1);
        }
    };

    let smf = match monomid::midi::parse(&bytes) {
        Ok(smf) => smf,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    // Report what will be processed before doing any of it.
    let tracks = monomid::included_tracks(
        smf.tracks.len(),
        cli.add_tracks.as_deref(),
        &cli.remove_tracks,
    );
    let channels = monomid::included_channels(cli.add_channels.as_deref(), &cli.remove_channels);
    println!("Including tracks: {:?}", tracks);
    println!("Including channels: {:?}", channels);

    let options = Options {
        include_tracks: cli.add_tracks,
        exclude_tracks: cli.remove_tracks,
        include_channels: cli.add_channels,
        exclude_channels: cli.remove_channels,
        target_channel: cli.target_channel,
        policy: cli.policy.into(),
        tolerate_trailing_hold: !cli.strict,
    };

    let processed = match monomid::process_smf(&smf, &options) {
        Ok(processed) => processed,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    match processed.verification {
        Verification::Clean => println!("Verified successfully"),
        Verification::TrailingNote(pitch) => {
            println!(
                "A single note {} was left on in the end. This will be ignored for now.",
                pitch
            );
        }
    }

    if let Err(e) = fs::write(&cli.output, &processed.bytes) {
        eprintln!("Error writing to '{}': {}", cli.output.display(), e);
        process::exit(1);
    }
    eprintln!("Wrote monophonic MIDI to {}", cli.output.display());
}
