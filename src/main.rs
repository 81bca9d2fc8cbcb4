//! Echoing Depths entry point
//!
//! Runs a headless demo session: the autopilot walks every level while cues
//! are rendered and logged. Usage: `echoing-depths [settings.json] [seed]`.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::Parser;
use echoing_depths::Settings;
use echoing_depths::game::run_session;
use echoing_depths::platform::{AutopilotInput, LogAudioSink};
use echoing_depths::renderer::NullSurface;

/// One hour of frames at 60 Hz
const MAX_FRAMES: u64 = 60 * 60 * 60;

#[derive(Parser, Debug)]
#[command(author, version, about = "Echoing Depths headless session", long_about = None)]
struct Args {
    /// JSON settings file; defaults are used when absent or unreadable
    settings: Option<PathBuf>,

    /// Session seed; taken from the clock when omitted
    seed: Option<u64>,
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    log::info!("Echoing Depths (headless) starting...");

    let settings = Settings::load_or_default(args.settings.as_deref());
    let seed = args.seed.unwrap_or_else(clock_seed);
    log::info!("Using seed {seed}");

    let mut audio = LogAudioSink::default();
    let mut surface = NullSurface::default();
    match run_session(settings, seed, &mut AutopilotInput, &mut audio, &mut surface, MAX_FRAMES) {
        Ok(summary) => {
            log::info!(
                "{:?} after {} ticks: {} level(s) cleared, score {}, {} cues, {} collisions",
                summary.phase,
                summary.ticks,
                summary.levels_completed,
                summary.score,
                summary.cues_played,
                summary.collisions
            );
        }
        Err(e) => {
            log::error!("Could not start session: {e}");
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_accept_path_and_seed() {
        let args = Args::try_parse_from(["echoing-depths", "depths.json", "42"]).unwrap();
        assert_eq!(args.settings, Some(PathBuf::from("depths.json")));
        assert_eq!(args.seed, Some(42));

        let args = Args::try_parse_from(["echoing-depths"]).unwrap();
        assert!(args.settings.is_none() && args.seed.is_none());
    }

    #[test]
    fn test_bad_seed_is_an_error() {
        assert!(Args::try_parse_from(["echoing-depths", "depths.json", "forty-two"]).is_err());
        assert!(Args::try_parse_from(["echoing-depths", "depths.json", "-1"]).is_err());
    }
}
