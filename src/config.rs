use std::path::PathBuf;

use clap::Parser;

use crate::fingerprint::HashKind;
use crate::policy::{IndexUpdate, Policy, Threshold};
use crate::quality::Ranking;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "imgdedup",
    version,
    about = "Move visually duplicate images out of a folder tree"
)]
pub struct Cli {
    /// The source folder to scan
    #[arg(short, long, value_name = "DIR", required_unless_present = "history")]
    pub source: Option<PathBuf>,

    /// Folder that receives the inferior copy of each duplicate pair
    #[arg(short, long, value_name = "DIR")]
    pub destination: PathBuf,

    /// Minimum similarity in 0.0..=1.0; 1.0 only matches identical fingerprints
    #[arg(short, long, default_value_t = Threshold::EXACT)]
    pub threshold: Threshold,

    /// Fingerprint algorithm
    #[arg(long = "hash", value_enum, default_value_t = HashKind::Difference)]
    pub hash_kind: HashKind,

    /// How the two images of a duplicate pair are ordered
    #[arg(long, value_enum, default_value_t = Ranking::Content)]
    pub ranking: Ranking,

    /// When the indexed image loses, point its index entry at the surviving file
    #[arg(long)]
    pub follow_survivor: bool,

    /// Only show what would be moved
    #[arg(long)]
    pub dry_run: bool,

    /// Threads used for fingerprinting (default: one per core)
    #[arg(short, long, value_name = "N")]
    pub jobs: Option<usize>,

    /// List the relocations journaled in the destination folder and exit
    #[arg(long, conflicts_with = "dry_run")]
    pub history: bool,
}

/// Everything a run needs, independent of how it was specified.
#[derive(Debug, Clone)]
pub struct Config {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub policy: Policy,
    pub hash_kind: HashKind,
    pub ranking: Ranking,
    pub dry_run: bool,
    pub jobs: Option<usize>,
    pub progress: bool,
}

impl Config {
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            policy: Policy::default(),
            hash_kind: HashKind::default(),
            ranking: Ranking::default(),
            dry_run: false,
            jobs: None,
            progress: false,
        }
    }
}

impl From<Cli> for Config {
    fn from(cli: Cli) -> Self {
        let update = if cli.follow_survivor {
            IndexUpdate::FollowSurvivor
        } else {
            IndexUpdate::Preserve
        };
        Self {
            source: cli.source.unwrap_or_default(),
            destination: cli.destination,
            policy: Policy::new(cli.threshold, update),
            hash_kind: cli.hash_kind,
            ranking: cli.ranking,
            dry_run: cli.dry_run,
            jobs: cli.jobs,
            progress: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_match_exact_matching() {
        let cli = Cli::try_parse_from(["imgdedup", "-s", "in", "-d", "out"]).unwrap();
        let config = Config::from(cli);
        assert_eq!(config.source, PathBuf::from("in"));
        assert_eq!(config.destination, PathBuf::from("out"));
        assert_eq!(config.policy.threshold, Threshold::EXACT);
        assert_eq!(config.policy.update, IndexUpdate::Preserve);
        assert_eq!(config.hash_kind, HashKind::Difference);
        assert_eq!(config.ranking, Ranking::Content);
        assert!(!config.dry_run);
    }

    #[test]
    fn parses_long_options() {
        let cli = Cli::try_parse_from([
            "imgdedup",
            "--source",
            "in",
            "--destination",
            "out",
            "--threshold",
            "0.9",
            "--hash",
            "mean",
            "--ranking",
            "area",
            "--follow-survivor",
            "--dry-run",
            "-j",
            "2",
        ])
        .unwrap();
        let config = Config::from(cli);
        assert_eq!(config.policy.threshold.value(), 0.9);
        assert_eq!(config.policy.update, IndexUpdate::FollowSurvivor);
        assert_eq!(config.hash_kind, HashKind::Mean);
        assert_eq!(config.ranking, Ranking::Area);
        assert!(config.dry_run);
        assert_eq!(config.jobs, Some(2));
    }

    #[test]
    fn rejects_bad_threshold_and_missing_args() {
        assert!(Cli::try_parse_from(["imgdedup", "-s", "a", "-d", "b", "-t", "1.5"]).is_err());
        assert!(Cli::try_parse_from(["imgdedup", "-s", "a", "-d", "b", "-t", "high"]).is_err());
        assert!(Cli::try_parse_from(["imgdedup", "-s", "a"]).is_err());
        assert!(Cli::try_parse_from(["imgdedup", "-d", "b"]).is_err());
    }

    #[test]
    fn history_needs_only_the_destination() {
        let cli = Cli::try_parse_from(["imgdedup", "--history", "-d", "held"]).unwrap();
        assert!(cli.history);
        assert_eq!(cli.source, None);
        assert_eq!(cli.destination, PathBuf::from("held"));

        assert!(Cli::try_parse_from(["imgdedup", "--history"]).is_err());
        assert!(Cli::try_parse_from(["imgdedup", "--history", "-d", "x", "--dry-run"]).is_err());
    }
}
