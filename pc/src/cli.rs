//! CLI command definitions and subcommands

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

use crate::resolve::AspectRatio;

/// PresetCam - preset catalog and prompt resolver for an AI camera
#[derive(Parser, Debug)]
#[command(name = "pc", author, version, about = "Preset catalog and prompt resolver for an AI camera", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List presets in the resolved catalog
    List {
        /// Only show presets with this category
        #[arg(short = 'C', long)]
        category: Option<String>,
    },

    /// Print a preset as JSON
    Show {
        /// Preset name
        #[arg(required = true)]
        name: String,
    },

    /// Resolve a preset into the prompt sent to the image service
    Resolve {
        /// Preset name
        #[arg(required = true)]
        name: String,

        /// Seed to use (default: current time in milliseconds)
        #[arg(short, long, allow_negative_numbers = true)]
        seed: Option<i64>,

        /// Option text for structured presets that do not randomize
        #[arg(long)]
        choice: Option<String>,

        /// Master prompt to append (overrides config)
        #[arg(short, long)]
        master: Option<String>,

        /// Aspect ratio instruction: none, 1:1 or 16:9 (overrides config)
        #[arg(short, long)]
        aspect: Option<AspectRatio>,
    },

    /// Add a user preset
    Add {
        /// Preset name
        #[arg(required = true)]
        name: String,

        /// Template text
        #[arg(short, long, required = true)]
        message: String,

        /// Category tag (repeatable)
        #[arg(short = 'C', long)]
        category: Vec<String>,

        /// Structured option text (repeatable)
        #[arg(short, long)]
        option: Vec<String>,

        /// Pick options at random
        #[arg(short, long)]
        randomize: bool,
    },

    /// Modify a preset
    Modify {
        /// Preset name
        #[arg(required = true)]
        name: String,

        /// New template text
        #[arg(short, long)]
        message: Option<String>,

        /// Replace category tags (repeatable)
        #[arg(short = 'C', long)]
        category: Vec<String>,

        /// Pick options at random (true or false)
        #[arg(short, long, action = ArgAction::Set)]
        randomize: Option<bool>,

        /// New preset name
        #[arg(long)]
        rename: Option<String>,
    },

    /// Delete a preset
    Delete {
        /// Preset name
        #[arg(required = true)]
        name: String,
    },

    /// Return a factory preset to its original state
    Restore {
        /// Preset name
        #[arg(required = true)]
        name: String,
    },

    /// Import presets from a catalog file
    Import {
        /// Catalog JSON file
        #[arg(required = true)]
        file: PathBuf,

        /// Only import these presets (repeatable; default: all)
        #[arg(short, long)]
        select: Vec<String>,

        /// Only import presets whose name contains this text (case-insensitive)
        #[arg(short, long)]
        filter: Option<String>,

        /// Show what would change without saving
        #[arg(long)]
        dry_run: bool,
    },

    /// Remove presets from the imported catalog
    Unimport {
        /// Preset name
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        name: Option<String>,

        /// Drop the whole imported catalog and fall back to the factory catalog
        #[arg(long)]
        all: bool,
    },

    /// Show recent selections for a preset
    History {
        /// Preset name
        #[arg(required = true)]
        name: String,
    },

    /// Remove overlay records
    Reset {
        /// Only drop factory preset edits and deletions, keep user presets
        #[arg(long)]
        factory_only: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_resolve() {
        let cli = Cli::try_parse_from([
            "pc", "resolve", "Animals", "--seed", "-7", "--aspect", "16:9", "-l", "debug",
        ])
        .unwrap();
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        match cli.command {
            Command::Resolve { name, seed, aspect, .. } => {
                assert_eq!(name, "Animals");
                assert_eq!(seed, Some(-7));
                assert_eq!(aspect, Some(AspectRatio::Widescreen));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_modify_randomize_value() {
        let cli = Cli::try_parse_from(["pc", "modify", "Letters", "--randomize", "false"]).unwrap();
        match cli.command {
            Command::Modify { randomize, .. } => assert_eq!(randomize, Some(false)),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_unimport_name_or_all() {
        let cli = Cli::try_parse_from(["pc", "unimport", "--all"]).unwrap();
        assert!(matches!(cli.command, Command::Unimport { name: None, all: true }));

        let cli = Cli::try_parse_from(["pc", "unimport", "Noir"]).unwrap();
        assert!(matches!(cli.command, Command::Unimport { name: Some(ref n), all: false } if n == "Noir"));

        assert!(Cli::try_parse_from(["pc", "unimport"]).is_err());
        assert!(Cli::try_parse_from(["pc", "unimport", "Noir", "--all"]).is_err());
    }

    #[test]
    fn test_parse_add_repeated_args() {
        let cli = Cli::try_parse_from([
            "pc", "add", "Letters", "-m", "Draw a letter", "-C", "fun", "-o", "A", "-o", "B", "-r",
        ])
        .unwrap();
        match cli.command {
            Command::Add {
                category,
                option,
                randomize,
                ..
            } => {
                assert_eq!(category, vec!["fun"]);
                assert_eq!(option, vec!["A", "B"]);
                assert!(randomize);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
