//! [`Args`] definitions.

use clap::{Parser, Subcommand};
use service::domain::opportunity;

/// Console of the opportunity pipeline.
#[derive(Debug, Parser)]
#[command(name = "crm-console", version, about, long_about = None)]
pub struct Args {
    /// Path to the configuration file.
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,

    /// [`Action`] to perform.
    #[command(subcommand)]
    pub action: Action,
}

impl Args {
    /// Parses command line arguments.
    ///
    /// # Errors
    ///
    /// Errors if failed to parse command line arguments.
    pub fn parse() -> Result<Self, clap::Error> {
        <Self as Parser>::try_parse()
    }
}

/// Action performed by the console.
#[derive(Clone, Copy, Debug, Subcommand)]
pub enum Action {
    /// Prints the pipeline board columns with their subtotals.
    Board,

    /// Moves an opportunity into another stage and prints the board.
    Move {
        /// ID of the opportunity to move.
        #[arg(long)]
        id: opportunity::Id,

        /// Code of the stage to move the opportunity into (1 to 7).
        #[arg(long, allow_negative_numbers = true)]
        stage: i64,
    },

    /// Prints an opportunity along with its line items totals.
    Show {
        /// ID of the opportunity to show.
        #[arg(long)]
        id: opportunity::Id,
    },
}

#[cfg(test)]
mod spec {
    use clap::Parser as _;

    use super::{Action, Args};

    #[test]
    fn parses_move() {
        let args = Args::try_parse_from([
            "crm-console",
            "--config",
            "local.toml",
            "move",
            "--id",
            "6c1b7c84-43ab-4b4e-9e55-8d6f0f1b3b0a",
            "--stage",
            "4",
        ])
        .unwrap();

        assert_eq!(args.config, "local.toml");
        assert!(matches!(
            args.action,
            Action::Move { id, stage: 4 }
                if id.to_string() == "6c1b7c84-43ab-4b4e-9e55-8d6f0f1b3b0a",
        ));
    }

    #[test]
    fn defaults_config_path() {
        let args = Args::try_parse_from(["crm-console", "board"]).unwrap();

        assert_eq!(args.config, "config.toml");
        assert!(matches!(args.action, Action::Board));
    }

    #[test]
    fn rejects_malformed_id() {
        assert!(
            Args::try_parse_from(["crm-console", "show", "--id", "42"]).is_err()
        );
    }
}
