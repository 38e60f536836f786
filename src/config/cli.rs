use clap::{Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "allergy-scan")]
#[command(about = "Scan food labels for allergens in your profile")]
pub struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "allergy-scan.toml")]
    pub config: String,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Scan a label photo and report whether it is safe
    Scan {
        #[arg(short, long)]
        user: String,

        /// Label photo; asked for interactively when omitted
        #[arg(short, long)]
        image: Option<String>,
    },

    /// Show or change a user's allergy profile
    Profile {
        #[arg(short, long)]
        user: String,

        #[command(subcommand)]
        action: ProfileAction,
    },

    /// List recipes that avoid the user's allergens
    Recipes {
        #[arg(short, long)]
        user: String,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum ProfileAction {
    Show,
    Enable {
        #[arg(required = true)]
        allergens: Vec<String>,
    },
    Disable {
        #[arg(required = true)]
        allergens: Vec<String>,
    },
    Toggle {
        #[arg(required = true)]
        allergens: Vec<String>,
    },
}
