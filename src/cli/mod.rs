pub mod commands;

use std::path::PathBuf;

use clap::{ArgGroup, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "lectern")]
#[command(about = "Read content from the backend's JSON API", long_about = None)]
pub struct Cli {
    /// Config file (default: ~/.config/lectern/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the configured API base URL
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ResourceKind {
    Articles,
    Magazines,
    Research,
    Monologues,
    Shop,
    Timeline,
    TimelineMeta,
    VideoLinks,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List visible records, or one raw page with --page
    List {
        resource: ResourceKind,
        /// Fetch a single unfiltered page
        #[arg(long)]
        page: Option<u64>,
        /// Page size
        #[arg(long)]
        limit: Option<u64>,
    },
    /// Show one record with its HTML sanitized
    #[command(group(ArgGroup::new("key").required(true).args(["id", "slug"])))]
    Get {
        resource: ResourceKind,
        #[arg(long)]
        id: Option<String>,
        #[arg(long)]
        slug: Option<String>,
    },
    /// List featured articles
    Featured,
    /// List records belonging to a parent (timeline entries of an era, videos of a monologue)
    Children {
        resource: ResourceKind,
        parent_id: String,
    },
    /// Sanitize an HTML file ("-" reads stdin)
    Sanitize { input: PathBuf },
}
