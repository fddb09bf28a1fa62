//! CLI entry point for thoughts

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use thoughts::content::CollectionKind;
use thoughts::Blog;

#[derive(Parser)]
#[command(name = "thoughts")]
#[command(version)]
#[command(about = "Static generator and preview server for The Structured Thoughts Blog", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Collection {
    Post,
    Page,
}

impl From<Collection> for CollectionKind {
    fn from(collection: Collection) -> Self {
        match collection {
            Collection::Post => CollectionKind::Post,
            Collection::Page => CollectionKind::Page,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new site
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        folder: PathBuf,
    },

    /// Create a new post or page
    New {
        /// Collection the document belongs to
        #[arg(short, long, value_enum, default_value = "post")]
        collection: Collection,

        /// Parent post, making the new post part of its series
        #[arg(short, long)]
        parent: Option<String>,

        /// Title of the new document
        title: String,
    },

    /// Generate static files
    #[command(alias = "g")]
    Generate {
        /// Watch for file changes
        #[arg(short, long)]
        watch: bool,
    },

    /// Start a local preview server
    #[command(alias = "s")]
    Server {
        /// Port to listen on
        #[arg(short, long, default_value = "4000")]
        port: u16,

        /// IP address to bind to
        #[arg(short, long, default_value = "localhost")]
        ip: String,

        /// Open browser automatically
        #[arg(short, long)]
        open: bool,

        /// Enable static mode (no file watching)
        #[arg(long)]
        r#static: bool,
    },

    /// Remove the public folder
    Clean,

    /// List site information
    List {
        /// Type of content to list (post, page, route)
        #[arg(default_value = "post")]
        r#type: String,
    },

    /// Display version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "thoughts=debug,info"
    } else {
        "thoughts=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine base directory
    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Commands::Init { folder } => {
            let target_dir = if folder.is_absolute() {
                folder
            } else {
                base_dir.join(folder)
            };
            tracing::info!("Initializing site in {:?}", target_dir);
            thoughts::commands::init::init_site(&target_dir)?;
            println!("Initialized site in {:?}", target_dir);
        }

        Commands::New {
            collection,
            parent,
            title,
        } => {
            let blog = Blog::new(&base_dir)?;
            let kind = CollectionKind::from(collection);
            tracing::info!("Creating new {} with title: {}", kind.as_str(), title);
            thoughts::commands::new::create_document(&blog, &title, kind, parent.as_deref())?;
        }

        Commands::Generate { watch } => {
            let blog = Blog::new(&base_dir)?;
            tracing::info!("Generating static files...");

            thoughts::commands::generate::run(&blog)?;
            println!("Generated successfully!");

            if watch {
                tracing::info!("Watching for file changes...");
                thoughts::commands::generate::watch(&blog).await?;
            }
        }

        Commands::Server {
            port,
            ip,
            open,
            r#static,
        } => {
            let blog = Blog::new(&base_dir)?;

            // Generate first
            tracing::info!("Generating static files...");
            blog.generate()?;

            tracing::info!("Starting server at http://{}:{}", ip, port);
            thoughts::server::start(&blog, &ip, port, !r#static, open).await?;
        }

        Commands::Clean => {
            let blog = Blog::new(&base_dir)?;
            tracing::info!("Cleaning public folder...");
            blog.clean()?;
            println!("Cleaned successfully!");
        }

        Commands::List { r#type } => {
            let blog = Blog::new(&base_dir)?;
            thoughts::commands::list::run(&blog, &r#type)?;
        }

        Commands::Version => {
            println!("thoughts version {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
