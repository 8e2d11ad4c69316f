use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use flurry::app::{App, UpdateStatus};
use flurry::config::Paths;
use flurry::feed::Fetcher;
use flurry::library::FilterMode;
use flurry::ui;

#[derive(Parser, Debug)]
#[command(name = "flurry", version, about = "Terminal RSS/Atom/RDF feed reader")]
struct Args {
    /// Keep config, subscriptions and cache under DIR instead of
    /// ~/.config/flurry and ~/.cache/flurry
    #[arg(long, value_name = "DIR", global = true)]
    home: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Download feeds and merge new items
    Update {
        /// Feed number or URL; all feeds when omitted
        feed: Option<String>,
    },
    /// List feeds with unread counts
    List {
        /// Only feeds in this category (repeatable)
        #[arg(short = 'c', long = "category")]
        categories: Vec<String>,
        /// Require every given category instead of any
        #[arg(long)]
        and: bool,
    },
    /// Show a feed's headlines, or one item in full
    Show {
        feed: String,
        /// Item number within the feed
        item: Option<usize>,
        /// Wrap width in columns (default: config, then terminal)
        #[arg(long)]
        width: Option<usize>,
        /// Only list unread headlines
        #[arg(long)]
        unread: bool,
    },
    /// Show unread headlines across all feeds
    New {
        #[arg(long)]
        width: Option<usize>,
    },
    /// Subscribe to a feed
    Add {
        url: String,
        /// Title shown instead of the feed's own
        #[arg(long)]
        title: Option<String>,
        #[arg(short = 'c', long = "category")]
        categories: Vec<String>,
        /// Shell command the download is piped through before parsing
        #[arg(long, value_name = "CMD")]
        filter: Option<String>,
        /// Accept feeds on localhost or a private network
        #[arg(long)]
        allow_local: bool,
    },
    /// Unsubscribe from a feed
    Remove { feed: String },
    /// Add a category to a feed
    Tag { feed: String, category: String },
    /// Remove a category from a feed
    Untag { feed: String, category: String },
    /// Mark one item, or a whole feed, read
    Read { feed: String, item: Option<usize> },
    /// List categories
    Categories,
    /// Subscribe to every feed in an OPML file
    Import { file: PathBuf },
    /// Write all subscriptions to an OPML file
    Export { file: PathBuf },
}

/// SEC-007: Restrict a data directory to the current user.
fn ensure_private_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory {}", dir.display()))?;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        match std::fs::metadata(dir) {
            Ok(metadata) => {
                let mut perms = metadata.permissions();
                perms.set_mode(0o700);
                if let Err(e) = std::fs::set_permissions(dir, perms) {
                    tracing::warn!(
                        path = %dir.display(),
                        error = %e,
                        "Failed to set directory permissions to 0700"
                    );
                }
            }
            Err(e) => {
                tracing::warn!(
                    path = %dir.display(),
                    error = %e,
                    "Failed to read directory metadata"
                );
            }
        }
    }
    Ok(())
}

fn save(app: &App) -> Result<()> {
    let paths = app.paths();
    if let Some(config_dir) = paths.subscriptions.parent() {
        ensure_private_dir(config_dir)?;
    }
    ensure_private_dir(&paths.cache_dir)?;
    app.save()
}

fn use_color() -> bool {
    std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none()
}

async fn run_update(app: &mut App, feed: Option<String>) -> Result<()> {
    let only = feed.map(|query| app.resolve_feed(&query)).transpose()?;
    let fetcher = Fetcher::new().context("Failed to create HTTP client")?;

    let results = app.update(&fetcher, only).await;
    let mut failed = 0;
    for update in &results {
        match &update.result {
            Ok(UpdateStatus::Updated(outcome)) => {
                println!("{}: {} new, {} total", update.url, outcome.new, outcome.total)
            }
            Ok(UpdateStatus::NotModified) => println!("{}: not modified", update.url),
            Err(e) => {
                failed += 1;
                println!("{}: {}", update.url, e);
            }
        }
    }
    println!(
        "Updated {} of {} feeds, {} unread",
        results.len() - failed,
        results.len(),
        app.library.unread_total()
    );
    save(app)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let paths = match &args.home {
        Some(dir) => Paths::under(dir),
        None => Paths::from_home()?,
    };
    let mut app = App::load(paths).context("Failed to start")?;
    let color = use_color();

    match args.command {
        Command::Update { feed } => run_update(&mut app, feed).await?,

        Command::List { categories, and } => {
            for name in &categories {
                app.library
                    .activate_filter(name)
                    .with_context(|| format!("Cannot filter on '{name}'"))?;
            }
            if and {
                app.library.set_filter_mode(FilterMode::And);
            }
            let opts = app.render_options(None, color);
            print!("{}", ui::render_feed_list(&app.library, &opts));
        }

        Command::Show {
            feed,
            item,
            width,
            unread,
        } => {
            let id = app.resolve_feed(&feed)?;
            let opts = app.render_options(width, color);
            match item {
                Some(n) => {
                    let item = app.resolve_item(id, n)?;
                    let owner = app.library.feed(item.feed);
                    print!(
                        "{}",
                        ui::render_item(&item, owner, &app.library.dejunker(), &opts)
                    );
                    if app.config.mark_read_on_show && !item.is_read() {
                        item.set_read(true);
                        app.library.rebuild_smart_feed();
                        save(&app)?;
                    }
                }
                None => {
                    let feed = app.library.feed(id).context("Feed disappeared")?;
                    print!("{}", ui::render_headlines(&app.library, feed, &opts, unread));
                }
            }
        }

        Command::New { width } => {
            let id = app.library.enable_smart_feed();
            let opts = app.render_options(width, color);
            let smart = app.library.feed(id).context("Smart feed missing")?;
            print!("{}", ui::render_headlines(&app.library, smart, &opts, true));
        }

        Command::Add {
            url,
            title,
            categories,
            filter,
            allow_local,
        } => {
            let id = app
                .subscribe(&url, title, &categories, filter, allow_local)
                .with_context(|| format!("Cannot subscribe to {url}"))?;
            save(&app)?;
            if let Some(feed) = app.library.feed(id) {
                println!("Subscribed to {}", feed.url);
            }
        }

        Command::Remove { feed } => {
            let id = app.resolve_feed(&feed)?;
            let removed = app.unsubscribe(id)?;
            save(&app)?;
            println!("Unsubscribed from {}", removed.url);
        }

        Command::Tag { feed, category } => {
            let id = app.resolve_feed(&feed)?;
            if app.library.tag_feed(id, &category)? {
                save(&app)?;
            } else {
                println!("Already in '{category}'");
            }
        }

        Command::Untag { feed, category } => {
            let id = app.resolve_feed(&feed)?;
            if app.library.untag_feed(id, &category)? {
                save(&app)?;
            } else {
                println!("Not in '{category}'");
            }
        }

        Command::Read { feed, item } => {
            let id = app.resolve_feed(&feed)?;
            let changed = app.mark_read(id, item)?;
            save(&app)?;
            println!("Marked {changed} item(s) read");
        }

        Command::Categories => {
            let opts = app.render_options(None, color);
            print!("{}", ui::render_categories(app.library.categories(), &opts));
        }

        Command::Import { file } => {
            // SEC-008: Canonicalize to resolve symlinks and refuse non-files
            let file = file
                .canonicalize()
                .with_context(|| format!("Failed to resolve import file: {}", file.display()))?;
            if !std::fs::metadata(&file)?.is_file() {
                anyhow::bail!("Import path must be a regular file");
            }
            let summary = app.import_opml(&file)?;
            save(&app)?;
            println!(
                "Imported {} feeds ({} skipped) from {}",
                summary.added,
                summary.skipped,
                file.display()
            );
        }

        Command::Export { file } => {
            let count = app.export_opml(&file)?;
            println!("Exported {} feeds to {}", count, file.display());
        }
    }

    Ok(())
}
