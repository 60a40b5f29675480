//! `metalwall` command line front end.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use core_auth::{hash_password, AuthManager, SessionContext};
use core_runtime::config::AppConfig;
use core_runtime::logging::init_logging;
use core_service::{AlbumDraft, ConcertDraft, WallService};
use core_wall::{Album, Concert, PageRequest};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::debug;

const SAMPLE_CONFIG: &str = r#"database_path = "metalwall.db"
# Signs remember-me tokens; at least 16 characters, empty disables them.
secret = ""
remember_days = 30

# password_sha256 is the hex SHA-256 of the password (see `metalwall hash-password`).
[[users]]
username = "admin"
password_sha256 = "8c6976e5b5410415bde908bd4dee15dfb167a9c873fc4bb8a81f6f2ab448a918"

[metadata_api]
# spotify_client_id = ""
# spotify_client_secret = ""
# lastfm_api_key = ""
rate_limit_delay_ms = 250

[discovery]
max_attempts = 10
identity_match = { mode = "exact" }
bandcamp_lookup = true

[logging]
level = "info"
"#;

#[derive(Parser)]
#[command(name = "metalwall", version, about = "Share metal albums and gigs")]
struct Cli {
    /// Configuration file
    #[arg(long, short, env = "METALWALL_CONFIG", default_value = "metalwall.toml")]
    config: PathBuf,

    #[command(flatten)]
    login: LoginArgs,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct LoginArgs {
    /// Username to act as
    #[arg(long, short, env = "METALWALL_USER", global = true)]
    user: Option<String>,

    #[arg(long, env = "METALWALL_PASSWORD", global = true, hide_env_values = true)]
    password: Option<String>,

    /// Remember-me token instead of a password
    #[arg(long, env = "METALWALL_TOKEN", global = true, hide_env_values = true)]
    token: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Write a sample configuration file
    Init {
        #[arg(long)]
        force: bool,
    },
    /// Print the digest to put in `password_sha256`
    HashPassword { password: String },
    /// Post an album from its link
    Post {
        url: String,
        /// Space separated, e.g. "#doom #sludge"
        #[arg(long, default_value = "")]
        tags: String,
    },
    /// Post an album with hand-entered metadata
    PostManual {
        url: String,
        artist: String,
        album: String,
        #[arg(long)]
        cover: Option<String>,
        #[arg(long, default_value = "")]
        tags: String,
    },
    /// Newest albums
    Feed {
        #[arg(long)]
        tag: Option<String>,
        #[arg(long, default_value_t = 0)]
        page: u32,
        #[arg(long, default_value_t = 20)]
        page_size: u32,
    },
    /// Most liked albums
    Ranking {
        #[arg(long)]
        tag: Option<String>,
        #[arg(long, default_value_t = 10)]
        limit: u32,
    },
    /// Like or unlike an album (or a gig)
    Like {
        id: String,
        #[arg(long)]
        gig: bool,
    },
    /// Delete one of your albums (or gigs)
    Delete {
        id: String,
        #[arg(long)]
        gig: bool,
    },
    /// Upcoming gigs
    Gigs {
        #[arg(long)]
        tag: Option<String>,
    },
    /// Announce a gig
    AddGig {
        bands: String,
        /// YYYY-MM-DD
        date: NaiveDate,
        venue: String,
        city: String,
        #[arg(long, default_value = "")]
        info: String,
        #[arg(long, default_value = "")]
        tags: String,
    },
    /// Activity of a user (yourself by default)
    Stats { username: Option<String> },
    /// Random discovery from the wall
    Discover {
        /// Start from this album instead of a random one
        #[arg(long)]
        from: Option<String>,
        /// Seed for reproducible picks
        #[arg(long)]
        seed: Option<u64>,
        /// Show your saved discoveries instead
        #[arg(long)]
        history: bool,
    },
    /// Issue a remember-me token
    Token,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Command::Init { force } => return write_sample_config(&cli.config, *force),
        Command::HashPassword { password } => {
            println!("{}", hash_password(password));
            return Ok(());
        }
        _ => {}
    }

    let config = AppConfig::from_file(&cli.config)
        .and_then(AppConfig::apply_env_overrides)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    init_logging(config.logging.to_logging_config()).context("Failed to initialize logging")?;
    debug!(config = ?config, "Configuration loaded");

    let auth = AuthManager::from_config(&config);
    let wall = core_service::bootstrap(&config)
        .await
        .context("Failed to start the wall")?;

    run(cli, &auth, &wall).await
}

async fn run(cli: Cli, auth: &AuthManager, wall: &WallService) -> Result<()> {
    let json = cli.json;

    match cli.command {
        Command::Init { .. } | Command::HashPassword { .. } => {}
        Command::Post { url, tags } => {
            let session = require_session(&cli.login, auth)?;
            let album = wall.post_album_from_url(&session, &url, &tags).await?;
            emit(json, &album, || print_album(&album))?;
        }
        Command::PostManual {
            url,
            artist,
            album,
            cover,
            tags,
        } => {
            let session = require_session(&cli.login, auth)?;
            let draft = AlbumDraft {
                url,
                artist,
                album_name: album,
                cover_url: cover,
            };
            let album = wall.post_album_manual(&session, draft, &tags).await?;
            emit(json, &album, || print_album(&album))?;
        }
        Command::Feed {
            tag,
            page,
            page_size,
        } => {
            let page = wall
                .feed(tag.as_deref(), PageRequest::new(page, page_size))
                .await?;
            emit(json, &page, || {
                if page.items.is_empty() {
                    println!("No results");
                }
                page.items.iter().for_each(print_album);
                println!("page {} of {} ({} albums)", page.page + 1, page.total_pages.max(1), page.total);
                if page.has_next() {
                    println!("more with --page {}", page.page + 1);
                }
            })?;
        }
        Command::Ranking { tag, limit } => {
            let albums = wall.ranking(tag.as_deref(), limit).await?;
            emit(json, &albums, || {
                for (rank, album) in albums.iter().enumerate() {
                    print!("#{:<3}", rank + 1);
                    print_album(album);
                }
            })?;
        }
        Command::Like { id, gig } => {
            let session = require_session(&cli.login, auth)?;
            let state = if gig {
                wall.toggle_concert_like(&session, &id).await?
            } else {
                wall.toggle_album_like(&session, &id).await?
            };
            emit(json, &state, || {
                let verb = if state.liked { "Liked" } else { "Unliked" };
                println!("{} ({} likes)", verb, state.count);
            })?;
        }
        Command::Delete { id, gig } => {
            let session = require_session(&cli.login, auth)?;
            if gig {
                wall.delete_concert(&session, &id).await?;
            } else {
                wall.delete_album(&session, &id).await?;
            }
            println!("Deleted {}", id);
        }
        Command::Gigs { tag } => {
            let concerts = wall.upcoming_concerts(tag.as_deref()).await?;
            emit(json, &concerts, || {
                if concerts.is_empty() {
                    println!("No upcoming gigs");
                }
                concerts.iter().for_each(print_concert);
            })?;
        }
        Command::AddGig {
            bands,
            date,
            venue,
            city,
            info,
            tags,
        } => {
            let session = require_session(&cli.login, auth)?;
            let draft = ConcertDraft {
                bands,
                date,
                venue,
                city,
                info,
            };
            let concert = wall.add_concert(&session, draft, &tags).await?;
            emit(json, &concert, || print_concert(&concert))?;
        }
        Command::Stats { username } => {
            let username = match username {
                Some(name) => name,
                None => require_session(&cli.login, auth)?.username,
            };
            let stats = wall.user_stats(&username).await?;
            emit(json, &stats, || {
                println!("@{}", username);
                println!("  albums posted:  {}", stats.albums_posted);
                println!("  likes received: {}", stats.likes_received);
                println!("  gigs announced: {}", stats.concerts);
            })?;
        }
        Command::Discover {
            from,
            seed,
            history,
        } => {
            let session = optional_session(&cli.login, auth)?;
            if history {
                let Some(session) = session else {
                    bail!("--history needs a signed-in user");
                };
                let saved = wall.discoveries(&session, 20).await?;
                emit(json, &saved, || {
                    for d in &saved {
                        println!(
                            "{} - {}  (from {} - {})",
                            d.discovered_artist, d.discovered_album, d.base_artist, d.base_album
                        );
                    }
                })?;
                return Ok(());
            }

            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            let outcome = match from {
                Some(album_id) => {
                    wall.discover_from(session.as_ref(), &album_id, &mut rng)
                        .await?
                }
                None => wall.discover(session.as_ref(), &mut rng).await?,
            };
            emit(json, &outcome, || {
                println!("{} - {}", outcome.album.artist, outcome.album.album);
                println!("  {}", outcome.description);
                println!("  {}", outcome.validation.label());
                println!("  {}", outcome.album.url);
                if let Some(link) = &outcome.store_link {
                    println!("  {}", link.url);
                }
                println!("  #{}", outcome.tags.join(" #"));
            })?;
        }
        Command::Token => {
            let session = require_session(&cli.login, auth)?;
            println!("{}", auth.remember(&session)?);
        }
    }

    Ok(())
}

fn optional_session(login: &LoginArgs, auth: &AuthManager) -> Result<Option<SessionContext>> {
    if let Some(token) = &login.token {
        return Ok(Some(auth.resume(token)?));
    }
    match (&login.user, &login.password) {
        (Some(user), Some(password)) => Ok(Some(auth.login(user, password)?)),
        (Some(_), None) => bail!("--password is required with --user"),
        _ => Ok(None),
    }
}

fn require_session(login: &LoginArgs, auth: &AuthManager) -> Result<SessionContext> {
    match optional_session(login, auth)? {
        Some(session) => Ok(session),
        None => bail!("Please sign in with --user/--password or --token"),
    }
}

fn emit<T: Serialize>(json: bool, value: &T, human: impl FnOnce()) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        human();
    }
    Ok(())
}

fn print_album(album: &Album) {
    println!(
        "{} - {}  [{}] @{}  ♥ {}",
        album.artist,
        album.album_name,
        album.platform,
        album.username,
        album.like_count()
    );
    println!("    {}  id={}", album.url, album.id);
    if !album.tags.is_empty() {
        println!("    {}", album.tags);
    }
}

fn print_concert(concert: &Concert) {
    let days = concert.days_until(chrono::Local::now().date_naive());
    let when = match days {
        0 => "today".to_string(),
        1 => "tomorrow".to_string(),
        n => format!("in {} days", n),
    };
    println!(
        "{}  {} @ {}, {} ({})  ♥ {}",
        concert.date.format("%d/%m/%Y"),
        concert.bands,
        concert.venue,
        concert.city,
        when,
        concert.like_count()
    );
    if !concert.info.is_empty() {
        println!("    {}", concert.info);
    }
    println!("    @{}  id={}", concert.username, concert.id);
}

fn write_sample_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    std::fs::write(path, SAMPLE_CONFIG)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Wrote {}", path.display());
    Ok(())
}
