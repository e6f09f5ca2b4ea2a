use std::fs::OpenOptions;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use actix_web::{web, App, HttpServer};
use chrono::Utc;
use clap::{value_parser, Arg, Command};
use log::{error, info, warn};
use wordtwist::config::GameConfig;
use wordtwist::error::StartupError;
use wordtwist::game::Game;
use wordtwist::handlers;
use wordtwist::models::{AdminCredentials, AppState};
use wordtwist::services::generator::PuzzleGenerator;
use wordtwist::services::puzzle_cache::PuzzleCache;
use wordtwist::services::word_loader::Corpus;
use wordtwist::store::{self, AdminSessionStore, FallbackStore, MemorySessionStore, RedisSessionStore, SharedConnection};

const DEFAULT_LISTEN_HOST: &str = "0.0.0.0:3001";

fn init_logging(log_file: Option<&String>) -> io::Result<()> {
    if let Some(file) = log_file {
        let log_output = OpenOptions::new().create(true).append(true).open(file)?;

        env_logger::Builder::from_default_env()
            .target(env_logger::Target::Pipe(Box::new(log_output)))
            .init();
    } else {
        env_logger::init();
    }
    Ok(())
}

fn load_puzzles(share_dir: &str, lang: &str, config: &GameConfig) -> Result<PuzzleCache, StartupError> {
    let corpus = Corpus::from_share_dir(
        &PathBuf::from(share_dir),
        lang,
        config.min_word_length,
        config.max_word_length,
    )?;
    Ok(PuzzleCache::build(Arc::new(corpus), config)?)
}

fn cli() -> Command {
    Command::new("wordtwist")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Ron Straight <straightre@gmail.com>")
        .about("Word twist puzzle and round session service")
        .arg(
            Arg::new("listen-host")
                .long("listen-host")
                .env("LISTEN_HOST")
                .num_args(1)
                .default_value(DEFAULT_LISTEN_HOST)
                .help("Specify the listen address (e.g., 0.0.0.0:3001)"),
        )
        .arg(
            Arg::new("log-file")
                .long("log-file")
                .env("LOG_FILE")
                .num_args(1)
                .help("Specify a log file path (if omitted, logs to stderr)"),
        )
        .arg(
            Arg::new("share-dir")
                .long("share-dir")
                .env("SHARE_DIR")
                .num_args(1)
                .default_value("./share")
                .help("Directory containing the word files"),
        )
        .arg(
            Arg::new("lang")
                .long("lang")
                .env("WORDTWIST_LANG")
                .num_args(1)
                .default_value("en")
                .help("Lexicon language to load"),
        )
        .arg(
            Arg::new("redis-url")
                .long("redis-url")
                .env("REDIS_URL")
                .num_args(1)
                .help("Redis URL for shared sessions (if omitted, sessions stay in this process)"),
        )
        .arg(
            Arg::new("timer-seconds")
                .long("timer-seconds")
                .env("TIMER_DURATION")
                .num_args(1)
                .value_parser(value_parser!(i64).range(1..))
                .default_value("120")
                .help("Length of a timed round in seconds"),
        )
        .arg(
            Arg::new("admin-username")
                .long("admin-username")
                .env("ADMIN_USERNAME")
                .num_args(1)
                .help("Admin login name (admin endpoints are disabled without it)"),
        )
        .arg(
            Arg::new("admin-password")
                .long("admin-password")
                .env("ADMIN_PASSWORD")
                .num_args(1)
                .hide_env_values(true)
                .help("Admin password (admin endpoints are disabled without it)"),
        )
}

// Sessions stay in memory until Redis answers; a background task keeps retrying.
async fn connect_redis(url: &str, config: &GameConfig) -> SharedConnection {
    let shared = SharedConnection::default();
    match store::redis::connect(url).await {
        Ok(conn) => {
            shared.install(conn);
            info!("Session backend: redis with in-memory fallback");
        }
        Err(e) => {
            warn!("Redis unavailable at startup, using in-memory sessions until it answers: {}", e);
            let retry = config
                .redis_retry_interval
                .to_std()
                .unwrap_or(std::time::Duration::from_secs(5));
            actix_web::rt::spawn(store::redis::connect_until_ready(url.to_string(), shared.clone(), retry));
        }
    }
    shared
}

fn spawn_reaper(state: web::Data<AppState>) {
    let period = state
        .game
        .config()
        .reaper_interval
        .to_std()
        .unwrap_or(std::time::Duration::from_secs(600));

    actix_web::rt::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let now = Utc::now();
            let rounds = state.game.store().fallback().purge_expired(now);
            let admins = state.admin_sessions.purge_expired(now);
            if rounds + admins > 0 {
                warn!("Reaper evicted {} round and {} admin sessions", rounds, admins);
            }
        }
    });
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    let matches = cli().get_matches();

    let listen_host = matches
        .get_one::<String>("listen-host")
        .cloned()
        .unwrap_or_else(|| DEFAULT_LISTEN_HOST.to_string());
    let log_file = matches.get_one::<String>("log-file");
    let share_dir = matches.get_one::<String>("share-dir").map_or("./share", String::as_str);
    let lang = matches.get_one::<String>("lang").map_or("en", String::as_str);
    let redis_url = matches.get_one::<String>("redis-url");
    let timer_seconds = matches.get_one::<i64>("timer-seconds").copied().unwrap_or(120);
    let admin = match (
        matches.get_one::<String>("admin-username"),
        matches.get_one::<String>("admin-password"),
    ) {
        (Some(username), Some(password)) => Some(AdminCredentials {
            username: username.clone(),
            password: password.clone(),
        }),
        _ => None,
    };

    init_logging(log_file)?;

    let config = Arc::new(GameConfig::default().with_timer_seconds(timer_seconds));
    info!("Loading {} lexicon from {}", lang, share_dir);
    let cache = match load_puzzles(share_dir, lang, &config) {
        Ok(cache) => Arc::new(cache),
        Err(e) => {
            error!("Startup failed: {}", e);
            return Err(e.into());
        }
    };

    let redis = match redis_url {
        Some(url) => Some(connect_redis(url, &config).await),
        None => {
            info!("Session backend: in-memory");
            None
        }
    };
    let primary = redis
        .clone()
        .map(|conn| RedisSessionStore::new(conn, config.session_ttl));
    if admin.is_none() {
        info!("Admin credentials not set, admin endpoints disabled");
    }

    let sessions = FallbackStore::new(primary, MemorySessionStore::new(config.session_ttl));
    let generator = PuzzleGenerator::new(cache, Arc::clone(&config));
    let state = web::Data::new(AppState {
        game: Game::new(generator, sessions, Arc::clone(&config)),
        admin_sessions: AdminSessionStore::new(redis.clone(), config.admin_session_ttl),
        admin,
        redis,
    });

    spawn_reaper(state.clone());

    info!("Listening on {}", listen_host);
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(handlers::configure)
    })
    .bind(&listen_host)?
    .run()
    .await
}
