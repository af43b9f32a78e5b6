use clap::{Parser, Subcommand};
use rg_client::{compile, ClientConfig, Game, Page, RawParams, RecommendationClient, SqliteStore};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "rg-client")]
#[command(about = "Recommend.Games catalog client", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// API root (overrides RG_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Durable cache path (overrides RG_CACHE_DB)
    #[arg(short, long, global = true)]
    db: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show canonical and serialized form of a query string
    Params {
        /// Query string, e.g. "for=markus&playerCount=4"
        query: String,
    },

    /// List recommended or ranked games
    Games {
        /// Filter query string
        #[arg(default_value = "")]
        query: String,

        /// Page number
        #[arg(short, long, default_value = "1")]
        page: u32,
    },

    /// Show a single game
    Game {
        id: i64,

        /// Bypass the game memo
        #[arg(long)]
        refresh: bool,
    },

    /// Games similar to a given game
    Similar {
        id: i64,

        #[arg(short, long, default_value = "1")]
        page: u32,
    },

    /// Most-voted games in [start, end)
    Popular {
        #[arg(long, default_value = "0")]
        start: usize,

        #[arg(long, default_value = "10")]
        end: usize,
    },

    /// Reference list items in [start, end), e.g. categories
    List {
        name: String,

        #[arg(long, default_value = "0")]
        start: usize,

        #[arg(long, default_value = "25")]
        end: usize,
    },

    /// Get durable cache statistics
    Stats,

    /// Clean up old durable cache entries
    Cleanup {
        /// Maximum age in days
        #[arg(short, long, default_value = "30")]
        max_age_days: i64,
    },
}

fn print_game(rank: usize, game: &Game) {
    let year = game
        .year
        .map(|y| y.to_string())
        .unwrap_or_else(|| "N/A".to_string());
    let rating = game
        .rec_rating
        .map(|r| format!("{r:.2}"))
        .unwrap_or_else(|| "-".to_string());
    println!(
        "{:>4}. {} ({}) [{}] rating {}",
        rank,
        game.name_short.as_deref().unwrap_or(&game.name),
        year,
        game.bgg_id.unwrap_or_default(),
        rating
    );
}

fn print_page(page: &Page) {
    if page.user_not_found {
        println!("⚠️  User not found, showing non-personalized results");
    }
    println!(
        "📋 Page {} of {} games{}",
        page.page_number,
        page.total,
        if page.has_next { " (more)" } else { "" }
    );
    for (i, game) in page.games.iter().enumerate() {
        print_game(i + 1, game);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rg_client=info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = ClientConfig::from_env();
    if let Some(url) = &cli.api_url {
        config = config.with_api_url(url);
    }
    if let Some(db) = &cli.db {
        config = config.with_durable_store_path(db.as_str());
    }

    match cli.command {
        Commands::Params { query } => {
            let client = RecommendationClient::from_config(config).await?;
            let params = client.parse_params(&RawParams::from_query(&query));

            println!("🔧 Canonical: {:#?}", params);
            println!("🔗 Serialized: {}", client.serialize_params(&params).to_query());
            println!("🔑 Cache key: {}", client.codec().cache_key(&params));

            println!("📡 Wire filters:");
            for (field, value) in compile(&params, client.codec().bounds()).to_query_pairs() {
                println!("   {} = {}", field, value);
            }
        }

        Commands::Games { query, page } => {
            let client = RecommendationClient::from_config(config).await?;
            let params = client.parse_params(&RawParams::from_query(&query));

            let result = client.get_games(page, &params).await?;
            print_page(&result);
        }

        Commands::Game { id, refresh } => {
            let client = RecommendationClient::from_config(config).await?;
            let game = client.get_game(id, refresh).await?;

            println!("🎲 {}", game.name);
            if let Some(year) = game.year {
                println!("   Year: {}", year);
            }
            if !game.designer_display.is_empty() {
                println!("   Designer: {}", game.designer_display);
            }
            if let Some(time) = &game.time_string {
                println!("   Time: {}", time);
            }
            if let Some(complexity) = &game.complexity_string {
                println!("   Complexity: {}", complexity);
            }
            if let Some(links) = &game.external_links {
                for link in links {
                    println!("   {}: {}", link.label, link.url);
                }
            }
        }

        Commands::Similar { id, page } => {
            let client = RecommendationClient::from_config(config).await?;
            let result = client.get_similar_games(id, page).await?;
            print_page(&result);
        }

        Commands::Popular { start, end } => {
            let client = RecommendationClient::from_config(config).await?;
            let games = client.get_popular_games(start, end).await?;

            println!("🔥 Popular games {}..{}", start, end);
            for (i, game) in games.iter().enumerate() {
                print_game(start + i + 1, game);
            }
        }

        Commands::List { name, start, end } => {
            let client = RecommendationClient::from_config(config).await?;
            let items = client.get_list(&name, start, end).await?;

            println!("📚 {} {}..{}", name, start, end);
            for (i, item) in items.iter().enumerate() {
                println!("{:>4}. {}", start + i + 1, item.display_name());
            }
        }

        Commands::Stats => {
            let store = SqliteStore::new(&config.durable_store_path).await?;
            let stats = store.stats().await?;

            println!("📊 Cache Statistics:");
            println!("   Total entries: {}", stats.total_entries);

            if let Some(oldest) = stats.oldest_entry {
                println!("   Oldest entry: {}", oldest.format("%Y-%m-%d %H:%M:%S"));
            }

            if let Some(newest) = stats.newest_entry {
                println!("   Newest entry: {}", newest.format("%Y-%m-%d %H:%M:%S"));
            }
        }

        Commands::Cleanup { max_age_days } => {
            println!("🧹 Cleaning up entries older than {} days...", max_age_days);

            let store = SqliteStore::new(&config.durable_store_path).await?;
            let deleted = store.cleanup(max_age_days).await?;

            println!("✅ Deleted {} entries", deleted);
        }
    }

    Ok(())
}
