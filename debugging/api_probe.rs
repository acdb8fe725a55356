//! Query the anime backend and print the decoded response as JSON.
//! Usage:
//!   cargo run --bin api_probe -- search <keyword> [page] [size]
//!   cargo run --bin api_probe -- title <id>
//!   cargo run --bin api_probe -- seasons <tmdb_id>
//!   cargo run --bin api_probe -- episodes <tmdb_id> <season_number>
//!   cargo run --bin api_probe -- episode <tmdb_id> <season_number> <episode_number>
//!   cargo run --bin api_probe -- recommend <text...>
//!   cargo run --bin api_probe -- timeline <keyword>
//!   cargo run --bin api_probe -- live        (one keyword per stdin line)
//! Uses ANIME_API_URL from the environment (.env supported).

use animeline::api::{AnimeApi, AnimeClient, SearchParams};
use animeline::config::Config;
use animeline::search::{SearchController, SearchView};
use animeline::timeline::{build_timeline, format_year_month, RatingFilter, TimelineBucket};
use anyhow::{Context, Result};
use dotenvy::dotenv;
use serde::Serialize;
use std::env;
use std::str::FromStr;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Probe {
    Search,
    Title,
    Seasons,
    Episodes,
    Episode,
    Recommend,
    Timeline,
    Live,
}

impl FromStr for Probe {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "search" => Ok(Probe::Search),
            "title" => Ok(Probe::Title),
            "seasons" => Ok(Probe::Seasons),
            "episodes" => Ok(Probe::Episodes),
            "episode" => Ok(Probe::Episode),
            "recommend" => Ok(Probe::Recommend),
            "timeline" => Ok(Probe::Timeline),
            "live" => Ok(Probe::Live),
            _ => Err(anyhow::anyhow!(
                "probe must be one of search, title, seasons, episodes, episode, recommend, timeline, live"
            )),
        }
    }
}

fn arg<T: FromStr>(args: &[String], index: usize, name: &str) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    args.get(index)
        .ok_or_else(|| anyhow::anyhow!("missing {name}"))?
        .parse()
        .with_context(|| format!("invalid {name}"))
}

fn print_buckets(buckets: &[TimelineBucket]) {
    for bucket in buckets {
        println!("{} ({})", format_year_month(&bucket.year_month), bucket.titles.len());
        for title in &bucket.titles {
            println!(
                "  {:>4.1}  {}  {}",
                title.vote_average,
                title.display_date().unwrap_or_default(),
                title.name
            );
        }
    }
}

fn print_view(view: &SearchView) {
    if let Some(message) = view.error() {
        println!("! {message}");
        return;
    }
    let keyword = view.params.keyword.as_deref().unwrap_or_default();
    println!("== {keyword}");
    print_buckets(&view.buckets());
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: cargo run --bin api_probe -- search <keyword> [page] [size]");
        eprintln!("       cargo run --bin api_probe -- seasons <tmdb_id>");
        eprintln!("       cargo run --bin api_probe -- episodes <tmdb_id> <season_number>");
        eprintln!("       cargo run --bin api_probe -- recommend <text...>");
        eprintln!("       cargo run --bin api_probe -- live");
        std::process::exit(1);
    }

    let probe = Probe::from_str(&args[1])?;
    let config = Config::from_env()?;
    let client = AnimeClient::new(&config.api_url)?;
    eprintln!("Backend: {}", client.base_url());

    match probe {
        Probe::Search => {
            let params = SearchParams {
                keyword: Some(arg(&args, 2, "keyword")?),
                page: args.get(3).map(|_| arg(&args, 3, "page")).transpose()?,
                size: args.get(4).map(|_| arg(&args, 4, "size")).transpose()?,
                ..SearchParams::default()
            };
            print_json(&client.search(&params).await?)?;
        }
        Probe::Title => {
            print_json(&client.fetch_title(arg(&args, 2, "id")?).await?)?;
        }
        Probe::Seasons => {
            print_json(&client.fetch_seasons(arg(&args, 2, "tmdb_id")?).await?)?;
        }
        Probe::Episodes => {
            let tmdb_id = arg(&args, 2, "tmdb_id")?;
            let season = arg(&args, 3, "season number")?;
            print_json(&client.fetch_episodes(tmdb_id, season).await?)?;
        }
        Probe::Episode => {
            let tmdb_id = arg(&args, 2, "tmdb_id")?;
            let season = arg(&args, 3, "season number")?;
            let episode = arg(&args, 4, "episode number")?;
            print_json(&client.fetch_episode(tmdb_id, season, episode).await?)?;
        }
        Probe::Recommend => {
            let text = args.get(2..).unwrap_or_default().join(" ");
            print_json(&client.recommend(&text).await?)?;
        }
        Probe::Timeline => {
            let keyword: String = arg(&args, 2, "keyword")?;
            let page = client.search(&SearchParams::keyword(keyword)).await?;
            print_buckets(&build_timeline(&page.content, RatingFilter::All));
        }
        Probe::Live => {
            eprintln!(
                "Type keywords, one per line. Searches fire after {:?} of quiet.",
                config.debounce
            );
            let controller = Arc::new(SearchController::new(
                Arc::new(client),
                config.locale,
                config.debounce,
            ));
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            let mut last = None;
            while let Some(line) = lines.next_line().await? {
                let handle = controller.on_keyword_input(line.trim());
                let controller = Arc::clone(&controller);
                last = Some(tokio::spawn(async move {
                    if let Ok(true) = handle.await {
                        print_view(&controller.view());
                    }
                }));
            }
            if let Some(printer) = last {
                printer.await?;
            }
        }
    }

    Ok(())
}
