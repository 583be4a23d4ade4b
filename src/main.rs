use clap::Parser;
use std::process;
use tvdb_api::{Result, Tvdb};

/// Look up TV shows on TheTVDB from the command line
#[derive(Parser)]
#[command(name = "tvdb", version, about)]
struct Args {
    /// Name of the show to search for
    show: String,

    /// Language to request results in ("all" for every language)
    #[arg(short, long, default_value = "en")]
    language: String,

    /// API key for the service
    #[arg(long, env = "TVDB_API_KEY")]
    api_key: String,

    /// Also fetch the full season/episode tree of the first match
    #[arg(long)]
    full: bool,
}

fn run(args: &Args) -> Result<()> {
    let mut db = Tvdb::new(&args.api_key);
    let result = db.search(&args.show, &args.language)?;

    if result.is_empty() {
        println!("No shows found for '{}'.", result.search());
        return Ok(());
    }

    println!("Found {} show(s) for '{}':", result.len(), result.search());
    for show in result.iter() {
        match show.id() {
            Ok(id) => println!("  [{}] {}", id, show.series_name().unwrap_or("?")),
            Err(_) => println!("  [?] {}", show.series_name().unwrap_or("?")),
        }
        if let Some(overview) = show
            .get_attribute("Overview")
            .ok()
            .and_then(|value| value.as_text())
        {
            println!("      {overview}");
        }
    }

    if args.full {
        let mut show = result.get(0)?.clone();
        println!(
            "\nFetching episodes for '{}'...",
            show.series_name().unwrap_or("?")
        );
        show.update()?;

        for season in show.seasons() {
            if season.number() == 0 {
                println!("\nSpecials");
            } else {
                println!("\nSeason {}", season.number());
            }
            for episode in season.episodes() {
                println!(
                    "  S{:02}E{:02} - {}",
                    episode.season_number(),
                    episode.episode_number(),
                    episode.name().unwrap_or("")
                );
            }
        }
    }

    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(err) = run(&args) {
        eprintln!("Error: {err}");
        process::exit(1);
    }
}
