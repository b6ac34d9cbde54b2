//! x-monitor — command-line front end
//! Manage monitored terms, trigger manual runs and browse results against the
//! X Monitor API. See `MonitorConfig` for configuration sources.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};

use x_monitor::{Monitor, MonitorConfig, ResultCard, ResultId, Term, TermId};

#[derive(Parser)]
#[command(name = "x-monitor", version, about = "Monitor keywords, hashtags and tickers on X")]
struct Cli {
    /// Path to a TOML config file (overrides $X_MONITOR_CONFIG)
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List monitored terms
    Terms,
    /// Add a term ($TICKER, #hashtag or plain keyword)
    Add {
        keyword: String,
        /// Only monitor accounts you follow
        #[arg(long)]
        following: bool,
    },
    /// Include a term in scheduled analysis
    Activate { id: i64 },
    /// Exclude a term from scheduled analysis
    Deactivate { id: i64 },
    /// Set the following-only filter explicitly
    Following {
        id: i64,
        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },
    /// Flip a term's active flag
    ToggleActive { id: i64 },
    /// Flip a term's following-only flag
    ToggleFollowing { id: i64 },
    /// Delete a term
    Delete {
        id: i64,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Run the analysis for a term now
    Run { id: i64 },
    /// List result summaries, optionally expanding one
    Results {
        #[arg(long)]
        expand: Option<i64>,
    },
    /// Show one result fully expanded
    Show { id: i64 },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    x_monitor::telemetry::init_tracing();

    let cli = Cli::parse();
    let cfg = match &cli.config {
        Some(p) => MonitorConfig::load_from(p)?,
        None => MonitorConfig::load_default()?,
    };
    let monitor = Monitor::connect(&cfg).context("building gateway")?;

    match cli.command {
        Command::Terms => {
            monitor.terms.load().await?;
            print_terms(&monitor.terms.terms());
        }
        Command::Add { keyword, following } => {
            monitor.terms.create(&keyword, following).await?;
            print_terms(&monitor.terms.terms());
        }
        Command::Activate { id } => {
            monitor.terms.set_active(TermId(id), true).await?;
            print_terms(&monitor.terms.terms());
        }
        Command::Deactivate { id } => {
            monitor.terms.set_active(TermId(id), false).await?;
            print_terms(&monitor.terms.terms());
        }
        Command::Following { id, enabled } => {
            monitor.terms.set_restrict_following(TermId(id), enabled).await?;
            print_terms(&monitor.terms.terms());
        }
        Command::ToggleActive { id } => {
            monitor.terms.load().await?;
            monitor.terms.toggle_active(TermId(id)).await?;
            print_terms(&monitor.terms.terms());
        }
        Command::ToggleFollowing { id } => {
            monitor.terms.load().await?;
            monitor.terms.toggle_restrict_following(TermId(id)).await?;
            print_terms(&monitor.terms.terms());
        }
        Command::Delete { id, yes } => {
            if !yes && !confirm("Are you sure you want to delete this term?")? {
                println!("Cancelled.");
                return Ok(());
            }
            monitor.terms.remove(TermId(id)).await?;
            print_terms(&monitor.terms.terms());
        }
        Command::Run { id } => {
            monitor.terms.load().await?;
            let term = monitor
                .terms
                .get(TermId(id))
                .ok_or_else(|| anyhow!("no term with id {id}"))?;
            match monitor.runs.run_now(&term).await {
                Ok(out) => println!("Summary generated for {}:\n{}", out.keyword, out.summary),
                Err(e) => {
                    eprintln!("{}", e.user_message());
                    return Err(e.into());
                }
            }
        }
        Command::Results { expand } => {
            monitor.results.load().await?;
            if let Some(id) = expand {
                monitor.results.toggle_expanded(ResultId(id));
            }
            let cards = monitor.results.cards();
            if cards.is_empty() {
                println!("No results yet. Run some analyses to see summaries here!");
            }
            for card in &cards {
                print_card(card);
            }
        }
        Command::Show { id } => {
            let id = ResultId(id);
            monitor.results.fetch(id).await?;
            monitor.results.toggle_expanded(id);
            if let Some(card) = monitor.results.card(id) {
                print_card(&card);
            }
        }
    }
    Ok(())
}

fn confirm(question: &str) -> Result<bool> {
    print!("{question} [y/N] ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

fn print_terms(terms: &[Term]) {
    if terms.is_empty() {
        println!("No monitored terms yet. Add one to get started!");
        return;
    }
    println!("{:>5}  {:<24} {:<15} {:<9} CREATED", "ID", "TERM", "SCOPE", "STATUS");
    for t in terms {
        println!(
            "{:>5}  {:<24} {:<15} {:<9} {}",
            t.id,
            t.keyword,
            if t.restrict_following { "Following Only" } else { "All Users" },
            if t.active { "Active" } else { "Inactive" },
            t.created_at.format("%Y-%m-%d"),
        );
    }
}

fn print_card(card: &ResultCard) {
    println!(
        "#{} {} ({})",
        card.id,
        card.term_label,
        card.created_at.format("%Y-%m-%d")
    );
    for line in card.preview.iter().chain(card.rest.iter()) {
        println!("  {line}");
    }
    if !card.top_posts.is_empty() {
        println!("  Top Tweets ({})", card.top_posts.len());
        for p in &card.top_posts {
            let who = p
                .author
                .as_ref()
                .map(|a| format!("@{}{} ", a.username, if a.verified { " ✓" } else { "" }))
                .unwrap_or_default();
            println!("    {who}{}", p.text);
            if let Some(m) = p.public_metrics {
                println!(
                    "      likes {} · retweets {} · replies {}",
                    m.like_count, m.retweet_count, m.reply_count
                );
            }
            println!("      {}", p.url);
        }
    }
    if !card.expanded && card.has_more {
        println!("  (use --expand {} for more)", card.id);
    }
    println!();
}
