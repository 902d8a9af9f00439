//! Stakeplan CLI - staking plans for a single race

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use dialoguer::{theme::ColorfulTheme, Input, Select};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use stakeplan::core::staking::{StakeCalculator, DEFAULT_UNIT};
use stakeplan::data::{read_text_file, EntryParser};
use stakeplan::report::{self, method_label};
use stakeplan::{Entrant, StakePlan, StakeStatus, StakingMethod};

#[cfg(feature = "scraper")]
use indicatif::{ProgressBar, ProgressStyle};
#[cfg(feature = "scraper")]
use stakeplan::scraper::{RaceScraper, ScrapedRace, ScraperConfig};

#[derive(Parser)]
#[command(name = "stakeplan")]
#[command(author, version, about = "Race staking planner", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Run in interactive mode
    #[arg(short, long)]
    interactive: bool,

    /// Print debug logs to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print the plan as JSON instead of tables
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Method {
    /// Same gross payout whichever entrant wins
    Flat,
    /// Recover everything spent plus the target profit
    Chasing,
}

impl From<Method> for StakingMethod {
    fn from(method: Method) -> Self {
        match method {
            Method::Flat => StakingMethod::Flat,
            Method::Chasing => StakingMethod::Chasing,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Plan stakes from a pasted race card (`number rank name odds` per line)
    Manual {
        /// Read the race card from a file (UTF-8 or Shift_JIS)
        #[arg(short, long, conflicts_with = "text")]
        file: Option<PathBuf>,

        /// Race card text; reads stdin when neither --file nor --text is given
        #[arg(short, long)]
        text: Option<String>,

        /// Budget in yen
        #[arg(long, default_value = "3000")]
        budget: i64,

        /// Target payout (flat) or target profit (chasing) in yen
        #[arg(long, default_value = "5000")]
        target: i64,

        /// Staking formula
        #[arg(long, value_enum, default_value = "flat")]
        method: Method,

        /// Stake unit in yen
        #[arg(long, default_value_t = DEFAULT_UNIT)]
        unit: i64,
    },

    /// Plan stakes from a race page URL (requires scraper feature)
    #[cfg(feature = "scraper")]
    Scrape {
        /// Race page URL
        #[arg(short, long)]
        url: String,

        /// Budget in yen
        #[arg(long, default_value = "100000")]
        budget: i64,

        /// Target profit (chasing) or target payout (flat) in yen
        #[arg(long, default_value = "5000")]
        target: i64,

        /// Staking formula
        #[arg(long, value_enum, default_value = "chasing")]
        method: Method,

        /// Stake unit in yen
        #[arg(long, default_value_t = DEFAULT_UNIT)]
        unit: i64,

        /// Request timeout in seconds
        #[arg(long, default_value = "10")]
        timeout: u64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::WARN })
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    if !cli.json {
        println!("{}", "Stakeplan v0.1.0".cyan().bold());
        println!();
    }

    if cli.interactive {
        run_interactive()?;
    } else if let Some(command) = cli.command {
        match command {
            Commands::Manual {
                file,
                text,
                budget,
                target,
                method,
                unit,
            } => {
                let input = read_input(file.as_deref(), text)?;
                let calc = StakeCalculator::new(budget, target, unit, method.into());
                run_manual(&input, &calc, cli.json)?;
            }
            #[cfg(feature = "scraper")]
            Commands::Scrape {
                url,
                budget,
                target,
                method,
                unit,
                timeout,
            } => {
                let calc = StakeCalculator::new(budget, target, unit, method.into());
                run_scrape(&url, &calc, timeout, cli.json)?;
            }
        }
    } else {
        println!("Use --help for usage information or --interactive for interactive mode.");
    }

    Ok(())
}

/// Race card text from a file, the command line, or stdin
fn read_input(file: Option<&Path>, text: Option<String>) -> Result<String> {
    if let Some(path) = file {
        return read_text_file(path).with_context(|| format!("Failed to read {:?}", path));
    }
    if let Some(text) = text {
        return Ok(text);
    }

    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .context("Failed to read race card from stdin")?;
    Ok(buf)
}

fn run_manual(input: &str, calc: &StakeCalculator, json: bool) -> Result<()> {
    calc.validate()?;

    let entrants = EntryParser::new()
        .parse_text(input)
        .context("Could not read the race card")?;

    let plan = calc.plan(&entrants)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        print_entrants(&entrants);
        print_plan(&plan);
    }

    Ok(())
}

#[cfg(feature = "scraper")]
fn run_scrape(url: &str, calc: &StakeCalculator, timeout: u64, json: bool) -> Result<()> {
    calc.validate()?;

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;

    let config = ScraperConfig {
        timeout_secs: timeout,
        ..Default::default()
    };
    let scraper = RaceScraper::new(config)?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(format!("Fetching {}...", url));
    pb.enable_steady_tick(std::time::Duration::from_millis(100));

    let result = rt.block_on(scraper.scrape(url));
    pb.finish_and_clear();

    let race: ScrapedRace = result.with_context(|| format!("Failed to scrape {}", url))?;
    let plan = calc.plan(&race.entrants)?;

    if json {
        let out = serde_json::json!({ "race": race, "plan": plan });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("{}: {} ({})", "Scraped".green(), race.url, race.scraped_at);
        println!();
        print_entrants(&race.entrants);
        print_plan(&plan);
    }

    Ok(())
}

fn print_entrants(entrants: &[Entrant]) {
    println!("{}", "出走馬 (Entrants):".yellow().bold());
    println!("{:>4} {:>4} {:<18} {:>8}", "馬番", "人気", "馬名", "オッズ");
    println!("{}", "-".repeat(40));

    for e in entrants {
        println!(
            "{:>4} {:>4} {:<18} {:>8}",
            e.number,
            e.popularity,
            truncate_name(&e.name, 18),
            report::format_odds(e.odds)
        );
    }
    println!();
}

fn print_plan(plan: &StakePlan) {
    println!(
        "{}: {} / {}",
        "Method".green(),
        method_label(plan.method),
        report::format_yen(plan.target)
    );
    println!();

    // Purchase list
    println!("{}", "買い目リスト (Purchase List):".yellow().bold());
    let purchases = report::purchase_rows(plan);
    if purchases.is_empty() {
        println!("{}", "購入可能な馬がいません。(No affordable entrant)".red());
    } else {
        println!(
            "{:>4} {:>4} {:<18} {:>8} {:>12} {:>12}",
            "馬番", "人気", "馬名", "オッズ", "投資額", "的中時払戻"
        );
        println!("{}", "-".repeat(66));
        for row in &purchases {
            println!(
                "{:>4} {:>4} {:<18} {:>8} {:>12} {:>12}",
                row.number,
                row.popularity,
                truncate_name(&row.name, 18),
                row.odds,
                row.stake,
                row.payout
            );
        }
    }
    println!();

    // Summary
    let totals = report::summary(plan);
    println!("{}", "Summary:".yellow().bold());
    println!("  初期軍資金 (Initial budget):  {:>12}", totals.initial_budget);
    println!("  投資合計   (Total invested):  {:>12}", totals.total_invested);
    println!("  最終残高   (Remaining):       {:>12}", totals.remaining_budget);
    if let Some(name) = &totals.stopped_at {
        println!(
            "{}",
            format!(
                "  予算不足のため {} 以降の {} 頭を除外しました (budget ran out at {})",
                name,
                plan.excluded.len(),
                name
            )
            .yellow()
        );
    }
    println!();

    // Full detail including skipped rows
    println!("{}", "計算詳細 (Full Detail):".yellow().bold());
    println!(
        "{:<8} {:>4} {:>4} {:<18} {:>8} {:>12} {:>12}",
        "状態", "馬番", "人気", "馬名", "オッズ", "投資額", "残金"
    );
    println!("{}", "-".repeat(74));
    for (row, allocation) in report::detail_rows(plan).iter().zip(&plan.allocations) {
        let status = match allocation.status {
            StakeStatus::Purchased => row.status.green(),
            StakeStatus::OverBudget => row.status.red(),
            StakeStatus::OddsTooShort => row.status.dimmed(),
        };
        println!(
            "{:<8} {:>4} {:>4} {:<18} {:>8} {:>12} {:>12}",
            status,
            row.number,
            row.popularity,
            truncate_name(&row.name, 18),
            row.odds,
            row.stake,
            row.remaining_budget
        );
    }
}

fn run_interactive() -> Result<()> {
    println!("{}", "Interactive mode".green().bold());
    println!("Choose 'Quit' to exit.\n");

    let theme = ColorfulTheme::default();

    loop {
        let options = vec!["Paste a race card", "Scrape a race page", "Quit"];

        let selection = Select::with_theme(&theme)
            .with_prompt("What would you like to do?")
            .items(&options)
            .default(0)
            .interact()?;

        let result = match selection {
            0 => {
                println!("Paste entrants (`number rank name odds`), empty line to finish:");
                let mut lines = Vec::new();
                loop {
                    let line: String = Input::with_theme(&theme)
                        .with_prompt(">")
                        .allow_empty(true)
                        .interact_text()?;
                    if line.trim().is_empty() {
                        break;
                    }
                    lines.push(line);
                }

                let calc = prompt_calculator(&theme, StakeCalculator::manual())?;
                println!();
                run_manual(&lines.join("\n"), &calc, false)
            }
            #[cfg(feature = "scraper")]
            1 => {
                let url: String = Input::with_theme(&theme)
                    .with_prompt("Race page URL")
                    .interact_text()?;

                let calc = prompt_calculator(&theme, StakeCalculator::scraped())?;
                println!();
                run_scrape(&url, &calc, ScraperConfig::default().timeout_secs, false)
            }
            #[cfg(not(feature = "scraper"))]
            1 => {
                println!("{}", "Built without the scraper feature.".yellow());
                Ok(())
            }
            _ => {
                println!("Goodbye!");
                break;
            }
        };

        if let Err(e) = result {
            println!("{}: {:#}", "Error".red(), e);
        }
        println!();
    }

    Ok(())
}

/// Ask for budget, target and formula, starting from the given defaults
fn prompt_calculator(theme: &ColorfulTheme, defaults: StakeCalculator) -> Result<StakeCalculator> {
    let budget: i64 = Input::with_theme(theme)
        .with_prompt("Budget (yen)")
        .default(defaults.budget)
        .interact_text()?;

    let target: i64 = Input::with_theme(theme)
        .with_prompt("Target (yen)")
        .default(defaults.target)
        .interact_text()?;

    let methods = [StakingMethod::Flat, StakingMethod::Chasing];
    let labels: Vec<_> = methods.iter().map(|m| method_label(*m)).collect();
    let method = Select::with_theme(theme)
        .with_prompt("Staking formula")
        .items(&labels)
        .default(if defaults.method == StakingMethod::Flat { 0 } else { 1 })
        .interact()?;

    Ok(StakeCalculator::new(budget, target, defaults.unit, methods[method]))
}

/// Truncate name to fit display width
fn truncate_name(name: &str, max_len: usize) -> String {
    let chars: Vec<char> = name.chars().collect();
    if chars.len() <= max_len {
        name.to_string()
    } else {
        chars[..max_len - 1].iter().collect::<String>() + "…"
    }
}
