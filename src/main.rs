use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use droplet::replay::{self, ReplayReport, Sharding};
use droplet::{Config, CoreTable, SynGuard};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "droplet")]
#[command(author = "Droplet Team")]
#[command(version = "0.1.0")]
#[command(about = "Inline SYN flood classifier", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a pcap capture through the classifier
    Replay {
        /// Legacy pcap file with Ethernet frames
        #[arg(short, long)]
        pcap: PathBuf,

        /// Configuration file (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Number of cores to spread frames over (overrides config)
        #[arg(long)]
        cores: Option<usize>,

        /// Send every frame to this core instead of round-robin
        #[arg(long)]
        pin: Option<usize>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration as TOML
    Show {
        /// Configuration file (TOML); defaults are used when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Load and validate a configuration file
    Check {
        /// Configuration file (TOML)
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Replay {
            pcap,
            config,
            cores,
            pin,
            json,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(cores) = cores {
                config.runtime.cores = cores;
            }
            config.validate()?;
            run_replay(&config, &pcap, pin, json)?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Show { config } => {
                let config = load_config(config.as_deref())?;
                print!("{}", toml::to_string_pretty(&config)?);
            }
            ConfigAction::Check { path } => {
                let config = Config::from_file(&path)?;
                match config.validate() {
                    Ok(()) => println!(
                        "{} {}",
                        "✅ Configuration valid:".bright_green(),
                        path.display()
                    ),
                    Err(e) => {
                        println!("{} {}", "❌ Configuration invalid:".bright_red(), e);
                        std::process::exit(1);
                    }
                }
            }
        },
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::from_file(path),
        None => Ok(Config::default()),
    }
}

fn run_replay(config: &Config, pcap: &Path, pin: Option<usize>, json: bool) -> Result<()> {
    let frames = replay::read_pcap(pcap)?;
    let guard = SynGuard::new(config);
    let mut table = CoreTable::new(config.runtime.cores);
    let sharding = match pin {
        Some(core) => Sharding::Pinned(core),
        None => Sharding::RoundRobin,
    };

    let report = replay::replay(&guard, &mut table, &frames, sharding)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(config, pcap, &report);
    }
    Ok(())
}

fn print_report(config: &Config, pcap: &Path, report: &ReplayReport) {
    println!(
        "{}",
        "═══════════════════════════════════════════════════".bright_cyan()
    );
    println!("{}", "        SYN Flood Classifier Replay".bright_cyan().bold());
    println!(
        "{}",
        "═══════════════════════════════════════════════════".bright_cyan()
    );
    println!();
    println!("  Capture:          {}", pcap.display().to_string().bright_white());
    println!(
        "  Window threshold: {} SYNs / 8s per core",
        config.detector.window_threshold().to_string().bright_yellow()
    );
    println!(
        "  Shedding cycle:   {} pass / {} drop",
        config.verdict.pass_ticks, config.verdict.drop_ticks
    );
    println!();
    println!("  Total Frames:     {:>10}", report.total_frames);
    println!("  SYN Frames:       {:>10}", report.syn_frames);
    println!("  Unclassified:     {:>10}", report.unclassified_frames);
    println!("  Passed:           {:>10}", report.passed);
    println!(
        "  Dropped:          {:>10}",
        report.dropped.to_string().bright_red()
    );
    println!("  Drop Rate:        {:>9.2}%", report.drop_rate());
    println!("  SYN Share:        {:>9.2}%", report.syn_percentage());
    println!();

    for core in &report.cores {
        let state = if core.active {
            "UNDER ATTACK".bright_red()
        } else {
            "normal".bright_green()
        };
        println!(
            "  core {:>3}: {:>8} frames, {:>8} SYN, {:>8} dropped, window {:>8}  [{}]",
            core.core, core.frames, core.syn_frames, core.dropped, core.window_total, state
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_structure() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_replay_args() {
        let cli = Cli::parse_from(["droplet", "replay", "--pcap", "x.pcap", "--cores", "4"]);
        match cli.command {
            Commands::Replay { pcap, cores, pin, .. } => {
                assert_eq!(pcap, PathBuf::from("x.pcap"));
                assert_eq!(cores, Some(4));
                assert_eq!(pin, None);
            }
            _ => panic!("expected replay"),
        }
    }

    #[test]
    fn test_load_default_config() {
        let config = load_config(None).unwrap();
        assert_eq!(config, Config::default());
    }
}
