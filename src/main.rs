use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use plex_music_hygiene::client::PlexClient;
use plex_music_hygiene::models::RepairOptions;
use plex_music_hygiene::pathmap::PathMap;
use plex_music_hygiene::repair::repair_artist_posters;
use plex_music_hygiene::verify::verify_artists;

#[derive(Parser, Debug)]
#[command(name = "plex-music-hygiene")]
#[command(about = "Catalog hygiene for a Plex music library: repair and audit artist posters.")]
struct Cli {
    /// Plex server base URL
    #[arg(long, env = "PLEX_BASE_URL", default_value = "http://127.0.0.1:32400")]
    base_url: String,

    /// Plex API token
    #[arg(long, env = "PLEX_TOKEN", default_value = "")]
    token: String,

    /// Music library section id
    #[arg(long, env = "PLEX_MUSIC_SECTION", default_value = "6")]
    section: String,

    /// HTTP read/write timeout in seconds
    #[arg(long, default_value_t = 60)]
    timeout: u64,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Repair missing or corrupt artist posters and write a CSV report
    RepairArtistPosters(RepairArgs),

    /// Count artists with missing or corrupt posters (read-only)
    VerifyArtists(VerifyArgs),
}

#[derive(Args, Debug)]
struct RepairArgs {
    /// Report output path
    #[arg(long)]
    out_csv: PathBuf,

    /// Prefix map SRC=DST translating server paths to host paths (repeatable,
    /// first match wins)
    #[arg(long = "path-map")]
    path_map: Vec<String>,

    /// Repair artists with no poster set
    #[arg(long)]
    fix_missing: bool,

    /// Repair artists whose poster serves the corrupt placeholder
    #[arg(long)]
    fix_corrupt: bool,

    /// Generate a placeholder cover when no other source is found
    #[arg(long)]
    generate_missing: bool,

    /// Maximum directory depth for the artwork scan
    #[arg(long, default_value_t = 4)]
    max_image_depth: usize,

    /// Directory for generated covers
    #[arg(long, default_value = "/tmp/plex_artist_generated")]
    tmp_dir: PathBuf,
}

#[derive(Args, Debug)]
struct VerifyArgs {
    /// How many example artists to print per bucket
    #[arg(long, default_value_t = 20)]
    show: usize,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    if cli.token.is_empty() {
        bail!("Missing --token or PLEX_TOKEN");
    }
    let client = PlexClient::new(&cli.base_url, &cli.token, cli.timeout);

    match &cli.cmd {
        Command::RepairArtistPosters(args) => cmd_repair(&cli, &client, args),
        Command::VerifyArtists(args) => cmd_verify(&cli, &client, args),
    }
}

fn cmd_repair(cli: &Cli, client: &PlexClient, args: &RepairArgs) -> Result<()> {
    let opts = RepairOptions {
        section: cli.section.clone(),
        fix_missing: args.fix_missing,
        fix_corrupt: args.fix_corrupt,
        generate_missing: args.generate_missing,
        max_image_depth: args.max_image_depth,
        tmp_dir: args.tmp_dir.clone(),
        path_map: PathMap::parse(&args.path_map)?,
    };

    let report = repair_artist_posters(client, &opts)?;
    report.write_csv(&args.out_csv)?;

    println!("fixed={}", report.fixed_count());
    println!("rows={}", report.len());
    println!("csv={}", args.out_csv.display());
    Ok(())
}

fn cmd_verify(cli: &Cli, client: &PlexClient, args: &VerifyArgs) -> Result<()> {
    let summary = verify_artists(client, &cli.section)?;

    println!("artists_total={}", summary.total);
    println!("missing_thumb={}", summary.missing.len());
    println!("corrupt_thumb={}", summary.corrupt.len());

    if args.show > 0 && !summary.missing.is_empty() {
        println!("missing_examples:");
        for (id, title) in summary.missing.iter().take(args.show) {
            println!("  {id} | {title}");
        }
    }
    if args.show > 0 && !summary.corrupt.is_empty() {
        println!("corrupt_examples:");
        for (id, title) in summary.corrupt.iter().take(args.show) {
            println!("  {id} | {title}");
        }
    }
    Ok(())
}
