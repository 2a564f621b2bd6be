//! Trendr CLI - Landsat temporal segmentation pipeline

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use trendr_algorithms::prelude::*;
use trendr_cloud::{EngineClientBlocking, EngineClientOptions, ExportRequest};
use trendr_core::geo::august_first_ms;

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "trendr")]
#[command(author, version, about = "Landsat temporal segmentation pipeline", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Engine root URL
    #[arg(long, global = true, default_value = "http://localhost:8080/api/v1")]
    engine: String,

    /// Bearer token for the engine
    #[arg(long, global = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full disturbance pipeline and write the dense vertex stack
    VertexStack {
        /// Region ring as 'lon,lat;lon,lat;...' (at least 3 points)
        #[arg(short, long)]
        region: String,
        /// First year of the series
        #[arg(long, default_value = "1985")]
        start_year: i32,
        /// Last year of the series
        #[arg(long, default_value = "2017")]
        end_year: i32,
        /// Output grid as 'rows,cols'
        #[arg(short, long, default_value = "256,256")]
        grid: String,
        /// Segmentation index: nbr, ndvi, ndsi, ndmi, evi, tcb, tcg, tcw, tca, b1..b7
        #[arg(short, long, default_value = "nbr")]
        index: String,
        /// Acquisition ids to exclude, comma separated
        #[arg(long)]
        exclude: Option<String>,
        /// Maximum number of fitted segments
        #[arg(long, default_value = "6")]
        max_segments: u32,
        /// Output JSON file
        output: PathBuf,
        /// Also submit a remote export of the stack under this description
        #[arg(long)]
        export: Option<String>,
        /// Pixel scale in meters for the remote export
        #[arg(long, default_value = "30")]
        scale: f64,
    },
    /// Minimal single-sensor connectivity check against a live engine
    Toy {
        /// Region ring as 'lon,lat;lon,lat;...'
        #[arg(short, long)]
        region: String,
        /// First year of the series
        #[arg(long, default_value = "1985")]
        start_year: i32,
        /// Last year of the series
        #[arg(long, default_value = "2010")]
        end_year: i32,
        /// Output grid as 'rows,cols'
        #[arg(short, long, default_value = "16,16")]
        grid: String,
    },
    /// Per-year count of clear observations per pixel
    ClearPixels {
        /// Region ring as 'lon,lat;lon,lat;...'
        #[arg(short, long)]
        region: String,
        #[arg(long, default_value = "1985")]
        start_year: i32,
        #[arg(long, default_value = "2017")]
        end_year: i32,
        #[arg(short, long, default_value = "256,256")]
        grid: String,
        /// Output JSON file
        output: PathBuf,
    },
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
}

fn year_progress(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} years {msg}")
            .unwrap(),
    );
    pb
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn parse_region(s: &str) -> Result<RegionOfInterest> {
    let ring = s
        .split(';')
        .map(|pair| {
            let parts: Vec<&str> = pair.trim().split(',').collect();
            if parts.len() != 2 {
                anyhow::bail!("Region point must be 'lon,lat', got: {}", pair);
            }
            let lon: f64 = parts[0].trim().parse().context("Invalid longitude")?;
            let lat: f64 = parts[1].trim().parse().context("Invalid latitude")?;
            Ok((lon, lat))
        })
        .collect::<Result<Vec<_>>>()?;
    RegionOfInterest::new(ring).map_err(|e| anyhow::anyhow!("Invalid region: {}", e))
}

fn parse_grid(s: &str) -> Result<(usize, usize)> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != 2 {
        anyhow::bail!("Grid must be 'rows,cols', got: {}", s);
    }
    let rows: usize = parts[0].trim().parse().context("Invalid rows")?;
    let cols: usize = parts[1].trim().parse().context("Invalid cols")?;
    if rows == 0 || cols == 0 {
        anyhow::bail!("Grid dimensions must be positive");
    }
    Ok((rows, cols))
}

fn parse_index(s: &str) -> Result<SpectralIndex> {
    match s.to_lowercase().as_str() {
        "nbr" => Ok(SpectralIndex::Nbr),
        "ndvi" => Ok(SpectralIndex::Ndvi),
        "ndsi" => Ok(SpectralIndex::Ndsi),
        "ndmi" => Ok(SpectralIndex::Ndmi),
        "evi" => Ok(SpectralIndex::Evi),
        "tcb" => Ok(SpectralIndex::Tcb),
        "tcg" => Ok(SpectralIndex::Tcg),
        "tcw" => Ok(SpectralIndex::Tcw),
        "tca" => Ok(SpectralIndex::Tca),
        "b1" => Ok(SpectralIndex::B1),
        "b2" => Ok(SpectralIndex::B2),
        "b3" => Ok(SpectralIndex::B3),
        "b4" => Ok(SpectralIndex::B4),
        "b5" => Ok(SpectralIndex::B5),
        "b7" => Ok(SpectralIndex::B7),
        _ => anyhow::bail!(
            "Unknown index: {}. Use nbr, ndvi, ndsi, ndmi, evi, tcb, tcg, tcw, tca, or b1..b7.",
            s
        ),
    }
}

fn connect(engine: &str, token: Option<String>) -> Result<EngineClientBlocking> {
    let options = EngineClientOptions {
        auth_token: token,
        ..Default::default()
    };
    EngineClientBlocking::new(engine, options).context("Failed to create engine client")
}

#[derive(Serialize)]
struct BandDump {
    name: String,
    rows: usize,
    cols: usize,
    values: Vec<f64>,
}

fn dump_image(image: &Image, path: &PathBuf) -> Result<()> {
    let pb = spinner("Writing output...");
    let (rows, cols) = image.shape();
    let bands: Vec<BandDump> = image
        .iter_bands()
        .map(|(name, raster)| BandDump {
            name: name.to_string(),
            rows,
            cols,
            values: raster.data().iter().copied().collect(),
        })
        .collect();
    let file = std::fs::File::create(path).context("Failed to create output file")?;
    serde_json::to_writer(file, &bands).context("Failed to write output")?;
    pb.finish_and_clear();
    Ok(())
}

fn build_series(
    source: &dyn SceneSource,
    years: YearRange,
    config: &PipelineConfig,
    region: &RegionOfInterest,
) -> Result<Vec<Image>> {
    let pb = year_progress(years.len() as u64);
    let mut series = Vec::with_capacity(years.len());
    for year in years.iter() {
        pb.set_message(format!("({year})"));
        let composite = build_composite(source, year, config, region)
            .with_context(|| format!("Failed to composite year {year}"))?;
        if composite.is_fully_masked() {
            info!("{}: no usable acquisitions, fully masked composite", year);
        }
        series.push(composite);
        pb.inc(1);
    }
    pb.finish_and_clear();
    Ok(series)
}

fn done(name: &str, path: &PathBuf, elapsed: std::time::Duration) {
    println!("{} saved to: {}", name, path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        // ── Vertex stack ─────────────────────────────────────────────
        Commands::VertexStack {
            region,
            start_year,
            end_year,
            grid,
            index,
            exclude,
            max_segments,
            output,
            export,
            scale,
        } => {
            let start = Instant::now();
            let region = parse_region(&region)?;
            let grid = parse_grid(&grid)?;
            let index = parse_index(&index)?;
            let years = YearRange::new(start_year, end_year)
                .map_err(|e| anyhow::anyhow!("Invalid year range: {}", e))?;

            let mut config = PipelineConfig::medoid_nbr(grid);
            config.index = index;
            if let Some(ids) = exclude {
                config.exclude_ids = ids.split(',').map(|s| s.trim().to_string()).collect();
            }

            let client = connect(&cli.engine, cli.token)?;
            info!(
                "Building {} annual composites ({}-{})",
                years.len(),
                years.start(),
                years.end()
            );
            let composites = build_series(&client, years, &config, &region)?;
            let index_series = build_index_series(&composites, index)
                .map_err(|e| anyhow::anyhow!("Index derivation failed: {}", e))?;

            let params = LandTrendrParams {
                max_segments,
                ..Default::default()
            };
            let pb = spinner("Running remote segmentation...");
            let result = client
                .segment_series(&index_series, index.band_name(), params.clone())
                .context("Segmentation failed")?;
            pb.finish_and_clear();

            let stack = vertex_stack(&result, params.max_segments)
                .map_err(|e| anyhow::anyhow!("Vertex stack extraction failed: {}", e))?;
            info!("Vertex stack: {} bands", stack.n_bands());

            dump_image(&stack, &output)?;

            if let Some(description) = export {
                let request = ExportRequest::new(&description, &description, &region, scale);
                let job = client
                    .start_export(&request)
                    .context("Export submission failed")?;
                println!("Export submitted: {} ({:?})", job.id, job.state);
            }

            done("Vertex stack", &output, start.elapsed());
        }

        // ── Toy run ──────────────────────────────────────────────────
        Commands::Toy {
            region,
            start_year,
            end_year,
            grid,
        } => {
            let region = parse_region(&region)?;
            let grid = parse_grid(&grid)?;
            let years = YearRange::new(start_year, end_year)
                .map_err(|e| anyhow::anyhow!("Invalid year range: {}", e))?;
            let config = PipelineConfig::toy(grid);

            let client = connect(&cli.engine, cli.token)?;
            let composites = build_series(&client, years, &config, &region)?;
            let index_series = build_index_series(&composites, config.index)
                .map_err(|e| anyhow::anyhow!("Index derivation failed: {}", e))?;

            let result = client
                .segment_series(
                    &index_series,
                    config.index.band_name(),
                    LandTrendrParams::default(),
                )
                .context("Segmentation failed")?;

            // Print the fitted trajectory of the grid centre pixel
            let pixel = result
                .pixel(grid.0 / 2, grid.1 / 2)
                .map_err(|e| anyhow::anyhow!("{}", e))?;
            println!("Centre pixel trajectory (year, source, fitted, vertex):");
            for step in 0..result.steps() {
                println!(
                    "  {:>6} {:>10.1} {:>10.1} {:>3}",
                    pixel[[0, step]], pixel[[1, step]], pixel[[2, step]], pixel[[3, step]]
                );
            }
        }

        // ── Clear-pixel counts ───────────────────────────────────────
        Commands::ClearPixels {
            region,
            start_year,
            end_year,
            grid,
            output,
        } => {
            let start = Instant::now();
            let region = parse_region(&region)?;
            let grid = parse_grid(&grid)?;
            let years = YearRange::new(start_year, end_year)
                .map_err(|e| anyhow::anyhow!("Invalid year range: {}", e))?;
            let config = PipelineConfig::medoid_nbr(grid);

            let client = connect(&cli.engine, cli.token)?;
            let counts = clear_pixel_count_series(&client, years, &config, &region)
                .map_err(|e| anyhow::anyhow!("Clear-pixel count failed: {}", e))?;

            let bands: Vec<_> = counts
                .into_iter()
                .zip(years.iter())
                .map(|(raster, year)| (format!("yr_{year}"), raster))
                .collect();
            let image = Image::new(bands, august_first_ms(years.start()))
                .map_err(|e| anyhow::anyhow!("{}", e))?;
            dump_image(&image, &output)?;

            done("Clear-pixel counts", &output, start.elapsed());
        }
    }

    Ok(())
}
