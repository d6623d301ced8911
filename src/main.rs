pub mod types;
pub mod config;
pub mod data;
pub mod filter;
pub mod aggregate;
pub mod render;
pub mod server;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export the dashboard and both maps as static HTML pages
    Export {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
    /// Serve the interactive dashboard
    Serve {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Export { config } => {
            println!("Exporting site with config: {:?}", config);
            let app_config = config::AppConfig::load_from_file(config)?;

            // 1. Load Data
            let (gardens, boundaries) = data::load_data(&app_config)?;

            // 2. Run the pipeline with no filters
            let filtered = filter::filter(&gardens, filter::ALL, filter::ALL);
            let counts = aggregate::gardens_per_department(&filtered, &boundaries);
            let center = render::map_center(&filtered);

            // 3. Render the pages
            let gardens_map = render::gardens_map_fragment(&filtered, center);
            let departments_map = render::choropleth_fragment(&counts, center);
            let types = filter::distinct_types(&gardens);
            let departments = filter::distinct_departments(&gardens);
            let dashboard = render::dashboard_page(&render::DashboardView {
                types: &types,
                departments: &departments,
                selected_type: filter::ALL,
                selected_department: filter::ALL,
                gardens: &filtered,
                gardens_map: &gardens_map,
                departments_map: &departments_map,
            });

            let site_dir = &app_config.output.site_dir;
            fs::create_dir_all(site_dir)
                .with_context(|| format!("Failed to create site directory: {:?}", site_dir))?;
            fs::write(site_dir.join("index.html"), dashboard)?;
            fs::write(
                site_dir.join("gardens-map.html"),
                render::map_page("Remarkable gardens", &gardens_map),
            )?;
            fs::write(
                site_dir.join("departments-map.html"),
                render::map_page("Gardens by department", &departments_map),
            )?;

            println!("Export complete! Pages written to {:?}", site_dir);
        }
        Commands::Serve { config } => {
            println!("Serving dashboard with config: {:?}", config);
            let app_config = config::AppConfig::load_from_file(config)?;

            let (gardens, boundaries) = data::load_data(&app_config)?;

            server::start_server(app_config, gardens, boundaries).await?;
        }
    }

    Ok(())
}
