mod app;

use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::Parser;

use paper_map::config::MapConfig;

use crate::app::{LoadRequest, PaperMapApp};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// JSON array of paper records.
    papers: PathBuf,
    /// JSON file overriding the default map parameters.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Keep only papers in this arXiv category; repeatable.
    #[arg(long = "category")]
    categories: Vec<String>,
    #[arg(long, default_value_t = 100)]
    initial_papers: usize,
    /// Admit papers in a random order instead of oldest first.
    #[arg(long)]
    shuffled: bool,
    /// Seed for admission order and placement.
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long)]
    link_strength: Option<f32>,
    #[arg(long)]
    anti_gravity_falloff: Option<f32>,
}

impl Args {
    fn map_config(&self) -> Result<MapConfig> {
        let mut config = match &self.config {
            Some(path) => MapConfig::load(path)?,
            None => MapConfig::default(),
        };
        if self.shuffled {
            config.ids_time_ordered = false;
        }
        if let Some(seed) = self.seed {
            config.admission_seed = seed;
        }
        if let Some(link_strength) = self.link_strength {
            config.link_strength = link_strength;
        }
        if let Some(falloff) = self.anti_gravity_falloff {
            config.anti_gravity_falloff_rsq = falloff * falloff;
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();
    let request = LoadRequest {
        config: args.map_config()?,
        papers_path: args.papers,
        categories: args.categories,
        initial_papers: args.initial_papers,
    };
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "paper-map",
        options,
        Box::new(move |cc| Ok(Box::new(PaperMapApp::new(cc, request)))),
    )
    .map_err(|error| anyhow!("failed to run the viewer: {error}"))
}
