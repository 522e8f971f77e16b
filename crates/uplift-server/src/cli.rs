//! Command line interface of the inference host

use clap::Parser;

#[derive(Parser, Debug, Default)]
#[command(name = "uplift-server")]
#[command(version, about = "V2 inference host for the uplift predictor", long_about = None)]
pub struct Cli {
    /// Server configuration file path
    #[arg(short, long, default_value = "server.yaml")]
    pub config: String,

    /// Model settings file (overrides the configuration file)
    #[arg(short, long, env = "UPLIFT_MODEL_CONFIG")]
    pub settings: Option<String>,

    /// Listen address
    #[arg(short = 'l', long)]
    pub listen: Option<String>,

    /// Listen port
    #[arg(short = 'P', long)]
    pub port: Option<u16>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}
