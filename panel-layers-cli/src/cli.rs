use std::path::PathBuf;

use clap::{Subcommand, ValueEnum};

#[derive(clap::Parser)]
#[command(about = "Edit the layers of a saved manga panel project")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a project from a panel image
    New {
        #[arg(short, long)]
        image: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long, default_value = "")]
        title: String,
        #[arg(long, default_value = "")]
        manga_title: String,
        #[arg(long, default_value = "")]
        character: String,
        /// Style id, e.g. anime-style or cel-shading
        #[arg(long)]
        style: Option<String>,
        /// Add the default Hair and Eyes layers
        #[arg(long)]
        seed: bool,
    },
    /// Print the project manifest and its layers
    Info { project: PathBuf },
    /// Print the layer stack as json
    ExportLayers { project: PathBuf },
    #[command(allow_negative_numbers = true)]
    Add {
        project: PathBuf,
        #[arg(short, long)]
        kind: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(short)]
        x: f64,
        #[arg(short)]
        y: f64,
        #[arg(long)]
        width: f64,
        #[arg(long)]
        height: f64,
        #[arg(short, long)]
        color: Option<String>,
        #[arg(long)]
        opacity: Option<f64>,
    },
    Remove { project: PathBuf, id: String },
    Move {
        project: PathBuf,
        id: String,
        direction: MoveDirection,
    },
    Show { project: PathBuf, id: String },
    Hide { project: PathBuf, id: String },
    Opacity {
        project: PathBuf,
        id: String,
        value: f64,
    },
    Rename {
        project: PathBuf,
        id: String,
        name: String,
    },
    /// Set position and size after a transform
    #[command(allow_negative_numbers = true)]
    Geometry {
        project: PathBuf,
        id: String,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
}

#[derive(Clone, Copy, ValueEnum)]
pub enum MoveDirection {
    Up,
    Down,
}

impl From<MoveDirection> for panel_layers::Direction {
    fn from(value: MoveDirection) -> Self {
        match value {
            MoveDirection::Up => panel_layers::Direction::Up,
            MoveDirection::Down => panel_layers::Direction::Down,
        }
    }
}
