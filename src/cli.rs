use clap::{Parser, Subcommand};
use funnskjema_common::{CoordSystem, Lang};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "funnskjema")]
#[command(about = "Fills the Norwegian metal-detector find report form", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build funnskjema-utfylt.pdf from a find file
    Export {
        /// Find file (JSON)
        #[arg(required = true)]
        input: PathBuf,

        /// Photo file, repeatable. Added after the photos listed in the find file
        #[arg(short, long = "photo")]
        photos: Vec<PathBuf>,

        /// Folder whose JPEG/PNG files are added as photos, sorted by name
        #[arg(long)]
        photo_dir: Option<PathBuf>,

        /// Output directory (default: config output_dir)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Summary page language (en/no/es)
        #[arg(short, long)]
        lang: Option<Lang>,

        /// Preferred coordinate system (utm32/wgs84)
        #[arg(short, long)]
        coords: Option<CoordSystem>,

        /// Latitude of the find, overrides the find file
        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,

        /// Longitude of the find, overrides the find file
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,

        /// Skip the Kartverket lookups
        #[arg(long)]
        offline: bool,

        /// PDF image quality (high/medium/low)
        #[arg(long)]
        pdf_quality: Option<PdfQuality>,

        /// Find date YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<chrono::NaiveDate>,
    },

    /// Write an empty find file, prefilled with the remembered finder
    Init {
        /// Output file
        #[arg(short, long, default_value = "funn.json")]
        output: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Look up address and municipality for a position
    Lookup {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
    },

    /// Convert a WGS84 position to UTM32
    Convert {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
    },

    /// Show or edit settings
    Config {
        /// Show settings
        #[arg(long)]
        show: bool,

        /// Template path or http(s) URL
        #[arg(long)]
        set_template: Option<String>,

        /// Remembered language (en/no/es)
        #[arg(long)]
        set_lang: Option<Lang>,

        /// Remembered coordinate system (utm32/wgs84)
        #[arg(long)]
        set_coords: Option<CoordSystem>,
    },
}

/// PDF image quality
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PdfQuality {
    /// 1400px, 85%
    High,
    /// 800px, 75% (default)
    #[default]
    Medium,
    /// 500px, 60%
    Low,
}

impl PdfQuality {
    /// Max pixel width
    pub fn max_width(&self) -> u32 {
        match self {
            PdfQuality::High => 1400,
            PdfQuality::Medium => 800,
            PdfQuality::Low => 500,
        }
    }

    /// JPEG quality (0-100)
    pub fn jpeg_quality(&self) -> u8 {
        match self {
            PdfQuality::High => 85,
            PdfQuality::Medium => 75,
            PdfQuality::Low => 60,
        }
    }
}

impl std::str::FromStr for PdfQuality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "high" | "h" => Ok(PdfQuality::High),
            "medium" | "med" | "m" => Ok(PdfQuality::Medium),
            "low" | "l" => Ok(PdfQuality::Low),
            _ => Err(format!("Unknown quality: {}. Use high, medium, or low", s)),
        }
    }
}

impl std::fmt::Display for PdfQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PdfQuality::High => write!(f, "high"),
            PdfQuality::Medium => write!(f, "medium"),
            PdfQuality::Low => write!(f, "low"),
        }
    }
}
