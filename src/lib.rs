//! Metal-detector find report export: fills the official form template,
//! appends a summary page with photos and writes `funnskjema-utfylt.pdf`.

pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod geo;
pub mod scanner;
pub mod store;
