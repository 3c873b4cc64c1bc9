use clap::Parser;
use funnskjema::{cli, config, error, export, geo, scanner, store};
use cli::{Cli, Commands};
use config::Config;
use error::{FunnError, Result};
use export::{ExportRequest, Exporter};
use funnskjema_common::{
    format_location, is_in_utm32_zone, wgs84_to_utm32, CoordSystem, FindRecord, LatLon, Lang,
};
use geo::{KartverketClient, LocationLookup, OfflineLookup};
use std::path::{Path, PathBuf};
use store::LocalStore;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    // the export command reports failures in the find's language
    let mut lang = Lang::default();
    if let Err(e) = run(cli, &mut lang).await {
        log::error!("{:?}", e);
        eprintln!("\n✖ {}: {}", lang.labels().export_failed, e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli, lang_out: &mut Lang) -> Result<()> {
    let config = Config::load()?;
    let store_path = LocalStore::default_path()?;

    match cli.command {
        Commands::Export {
            input,
            photos,
            photo_dir,
            output,
            lang,
            coords,
            lat,
            lon,
            offline,
            pdf_quality,
            date,
        } => {
            println!("📄 funnskjema - export\n");
            let store = LocalStore::load(&store_path);

            // 1. Collect inputs
            println!("[1/3] Reading find file...");
            let mut record = FindRecord::load(&input)?;
            if let Some(lang) = lang.or_else(|| store.lang()) {
                record.lang = lang;
            }
            *lang_out = record.lang;
            if let (Some(lat), Some(lon)) = (lat, lon) {
                record.position = Some(LatLon { lat, lon });
            }

            // photo paths in the find file are relative to the find file
            let base_dir = input.parent().unwrap_or(Path::new("."));
            let mut photo_paths: Vec<PathBuf> = record
                .photos
                .iter()
                .map(|p| resolve_relative(base_dir, p))
                .collect();
            photo_paths.extend(photos);
            if let Some(dir) = photo_dir {
                photo_paths.extend(scanner::scan_folder(&dir)?.into_iter().map(|i| i.path));
            }
            println!("✔ {} photo(s)\n", photo_paths.len());

            let mut request = ExportRequest::new(record, output.unwrap_or(config.output_dir.clone()));
            request.photo_paths = photo_paths;
            request.preferred_system = coords.or_else(|| store.coord_system()).unwrap_or_default();
            request.quality = pdf_quality.unwrap_or(config.pdf_quality);
            if let Some(date) = date {
                request.today = date;
            }

            // 2. Export
            println!("[2/3] Building PDF... (quality: {})", request.quality);
            let template = config.template_source();
            let outcome = if offline {
                Exporter::new(OfflineLookup, template)
                    .with_store(&store_path)
                    .export(request)
                    .await?
            } else {
                let client = KartverketClient::new(&config.geo_base_url, config.lookup_timeout());
                Exporter::new(client, template)
                    .with_store(&store_path)
                    .export(request)
                    .await?
            };

            if let Some(location) = &outcome.location {
                if location.fell_back_to_wgs84 {
                    println!("! {}", lang_out.labels().wgs84_fallback);
                }
                println!(
                    "✔ Address: {}",
                    location.address.as_ref().map_or("-", |a| a.street_text.as_str())
                );
                println!(
                    "✔ Municipality: {}",
                    location.municipality.as_ref().map_or("-", |m| m.municipality_name.as_str())
                );
            }
            for (name, reason) in outcome.report.skipped() {
                println!("  skipped field {:?}: {}", name, reason);
            }
            for number in &outcome.skipped_photos {
                println!("  skipped photo {}", number);
            }

            // 3. Output
            println!("\n[3/3] Output");
            println!("✔ PDF: {} ({} pages)", outcome.pdf_path.display(), outcome.page_count);
            if let Some(path) = &outcome.email_payload_path {
                println!("✔ Email payload: {}", path.display());
            }

            println!("\n✅ Export complete");
        }

        Commands::Init { output, force } => {
            if output.exists() && !force {
                return Err(FunnError::InvalidInput(format!(
                    "{} already exists (use --force to overwrite)",
                    output.display()
                )));
            }
            let store = LocalStore::load(&store_path);
            let record = FindRecord {
                finder: store.remembered_finder().unwrap_or_default(),
                lang: store.lang().unwrap_or_default(),
                ..Default::default()
            };
            let json = serde_json::to_string_pretty(&record)?;
            std::fs::write(&output, json)?;
            println!("✔ Find file written: {}", output.display());
        }

        Commands::Lookup { lat, lon } => {
            let client = KartverketClient::new(&config.geo_base_url, config.lookup_timeout());
            let (address, municipality) = tokio::join!(
                client.resolve_address(lat, lon),
                client.resolve_municipality(lat, lon),
            );

            println!("Position: {}", format_location(lat, lon, CoordSystem::Wgs84));
            match address {
                Some(a) => {
                    println!("Address:");
                    println!("  {}, {} {}", a.street_text, a.postal_code, a.postal_place);
                    println!("  Municipality: {}", a.municipality_name);
                    println!("  Gnr/Bnr: {}/{}", a.farm_number, a.holding_number);
                    if let Some(distance) = a.distance_meters {
                        println!("  Distance: {:.0} m", distance);
                    }
                }
                None => println!("Address: not found"),
            }
            match municipality {
                Some(m) => {
                    println!("Municipality: {} ({})", m.municipality_name, m.municipality_number);
                    println!("County: {} ({})", m.county_name, m.county_number);
                }
                None => println!("Municipality: not found"),
            }
        }

        Commands::Convert { lat, lon } => {
            if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
                return Err(FunnError::InvalidInput(format!(
                    "position out of range: {}, {}",
                    lat, lon
                )));
            }
            let utm = wgs84_to_utm32(lat, lon);
            println!("WGS84:  {}", format_location(lat, lon, CoordSystem::Wgs84));
            println!("UTM32:  N {:.2}, E {:.2}", utm.northing, utm.easting);
            if is_in_utm32_zone(lon) {
                println!("✔ Inside zone 32 (3°E-12°E)");
            } else {
                println!("! Outside zone 32, the form will use WGS84");
            }
        }

        Commands::Config {
            show,
            set_template,
            set_lang,
            set_coords,
        } => {
            let mut config = config;
            let mut store = LocalStore::load(&store_path);

            if let Some(template) = set_template {
                config.set_template(template)?;
                println!("✔ Template set");
            }
            if let Some(lang) = set_lang {
                store.set_lang(lang)?;
                store.save(&store_path)?;
                println!("✔ Language set: {}", lang);
            }
            if let Some(system) = set_coords {
                store.set_coord_system(system)?;
                store.save(&store_path)?;
                println!("✔ Coordinate system set: {}", system);
            }

            if show {
                println!("Settings:");
                println!("  Template: {}", config.template_source());
                println!("  Lookup service: {}", config.geo_base_url);
                println!("  Lookup timeout: {}s", config.lookup_timeout_seconds);
                println!("  Output directory: {}", config.output_dir.display());
                println!("  PDF quality: {}", config.pdf_quality);
                println!("  Language: {}", store.lang().unwrap_or_default());
                println!("  Coordinates: {}", store.coord_system().unwrap_or_default());
                println!(
                    "  Remembered finder: {}",
                    store.remembered_finder().map_or("-".to_string(), |f| f.name)
                );
            }
        }
    }

    Ok(())
}

fn resolve_relative(base_dir: &Path, path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_relative() {
        base_dir.join(path)
    } else {
        path.to_path_buf()
    }
}
