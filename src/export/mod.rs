//! Export pipeline
//!
//! CollectingInputs → ResolvingLocation (address, municipality and photos
//! concurrently) → LoadingTemplate → PopulatingForm → ComposingPages →
//! Finalizing → Downloading → Done. Only a missing or unreadable template,
//! a corrupt page tree or an unwritable output ends in Failed.

pub mod acroform;
pub mod email;
pub mod form;
pub mod images;
pub mod summary;

use crate::cli::PdfQuality;
use crate::error::{FunnError, Result};
use crate::geo::LocationLookup;
use crate::store::LocalStore;
use acroform::AcroForm;
use chrono::NaiveDate;
use email::EmailPayload;
use form::PopulateReport;
use funnskjema_common::{plan_summary, CoordSystem, FindRecord, LocationContext, PhotoSize};
use images::DecodedPhoto;
use lopdf::Document;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::OnceCell;

pub const OUTPUT_FILE_NAME: &str = "funnskjema-utfylt.pdf";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportStage {
    Idle,
    CollectingInputs,
    ResolvingLocation,
    LoadingTemplate,
    PopulatingForm,
    ComposingPages,
    Finalizing,
    Downloading,
    Done,
    Failed,
}

impl std::fmt::Display for ExportStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ExportStage::Idle => "idle",
            ExportStage::CollectingInputs => "collecting inputs",
            ExportStage::ResolvingLocation => "resolving location",
            ExportStage::LoadingTemplate => "loading template",
            ExportStage::PopulatingForm => "populating form",
            ExportStage::ComposingPages => "composing pages",
            ExportStage::Finalizing => "finalizing",
            ExportStage::Downloading => "writing output",
            ExportStage::Done => "done",
            ExportStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Stage trail of one export, every transition logged
#[derive(Debug)]
struct StageLog {
    stages: Vec<ExportStage>,
}

impl StageLog {
    fn new() -> Self {
        Self {
            stages: vec![ExportStage::Idle],
        }
    }

    fn current(&self) -> ExportStage {
        self.stages.last().copied().unwrap_or(ExportStage::Idle)
    }

    fn enter(&mut self, stage: ExportStage) {
        log::info!("export: {} -> {}", self.current(), stage);
        self.stages.push(stage);
    }
}

/// Where the form template comes from
#[derive(Debug, Clone)]
pub enum TemplateSource {
    Path(PathBuf),
    Url(String),
    Memory(Arc<Vec<u8>>),
}

impl TemplateSource {
    /// `http(s)://` is a URL, anything else a file path
    pub fn parse(value: &str) -> Self {
        let lower = value.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            TemplateSource::Url(value.to_string())
        } else {
            TemplateSource::Path(PathBuf::from(value))
        }
    }

    /// Reads the template bytes. Any failure is a `TemplateLoad`.
    pub async fn fetch(&self) -> Result<Vec<u8>> {
        match self {
            TemplateSource::Path(path) => tokio::fs::read(path)
                .await
                .map_err(|e| FunnError::TemplateLoad(format!("{}: {}", path.display(), e))),
            TemplateSource::Url(url) => {
                let response = reqwest::get(url)
                    .await
                    .map_err(|e| FunnError::TemplateLoad(format!("{}: {}", url, e)))?;
                let status = response.status();
                if !status.is_success() {
                    return Err(FunnError::TemplateLoad(format!("{}: HTTP {}", url, status)));
                }
                let bytes = response
                    .bytes()
                    .await
                    .map_err(|e| FunnError::TemplateLoad(format!("{}: {}", url, e)))?;
                Ok(bytes.to_vec())
            }
            TemplateSource::Memory(bytes) => Ok(bytes.as_ref().clone()),
        }
    }
}

impl std::fmt::Display for TemplateSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TemplateSource::Path(path) => write!(f, "{}", path.display()),
            TemplateSource::Url(url) => f.write_str(url),
            TemplateSource::Memory(bytes) => write!(f, "<{} bytes in memory>", bytes.len()),
        }
    }
}

/// Everything one export needs, taken by value so later edits cannot leak in
#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub record: FindRecord,
    /// Photos in caption order
    pub photo_paths: Vec<PathBuf>,
    pub preferred_system: CoordSystem,
    pub output_dir: PathBuf,
    /// Find date written to the form
    pub today: NaiveDate,
    pub quality: PdfQuality,
}

impl ExportRequest {
    /// Request with the record's own photos, UTM32, medium quality and today's date
    pub fn new(record: FindRecord, output_dir: impl Into<PathBuf>) -> Self {
        let photo_paths = record.photos.iter().map(PathBuf::from).collect();
        Self {
            record,
            photo_paths,
            preferred_system: CoordSystem::default(),
            output_dir: output_dir.into(),
            today: chrono::Local::now().date_naive(),
            quality: PdfQuality::default(),
        }
    }
}

#[derive(Debug)]
pub struct ExportOutcome {
    pub pdf_path: PathBuf,
    pub pdf: Vec<u8>,
    pub email_payload_path: Option<PathBuf>,
    pub report: PopulateReport,
    pub page_count: usize,
    /// `None` when neither a position nor a readable location text was given
    pub location: Option<LocationContext>,
    pub stages: Vec<ExportStage>,
    /// Numbers of photos that could not be read or decoded
    pub skipped_photos: Vec<usize>,
}

/// Clears the in-flight flag when the export ends, however it ends
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct Exporter<L> {
    lookup: L,
    template: TemplateSource,
    /// Template bytes, loaded on first export and kept for the exporter's lifetime
    template_bytes: OnceCell<Vec<u8>>,
    store_path: Option<PathBuf>,
    in_flight: AtomicBool,
}

impl<L: LocationLookup> Exporter<L> {
    pub fn new(lookup: L, template: TemplateSource) -> Self {
        Self {
            lookup,
            template,
            template_bytes: OnceCell::new(),
            store_path: None,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Remember the finder in this local store at every export start
    pub fn with_store(mut self, path: impl Into<PathBuf>) -> Self {
        self.store_path = Some(path.into());
        self
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    async fn template(&self) -> Result<&[u8]> {
        let bytes = self
            .template_bytes
            .get_or_try_init(|| async {
                log::debug!("loading template from {}", self.template);
                self.template.fetch().await
            })
            .await?;
        Ok(bytes.as_slice())
    }

    /// Runs one export. A second call while one is running is rejected.
    pub async fn export(&self, request: ExportRequest) -> Result<ExportOutcome> {
        let _guard = InFlightGuard::acquire(&self.in_flight).ok_or(FunnError::ExportInProgress)?;

        let mut stages = StageLog::new();
        match self.run(request, &mut stages).await {
            Ok(mut outcome) => {
                stages.enter(ExportStage::Done);
                outcome.stages = stages.stages;
                Ok(outcome)
            }
            Err(e) => {
                log::error!("export failed while {}: {}", stages.current(), e);
                stages.enter(ExportStage::Failed);
                Err(e)
            }
        }
    }

    async fn remember_finder(&self, record: &FindRecord) {
        let Some(path) = &self.store_path else {
            return;
        };
        let mut store = LocalStore::load_async(path).await;
        let saved = match store.remember_finder(&record.finder) {
            Ok(()) => store.save_async(path).await,
            Err(e) => Err(e),
        };
        if let Err(e) = saved {
            log::warn!("could not remember finder in {}: {}", path.display(), e);
        }
    }

    async fn run(&self, request: ExportRequest, stages: &mut StageLog) -> Result<ExportOutcome> {
        stages.enter(ExportStage::CollectingInputs);
        let ExportRequest {
            record,
            photo_paths,
            preferred_system,
            output_dir,
            today,
            quality,
        } = request;
        self.remember_finder(&record).await;

        let position = match record.resolve_position() {
            Ok(position) => Some(position),
            Err(e) => {
                log::warn!("no usable position, GPS and registry fields stay blank: {}", e);
                None
            }
        };

        stages.enter(ExportStage::ResolvingLocation);
        let (address, municipality, photos) = tokio::join!(
            async {
                match position {
                    Some(p) => self.lookup.resolve_address(p.lat, p.lon).await,
                    None => None,
                }
            },
            async {
                match position {
                    Some(p) => self.lookup.resolve_municipality(p.lat, p.lon).await,
                    None => None,
                }
            },
            images::load_photos(&photo_paths, quality),
        );
        let location = position.map(|p| {
            LocationContext::new(p, preferred_system).with_lookups(address, municipality)
        });
        if location.as_ref().is_some_and(|l| l.fell_back_to_wgs84) {
            log::info!("position outside UTM zone 32, using WGS84");
        }

        let skipped_photos: Vec<usize> = photos
            .iter()
            .enumerate()
            .filter(|(_, photo)| photo.is_none())
            .map(|(index, _)| index + 1)
            .collect();
        let photos: Vec<DecodedPhoto> = photos.into_iter().flatten().collect();

        stages.enter(ExportStage::LoadingTemplate);
        let template = self.template().await?;
        let mut doc = Document::load_mem(template)
            .map_err(|e| FunnError::TemplateParse(e.to_string()))?;

        stages.enter(ExportStage::PopulatingForm);
        let (report, has_form) = match AcroForm::new(&mut doc) {
            Ok(mut form) => (form::populate(&mut form, &record, location.as_ref(), today), true),
            Err(e) => {
                log::warn!("template has no usable form, every field skipped: {}", e);
                (PopulateReport::without_form(), false)
            }
        };
        log::info!(
            "form populated: {} written, {} skipped",
            report.written_count(),
            report.skipped_count()
        );

        stages.enter(ExportStage::ComposingPages);
        let content = summary::build_summary_content(&record, location.as_ref());
        let sizes: Vec<PhotoSize> = photos.iter().map(DecodedPhoto::layout_size).collect();
        let plan = plan_summary(&content, &sizes, record.lang.labels());
        summary::append_pages(&mut doc, &plan, &photos).map_err(FunnError::PdfGeneration)?;

        stages.enter(ExportStage::Finalizing);
        if has_form {
            AcroForm::new(&mut doc)
                .and_then(|mut form| form.finalize_appearances())
                .map_err(FunnError::PdfGeneration)?;
        }

        stages.enter(ExportStage::Downloading);
        let page_count = doc.get_pages().len();
        let mut pdf = Vec::new();
        doc.save_to(&mut pdf)
            .map_err(|e| FunnError::PdfGeneration(format!("serialization failed: {}", e)))?;
        let pdf_path = write_output(&output_dir, &pdf).await?;

        let email_payload_path = match EmailPayload::build(
            &record,
            &summary::location_display(&record, location.as_ref()),
            &pdf,
        ) {
            Some(payload) => match payload.write_to(&output_dir).await {
                Ok(path) => {
                    log::info!(
                        "email hand-off payload written to {} (finder: {}, owner: {})",
                        path.display(),
                        payload.wants.finder,
                        payload.wants.owner
                    );
                    Some(path)
                }
                Err(e) => {
                    log::warn!("email hand-off payload not written: {}", e);
                    None
                }
            },
            None => None,
        };

        Ok(ExportOutcome {
            pdf_path,
            pdf,
            email_payload_path,
            report,
            page_count,
            location,
            stages: Vec::new(),
            skipped_photos,
        })
    }
}

async fn write_output(output_dir: &Path, pdf: &[u8]) -> Result<PathBuf> {
    tokio::fs::create_dir_all(output_dir).await?;
    let path = output_dir.join(OUTPUT_FILE_NAME);
    tokio::fs::write(&path, pdf).await?;
    Ok(path)
}
