//! Report pipeline service - core business logic

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;
use patcher_domain::constants::{IOS_PLATFORM_LABEL, REPORTS_DIR_NAME};
use patcher_domain::{PatchSummary, PatcherError, Result, SortKey};
use tracing::{debug, error, info, instrument};

use super::ports::{PatchDataSource, ReportExporter};
use super::transform::{omit_recent, sort_reports};
use crate::compliance::reconcile;

/// Options of a single report run
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReportRequest {
    /// Directory that receives the `Patch-Reports` folder
    pub path: PathBuf,
    /// Column to sort by, as typed by the user (`"Hosts Patched"`)
    pub sort: Option<String>,
    /// Drop titles patched within the last 48 hours
    pub omit: bool,
    /// Append iOS adoption rows
    pub ios: bool,
}

/// Report pipeline service
pub struct ReportService {
    source: Arc<dyn PatchDataSource>,
    exporter: Arc<dyn ReportExporter>,
}

impl ReportService {
    /// Create a new report service
    pub fn new(source: Arc<dyn PatchDataSource>, exporter: Arc<dyn ReportExporter>) -> Self {
        Self { source, exporter }
    }

    /// Fetch, shape and export one report; returns the exported file.
    ///
    /// Fails fast: the first failing step aborts the run and nothing is
    /// exported.
    #[instrument(skip(self, request), fields(path = %request.path.display()))]
    pub async fn process_reports(&self, request: &ReportRequest) -> Result<PathBuf> {
        debug!("Beginning report run");
        let reports_dir = prepare_output_dir(&request.path)?;

        let policy_ids = self.source.get_policies().await?;
        if policy_ids.is_empty() {
            error!("Policy listing returned no ids");
            return Err(PatcherError::PolicyFetch { url: self.source.server_url() });
        }
        debug!(count = policy_ids.len(), "Retrieved policy ids");

        let mut reports = self.source.get_summaries(&policy_ids).await?;
        if reports.is_empty() {
            error!("No patch summaries returned");
            return Err(PatcherError::SummaryFetch { url: self.source.server_url() });
        }
        debug!(count = reports.len(), "Retrieved patch summaries");

        if let Some(column) = request.sort.as_deref() {
            let key = SortKey::parse_column(column)?;
            sort_reports(&mut reports, key);
            debug!(column = %key, "Patch reports sorted");
        }

        if request.omit {
            let before = reports.len();
            reports = omit_recent(reports, Local::now().naive_local());
            debug!(omitted = before - reports.len(), "Omitted recently released patches");
        }

        if request.ios {
            let rows = self.ios_rows().await?;
            debug!(count = rows.len(), "Appending iOS adoption rows");
            reports.extend(rows);
        }

        let file = self.exporter.export(&reports, &reports_dir).map_err(|e| match e {
            PatcherError::Export { .. } => e,
            other => {
                error!(error = %other, "Report export failed");
                PatcherError::Export { file_path: Some(reports_dir.display().to_string()) }
            }
        })?;

        info!(file = %file.display(), records = reports.len(), "Report exported");
        Ok(file)
    }

    async fn ios_rows(&self) -> Result<Vec<PatchSummary>> {
        let device_ids = self.source.get_device_ids().await?;
        if device_ids.is_empty() {
            return Err(PatcherError::device_id_fetch("no mobile device ids were returned"));
        }
        debug!(count = device_ids.len(), "Retrieved mobile device ids");

        let devices = self.source.get_device_os_versions(&device_ids).await?;
        if devices.is_empty() {
            return Err(PatcherError::device_os_fetch(
                "received empty response obtaining device OS versions",
            ));
        }

        let catalog = self.source.get_release_feed().await?;
        if catalog.is_empty() {
            return Err(PatcherError::SofaFeed {
                reason: Some("release feed contained no versions".to_string()),
                url: None,
            });
        }

        Ok(reconcile(&devices, &catalog, IOS_PLATFORM_LABEL).into_iter().map(Into::into).collect())
    }
}

fn prepare_output_dir(path: &Path) -> Result<PathBuf> {
    if path.is_file() {
        error!(path = %path.display(), "Output path is a file");
        return Err(PatcherError::DirectoryCreation { path: Some(path.display().to_string()) });
    }

    let reports_dir = path.join(REPORTS_DIR_NAME);
    fs::create_dir_all(&reports_dir).map_err(|e| {
        error!(error = %e, path = %reports_dir.display(), "Failed to create reports directory");
        PatcherError::DirectoryCreation { path: Some(reports_dir.display().to_string()) }
    })?;

    info!(path = %reports_dir.display(), "Reports directory ready");
    Ok(reports_dir)
}
