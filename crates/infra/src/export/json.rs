//! JSON report writer
//!
//! Writes `patch-report-<mm-dd-yy>.json` holding the configured header and
//! footer text, the generation date and one object per report row.

use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use patcher_core::ReportExporter;
use patcher_domain::{PatchSummary, PatcherError, ReportSettings, Result};
use serde::Serialize;
use tracing::{debug, info};

const FILE_PREFIX: &str = "patch-report";
const FILE_DATE_FORMAT: &str = "%m-%d-%y";

#[derive(Debug, Serialize)]
struct ReportDocument<'a> {
    header: &'a str,
    footer: &'a str,
    generated: String,
    rows: &'a [PatchSummary],
}

/// Exporter writing the report as pretty-printed JSON
#[derive(Debug, Clone)]
pub struct JsonReportExporter {
    settings: ReportSettings,
}

impl JsonReportExporter {
    pub fn new(settings: ReportSettings) -> Self {
        Self { settings }
    }

    /// Write the report as if generated on `date`
    ///
    /// # Errors
    /// Returns [`PatcherError::Export`] naming the target file if it cannot be
    /// written.
    pub fn export_on(
        &self,
        reports: &[PatchSummary],
        output_dir: &Path,
        date: NaiveDate,
    ) -> Result<PathBuf> {
        let path =
            output_dir.join(format!("{FILE_PREFIX}-{}.json", date.format(FILE_DATE_FORMAT)));
        let export_error = || PatcherError::Export { file_path: Some(path.display().to_string()) };

        let mut generated = String::new();
        write!(generated, "{}", date.format(&self.settings.date_format)).map_err(|_| {
            debug!(format = %self.settings.date_format, "Invalid report date format");
            export_error()
        })?;

        let document = ReportDocument {
            header: &self.settings.header_text,
            footer: &self.settings.footer_text,
            generated,
            rows: reports,
        };

        let file = File::create(&path).map_err(|e| {
            debug!(path = %path.display(), error = %e, "Failed to create report file");
            export_error()
        })?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &document).map_err(|e| {
            debug!(path = %path.display(), error = %e, "Failed to serialize report");
            export_error()
        })?;
        writer.flush().map_err(|_| export_error())?;

        info!(path = %path.display(), rows = reports.len(), "Report exported");
        Ok(path)
    }
}

impl ReportExporter for JsonReportExporter {
    fn export(&self, reports: &[PatchSummary], output_dir: &Path) -> Result<PathBuf> {
        self.export_on(reports, output_dir, Local::now().date_naive())
    }
}
