//! Bulk CSV import of resources into a section.
//!
//! Rows are independent: each is decoded, validated and persisted on its
//! own, and a failing row is recorded in the report instead of aborting
//! the import.

use std::sync::Arc;

use csv::{ReaderBuilder, StringRecord, Trim};
use resman_core::error::{ResmanError, ResmanResult};
use resman_core::models::resource::{CreateResource, ResourceStatus};
use resman_core::repository::{ResourceRepository, SectionRepository, Store};
use resman_core::validation::ValidationErrors;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::hierarchy::validate_resource;

/// Default payload cap.
pub const DEFAULT_MAX_BYTES: usize = 1024 * 1024;

/// One rejected data row.
///
/// `row` counts data records from 1, excluding the header. Blank lines
/// are not records, so `line` gives the 1-based line of the upload where
/// the record starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowFailure {
    pub row: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u64>,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    pub imported: usize,
    pub failed: Vec<RowFailure>,
}

/// Column positions resolved from the header row.
#[derive(Debug)]
struct Columns {
    title: usize,
    status: Option<usize>,
    link: Option<usize>,
    notes: Option<usize>,
}

impl Columns {
    fn resolve(headers: &StringRecord) -> Result<Self, ValidationErrors> {
        let position = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        let title = position("title")
            .ok_or_else(|| ValidationErrors::single("title", "header column is required"))?;
        Ok(Self {
            title,
            status: position("status"),
            link: position("link"),
            notes: position("notes"),
        })
    }

    fn field<'r>(record: &'r StringRecord, idx: Option<usize>) -> Option<&'r str> {
        idx.and_then(|i| record.get(i)).filter(|v| !v.is_empty())
    }

    fn decode(&self, section_id: i64, record: &StringRecord) -> Result<CreateResource, String> {
        let status = match Self::field(record, self.status) {
            Some(raw) => raw.parse::<ResourceStatus>()?,
            None => ResourceStatus::default(),
        };
        Ok(CreateResource {
            section_id,
            title: record.get(self.title).unwrap_or_default().to_string(),
            status,
            link: Self::field(record, self.link).map(str::to_string),
            notes: Self::field(record, self.notes).map(str::to_string),
        })
    }
}

pub struct BulkImporter<S: Store> {
    store: Arc<S>,
    max_bytes: usize,
}

impl<S: Store> BulkImporter<S> {
    pub fn new(store: Arc<S>, max_bytes: usize) -> Self {
        Self { store, max_bytes }
    }

    /// Import every data row of `payload` as a resource of `section_id`.
    ///
    /// Fails as a whole only when the payload is too large, the section
    /// does not exist, or the header row lacks a `title` column.
    #[instrument(skip(self, payload), fields(bytes = payload.len()))]
    pub async fn import(&self, section_id: i64, payload: &[u8]) -> ResmanResult<ImportReport> {
        if payload.len() > self.max_bytes {
            return Err(ValidationErrors::single(
                "body",
                format!("must be at most {} bytes", self.max_bytes),
            )
            .into());
        }

        self.store.sections().get_by_id(section_id).await?;

        let mut reader = ReaderBuilder::new()
            .flexible(true)
            .trim(Trim::All)
            .from_reader(payload);
        let headers = reader
            .headers()
            .map_err(|e| ValidationErrors::single("body", format!("unreadable header: {e}")))?
            .clone();
        let columns = Columns::resolve(&headers)?;

        let mut report = ImportReport::default();
        for (idx, record) in reader.records().enumerate() {
            let row = idx + 1;
            let line = match &record {
                Ok(record) => record.position(),
                Err(e) => e.position(),
            }
            .map(|position| position.line());
            match self.import_row(section_id, &columns, record).await {
                Ok(()) => report.imported += 1,
                Err(reason) => {
                    warn!(row, ?line, %reason, "import row rejected");
                    report.failed.push(RowFailure { row, line, reason });
                }
            }
        }

        info!(
            section_id,
            imported = report.imported,
            failed = report.failed.len(),
            "csv import finished"
        );
        Ok(report)
    }

    async fn import_row(
        &self,
        section_id: i64,
        columns: &Columns,
        record: Result<StringRecord, csv::Error>,
    ) -> Result<(), String> {
        let record = record.map_err(|e| format!("malformed record: {e}"))?;
        let input = columns.decode(section_id, &record)?;
        validate_resource(&input).map_err(|e| e.to_string())?;

        match self.store.resources().create(input).await {
            Ok(_) => Ok(()),
            Err(e) if e.is_client_safe() => Err(e.to_string()),
            Err(ResmanError::Store(detail) | ResmanError::Internal(detail)) => {
                warn!(%detail, "store failure during import");
                Err("store error".to_string())
            }
            Err(e) => Err(e.to_string()),
        }
    }
}
