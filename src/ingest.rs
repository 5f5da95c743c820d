use std::sync::atomic::{AtomicU64, Ordering};

use crate::domain::is_valid_address;

/// Upload size cap, checked before any parsing happens.
pub const MAX_CSV_BYTES: usize = 5 * 1024 * 1024;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum CsvError {
    #[error("the uploaded file is not a .csv file")]
    NotCsvFile,
    #[error("the uploaded file is larger than 5 MiB")]
    FileTooLarge,
    #[error("the uploaded file has no header line or no data lines")]
    EmptyFile,
    #[error("the header row has no 'email' column")]
    MissingEmailColumn,
    #[error("no valid email addresses were found in the file")]
    NoValidEmails,
    #[error("failed to process the uploaded file")]
    Processing,
}

/// An uploaded file as handed over by the HTTP layer.
#[derive(Debug)]
pub struct CsvUpload {
    pub file_name: String,
    pub data: Vec<u8>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Surviving addresses in file order, not yet deduplicated against the
    /// recipient store.
    Candidates(Vec<String>),
    /// A later upload started while this one was in flight; its result is
    /// discarded.
    Superseded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestTicket(u64);

/// Runs uploads with latest-file-wins semantics: every new upload takes a
/// ticket that invalidates all earlier in-flight ones, so a stale result
/// is dropped when it finally arrives instead of clobbering the newer one.
#[derive(Debug, Default)]
pub struct CsvIngester {
    latest: AtomicU64,
}

impl CsvIngester {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new upload attempt, superseding any in-flight one.
    pub fn begin(&self) -> IngestTicket {
        IngestTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    #[tracing::instrument(name = "Ingesting an uploaded CSV file", skip(self, upload), fields(file_name = %upload.file_name, bytes = upload.data.len()))]
    pub async fn run(
        &self,
        ticket: IngestTicket,
        upload: CsvUpload,
    ) -> Result<IngestOutcome, CsvError> {
        if !upload.file_name.to_lowercase().ends_with(".csv") {
            return Err(CsvError::NotCsvFile);
        }
        if upload.data.len() > MAX_CSV_BYTES {
            return Err(CsvError::FileTooLarge);
        }

        // A 5 MiB parse has no business on the async runtime threads.
        let parsed = tokio::task::spawn_blocking(move || extract_candidates(&upload.data))
            .await
            .map_err(|_| CsvError::Processing)?;

        if self.latest.load(Ordering::SeqCst) != ticket.0 {
            tracing::info!("discarding superseded csv upload");
            return Ok(IngestOutcome::Superseded);
        }

        Ok(IngestOutcome::Candidates(parsed?))
    }
}

/// The parsing rules proper: lossy text decode, first line is the header,
/// naive comma split with no quoting support, rows keep the trimmed value
/// of the `email` column iff it has the right shape. Rows with too few
/// fields are skipped without error.
pub fn extract_candidates(data: &[u8]) -> Result<Vec<String>, CsvError> {
    let text = String::from_utf8_lossy(data);
    let mut lines = text.lines();

    let header = lines.next().ok_or(CsvError::EmptyFile)?;
    let rows: Vec<&str> = lines.collect();
    if rows.is_empty() {
        return Err(CsvError::EmptyFile);
    }

    let email_column = header
        .split(',')
        .position(|field| field.trim().eq_ignore_ascii_case("email"))
        .ok_or(CsvError::MissingEmailColumn)?;

    let mut candidates = Vec::new();
    for line in rows {
        let Some(field) = line.split(',').nth(email_column) else {
            continue;
        };
        let field = field.trim();
        if is_valid_address(field) {
            candidates.push(field.to_owned());
        }
    }

    if candidates.is_empty() {
        return Err(CsvError::NoValidEmails);
    }
    Ok(candidates)
}
