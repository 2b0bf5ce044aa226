//! Per-row outcomes and their reduction into a batch outcome

use serde::Serialize;

/// What happened to one record of a batch
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Inserted,
    /// The `(symbol, timestamp)` key already existed
    DuplicateRejected,
    ValidationError(String),
    StorageError(String),
}

/// A record's outcome together with where it sat in the batch
#[derive(Debug, Clone)]
pub struct RowReport {
    pub index: usize,
    pub symbol: Option<String>,
    pub datetime: Option<String>,
    pub outcome: RowOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RejectReason {
    DuplicateKey,
    ValidationError,
    StorageError,
}

impl RejectReason {
    pub fn as_str(self) -> &'static str {
        match self {
            RejectReason::DuplicateKey => "duplicate-key",
            RejectReason::ValidationError => "validation-error",
            RejectReason::StorageError => "storage-error",
        }
    }
}

/// A non-inserted record, reported back to the caller
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectEntry {
    pub index: usize,
    pub symbol: Option<String>,
    pub datetime: Option<String>,
    pub reason: RejectReason,
    pub detail: String,
}

impl RejectEntry {
    fn from_report(report: RowReport) -> Option<Self> {
        let (reason, detail) = match report.outcome {
            RowOutcome::Inserted => return None,
            RowOutcome::DuplicateRejected => (
                RejectReason::DuplicateKey,
                "Duplicate key (already exists)".to_string(),
            ),
            RowOutcome::ValidationError(msg) => (RejectReason::ValidationError, msg),
            RowOutcome::StorageError(msg) => (RejectReason::StorageError, msg),
        };
        Some(Self {
            index: report.index,
            symbol: report.symbol,
            datetime: report.datetime,
            reason,
            detail,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    Success,
    Partial,
}

/// Response body of a batch load
#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    pub status: BatchStatus,
    pub inserted_count: usize,
    pub total_received: usize,
    /// `null` when nothing was rejected
    #[serde(serialize_with = "serialize_rejects")]
    pub rejects: Vec<RejectEntry>,
    /// Ledger batch the rejects were recorded under
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<String>,
    /// Set when the rejects could not be written to the ledger
    #[serde(skip)]
    pub ledger_error: Option<String>,
}

fn serialize_rejects<S>(rejects: &[RejectEntry], serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    if rejects.is_empty() {
        serializer.serialize_none()
    } else {
        serializer.collect_seq(rejects)
    }
}

impl BatchOutcome {
    /// Fold per-row reports, given in batch order, into one outcome
    pub fn aggregate(reports: Vec<RowReport>) -> Self {
        let total_received = reports.len();
        let inserted_count = reports
            .iter()
            .filter(|r| r.outcome == RowOutcome::Inserted)
            .count();
        let rejects: Vec<RejectEntry> = reports.into_iter().filter_map(RejectEntry::from_report).collect();
        let status = if rejects.is_empty() {
            BatchStatus::Success
        } else {
            BatchStatus::Partial
        };

        Self {
            status,
            inserted_count,
            total_received,
            rejects,
            batch_id: None,
            ledger_error: None,
        }
    }
}
