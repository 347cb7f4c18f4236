// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{InvoiceRecord, InvoiceStatus, PageSize, StatusFilter};

/// Records matching `filter`, in fetch order. The input is left untouched.
pub fn filter_records(records: &[InvoiceRecord], filter: &StatusFilter) -> Vec<InvoiceRecord> {
    records
        .iter()
        .filter(|record| filter.matches(&record.status))
        .cloned()
        .collect()
}

/// Case-insensitive match on invoice number or customer name.
pub fn search_records(records: &[InvoiceRecord], query: &str) -> Vec<InvoiceRecord> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return records.to_vec();
    }
    records
        .iter()
        .filter(|record| {
            record.id.to_lowercase().contains(&needle)
                || record.customer.to_lowercase().contains(&needle)
        })
        .cloned()
        .collect()
}

pub fn page_count(total: usize, size: PageSize) -> usize {
    total.div_ceil(size.rows()).max(1)
}

/// Zero-based page slice. Out-of-range pages clamp to the last page.
pub fn paginate(records: &[InvoiceRecord], size: PageSize, page: usize) -> &[InvoiceRecord] {
    let page = page.min(page_count(records.len(), size) - 1);
    let start = (page * size.rows()).min(records.len());
    let end = (start + size.rows()).min(records.len());
    &records[start..end]
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub total: usize,
    pub awaiting_payment: usize,
    pub overdue: usize,
    pub paid: usize,
    pub draft: usize,
}

pub fn status_counts(records: &[InvoiceRecord]) -> StatusCounts {
    records
        .iter()
        .fold(StatusCounts::default(), |mut counts, record| {
            counts.total += 1;
            match record.status {
                InvoiceStatus::AwaitingPayment => counts.awaiting_payment += 1,
                InvoiceStatus::Overdue => counts.overdue += 1,
                InvoiceStatus::Paid => counts.paid += 1,
                InvoiceStatus::Draft => counts.draft += 1,
                InvoiceStatus::Other(_) => {}
            }
            counts
        })
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ListingState {
    #[default]
    NotLoaded,
    Loading {
        previous: Option<Vec<InvoiceRecord>>,
    },
    Loaded(Vec<InvoiceRecord>),
    Failed {
        error: String,
        previous: Option<Vec<InvoiceRecord>>,
    },
}

impl ListingState {
    /// The collection currently on screen, if any was ever loaded.
    pub fn records(&self) -> &[InvoiceRecord] {
        match self {
            Self::Loaded(records) => records,
            Self::Loading { previous } | Self::Failed { previous, .. } => {
                previous.as_deref().unwrap_or_default()
            }
            Self::NotLoaded => &[],
        }
    }

    pub fn visible(&self, filter: &StatusFilter) -> Vec<InvoiceRecord> {
        filter_records(self.records(), filter)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    fn retained(&self) -> Option<Vec<InvoiceRecord>> {
        match self {
            Self::Loaded(records) => Some(records.clone()),
            Self::Loading { previous } | Self::Failed { previous, .. } => previous.clone(),
            Self::NotLoaded => None,
        }
    }

    pub fn begin_loading(&mut self) {
        *self = Self::Loading {
            previous: self.retained(),
        };
    }

    pub fn finish(&mut self, result: Result<Vec<InvoiceRecord>, String>) {
        *self = match result {
            Ok(records) => Self::Loaded(records),
            Err(error) => Self::Failed {
                error,
                previous: self.retained(),
            },
        };
    }
}
