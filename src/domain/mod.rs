//! Synthetic record stores behind each back-office list.
//!
//! Records are generated deterministically once per process and never
//! mutated afterwards.

pub mod escrow;
pub mod payments;
pub mod users;

pub use escrow::{EscrowRecord, EscrowStatus};
pub use payments::{EnterprisePayment, PaymentMethod, PaymentStatus};
pub use users::{Segment, UserRecord};

use std::fmt;
use std::str::FromStr;

use crate::drawer::DrawerView;
use crate::error::RecliqError;
use crate::listview::{Column, ListSchema};

/// A record type with everything a list page needs.
pub trait DatasetRecord: DrawerView + Sized + 'static {
    const TABLE_HEADERS: &'static [&'static str];

    fn schema() -> &'static ListSchema;

    fn table_row(&self, currency_symbol: &str) -> Vec<String>;

    fn csv_columns() -> Vec<Column<Self>>;

    /// One-line footer over the filtered records, if the list has one.
    fn summary(_records: &[&Self], _currency_symbol: &str) -> Option<String> {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dataset {
    Payments,
    Escrows,
    Users,
}

impl Dataset {
    pub const ALL: [Dataset; 3] = [Dataset::Payments, Dataset::Escrows, Dataset::Users];

    pub fn name(self) -> &'static str {
        match self {
            Dataset::Payments => "payments",
            Dataset::Escrows => "escrows",
            Dataset::Users => "users",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Dataset::Payments => "Enterprise payments",
            Dataset::Escrows => "Escrow holdings",
            Dataset::Users => "User recycling segments",
        }
    }

    /// `(subject, description)` for the export filename.
    pub fn export_name(self) -> (&'static str, &'static str) {
        match self {
            Dataset::Payments => ("enterprise", "payments"),
            Dataset::Escrows => ("escrow", "holdings"),
            Dataset::Users => ("user", "segments"),
        }
    }

    pub fn record_count(self) -> usize {
        match self {
            Dataset::Payments => payments::records().len(),
            Dataset::Escrows => escrow::records().len(),
            Dataset::Users => users::records().len(),
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dataset {
    type Err = RecliqError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "payments" | "enterprise-payments" => Ok(Dataset::Payments),
            "escrows" | "escrow" => Ok(Dataset::Escrows),
            "users" | "segments" => Ok(Dataset::Users),
            _ => Err(RecliqError::UnknownDataset(s.to_string())),
        }
    }
}

/// Pick the `i`-th entry of a non-empty table, wrapping around.
pub(crate) fn cycle<T: Copy>(table: &[T], i: usize) -> T {
    table[i % table.len()]
}
