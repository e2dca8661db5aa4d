use chrono::{Days, NaiveDate};
use serde::Serialize;
use std::sync::OnceLock;

use super::{cycle, DatasetRecord};
use crate::drawer::{ActionSpec, DrawerField, DrawerView, Role};
use crate::format::format_money;
use crate::listview::{
    Column, Direction, FieldValue, FilterSpec, ListSchema, Listable, SortKind, SortSpec,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EscrowStatus {
    Active,
    Released,
    Disputed,
    Refunded,
}

impl EscrowStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            EscrowStatus::Active => "active",
            EscrowStatus::Released => "released",
            EscrowStatus::Disputed => "disputed",
            EscrowStatus::Refunded => "refunded",
        }
    }
}

/// Funds held for a pickup until the release condition is met.
#[derive(Debug, Clone, Serialize)]
pub struct EscrowRecord {
    pub id: String,
    /// Linked pickup; never dereferenced
    pub pickup_id: String,
    pub payer: String,
    pub recycler: String,
    pub amount: i64,
    pub status: EscrowStatus,
    pub created_on: NaiveDate,
    pub sla_deadline: NaiveDate,
}

impl EscrowRecord {
    /// Only active holds can breach their SLA.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status == EscrowStatus::Active && self.sla_deadline < today
    }
}

/// Active escrows whose SLA deadline passed before `today`, in store order.
pub fn overdue(records: &[EscrowRecord], today: NaiveDate) -> Vec<&EscrowRecord> {
    records.iter().filter(|e| e.is_overdue(today)).collect()
}

const PAYERS: [&str; 6] = [
    "GreenCycle Industries",
    "Metro Municipal Corp",
    "Harbor Foods Pvt Ltd",
    "Lakeside Hospital",
    "Bluewave Hotels",
    "Summit Textiles",
];

const RECYCLERS: [&str; 4] = [
    "EcoHaul Partners",
    "ReNew Scrap Co",
    "CleanLoop Recyclers",
    "Circular Metals",
];

const STATUSES: [EscrowStatus; 6] = [
    EscrowStatus::Active,
    EscrowStatus::Released,
    EscrowStatus::Active,
    EscrowStatus::Disputed,
    EscrowStatus::Released,
    EscrowStatus::Refunded,
];

pub fn generate(n: usize) -> Vec<EscrowRecord> {
    let base = NaiveDate::from_ymd_opt(2024, 10, 1).unwrap_or_default();
    (0..n)
        .map(|i| {
            let created_on = base
                .checked_add_days(Days::new(i as u64 * 2))
                .unwrap_or(base);
            // 7 or 14 day release windows
            let window = if i % 3 == 0 { 14 } else { 7 };
            EscrowRecord {
                id: format!("ESC-{:04}", 301 + i),
                pickup_id: format!("PU-{:05}", 18_400 + i * 7),
                payer: cycle(&PAYERS, i).to_string(),
                recycler: cycle(&RECYCLERS, i).to_string(),
                amount: 5_000 + ((i as i64 * 3571) % 90) * 500,
                status: cycle(&STATUSES, i),
                created_on,
                sla_deadline: created_on
                    .checked_add_days(Days::new(window))
                    .unwrap_or(created_on),
            }
        })
        .collect()
}

pub fn records() -> &'static [EscrowRecord] {
    static RECORDS: OnceLock<Vec<EscrowRecord>> = OnceLock::new();
    RECORDS.get_or_init(|| generate(30))
}

static SCHEMA: ListSchema = ListSchema {
    searchable: &["id", "payer", "pickup_id"],
    filters: &[
        FilterSpec::new("status", &["active", "released", "disputed", "refunded"]),
        FilterSpec::new("recycler", &[]),
    ],
    sorts: &[
        SortSpec::new("amount", SortKind::Numeric, Direction::Descending),
        SortSpec::new("sla_deadline", SortKind::Date, Direction::Ascending),
    ],
    default_sort: None,
};

impl Listable for EscrowRecord {
    fn id(&self) -> &str {
        &self.id
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        Some(match name {
            "id" => FieldValue::text(&self.id),
            "pickup_id" => FieldValue::text(&self.pickup_id),
            "payer" => FieldValue::text(&self.payer),
            "recycler" => FieldValue::tag(&self.recycler),
            "amount" => FieldValue::Money(self.amount),
            "status" => FieldValue::tag(self.status.as_str()),
            "created_on" => FieldValue::Date(self.created_on),
            "sla_deadline" => FieldValue::Date(self.sla_deadline),
            _ => return None,
        })
    }
}

impl DrawerView for EscrowRecord {
    const ACTIONS: &'static [ActionSpec] = &[
        ActionSpec::new("flag_dispute", "Flag Dispute", Role::Operations),
        ActionSpec::new("hold_payout", "Hold Payout", Role::FinanceAdmin),
        ActionSpec::new("release", "Release Funds", Role::FinanceAdmin),
    ];

    fn title(&self) -> String {
        format!("Escrow {}", self.id)
    }

    fn drawer_fields(&self) -> Vec<DrawerField> {
        vec![
            DrawerField::new("Pickup", &self.pickup_id),
            DrawerField::new("Payer", &self.payer),
            DrawerField::new("Recycler", &self.recycler),
            DrawerField::new("Amount", format_money(self.amount, "$")),
            DrawerField::new("Status", self.status.as_str()),
            DrawerField::new("Created", self.created_on.to_string()),
            DrawerField::new("SLA deadline", self.sla_deadline.to_string()),
        ]
    }
}

impl DatasetRecord for EscrowRecord {
    const TABLE_HEADERS: &'static [&'static str] =
        &["ID", "PICKUP", "PAYER", "RECYCLER", "AMOUNT", "STATUS", "SLA"];

    fn schema() -> &'static ListSchema {
        &SCHEMA
    }

    fn table_row(&self, currency_symbol: &str) -> Vec<String> {
        vec![
            self.id.clone(),
            self.pickup_id.clone(),
            self.payer.clone(),
            self.recycler.clone(),
            format_money(self.amount, currency_symbol),
            self.status.as_str().to_uppercase(),
            self.sla_deadline.to_string(),
        ]
    }

    fn csv_columns() -> Vec<Column<Self>> {
        vec![
            Column::field("Escrow ID", "id"),
            Column::field("Pickup ID", "pickup_id"),
            Column::field("Payer", "payer"),
            Column::field("Recycler", "recycler"),
            Column::field("Amount", "amount"),
            Column::field("Status", "status"),
            Column::field("SLA Deadline", "sla_deadline"),
        ]
    }
}
