use chrono::{Days, NaiveDate};
use serde::Serialize;
use std::fmt;
use std::sync::OnceLock;

use super::{cycle, DatasetRecord};
use crate::drawer::{ActionSpec, DrawerField, DrawerView, Role};
use crate::format::{format_money, format_percent};
use crate::listview::{
    Column, Direction, FieldValue, FilterSpec, ListSchema, Listable, SortKind, SortSpec,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Paid,
    Partial,
    Pending,
    Overdue,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Paid => "paid",
            PaymentStatus::Partial => "partial",
            PaymentStatus::Pending => "pending",
            PaymentStatus::Overdue => "overdue",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    BankTransfer,
    Card,
    Upi,
    Cheque,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::Card => "card",
            PaymentMethod::Upi => "upi",
            PaymentMethod::Cheque => "cheque",
        }
    }
}

/// A payment owed by an enterprise customer against one invoice.
#[derive(Debug, Clone, Serialize)]
pub struct EnterprisePayment {
    pub id: String,
    pub enterprise: String,
    /// Linked invoice; never dereferenced
    pub invoice_id: String,
    pub amount: i64,
    pub paid: i64,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub due_date: NaiveDate,
    pub paid_on: Option<NaiveDate>,
}

impl EnterprisePayment {
    pub fn outstanding(&self) -> i64 {
        self.amount - self.paid
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

#[allow(clippy::too_many_arguments)]
fn payment(
    id: &str,
    enterprise: &str,
    invoice_id: &str,
    amount: i64,
    paid: i64,
    method: PaymentMethod,
    status: PaymentStatus,
    due_date: NaiveDate,
    paid_on: Option<NaiveDate>,
) -> EnterprisePayment {
    EnterprisePayment {
        id: id.to_string(),
        enterprise: enterprise.to_string(),
        invoice_id: invoice_id.to_string(),
        amount,
        paid,
        method,
        status,
        due_date,
        paid_on,
    }
}

/// The five hand-written records shown on the enterprise payments page.
pub fn seed() -> Vec<EnterprisePayment> {
    use PaymentMethod::*;
    use PaymentStatus::*;

    vec![
        payment(
            "EP-1001",
            "GreenCycle Industries",
            "INV-2024-0142",
            125_000,
            125_000,
            BankTransfer,
            Paid,
            date(2024, 11, 15),
            Some(date(2024, 11, 12)),
        ),
        payment(
            "EP-1002",
            "Metro Municipal Corp",
            "INV-2024-0143",
            340_000,
            170_000,
            BankTransfer,
            Partial,
            date(2024, 11, 20),
            Some(date(2024, 11, 18)),
        ),
        payment(
            "EP-1003",
            "Harbor Foods Pvt Ltd",
            "INV-2024-0147",
            86_500,
            0,
            Card,
            Pending,
            date(2024, 12, 5),
            None,
        ),
        payment(
            "EP-1004",
            "Sunrise Apartments RWA",
            "INV-2024-0151",
            42_000,
            42_000,
            Upi,
            Paid,
            date(2024, 11, 28),
            Some(date(2024, 11, 27)),
        ),
        payment(
            "EP-1005",
            "TechPark Facilities",
            "INV-2024-0138",
            198_000,
            0,
            Cheque,
            Overdue,
            date(2024, 10, 30),
            None,
        ),
    ]
}

const ENTERPRISES: [&str; 8] = [
    "Lakeside Hospital",
    "Northgate Mall",
    "Bluewave Hotels",
    "City Schools Trust",
    "Riverbend Logistics",
    "Orchid Residency",
    "Summit Textiles",
    "Evergreen Campus",
];

const STATUSES: [PaymentStatus; 5] = [
    PaymentStatus::Pending,
    PaymentStatus::Paid,
    PaymentStatus::Overdue,
    PaymentStatus::Partial,
    PaymentStatus::Paid,
];

const METHODS: [PaymentMethod; 4] = [
    PaymentMethod::BankTransfer,
    PaymentMethod::Upi,
    PaymentMethod::Card,
    PaymentMethod::Cheque,
];

/// `n` additional records derived from their index.
pub fn generate(n: usize) -> Vec<EnterprisePayment> {
    let base = date(2024, 9, 2);
    (0..n)
        .map(|i| {
            let amount = 20_000 + ((i as i64 * 7919) % 300) * 1_000;
            let status = cycle(&STATUSES, i);
            let due_date = base
                .checked_add_days(Days::new(i as u64 * 3))
                .unwrap_or(base);
            let (paid, paid_on) = match status {
                PaymentStatus::Paid => (amount, due_date.checked_sub_days(Days::new(2))),
                PaymentStatus::Partial => (amount / 2, Some(due_date)),
                PaymentStatus::Pending | PaymentStatus::Overdue => (0, None),
            };
            EnterprisePayment {
                id: format!("EP-{}", 2001 + i),
                enterprise: cycle(&ENTERPRISES, i).to_string(),
                invoice_id: format!("INV-2024-{:04}", 200 + i),
                amount,
                paid,
                method: cycle(&METHODS, i),
                status,
                due_date,
                paid_on,
            }
        })
        .collect()
}

pub fn records() -> &'static [EnterprisePayment] {
    static RECORDS: OnceLock<Vec<EnterprisePayment>> = OnceLock::new();
    RECORDS.get_or_init(|| {
        let mut records = seed();
        records.extend(generate(37));
        records
    })
}

/// Collected vs billed across `payments`.
pub fn totals<'a>(payments: impl IntoIterator<Item = &'a EnterprisePayment>) -> (i64, i64) {
    payments
        .into_iter()
        .fold((0, 0), |(billed, collected), p| (billed + p.amount, collected + p.paid))
}

static SCHEMA: ListSchema = ListSchema {
    searchable: &["enterprise", "id", "invoice_id"],
    filters: &[
        FilterSpec::new("status", &["paid", "partial", "pending", "overdue"]),
        FilterSpec::new("method", &["bank_transfer", "card", "upi", "cheque"]),
    ],
    sorts: &[
        SortSpec::new("amount", SortKind::Numeric, Direction::Descending),
        SortSpec::new("outstanding", SortKind::Numeric, Direction::Descending),
        SortSpec::new("due_date", SortKind::Date, Direction::Descending),
    ],
    default_sort: None,
};

impl Listable for EnterprisePayment {
    fn id(&self) -> &str {
        &self.id
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        Some(match name {
            "id" => FieldValue::text(&self.id),
            "enterprise" => FieldValue::text(&self.enterprise),
            "invoice_id" => FieldValue::text(&self.invoice_id),
            "amount" => FieldValue::Money(self.amount),
            "paid" => FieldValue::Money(self.paid),
            "outstanding" => FieldValue::Money(self.outstanding()),
            "method" => FieldValue::tag(self.method.as_str()),
            "status" => FieldValue::tag(self.status.as_str()),
            "due_date" => FieldValue::Date(self.due_date),
            "paid_on" => FieldValue::Date(self.paid_on?),
            _ => return None,
        })
    }
}

impl DrawerView for EnterprisePayment {
    const ACTIONS: &'static [ActionSpec] = &[
        ActionSpec::new("download_invoice", "Download Invoice", Role::Viewer),
        ActionSpec::new("send_reminder", "Send Reminder", Role::Operations),
        ActionSpec::new("record_payment", "Record Payment", Role::FinanceAdmin),
    ];

    fn title(&self) -> String {
        format!("{} - {}", self.id, self.enterprise)
    }

    fn drawer_fields(&self) -> Vec<DrawerField> {
        vec![
            DrawerField::new("Enterprise", &self.enterprise),
            DrawerField::new("Invoice", &self.invoice_id),
            DrawerField::new("Amount", format_money(self.amount, "$")),
            DrawerField::new("Paid", format_money(self.paid, "$")),
            DrawerField::new("Outstanding", format_money(self.outstanding(), "$")),
            DrawerField::new("Collected", format_percent(self.paid, self.amount)),
            DrawerField::new("Method", self.method.as_str()),
            DrawerField::new("Status", self.status.as_str()),
            DrawerField::new("Due", self.due_date.to_string()),
            DrawerField::new(
                "Paid on",
                self.paid_on.map(|d| d.to_string()).unwrap_or_else(|| "-".into()),
            ),
        ]
    }
}

impl DatasetRecord for EnterprisePayment {
    const TABLE_HEADERS: &'static [&'static str] =
        &["ID", "ENTERPRISE", "INVOICE", "AMOUNT", "PAID", "STATUS", "DUE"];

    fn schema() -> &'static ListSchema {
        &SCHEMA
    }

    fn table_row(&self, currency_symbol: &str) -> Vec<String> {
        vec![
            self.id.clone(),
            self.enterprise.clone(),
            self.invoice_id.clone(),
            format_money(self.amount, currency_symbol),
            format_money(self.paid, currency_symbol),
            self.status.as_str().to_uppercase(),
            self.due_date.to_string(),
        ]
    }

    fn csv_columns() -> Vec<Column<Self>> {
        vec![
            Column::field("Payment ID", "id"),
            Column::field("Enterprise", "enterprise"),
            Column::field("Invoice ID", "invoice_id"),
            Column::field("Amount", "amount"),
            Column::field("Paid", "paid"),
            Column::field("Method", "method"),
            Column::field("Status", "status"),
            Column::field("Due Date", "due_date"),
        ]
    }

    fn summary(records: &[&Self], currency_symbol: &str) -> Option<String> {
        let (billed, collected) = totals(records.iter().copied());
        Some(format!(
            "Collected {} of {} billed ({})",
            format_money(collected, currency_symbol),
            format_money(billed, currency_symbol),
            format_percent(collected, billed)
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listview::ListView;

    #[test]
    fn seed_has_two_paid_records() {
        let seed = seed();
        assert_eq!(seed.len(), 5);
        let paid: Vec<_> = seed
            .iter()
            .filter(|p| p.status == PaymentStatus::Paid)
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(paid, ["EP-1001", "EP-1004"]);
    }

    #[test]
    fn generation_is_deterministic() {
        let a = generate(12);
        let b = generate(12);
        assert_eq!(
            a.iter().map(|p| (&p.id, p.amount)).collect::<Vec<_>>(),
            b.iter().map(|p| (&p.id, p.amount)).collect::<Vec<_>>()
        );
        assert!(a.iter().all(|p| p.paid <= p.amount));
    }

    #[test]
    fn ids_are_unique() {
        let mut ids: Vec<_> = records().iter().map(|p| p.id.clone()).collect();
        let total = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), total);
    }

    #[test]
    fn paid_filter_ignores_unmatched_generated_record() {
        let mut store = seed();
        store.extend(generate(1));
        let mut view = ListView::new(&store, &SCHEMA, 10).unwrap();
        view.set_filter("status", "paid").unwrap();
        let ids: Vec<_> = view.filtered_sorted().iter().map(|p| p.id.clone()).collect();
        assert_eq!(ids, ["EP-1001", "EP-1004"]);
    }

    #[test]
    fn totals_sum_billed_and_collected() {
        let (billed, collected) = totals(&seed());
        assert_eq!(billed, 791_500);
        assert_eq!(collected, 337_000);
    }
}
