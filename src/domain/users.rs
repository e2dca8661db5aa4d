use chrono::{Days, NaiveDate};
use serde::Serialize;
use std::sync::OnceLock;

use super::{cycle, DatasetRecord};
use crate::drawer::{ActionSpec, DrawerField, DrawerView, Role};
use crate::listview::{
    Column, Direction, FieldValue, FilterSpec, ListSchema, Listable, SortKind, SortSpec,
};

/// Frequency band derived from pickups per month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Segment {
    PowerRecycler,
    Regular,
    Occasional,
    AtRisk,
}

impl Segment {
    pub fn from_frequency(pickups_per_month: u32) -> Self {
        match pickups_per_month {
            0 => Segment::AtRisk,
            1..=3 => Segment::Occasional,
            4..=7 => Segment::Regular,
            _ => Segment::PowerRecycler,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Segment::PowerRecycler => "power_recycler",
            Segment::Regular => "regular",
            Segment::Occasional => "occasional",
            Segment::AtRisk => "at_risk",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserRecord {
    pub id: String,
    pub name: String,
    pub email: String,
    pub city: String,
    pub pickups_per_month: u32,
    pub total_kg: f64,
    pub last_pickup: Option<NaiveDate>,
}

impl UserRecord {
    pub fn segment(&self) -> Segment {
        Segment::from_frequency(self.pickups_per_month)
    }
}

const FIRST_NAMES: [&str; 10] = [
    "Asha", "Rohan", "Meera", "Vikram", "Priya", "Arjun", "Neha", "Karan", "Divya", "Sameer",
];

const LAST_NAMES: [&str; 7] = ["Rao", "Iyer", "Shah", "Nair", "Mehta", "Kapoor", "Das"];

const CITIES: [&str; 5] = ["Bengaluru", "Pune", "Chennai", "Hyderabad", "Mumbai"];

pub fn generate(n: usize) -> Vec<UserRecord> {
    let base = NaiveDate::from_ymd_opt(2024, 12, 1).unwrap_or_default();
    (0..n)
        .map(|i| {
            let first = cycle(&FIRST_NAMES, i);
            let last = cycle(&LAST_NAMES, i / 3);
            let pickups = ((i * 37) % 13) as u32;
            let last_pickup = (pickups > 0).then(|| {
                base.checked_sub_days(Days::new((i as u64 * 5) % 45))
                    .unwrap_or(base)
            });
            UserRecord {
                id: format!("U-{:05}", 10_001 + i),
                name: format!("{first} {last}"),
                email: format!(
                    "{}.{}{}@mail.example",
                    first.to_lowercase(),
                    last.to_lowercase(),
                    i
                ),
                city: cycle(&CITIES, i).to_string(),
                pickups_per_month: pickups,
                total_kg: pickups as f64 * 4.5 + (i % 7) as f64,
                last_pickup,
            }
        })
        .collect()
}

pub fn records() -> &'static [UserRecord] {
    static RECORDS: OnceLock<Vec<UserRecord>> = OnceLock::new();
    RECORDS.get_or_init(|| generate(60))
}

static SCHEMA: ListSchema = ListSchema {
    searchable: &["name", "email", "city"],
    filters: &[
        FilterSpec::new(
            "segment",
            &["power_recycler", "regular", "occasional", "at_risk"],
        ),
        FilterSpec::new("city", &[]),
    ],
    sorts: &[
        SortSpec::new("frequency", SortKind::Numeric, Direction::Descending),
        SortSpec::new("total_kg", SortKind::Numeric, Direction::Descending),
        SortSpec::new("last_pickup", SortKind::Date, Direction::Descending),
    ],
    default_sort: Some("frequency"),
};

impl Listable for UserRecord {
    fn id(&self) -> &str {
        &self.id
    }

    fn field(&self, name: &str) -> Option<FieldValue> {
        Some(match name {
            "id" => FieldValue::text(&self.id),
            "name" => FieldValue::text(&self.name),
            "email" => FieldValue::text(&self.email),
            "city" => FieldValue::tag(&self.city),
            "frequency" => FieldValue::Number(self.pickups_per_month as f64),
            "total_kg" => FieldValue::Number(self.total_kg),
            "last_pickup" => FieldValue::Date(self.last_pickup?),
            "segment" => FieldValue::tag(self.segment().as_str()),
            _ => return None,
        })
    }
}

impl DrawerView for UserRecord {
    const ACTIONS: &'static [ActionSpec] = &[
        ActionSpec::new("view_pickups", "View Pickups", Role::Viewer),
        ActionSpec::new("send_nudge", "Send Nudge", Role::Operations),
        ActionSpec::new("issue_credit", "Issue Credit", Role::FinanceAdmin),
    ];

    fn title(&self) -> String {
        format!("{} ({})", self.name, self.id)
    }

    fn drawer_fields(&self) -> Vec<DrawerField> {
        vec![
            DrawerField::new("Email", &self.email),
            DrawerField::new("City", &self.city),
            DrawerField::new("Pickups / month", self.pickups_per_month.to_string()),
            DrawerField::new("Total recycled", format!("{:.1} kg", self.total_kg)),
            DrawerField::new("Segment", self.segment().as_str()),
            DrawerField::new(
                "Last pickup",
                self.last_pickup
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "never".into()),
            ),
        ]
    }
}

impl DatasetRecord for UserRecord {
    const TABLE_HEADERS: &'static [&'static str] =
        &["ID", "NAME", "CITY", "PICKUPS/MO", "KG", "SEGMENT", "LAST PICKUP"];

    fn schema() -> &'static ListSchema {
        &SCHEMA
    }

    fn table_row(&self, _currency_symbol: &str) -> Vec<String> {
        vec![
            self.id.clone(),
            self.name.clone(),
            self.city.clone(),
            self.pickups_per_month.to_string(),
            format!("{:.1}", self.total_kg),
            self.segment().as_str().to_string(),
            self.last_pickup
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".into()),
        ]
    }

    fn csv_columns() -> Vec<Column<Self>> {
        vec![
            Column::field("User ID", "id"),
            Column::field("Name", "name"),
            Column::field("Email", "email"),
            Column::field("City", "city"),
            Column::field("Pickups Per Month", "frequency"),
            Column::field("Total Kg", "total_kg"),
            Column::field("Segment", "segment"),
            Column::field("Last Pickup", "last_pickup"),
        ]
    }
}
