//! Read-only detail panel for one selected record.
//!
//! Action buttons never touch the record store. A permitted click becomes an
//! [`ActionRequested`] event handed to an [`ActionSink`], which stands in for
//! the mutation layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{RecliqError, Result};
use crate::listview::Listable;

pub const READ_ONLY_NOTICE: &str = "Read-only except Finance Admin";

/// Back-office roles, least to most privileged.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Viewer,
    Operations,
    FinanceAdmin,
}

impl Role {
    pub fn allows(self, required: Role) -> bool {
        self >= required
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Viewer => "viewer",
            Role::Operations => "operations",
            Role::FinanceAdmin => "finance_admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = RecliqError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "viewer" => Ok(Role::Viewer),
            "operations" | "ops" => Ok(Role::Operations),
            "finance_admin" => Ok(Role::FinanceAdmin),
            _ => Err(RecliqError::InvalidChoice {
                what: "role",
                value: s.to_string(),
                expected: "viewer, operations, finance_admin",
            }),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ActionSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub required_role: Role,
}

impl ActionSpec {
    pub const fn new(name: &'static str, label: &'static str, required_role: Role) -> Self {
        Self {
            name,
            label,
            required_role,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawerField {
    pub label: &'static str,
    pub value: String,
}

impl DrawerField {
    pub fn new(label: &'static str, value: impl Into<String>) -> Self {
        Self {
            label,
            value: value.into(),
        }
    }
}

/// A record that knows how to present itself in the drawer.
pub trait DrawerView: Listable {
    /// Fixed action buttons, in display order
    const ACTIONS: &'static [ActionSpec];

    fn title(&self) -> String;

    fn drawer_fields(&self) -> Vec<DrawerField>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActionButton {
    pub name: &'static str,
    pub label: &'static str,
    pub enabled: bool,
}

#[derive(Debug, Clone)]
pub struct DrawerContents {
    pub title: String,
    pub fields: Vec<DrawerField>,
    pub actions: Vec<ActionButton>,
    pub notice: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionRequested {
    pub record_id: String,
    pub action: String,
    pub role: Role,
    pub requested_at: DateTime<Utc>,
}

/// Receives action requests raised from a drawer.
pub trait ActionSink {
    fn dispatch(&mut self, event: ActionRequested);
}

impl ActionSink for Vec<ActionRequested> {
    fn dispatch(&mut self, event: ActionRequested) {
        self.push(event);
    }
}

/// Logs requests and drops them.
#[derive(Debug, Default)]
pub struct LogSink;

impl ActionSink for LogSink {
    fn dispatch(&mut self, event: ActionRequested) {
        tracing::info!(
            record = %event.record_id,
            action = %event.action,
            role = %event.role,
            "action requested"
        );
    }
}

#[derive(Debug)]
pub struct DetailDrawer<'a, T> {
    record: Option<&'a T>,
    open: bool,
}

impl<'a, T> Default for DetailDrawer<'a, T> {
    fn default() -> Self {
        Self {
            record: None,
            open: false,
        }
    }
}

impl<'a, T: DrawerView> DetailDrawer<'a, T> {
    pub fn new(record: Option<&'a T>, open: bool) -> Self {
        Self { record, open }
    }

    /// Open on `record`, the usual row-click path.
    pub fn show(record: &'a T) -> Self {
        Self::new(Some(record), true)
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn record(&self) -> Option<&'a T> {
        self.record
    }

    fn visible_record(&self) -> Option<&'a T> {
        if self.open {
            self.record
        } else {
            None
        }
    }

    /// Contents for `role`, or `None` when closed or empty.
    pub fn render(&self, role: Role) -> Option<DrawerContents> {
        let record = self.visible_record()?;
        Some(DrawerContents {
            title: record.title(),
            fields: record.drawer_fields(),
            actions: T::ACTIONS
                .iter()
                .map(|a| ActionButton {
                    name: a.name,
                    label: a.label,
                    enabled: role.allows(a.required_role),
                })
                .collect(),
            notice: (role != Role::FinanceAdmin).then_some(READ_ONLY_NOTICE),
        })
    }

    /// Raise `action` for the shown record and hand it to `sink`.
    pub fn request(
        &self,
        action: &str,
        role: Role,
        sink: &mut dyn ActionSink,
    ) -> Result<ActionRequested> {
        let record = self.visible_record().ok_or(RecliqError::DrawerClosed)?;
        let spec = T::ACTIONS
            .iter()
            .find(|a| a.name == action)
            .ok_or_else(|| RecliqError::UnknownAction {
                title: record.title(),
                action: action.to_string(),
            })?;
        if !role.allows(spec.required_role) {
            return Err(RecliqError::Forbidden {
                action: spec.name.to_string(),
                required: spec.required_role.to_string(),
                role: role.to_string(),
            });
        }

        let event = ActionRequested {
            record_id: record.id().to_string(),
            action: spec.name.to_string(),
            role,
            requested_at: Utc::now(),
        };
        sink.dispatch(event.clone());
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listview::FieldValue;

    struct Payout {
        id: &'static str,
        amount: i64,
    }

    impl Listable for Payout {
        fn id(&self) -> &str {
            self.id
        }

        fn field(&self, name: &str) -> Option<FieldValue> {
            match name {
                "amount" => Some(FieldValue::Money(self.amount)),
                _ => None,
            }
        }
    }

    impl DrawerView for Payout {
        const ACTIONS: &'static [ActionSpec] = &[
            ActionSpec::new("view", "View Statement", Role::Viewer),
            ActionSpec::new("hold", "Hold Payout", Role::FinanceAdmin),
        ];

        fn title(&self) -> String {
            format!("Payout {}", self.id)
        }

        fn drawer_fields(&self) -> Vec<DrawerField> {
            vec![DrawerField::new("Amount", self.amount.to_string())]
        }
    }

    #[test]
    fn empty_or_closed_drawer_renders_nothing() {
        let drawer: DetailDrawer<Payout> = DetailDrawer::new(None, true);
        assert!(drawer.render(Role::FinanceAdmin).is_none());

        let payout = Payout { id: "P1", amount: 10 };
        let mut drawer = DetailDrawer::show(&payout);
        drawer.close();
        assert!(drawer.render(Role::FinanceAdmin).is_none());
    }

    #[test]
    fn buttons_are_gated_by_role() {
        let payout = Payout { id: "P1", amount: 10 };
        let drawer = DetailDrawer::show(&payout);

        let viewer = drawer.render(Role::Viewer).unwrap();
        assert_eq!(viewer.notice, Some(READ_ONLY_NOTICE));
        assert!(viewer.actions[0].enabled);
        assert!(!viewer.actions[1].enabled);

        let admin = drawer.render(Role::FinanceAdmin).unwrap();
        assert_eq!(admin.notice, None);
        assert!(admin.actions.iter().all(|a| a.enabled));
    }

    #[test]
    fn permitted_action_reaches_sink() {
        let payout = Payout { id: "P1", amount: 10 };
        let drawer = DetailDrawer::show(&payout);
        let mut sink: Vec<ActionRequested> = Vec::new();

        let event = drawer.request("hold", Role::FinanceAdmin, &mut sink).unwrap();
        assert_eq!(event.record_id, "P1");
        assert_eq!(sink, vec![event]);
    }

    #[test]
    fn forbidden_and_unknown_actions_are_rejected() {
        let payout = Payout { id: "P1", amount: 10 };
        let drawer = DetailDrawer::show(&payout);
        let mut sink: Vec<ActionRequested> = Vec::new();

        assert!(matches!(
            drawer.request("hold", Role::Operations, &mut sink),
            Err(RecliqError::Forbidden { .. })
        ));
        assert!(matches!(
            drawer.request("delete", Role::FinanceAdmin, &mut sink),
            Err(RecliqError::UnknownAction { .. })
        ));
        assert!(sink.is_empty());
    }

    #[test]
    fn parses_roles() {
        assert_eq!("finance-admin".parse::<Role>().unwrap(), Role::FinanceAdmin);
        assert_eq!("OPS".parse::<Role>().unwrap(), Role::Operations);
        assert!("root".parse::<Role>().is_err());
    }
}
