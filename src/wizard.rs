//! Five-step pricing-rule wizard.
//!
//! Steps advance strictly forward or backward. Each step has a single
//! `can_proceed` gate; the review step builds the rule and the book
//! prepends it.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{RecliqError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Basics,
    Scope,
    Rates,
    Schedule,
    Review,
}

impl Step {
    pub const ALL: [Step; 5] = [
        Step::Basics,
        Step::Scope,
        Step::Rates,
        Step::Schedule,
        Step::Review,
    ];

    /// 1-based position, for "step N of 5"
    pub fn number(self) -> usize {
        Step::ALL.iter().position(|s| *s == self).unwrap_or(0) + 1
    }

    fn next(self) -> Option<Step> {
        Step::ALL.get(self.number()).copied()
    }

    fn previous(self) -> Option<Step> {
        self.number().checked_sub(2).map(|i| Step::ALL[i])
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Step::Basics => "basics",
            Step::Scope => "scope",
            Step::Rates => "rates",
            Step::Schedule => "schedule",
            Step::Review => "review",
        })
    }
}

macro_rules! choice_enum {
    ($name:ident, $what:literal, $expected:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = RecliqError;

            fn from_str(s: &str) -> Result<Self> {
                match s.to_ascii_lowercase().replace('-', "_").as_str() {
                    $($text => Ok($name::$variant),)+
                    _ => Err(RecliqError::InvalidChoice {
                        what: $what,
                        value: s.to_string(),
                        expected: $expected,
                    }),
                }
            }
        }
    };
}

choice_enum!(Material, "material", "plastic, paper, metal, glass, e_waste, organic", {
    Plastic => "plastic",
    Paper => "paper",
    Metal => "metal",
    Glass => "glass",
    EWaste => "e_waste",
    Organic => "organic",
});

choice_enum!(CustomerSegment, "segment", "residential, enterprise, municipal", {
    Residential => "residential",
    Enterprise => "enterprise",
    Municipal => "municipal",
});

choice_enum!(RateUnit, "unit", "per_kg, per_pickup, flat", {
    PerKg => "per_kg",
    PerPickup => "per_pickup",
    Flat => "flat",
});

/// Inputs collected across the wizard steps.
#[derive(Debug, Clone, Default)]
pub struct PricingRuleDraft {
    pub name: String,
    pub material: Option<Material>,
    pub zones: Vec<String>,
    pub segment: Option<CustomerSegment>,
    pub unit: Option<RateUnit>,
    pub base_rate: i64,
    pub min_quantity: u32,
    pub effective_from: Option<NaiveDate>,
    pub effective_to: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricingRule {
    pub id: String,
    pub name: String,
    pub material: Material,
    pub zones: Vec<String>,
    pub segment: CustomerSegment,
    pub unit: RateUnit,
    pub base_rate: i64,
    pub min_quantity: u32,
    pub effective_from: NaiveDate,
    pub effective_to: Option<NaiveDate>,
}

#[derive(Debug, Clone)]
pub struct PricingRuleWizard {
    step: Step,
    pub draft: PricingRuleDraft,
}

impl Default for PricingRuleWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl PricingRuleWizard {
    pub fn new() -> Self {
        Self {
            step: Step::Basics,
            draft: PricingRuleDraft::default(),
        }
    }

    pub fn step(&self) -> Step {
        self.step
    }

    /// Why `step` is blocked for the current draft, if it is.
    fn blocker(&self, step: Step) -> Option<&'static str> {
        let d = &self.draft;
        match step {
            Step::Basics if d.name.trim().is_empty() => Some("a rule name is required"),
            Step::Basics if d.material.is_none() => Some("choose a material"),
            Step::Scope if d.zones.iter().all(|z| z.trim().is_empty()) => {
                Some("add at least one zone")
            }
            Step::Scope if d.segment.is_none() => Some("choose a customer segment"),
            Step::Rates if d.base_rate <= 0 => Some("base rate must be greater than zero"),
            Step::Rates if d.unit.is_none() => Some("choose a rate unit"),
            Step::Schedule => match (d.effective_from, d.effective_to) {
                (None, _) => Some("an effective-from date is required"),
                (Some(from), Some(to)) if to < from => {
                    Some("effective-to must not be before effective-from")
                }
                _ => None,
            },
            _ => None,
        }
    }

    pub fn can_proceed(&self) -> bool {
        self.blocker(self.step).is_none()
    }

    pub fn next(&mut self) -> Result<Step> {
        if let Some(reason) = self.blocker(self.step) {
            return Err(RecliqError::StepIncomplete {
                step: self.step.to_string(),
                reason: reason.to_string(),
            });
        }
        if let Some(next) = self.step.next() {
            self.step = next;
        }
        Ok(self.step)
    }

    pub fn back(&mut self) -> Step {
        if let Some(previous) = self.step.previous() {
            self.step = previous;
        }
        self.step
    }

    /// Build the rule from the review step. Every earlier step is checked
    /// again, since the draft may have changed after it was passed.
    pub fn submit(&self, id: impl Into<String>) -> Result<PricingRule> {
        if self.step != Step::Review {
            return Err(RecliqError::NotOnReviewStep);
        }
        for step in Step::ALL {
            if let Some(reason) = self.blocker(step) {
                return Err(RecliqError::StepIncomplete {
                    step: step.to_string(),
                    reason: reason.to_string(),
                });
            }
        }
        let d = &self.draft;
        let incomplete = |reason: &str| RecliqError::StepIncomplete {
            step: Step::Review.to_string(),
            reason: reason.to_string(),
        };
        Ok(PricingRule {
            id: id.into(),
            name: d.name.trim().to_string(),
            material: d.material.ok_or_else(|| incomplete("material missing"))?,
            zones: d
                .zones
                .iter()
                .map(|z| z.trim().to_string())
                .filter(|z| !z.is_empty())
                .collect(),
            segment: d.segment.ok_or_else(|| incomplete("segment missing"))?,
            unit: d.unit.ok_or_else(|| incomplete("unit missing"))?,
            base_rate: d.base_rate,
            min_quantity: d.min_quantity,
            effective_from: d
                .effective_from
                .ok_or_else(|| incomplete("effective-from missing"))?,
            effective_to: d.effective_to,
        })
    }

    /// Walk every step in order, stopping at the first blocked one.
    pub fn run_to_review(&mut self) -> Result<()> {
        while self.step != Step::Review {
            self.next()?;
        }
        Ok(())
    }
}

/// In-memory rule list, newest first.
#[derive(Debug, Clone, Default)]
pub struct PricingRuleBook {
    rules: Vec<PricingRule>,
}

impl PricingRuleBook {
    pub fn new(rules: Vec<PricingRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[PricingRule] {
        &self.rules
    }

    pub fn next_id(&self) -> String {
        format!("PR-{:03}", self.rules.len() + 1)
    }

    pub fn prepend(&mut self, rule: PricingRule) {
        tracing::info!(id = %rule.id, name = %rule.name, "pricing rule created");
        self.rules.insert(0, rule);
    }

    /// Rules active in the dashboard today.
    pub fn seeded() -> Self {
        let date = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default();
        Self::new(vec![
            PricingRule {
                id: "PR-003".into(),
                name: "E-waste enterprise pickup".into(),
                material: Material::EWaste,
                zones: vec!["north".into(), "central".into()],
                segment: CustomerSegment::Enterprise,
                unit: RateUnit::PerPickup,
                base_rate: 1_500,
                min_quantity: 1,
                effective_from: date(2024, 9, 1),
                effective_to: None,
            },
            PricingRule {
                id: "PR-002".into(),
                name: "Municipal metal buyback".into(),
                material: Material::Metal,
                zones: vec!["all".into()],
                segment: CustomerSegment::Municipal,
                unit: RateUnit::PerKg,
                base_rate: 32,
                min_quantity: 100,
                effective_from: date(2024, 7, 1),
                effective_to: Some(date(2025, 6, 30)),
            },
            PricingRule {
                id: "PR-001".into(),
                name: "Residential dry waste".into(),
                material: Material::Paper,
                zones: vec!["south".into()],
                segment: CustomerSegment::Residential,
                unit: RateUnit::PerKg,
                base_rate: 12,
                min_quantity: 5,
                effective_from: date(2024, 4, 1),
                effective_to: None,
            },
        ])
    }
}
