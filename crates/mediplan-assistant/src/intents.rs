//! Keyword intent classification.

use serde::{Deserialize, Serialize};

/// What a query is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    TodayAppointments,
    RecentPatients,
    Payments,
    Statistics,
    Suggestions,
    Help,
    Unknown,
}

/// A rule matches when every group has at least one keyword in the query.
struct Rule {
    intent: Intent,
    groups: &'static [&'static [&'static str]],
}

/// Checked in order; the first match wins.
const RULES: &[Rule] = &[
    Rule {
        intent: Intent::TodayAppointments,
        groups: &[&["rendez-vous"], &["aujourd", "today"]],
    },
    Rule {
        intent: Intent::RecentPatients,
        groups: &[&["patient"], &["récent", "nouveau", "dernier"]],
    },
    Rule {
        intent: Intent::Payments,
        groups: &[&["paiement", "impayé", "attente", "facture"]],
    },
    Rule {
        intent: Intent::Statistics,
        groups: &[&["statistique", "résumé", "bilan", "performance"]],
    },
    Rule {
        intent: Intent::Suggestions,
        groups: &[&["suggestion", "conseil", "améliorer", "optimiser"]],
    },
    Rule {
        intent: Intent::Help,
        groups: &[&["aide", "help", "quoi", "faire"]],
    },
];

impl Rule {
    fn matches(&self, query: &str) -> bool {
        self.groups
            .iter()
            .all(|group| group.iter().any(|keyword| query.contains(keyword)))
    }
}

/// Classify a free-text query by substring matching on its lower-cased form.
pub fn classify(query: &str) -> Intent {
    let query = query.to_lowercase();
    RULES
        .iter()
        .find(|rule| rule.matches(&query))
        .map(|rule| rule.intent)
        .unwrap_or(Intent::Unknown)
}
