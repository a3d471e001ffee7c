//! Expense normalization
//!
//! This module turns raw expense records into normalized expenses:
//! - Per-person amounts multiplied by the participant count
//! - Payer ids resolved to display names
//! - General and daily expenses flattened into one list, after the fuel estimate

use crate::types::{
    Expense, ExpenseOrigin, FuelEstimate, NormalizedExpense, Participant, PayerResolution,
    TripSnapshot, NOT_APPLICABLE, UNKNOWN_PAYER,
};
use std::collections::HashMap;

/// Participants indexed by id, first occurrence wins on duplicate ids
#[derive(Debug, Clone)]
pub struct ParticipantDirectory<'a> {
    entries: Vec<&'a Participant>,
    by_id: HashMap<&'a str, usize>,
}

impl<'a> ParticipantDirectory<'a> {
    pub fn new(participants: &'a [Participant]) -> Self {
        let mut entries = Vec::with_capacity(participants.len());
        let mut by_id = HashMap::with_capacity(participants.len());

        for participant in participants {
            if by_id.contains_key(participant.id.as_str()) {
                continue;
            }
            by_id.insert(participant.id.as_str(), entries.len());
            entries.push(participant);
        }

        Self { entries, by_id }
    }

    /// Number of distinct participants
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Participant count floored at 1, safe to divide or multiply by
    pub fn headcount(&self) -> usize {
        self.entries.len().max(1)
    }

    /// Position of a participant in directory order
    pub fn position(&self, id: &str) -> Option<usize> {
        self.by_id.get(id).copied()
    }

    pub fn get(&self, id: &str) -> Option<&'a Participant> {
        self.position(id).map(|idx| self.entries[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Participant> + '_ {
        self.entries.iter().copied()
    }
}

/// Cost of an expense once the per-person multiplier is applied
pub fn calculated_amount(expense: &Expense, participant_count: usize) -> f64 {
    if expense.per_person {
        expense.amount * participant_count as f64
    } else {
        expense.amount
    }
}

/// Normalizer for converting raw expenses to normalized expenses
pub struct ExpenseNormalizer<'d, 'a> {
    directory: &'d ParticipantDirectory<'a>,
}

impl<'d, 'a> ExpenseNormalizer<'d, 'a> {
    pub fn new(directory: &'d ParticipantDirectory<'a>) -> Self {
        Self { directory }
    }

    /// Resolve a payer id to its resolution and display label
    pub fn resolve_payer(&self, paid_by_id: Option<&str>) -> (PayerResolution, String) {
        match paid_by_id {
            None => (PayerResolution::Unassigned, NOT_APPLICABLE.to_string()),
            Some(id) => match self.directory.get(id) {
                Some(participant) => (
                    PayerResolution::Participant,
                    participant.display_name().to_string(),
                ),
                None => (PayerResolution::Unknown, UNKNOWN_PAYER.to_string()),
            },
        }
    }

    /// Normalize a single expense
    pub fn normalize(&self, expense: &Expense, origin: ExpenseOrigin) -> NormalizedExpense {
        let payer_id = expense.payer_id();
        let (payer, paid_by_name) = self.resolve_payer(payer_id);

        NormalizedExpense {
            id: expense.id.clone(),
            description: expense.description.clone(),
            origin,
            day_label: origin.label(),
            amount: expense.amount,
            per_person: expense.per_person,
            paid_by_id: payer_id.map(str::to_string),
            paid_by_name,
            payer,
            calculated_amount: calculated_amount(expense, self.directory.headcount()),
        }
    }

    /// Flatten every expense of the snapshot: fuel, general, then day by day
    pub fn normalize_all(
        &self,
        snapshot: &TripSnapshot,
        fuel: &FuelEstimate,
    ) -> Vec<NormalizedExpense> {
        let day_expense_count: usize = snapshot.days.iter().map(|day| day.expenses.len()).sum();
        let mut expenses =
            Vec::with_capacity(1 + snapshot.general_expenses.len() + day_expense_count);

        expenses.extend(fuel.to_expense());

        expenses.extend(
            snapshot
                .general_expenses
                .iter()
                .map(|expense| self.normalize(expense, ExpenseOrigin::General)),
        );

        for (index, day) in snapshot.days.iter().enumerate() {
            expenses.extend(
                day.expenses
                    .iter()
                    .map(|expense| self.normalize(expense, ExpenseOrigin::Day { index })),
            );
        }

        expenses
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fuel::FuelEstimator;
    use crate::types::{Day, FuelConfig};

    fn participants() -> Vec<Participant> {
        vec![
            Participant::new("p1", "Anna"),
            Participant::new("p2", "Marco"),
            Participant::new("p1", "Duplicate Anna"),
        ]
    }

    #[test]
    fn test_directory_deduplicates_ids() {
        let people = participants();
        let directory = ParticipantDirectory::new(&people);

        assert_eq!(directory.len(), 2);
        assert_eq!(directory.get("p1").map(|p| p.display_name()), Some("Anna"));
        assert_eq!(directory.position("p2"), Some(1));
    }

    #[test]
    fn test_empty_directory_headcount_is_one() {
        let directory = ParticipantDirectory::new(&[]);
        assert!(directory.is_empty());
        assert_eq!(directory.headcount(), 1);
    }

    #[test]
    fn test_per_person_amount_multiplied() {
        let people = participants();
        let directory = ParticipantDirectory::new(&people);
        let normalizer = ExpenseNormalizer::new(&directory);

        let expense = Expense::per_person("e1", 25.0, Some("p2"));
        let normalized = normalizer.normalize(&expense, ExpenseOrigin::Day { index: 0 });

        assert_eq!(normalized.calculated_amount, 50.0);
        assert_eq!(normalized.amount, 25.0);
        assert_eq!(normalized.paid_by_name, "Marco");
        assert_eq!(normalized.day_label, "Day 1");
        assert!(normalized.is_shareable());
    }

    #[test]
    fn test_payer_sentinels() {
        let people = participants();
        let directory = ParticipantDirectory::new(&people);
        let normalizer = ExpenseNormalizer::new(&directory);

        let unknown = normalizer.normalize(
            &Expense::shared("e1", 10.0, Some("ghost")),
            ExpenseOrigin::General,
        );
        assert_eq!(unknown.paid_by_name, UNKNOWN_PAYER);
        assert_eq!(unknown.payer, PayerResolution::Unknown);
        assert!(!unknown.is_shareable());

        let unassigned =
            normalizer.normalize(&Expense::shared("e2", 10.0, None), ExpenseOrigin::General);
        assert_eq!(unassigned.paid_by_name, NOT_APPLICABLE);
        assert_eq!(unassigned.payer, PayerResolution::Unassigned);
    }

    #[test]
    fn test_normalize_all_order() {
        let snapshot = TripSnapshot {
            participants: participants(),
            general_expenses: vec![Expense::shared("g1", 30.0, Some("p1"))],
            days: vec![
                Day {
                    expenses: vec![Expense::shared("d1e1", 50.0, Some("p2"))],
                    ..Day::driving("d1", 100.0, "State road")
                },
                Day {
                    expenses: vec![Expense::per_person("d2e1", 5.0, Some("p1"))],
                    ..Day::driving("d2", 150.0, "State road")
                },
            ],
            fuel: FuelConfig {
                cost_per_liter: 2.0,
                km_per_liter: 10.0,
            },
        };
        let directory = ParticipantDirectory::new(&snapshot.participants);
        let fuel = FuelEstimator::estimate(&snapshot.days, &snapshot.fuel, directory.headcount());
        let expenses = ExpenseNormalizer::new(&directory).normalize_all(&snapshot, &fuel);

        let ids: Vec<&str> = expenses.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["fuel_cost", "g1", "d1e1", "d2e1"]);
        assert_eq!(expenses[3].origin, ExpenseOrigin::Day { index: 1 });
        assert_eq!(expenses[3].calculated_amount, 10.0);
    }
}
