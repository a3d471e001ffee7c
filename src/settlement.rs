//! Balance settlement
//!
//! Computes each participant's net balance over the shareable expenses, then
//! greedily matches the largest debtor against the largest creditor until one
//! side runs out. Every match zeroes at least one of the two, so a trip with
//! `n` participants settles in at most `n - 1` transactions.

use crate::normalizer::ParticipantDirectory;
use crate::types::{NormalizedExpense, ParticipantBalance, Settlement, SettlementTransaction};

/// Balances smaller than this are considered settled
pub const SETTLEMENT_EPSILON: f64 = 0.01;

/// Calculator for participant balances and settlement transactions
pub struct BalanceCalculator;

impl BalanceCalculator {
    /// Compute balances and the settlement plan
    ///
    /// Only shareable expenses count: the fuel estimate and expenses without a
    /// resolvable payer are ignored, so balances always net to zero.
    pub fn calculate(
        directory: &ParticipantDirectory<'_>,
        expenses: &[NormalizedExpense],
    ) -> Settlement {
        let mut balances: Vec<ParticipantBalance> = directory
            .iter()
            .map(|participant| ParticipantBalance {
                participant_id: participant.id.clone(),
                name: participant.display_name().to_string(),
                paid: 0.0,
                share: 0.0,
                balance: 0.0,
            })
            .collect();

        let mut total_shared = 0.0;
        for expense in expenses.iter().filter(|expense| expense.is_shareable()) {
            let payer = expense
                .paid_by_id
                .as_deref()
                .and_then(|id| directory.position(id));
            if let Some(idx) = payer {
                balances[idx].paid += expense.calculated_amount;
                total_shared += expense.calculated_amount;
            }
        }

        let share_per_person = if balances.is_empty() {
            0.0
        } else {
            total_shared / directory.headcount() as f64
        };

        for entry in &mut balances {
            entry.share = share_per_person;
            entry.balance = entry.paid - share_per_person;
        }

        let transactions = if balances.len() < 2 || total_shared == 0.0 {
            Vec::new()
        } else {
            settle(&balances)
        };

        tracing::trace!(
            participants = balances.len(),
            total_shared,
            transactions = transactions.len(),
            "computed settlement"
        );

        Settlement {
            total_shared,
            share_per_person,
            balances,
            transactions,
        }
    }
}

/// Working position of one participant during matching
struct Position<'b> {
    entry: &'b ParticipantBalance,
    remaining: f64,
}

/// Greedy settlement over arbitrary balances
///
/// Debtors are matched most-negative first against creditors largest first. A
/// side advances only once its own remaining balance drops below
/// [`SETTLEMENT_EPSILON`], so a residue under the epsilon can be left
/// unmatched when the other list runs out first.
pub fn settle(balances: &[ParticipantBalance]) -> Vec<SettlementTransaction> {
    let mut debtors: Vec<Position<'_>> = balances
        .iter()
        .filter(|entry| entry.balance < 0.0)
        .map(|entry| Position {
            entry,
            remaining: entry.balance,
        })
        .collect();
    debtors.sort_by(|a, b| a.remaining.total_cmp(&b.remaining));

    let mut creditors: Vec<Position<'_>> = balances
        .iter()
        .filter(|entry| entry.balance > 0.0)
        .map(|entry| Position {
            entry,
            remaining: entry.balance,
        })
        .collect();
    creditors.sort_by(|a, b| b.remaining.total_cmp(&a.remaining));

    let mut transactions = Vec::new();
    let (mut i, mut j) = (0, 0);

    while i < debtors.len() && j < creditors.len() {
        let debtor = &debtors[i];
        let creditor = &creditors[j];
        let amount = (-debtor.remaining).min(creditor.remaining);

        // Non-finite balances cannot be settled
        if !amount.is_finite() {
            tracing::warn!(
                from = %debtor.entry.participant_id,
                to = %creditor.entry.participant_id,
                "stopping settlement on non-finite balance"
            );
            break;
        }

        transactions.push(SettlementTransaction {
            from_id: debtor.entry.participant_id.clone(),
            from: debtor.entry.name.clone(),
            to_id: creditor.entry.participant_id.clone(),
            to: creditor.entry.name.clone(),
            amount,
        });

        debtors[i].remaining += amount;
        creditors[j].remaining -= amount;

        if debtors[i].remaining.abs() < SETTLEMENT_EPSILON {
            i += 1;
        }
        if creditors[j].remaining.abs() < SETTLEMENT_EPSILON {
            j += 1;
        }
    }

    transactions
}
