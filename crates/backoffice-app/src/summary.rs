// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeMap;

use crate::{Client, Payment, RecordStatus, Role, User};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatusCounts {
    pub active: usize,
    pub inactive: usize,
}

impl StatusCounts {
    fn tally(statuses: impl IntoIterator<Item = RecordStatus>) -> Self {
        statuses
            .into_iter()
            .fold(Self::default(), |mut counts, status| {
                if status.is_active() {
                    counts.active += 1;
                } else {
                    counts.inactive += 1;
                }
                counts
            })
    }

    pub const fn total(self) -> usize {
        self.active + self.inactive
    }
}

/// Read-only figures for the dashboard screen, derived from loaded lists.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DashboardSummary {
    pub clients: StatusCounts,
    pub payments: StatusCounts,
    pub roles: StatusCounts,
    pub users: StatusCounts,
    pub year: i32,
    /// Index 0 is January.
    pub monthly_cents: [i64; 12],
    pub users_per_role: BTreeMap<String, usize>,
}

impl DashboardSummary {
    pub fn compute(
        clients: &[Client],
        payments: &[Payment],
        roles: &[Role],
        users: &[User],
        year: i32,
    ) -> Self {
        let mut monthly_cents = [0_i64; 12];
        for payment in payments
            .iter()
            .filter(|payment| payment.year == year && payment.status.is_active())
        {
            if let Some(slot) = usize::from(payment.month)
                .checked_sub(1)
                .and_then(|index| monthly_cents.get_mut(index))
            {
                *slot = slot.saturating_add(payment.amount_cents);
            }
        }

        let role_names = roles
            .iter()
            .map(|role| (role.id, role.name.as_str()))
            .collect::<BTreeMap<_, _>>();
        let mut users_per_role = BTreeMap::new();
        for user in users {
            let name = role_names
                .get(&user.role_id)
                .copied()
                .filter(|name| !name.is_empty())
                .or_else(|| (!user.role_name.is_empty()).then_some(user.role_name.as_str()))
                .unwrap_or("unassigned");
            *users_per_role.entry(name.to_owned()).or_insert(0) += 1;
        }

        Self {
            clients: StatusCounts::tally(clients.iter().map(|client| client.status)),
            payments: StatusCounts::tally(payments.iter().map(|payment| payment.status)),
            roles: StatusCounts::tally(roles.iter().map(|role| role.status)),
            users: StatusCounts::tally(users.iter().map(|user| user.status)),
            year,
            monthly_cents,
            users_per_role,
        }
    }

    pub fn year_total_cents(&self) -> i64 {
        self.monthly_cents.iter().copied().fold(0, i64::saturating_add)
    }
}

#[cfg(test)]
mod tests {
    use super::DashboardSummary;
    use crate::{ClientId, Payment, PaymentId, RecordStatus, Role, RoleId, User, UserId};

    fn payment(id: i64, month: u8, year: i32, cents: i64, status: RecordStatus) -> Payment {
        Payment {
            id: PaymentId::new(id),
            client_id: ClientId::new(1),
            client_name: "Ana".to_owned(),
            amount_cents: cents,
            month,
            year,
            paid_on: None,
            reference: format!("ref-{id}"),
            status,
        }
    }

    fn user(id: i64, role: i64) -> User {
        User {
            id: UserId::new(id),
            name: format!("user {id}"),
            email: format!("u{id}@example.com"),
            role_id: RoleId::new(role),
            role_name: String::new(),
            status: RecordStatus::Active,
        }
    }

    #[test]
    fn monthly_totals_only_count_active_payments_of_the_year() {
        let payments = [
            payment(1, 1, 2026, 1_000, RecordStatus::Active),
            payment(2, 1, 2026, 500, RecordStatus::Active),
            payment(3, 3, 2026, 700, RecordStatus::Inactive),
            payment(4, 3, 2025, 900, RecordStatus::Active),
            payment(5, 13, 2026, 100, RecordStatus::Active),
        ];
        let summary = DashboardSummary::compute(&[], &payments, &[], &[], 2026);
        assert_eq!(summary.monthly_cents[0], 1_500);
        assert_eq!(summary.monthly_cents[2], 0);
        assert_eq!(summary.year_total_cents(), 1_500);
        assert_eq!(summary.payments.active, 4);
        assert_eq!(summary.payments.inactive, 1);
    }

    #[test]
    fn users_grouped_by_role_name() {
        let roles = [Role {
            id: RoleId::new(1),
            name: "admin".to_owned(),
            description: String::new(),
            status: RecordStatus::Active,
        }];
        let users = [user(1, 1), user(2, 1), user(3, 9)];
        let summary = DashboardSummary::compute(&[], &[], &roles, &users, 2026);
        assert_eq!(summary.users_per_role["admin"], 2);
        assert_eq!(summary.users_per_role["unassigned"], 1);
        assert_eq!(summary.users.total(), 3);
    }
}
