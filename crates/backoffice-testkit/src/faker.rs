// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use backoffice_app::{
    Client, ClientId, Payment, PaymentId, RecordStatus, Role, RoleId, User, UserId,
};

const FIRST_NAMES: [&str; 16] = [
    "Juan", "Ana", "Lucia", "Mateo", "Sofia", "Diego", "Valeria", "Carlos", "Camila", "Jorge",
    "Elena", "Pablo", "Marta", "Andres", "Rosa", "Tomas",
];
const LAST_NAMES: [&str; 14] = [
    "Perez", "Gomez", "Lopez", "Diaz", "Torres", "Ramirez", "Flores", "Rivera", "Morales",
    "Castro", "Ortiz", "Vargas", "Rojas", "Mendoza",
];
const STREETS: [&str; 10] = [
    "Av. Reforma",
    "Calle Hidalgo",
    "Calle Juarez",
    "Av. Insurgentes",
    "Calle Morelos",
    "Av. Universidad",
    "Calle Allende",
    "Calle Zaragoza",
    "Av. Revolucion",
    "Calle Madero",
];
const DOMAINS: [&str; 4] = ["example.com", "correo.test", "mail.example.org", "office.test"];
const ROLES: [(&str, &str); 4] = [
    ("admin", "full access to every screen"),
    ("cashier", "records and reviews payments"),
    ("support", "maintains client records"),
    ("auditor", "read-only review"),
];

pub const REFERENCE_YEAR: i32 = 2026;

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

/// Everything a populated back office holds.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Dataset {
    pub clients: Vec<Client>,
    pub payments: Vec<Payment>,
    pub roles: Vec<Role>,
    pub users: Vec<User>,
}

/// Seeded generator for plausible back office records. The same seed always
/// yields the same records.
#[derive(Debug, Clone)]
pub struct OfficeFaker {
    rng: DeterministicRng,
}

impl OfficeFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
        }
    }

    pub fn int_n(&mut self, n: usize) -> usize {
        self.rng.int_n(n)
    }

    pub fn client(&mut self, id: i64) -> Client {
        let first = self.pick(&FIRST_NAMES);
        let last = self.pick(&LAST_NAMES);
        let domain = self.pick(&DOMAINS);
        Client {
            id: ClientId::new(id),
            name: format!("{first} {last}"),
            email: format!(
                "{}.{}{id}@{domain}",
                first.to_ascii_lowercase(),
                last.to_ascii_lowercase()
            ),
            phone: format!("55{:08}", self.int_range(0, 99_999_999)),
            address: format!("{} {}", self.pick(&STREETS), self.int_range(1, 999)),
            status: self.status(),
        }
    }

    pub fn payment(&mut self, id: i64, client: &Client) -> Payment {
        let month = self.int_range(1, 12) as u8;
        let day = self.int_range(1, 28);
        Payment {
            id: PaymentId::new(id),
            client_id: client.id,
            client_name: client.name.clone(),
            amount_cents: self.int_range(50, 2_500) * 100 + self.int_range(0, 99),
            month,
            year: REFERENCE_YEAR,
            paid_on: Some(format!("{REFERENCE_YEAR}-{month:02}-{day:02}")),
            reference: format!("PAY-{REFERENCE_YEAR}-{id:04}"),
            status: self.status(),
        }
    }

    pub fn user(&mut self, id: i64, role: &Role) -> User {
        let first = self.pick(&FIRST_NAMES);
        let last = self.pick(&LAST_NAMES);
        User {
            id: UserId::new(id),
            name: format!("{first} {last}"),
            email: format!("{}{id}@office.test", first.to_ascii_lowercase()),
            role_id: role.id,
            role_name: role.name.clone(),
            status: self.status(),
        }
    }

    pub fn dataset(&mut self, clients: usize, payments: usize, users: usize) -> Dataset {
        let roles = ROLES
            .iter()
            .zip(1..)
            .map(|((name, description), id)| Role {
                id: RoleId::new(id),
                name: (*name).to_owned(),
                description: (*description).to_owned(),
                status: RecordStatus::Active,
            })
            .collect::<Vec<_>>();

        let clients = (1..=clients as i64)
            .map(|id| self.client(id))
            .collect::<Vec<_>>();

        let payments = if clients.is_empty() {
            Vec::new()
        } else {
            (1..=payments as i64)
                .map(|id| {
                    let owner = clients[self.int_n(clients.len())].clone();
                    self.payment(id, &owner)
                })
                .collect()
        };

        let users = (1..=users as i64)
            .map(|id| {
                let role = roles[self.int_n(roles.len())].clone();
                self.user(id, &role)
            })
            .collect();

        Dataset {
            clients,
            payments,
            roles,
            users,
        }
    }

    fn status(&mut self) -> RecordStatus {
        // Roughly one record in five is inactive.
        if self.int_n(5) == 0 {
            RecordStatus::Inactive
        } else {
            RecordStatus::Active
        }
    }

    fn pick<'a>(&mut self, options: &'a [&'a str]) -> &'a str {
        options[self.int_n(options.len())]
    }

    fn int_range(&mut self, low: i64, high: i64) -> i64 {
        if high <= low {
            return low;
        }
        low + self.int_n((high - low + 1) as usize) as i64
    }
}
