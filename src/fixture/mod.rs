//! Randomized seed-data synthesis for the mock API.
//!
//! Produces the `{companies, persons, users: []}` document the store
//! serves from. Generation is pure: the same seed always produces the
//! same document, and the only side effect lives in the CLI that writes
//! the file.

use chrono::Utc;
use fake::faker::company::raw::CompanyName;
use fake::faker::internet::raw::SafeEmail;
use fake::faker::job::raw::Title;
use fake::faker::name::raw::{FirstName, LastName};
use fake::faker::phone_number::raw::PhoneNumber;
use fake::locales::EN;
use fake::Fake;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde_json::{json, Value};
use uuid::Uuid;

pub const DEFAULT_COMPANIES: usize = 10;
pub const DEFAULT_PERSONS_PER_COMPANY: usize = 20;

#[derive(Debug, Clone)]
pub struct FixtureOptions {
    pub companies: usize,
    pub persons_per_company: usize,
    pub seed: u64,
}

impl Default for FixtureOptions {
    fn default() -> Self {
        Self {
            companies: DEFAULT_COMPANIES,
            persons_per_company: DEFAULT_PERSONS_PER_COMPANY,
            seed: rand::random(),
        }
    }
}

/// Generate the seed document: `companies`, one batch of `persons` per
/// company, and an empty `users` list for accounts created at runtime.
pub fn generate(options: &FixtureOptions) -> Value {
    let mut rng = ChaCha8Rng::seed_from_u64(options.seed);
    let now = Utc::now().timestamp_millis();

    let companies: Vec<Value> = (0..options.companies)
        .map(|_| company(&mut rng, now))
        .collect();

    let mut persons = Vec::with_capacity(options.companies * options.persons_per_company);
    for company in &companies {
        let company_id = company["id"].clone();
        for _ in 0..options.persons_per_company {
            persons.push(person(&mut rng, company_id.clone(), now));
        }
    }

    json!({
        "companies": companies,
        "persons": persons,
        "users": [],
    })
}

fn company(rng: &mut ChaCha8Rng, now: i64) -> Value {
    let id = Uuid::from_u128(rng.random());
    let name: String = CompanyName(EN).fake_with_rng(rng);
    let thumbnail_seed: u32 = rng.random();

    json!({
        "id": id.to_string(),
        "name": name,
        "createdAt": now,
        "updatedAt": now,
        "thumbnailUrl": format!("https://picsum.photos/seed/{}/200/200", thumbnail_seed),
    })
}

fn person(rng: &mut ChaCha8Rng, company_id: Value, now: i64) -> Value {
    let id = Uuid::from_u128(rng.random());
    let first_name: String = FirstName(EN).fake_with_rng(rng);
    let last_name: String = LastName(EN).fake_with_rng(rng);
    let job_title: String = Title(EN).fake_with_rng(rng);
    let email: String = SafeEmail(EN).fake_with_rng(rng);
    let phone: String = PhoneNumber(EN).fake_with_rng(rng);
    let age: u32 = rng.random_range(18..=65);

    json!({
        "id": id.to_string(),
        "companyId": company_id,
        "firstName": first_name,
        "lastName": last_name,
        "age": age,
        "jobTitle": job_title,
        "email": email,
        "phone": phone,
        "createdAt": now,
        "updatedAt": now,
        "avatarUrl": format!("https://i.pravatar.cc/150?u={}", id),
    })
}
