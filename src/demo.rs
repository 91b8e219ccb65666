use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::models::{Dataset, Record};

pub const DEMO_SOURCE: &str = "demo";

const SEED: u64 = 0x5a1e5;
const ORDER_COUNT: usize = 900;

/// (region, state, city)
const GEOGRAPHY: &[(&str, &str, &str)] = &[
    ("East", "New York", "New York City"),
    ("East", "New York", "Buffalo"),
    ("East", "Pennsylvania", "Philadelphia"),
    ("East", "Ohio", "Columbus"),
    ("West", "California", "Los Angeles"),
    ("West", "California", "San Francisco"),
    ("West", "Washington", "Seattle"),
    ("West", "Oregon", "Portland"),
    ("Central", "Texas", "Houston"),
    ("Central", "Texas", "Dallas"),
    ("Central", "Illinois", "Chicago"),
    ("Central", "Michigan", "Detroit"),
    ("South", "Florida", "Jacksonville"),
    ("South", "Kentucky", "Henderson"),
    ("South", "Virginia", "Richmond"),
    ("South", "Georgia", "Atlanta"),
];

/// (category, low, high) price band per line item.
const CATEGORIES: &[(&str, f64, f64)] = &[
    ("Furniture", 40.0, 900.0),
    ("Office Supplies", 3.0, 250.0),
    ("Technology", 20.0, 1800.0),
];

const SEGMENTS: &[&str] = &["Consumer", "Corporate", "Home Office"];

const FIRST_NAMES: &[&str] = &[
    "Claire", "Darrin", "Sean", "Brosina", "Andrew", "Irene", "Harold", "Pete", "Alejandro",
    "Zuschuss", "Ken", "Sandra", "Emily", "Eric", "Tracy", "Matt",
];

const LAST_NAMES: &[&str] = &[
    "Gute", "Van Huff", "O'Donnell", "Hoffman", "Allen", "Maddox", "Pawlan", "Kriz", "Grove",
    "Carroll", "Lonsdale", "Flathers", "Phan", "Hoffmann", "Blount", "Abelman",
];

struct Customer {
    id: String,
    name: String,
    segment: &'static str,
    home: usize,
}

fn customers(rng: &mut StdRng) -> Vec<Customer> {
    let mut out = Vec::new();
    for (i, first) in FIRST_NAMES.iter().enumerate() {
        for (j, last) in LAST_NAMES.iter().enumerate().skip(i % 3).step_by(3) {
            let initials: String = [first, last]
                .iter()
                .filter_map(|s| s.chars().next())
                .collect();
            out.push(Customer {
                id: format!("{initials}-{:05}", 10000 + i * 100 + j),
                name: format!("{first} {last}"),
                segment: SEGMENTS[(i + j) % SEGMENTS.len()],
                home: rng.gen_range(0..GEOGRAPHY.len()),
            });
        }
    }
    out
}

/// Deterministic sample dataset shaped like a four-year store order history.
pub fn demo_dataset() -> Dataset {
    let mut rng = StdRng::seed_from_u64(SEED);
    let customers = customers(&mut rng);
    let start = NaiveDate::from_ymd_opt(2014, 1, 3).unwrap_or_default();
    let span_days = 4 * 365;

    let mut records = Vec::new();
    for n in 0..ORDER_COUNT {
        let Some(customer) = customers.choose(&mut rng) else {
            break;
        };
        // Most orders ship to the customer's home city, some elsewhere.
        let geo = if rng.gen_bool(0.8) {
            customer.home
        } else {
            rng.gen_range(0..GEOGRAPHY.len())
        };
        let (region, state, city) = GEOGRAPHY[geo];
        let order_date = start + Duration::days(rng.gen_range(0..span_days));
        let order_id = format!(
            "{}-{}-{:06}",
            if region == "West" { "US" } else { "CA" },
            chrono::Datelike::year(&order_date),
            100000 + n * 37 % 900000
        );

        let lines = rng.gen_range(1..=4);
        for _ in 0..lines {
            let (category, low, high) = CATEGORIES[rng.gen_range(0..CATEGORIES.len())];
            let sales = (rng.gen_range(low..high) * 100.0).round() / 100.0;
            let margin = rng.gen_range(-0.35..0.45);
            let profit = (sales * margin * 10000.0).round() / 10000.0;
            records.push(Record {
                order_date,
                region: region.to_string(),
                state: state.to_string(),
                city: city.to_string(),
                category: category.to_string(),
                segment: customer.segment.to_string(),
                customer_id: customer.id.clone(),
                customer_name: customer.name.clone(),
                order_id: order_id.clone(),
                sales,
                profit,
            });
        }
    }
    records.sort_by_key(|r| r.order_date);
    Dataset::new(DEMO_SOURCE, records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};

    #[test]
    fn test_demo_is_deterministic() {
        let a = demo_dataset();
        let b = demo_dataset();
        assert_eq!(a.records(), b.records());
    }

    #[test]
    fn test_demo_shape() {
        let ds = demo_dataset();
        assert!(ds.len() >= ORDER_COUNT);
        let regions: HashSet<&str> = ds.records().iter().map(|r| r.region.as_str()).collect();
        assert_eq!(regions.len(), 4);
        assert!(ds.records().iter().all(|r| r.sales > 0.0));
        assert!(ds.records().iter().all(|r| r.profit <= r.sales));
    }

    #[test]
    fn test_demo_hierarchy_is_consistent() {
        // Every city belongs to exactly one state, every state to one region.
        let ds = demo_dataset();
        let mut city_state: HashMap<&str, &str> = HashMap::new();
        let mut state_region: HashMap<&str, &str> = HashMap::new();
        for r in ds.records() {
            assert_eq!(*city_state.entry(&r.city).or_insert(&r.state), r.state);
            assert_eq!(*state_region.entry(&r.state).or_insert(&r.region), r.region);
        }
    }

    #[test]
    fn test_customer_ids_are_unique_per_name() {
        let ds = demo_dataset();
        let mut names: HashMap<&str, &str> = HashMap::new();
        for r in ds.records() {
            assert_eq!(*names.entry(&r.customer_id).or_insert(&r.customer_name), r.customer_name);
        }
    }
}
