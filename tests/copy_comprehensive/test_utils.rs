//! Shared fixtures for the copy suite.

#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use tablecopy::testing::FaultyStore;
use tablecopy::{
    AttributeDefinition, AttributeValue, CopyConfig, CreateTableRequest, Item, KeySchema,
    MemoryStore, ScalarAttributeType, StoreOptions, TableProvisioner,
};

/// Fixed seed so generated datasets are reproducible
pub const SEED: u64 = 0x7ab1_ec09;

pub const SOURCE: &str = "source";
pub const TARGET: &str = "target";

/// Create a table keyed by `id` (S), or `id` + `sk` (N) when `composite`
pub fn create_table(store: &MemoryStore, name: &str, composite: bool) {
    let request = if composite {
        CreateTableRequest::new(
            name,
            KeySchema::hash_range("id", "sk").unwrap(),
            vec![
                AttributeDefinition::new("id", ScalarAttributeType::S),
                AttributeDefinition::new("sk", ScalarAttributeType::N),
            ],
        )
    } else {
        CreateTableRequest::new(
            name,
            KeySchema::hash("id"),
            vec![AttributeDefinition::new("id", ScalarAttributeType::S)],
        )
    };
    store.create_table(request).unwrap();
}

/// Random item with key `id = key-{i}` and a handful of payload attributes
pub fn random_item(rng: &mut StdRng, i: usize) -> Item {
    let mut item = Item::new();
    item.insert("id".to_string(), AttributeValue::S(format!("key-{i}")));
    item.insert(
        "amount".to_string(),
        AttributeValue::N(rng.gen_range(0..1_000_000).to_string()),
    );
    item.insert("active".to_string(), AttributeValue::Bool(rng.gen()));
    let tags: Vec<String> = (0..rng.gen_range(1..4)).map(|t| format!("t{t}")).collect();
    item.insert("tags".to_string(), AttributeValue::Ss(tags));
    item
}

/// Store holding a source table with `rows` random items
pub fn store_with_source(rows: usize, options: StoreOptions) -> MemoryStore {
    let store = MemoryStore::with_options(options);
    create_table(&store, SOURCE, false);
    let mut rng = StdRng::seed_from_u64(SEED);
    for i in 0..rows {
        store.put_item(SOURCE, random_item(&mut rng, i)).unwrap();
    }
    store
}

/// Source with `rows` items plus an empty target, wrapped for fault injection
pub fn faulty_pair(rows: usize) -> Arc<FaultyStore<MemoryStore>> {
    let store = store_with_source(rows, StoreOptions::default());
    create_table(&store, TARGET, false);
    Arc::new(FaultyStore::new(store))
}

/// Config with `scanners` scanners and a small page limit
pub fn config(scanners: u32) -> CopyConfig {
    CopyConfig {
        scanner_count: scanners,
        scan_page_limit: Some(100),
        ..CopyConfig::default()
    }
}
