//! Test fixtures for integration tests.

#![allow(dead_code)]

use mongodb::bson::oid::ObjectId;
use mongodb::bson::{Document, doc};
use serde::{Deserialize, Serialize};

/// Typed document used to exercise `Store<T>` with a caller-defined schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub age: i32,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl User {
    pub fn new(name: &str, age: i32) -> Self {
        Self { id: None, name: name.to_string(), age, tags: Vec::new() }
    }
}

/// Generate a batch of untyped test documents.
pub fn generate_test_documents(count: usize) -> Vec<Document> {
    (0..count)
        .map(|i| {
            doc! {
                "index": i as i32,
                "name": format!("Document {}", i),
                "category": if i % 2 == 0 { "even" } else { "odd" },
                "value": (i * 10) as i32,
            }
        })
        .collect()
}

/// Generate test documents for aggregation pipeline tests.
pub fn aggregation_test_data() -> Vec<Document> {
    vec![
        doc! { "category": "A", "amount": 100, "quantity": 5 },
        doc! { "category": "B", "amount": 200, "quantity": 3 },
        doc! { "category": "A", "amount": 150, "quantity": 2 },
        doc! { "category": "C", "amount": 300, "quantity": 1 },
        doc! { "category": "B", "amount": 250, "quantity": 4 },
        doc! { "category": "A", "amount": 50, "quantity": 10 },
    ]
}
