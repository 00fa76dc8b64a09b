//! Mints stable, human-display `ShortID`s from a Mongo counter document (spec.md I4).

use bson::doc;
use mongodb::options::{FindOneAndUpdateOptions, ReturnDocument};
use mongodb::{Collection, Database};
use rc_common::{Result, ShortId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
struct Counter {
    #[serde(rename = "_id")]
    name: String,
    seq: u64,
}

pub struct ShortIdGenerator {
    counters: Collection<Counter>,
}

impl ShortIdGenerator {
    pub fn new(db: &Database) -> Self {
        Self {
            counters: db.collection("counters"),
        }
    }

    pub async fn next(&self) -> Result<ShortId> {
        let counter = self
            .counters
            .find_one_and_update(
                doc! { "_id": "order_short_id" },
                doc! { "$inc": { "seq": 1i64 } },
            )
            .with_options(
                FindOneAndUpdateOptions::builder()
                    .upsert(true)
                    .return_document(ReturnDocument::After)
                    .build(),
            )
            .await?
            .expect("upsert guarantees a document");

        Ok(ShortId::from_sequence(counter.seq))
    }
}
