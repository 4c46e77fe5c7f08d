//! MongoDB index bootstrap
//!
//! Uniqueness rules live in the database so that concurrent inserts cannot
//! slip past an application-level check.

use mongodb::{Database, IndexModel, bson::doc, options::IndexOptions};
use tracing::info;

use super::complaint::COMPLAINTS_COLLECTION;
use super::identity::IDENTITIES_COLLECTION;
use crate::domain::{Complaint, Identity};
use crate::error::Result;

pub async fn ensure_indexes(db: &Database) -> Result<()> {
    let identities = db.collection::<Identity>(IDENTITIES_COLLECTION);
    identities
        .create_index(
            IndexModel::builder()
                .keys(doc! { "email": 1 })
                .options(IndexOptions::builder().unique(true).name("uniq_email".to_string()).build())
                .build(),
        )
        .await?;
    identities
        .create_index(IndexModel::builder().keys(doc! { "role": 1 }).build())
        .await?;

    let complaints = db.collection::<Complaint>(COMPLAINTS_COLLECTION);

    // At most one open complaint per (student, course)
    complaints
        .create_index(
            IndexModel::builder()
                .keys(doc! { "requestingStudent": 1, "courseConcerned": 1 })
                .options(
                    IndexOptions::builder()
                        .unique(true)
                        .partial_filter_expression(doc! { "open": true })
                        .name("uniq_open_complaint".to_string())
                        .build(),
                )
                .build(),
        )
        .await?;

    let lookups = [
        doc! { "respondingLecturer": 1 },
        doc! { "requestingStudent": 1 },
        doc! { "courseConcerned": 1 },
        doc! { "status": 1 },
    ];
    for keys in lookups {
        complaints
            .create_index(IndexModel::builder().keys(keys).build())
            .await?;
    }

    info!("MongoDB indexes ensured");
    Ok(())
}
