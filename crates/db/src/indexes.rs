use mongodb::{Database, IndexModel, options::IndexOptions};
use tracing::info;

pub async fn ensure_indexes(db: &Database) -> Result<(), mongodb::error::Error> {
    // Active participants: presence rows are deleted by sid alone, and the
    // unique compound key enforces one row per participant per room.
    create_indexes(
        db,
        "active_participants",
        vec![
            index_unique(bson::doc! { "participant_sid": 1, "room_name": 1 }),
            index(bson::doc! { "participant_sid": 1 }),
        ],
    )
    .await?;

    // Transcriptions: the (sid, room) pair is a lookup key, not unique;
    // the capture process may write several records per session.
    create_indexes(
        db,
        "transcriptions",
        vec![index(bson::doc! { "participant_sid": 1, "room_name": 1 })],
    )
    .await?;

    // Room events (callback audit log)
    create_indexes(
        db,
        "room_events",
        vec![index(bson::doc! { "room_name": 1, "received_at": -1 })],
    )
    .await?;

    info!("All indexes ensured");
    Ok(())
}

fn index(keys: bson::Document) -> IndexModel {
    IndexModel::builder().keys(keys).build()
}

fn index_unique(keys: bson::Document) -> IndexModel {
    IndexModel::builder()
        .keys(keys)
        .options(IndexOptions::builder().unique(true).build())
        .build()
}

async fn create_indexes(
    db: &Database,
    collection: &str,
    indexes: Vec<IndexModel>,
) -> Result<(), mongodb::error::Error> {
    let coll = db.collection::<bson::Document>(collection);
    match coll.create_indexes(indexes.clone()).await {
        Ok(_) => {
            info!(collection, "Indexes created");
            Ok(())
        }
        Err(e) => {
            // IndexKeySpecsConflict (code 86): an existing index has the same name
            // but different options. Drop the conflicting index and retry.
            if let mongodb::error::ErrorKind::Command(ref cmd_err) = *e.kind {
                if cmd_err.code == 86 {
                    tracing::warn!(
                        collection,
                        "Index conflict detected, dropping conflicting indexes and retrying"
                    );
                    coll.drop_indexes().await?;
                    coll.create_indexes(indexes).await?;
                    info!(collection, "Indexes recreated after conflict resolution");
                    return Ok(());
                }
            }
            Err(e)
        }
    }
}
