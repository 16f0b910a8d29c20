use async_trait::async_trait;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::sqlite::SqliteConnection;
use std::sync::Arc;

use super::model::SchedulerStateDB;
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::scheduler_states;
use ledgerly_core::scheduler::{SchedulerState, SchedulerStateRepositoryTrait};
use ledgerly_core::Result;

pub struct SchedulerStateRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl SchedulerStateRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        Self { pool, writer }
    }
}

#[async_trait]
impl SchedulerStateRepositoryTrait for SchedulerStateRepository {
    async fn get(&self, job_name: &str) -> Result<Option<SchedulerState>> {
        let mut conn = get_connection(&self.pool)?;
        let row = scheduler_states::table
            .find(job_name)
            .select(SchedulerStateDB::as_select())
            .first::<SchedulerStateDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        row.map(SchedulerState::try_from).transpose()
    }

    async fn save(&self, state: SchedulerState) -> Result<SchedulerState> {
        let row = SchedulerStateDB::from(&state);
        self.writer
            .exec(move |conn| {
                diesel::insert_into(scheduler_states::table)
                    .values(&row)
                    .on_conflict(scheduler_states::job_name)
                    .do_update()
                    .set(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(state)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::setup_db;
    use chrono::{TimeZone, Utc};

    fn state(hour: u32, outcome: &str) -> SchedulerState {
        let slot = Utc.with_ymd_and_hms(2025, 1, 1, hour, 0, 0).unwrap();
        SchedulerState {
            job_name: "invoice-closure".to_string(),
            last_slot: slot,
            last_slot_label: slot.to_rfc3339(),
            last_run_at: slot,
            last_outcome: Some(outcome.to_string()),
        }
    }

    #[tokio::test]
    async fn test_save_overwrites_marker() {
        let db = setup_db();
        let repo = SchedulerStateRepository::new(db.pool.clone(), db.writer.clone());
        assert!(repo.get("invoice-closure").await.unwrap().is_none());

        repo.save(state(12, "ok")).await.unwrap();
        repo.save(state(13, "ok")).await.unwrap();

        let stored = repo.get("invoice-closure").await.unwrap().unwrap();
        assert_eq!(stored, state(13, "ok"));
    }
}
