use diesel::prelude::*;

use crate::utils::{format_timestamp, parse_timestamp};
use ledgerly_core::scheduler::SchedulerState;
use ledgerly_core::{Error, Result};

#[derive(Queryable, Identifiable, Insertable, AsChangeset, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::scheduler_states)]
#[diesel(primary_key(job_name))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[diesel(treat_none_as_null = true)]
pub struct SchedulerStateDB {
    pub job_name: String,
    pub last_slot: String,
    pub last_slot_label: String,
    pub last_run_at: String,
    pub last_outcome: Option<String>,
}

impl TryFrom<SchedulerStateDB> for SchedulerState {
    type Error = Error;

    fn try_from(db: SchedulerStateDB) -> Result<Self> {
        Ok(Self {
            last_slot: parse_timestamp(&db.last_slot, "last_slot")?,
            last_run_at: parse_timestamp(&db.last_run_at, "last_run_at")?,
            job_name: db.job_name,
            last_slot_label: db.last_slot_label,
            last_outcome: db.last_outcome,
        })
    }
}

impl From<&SchedulerState> for SchedulerStateDB {
    fn from(domain: &SchedulerState) -> Self {
        Self {
            job_name: domain.job_name.clone(),
            last_slot: format_timestamp(domain.last_slot),
            last_slot_label: domain.last_slot_label.clone(),
            last_run_at: format_timestamp(domain.last_run_at),
            last_outcome: domain.last_outcome.clone(),
        }
    }
}
