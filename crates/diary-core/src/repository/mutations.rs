use crate::error::CoreError;
use crate::repository::SqliteRepository;
use crate::scoping::{MutationPlan, StorageOp};
use async_trait::async_trait;
use sqlx::{Sqlite, Transaction};
use tracing::debug;

#[async_trait]
impl super::MutationRepository for SqliteRepository {
    async fn apply_plan(&self, plan: &MutationPlan) -> Result<(), CoreError> {
        // Dropping the transaction on an early return rolls it back.
        let mut tx = self.pool().begin().await?;
        for op in &plan.ops {
            if !Self::apply_op_in_transaction(&mut tx, op).await? {
                return Err(CoreError::ConcurrentModification(plan.series_id));
            }
        }
        tx.commit().await?;

        debug!(series_id = %plan.series_id, ops = plan.ops.len(), "applied mutation plan");
        Ok(())
    }
}

impl SqliteRepository {
    /// Returns `false` when a versioned row no longer matches.
    async fn apply_op_in_transaction<'a>(tx: &mut Transaction<'a, Sqlite>, op: &StorageOp) -> Result<bool, CoreError> {
        match op {
            StorageOp::InsertSchedule(schedule) => {
                Self::insert_schedule_in_transaction(tx, schedule).await?;
                Ok(true)
            }
            StorageOp::UpdateSchedule { schedule, expected_version } => {
                Self::update_schedule_in_transaction(tx, schedule, *expected_version).await
            }
            StorageOp::DeleteSchedule { id, expected_version } => {
                Self::delete_schedule_in_transaction(tx, *id, *expected_version).await
            }
            StorageOp::TouchSchedule { id, expected_version } => {
                Self::touch_schedule_in_transaction(tx, *id, *expected_version).await
            }
            StorageOp::InsertRule(rule) => {
                Self::insert_rule_in_transaction(tx, rule).await?;
                Ok(true)
            }
            StorageOp::UpdateRule { rule, expected_version } => Self::update_rule_in_transaction(tx, rule, *expected_version).await,
            StorageOp::DeleteRule { id, expected_version } => Self::delete_rule_in_transaction(tx, *id, *expected_version).await,
        }
    }
}
