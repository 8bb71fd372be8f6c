use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::entities::edit_history::{
    ActiveModel as EditHistoryActiveModel, Column, Entity as EditHistory, Model as EditHistoryModel,
};
use crate::repositories::Repository;

use super::BaseRepository;

/// Row to append to the edit history.
#[derive(Debug, Clone)]
pub struct NewEditEntry {
    pub table_name: String,
    pub record_id: String,
    pub field_changed: String,
    pub previous_value: String,
    pub new_value: String,
    pub performed_by: Uuid,
}

/// Append-only access to the generic edit history table.
#[derive(Debug, Clone)]
pub struct EditHistoryRepository {
    base: BaseRepository,
}

impl EditHistoryRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn append(
        &self,
        entry: NewEditEntry,
        at: DateTime<Utc>,
    ) -> Result<EditHistoryModel, DbErr> {
        EditHistoryActiveModel {
            id: Set(Uuid::new_v4()),
            table_name: Set(entry.table_name),
            record_id: Set(entry.record_id),
            field_changed: Set(entry.field_changed),
            previous_value: Set(entry.previous_value),
            new_value: Set(entry.new_value),
            performed_by: Set(entry.performed_by),
            created_at: Set(at),
        }
        .insert(self.base.get_db())
        .await
    }

    /// Entries for one record of one table and field, newest first
    pub async fn list_for(
        &self,
        table_name: &str,
        record_id: &str,
        field_changed: &str,
    ) -> Result<Vec<EditHistoryModel>, DbErr> {
        EditHistory::find()
            .filter(Column::TableName.eq(table_name))
            .filter(Column::RecordId.eq(record_id))
            .filter(Column::FieldChanged.eq(field_changed))
            .order_by_desc(Column::CreatedAt)
            .all(self.base.get_db())
            .await
    }
}
