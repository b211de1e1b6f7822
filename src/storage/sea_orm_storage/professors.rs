//! 教师存储操作

use super::SeaOrmStorage;
use crate::entity::professors::{ActiveModel, Column, Entity as Professors};
use crate::entity::scores::{Column as ScoreColumn, Entity as Scores};
use crate::errors::{RatingsError, Result};
use crate::models::{MAX_LIST_ROWS, professors::entities::Professor};
use crate::utils::require_non_empty;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use uuid::Uuid;

impl SeaOrmStorage {
    fn professor_model(&self, name: &str) -> Result<ActiveModel> {
        let name = require_non_empty("name", name)?;

        Ok(ActiveModel {
            uuid: Set(Uuid::new_v4().to_string()),
            name: Set(name.to_string()),
            created_at: Set(self.clock.now_micros()),
        })
    }

    /// 创建教师
    pub async fn add_professor_impl(&self, name: &str) -> Result<Professor> {
        let model = self.professor_model(name)?;

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| self.dialect.classify(e, "创建教师失败"))?;

        Ok(result.into_professor())
    }

    /// 批量创建教师
    pub async fn add_professor_many_impl(&self, names: Vec<String>) -> Result<Vec<Professor>> {
        let models = names
            .iter()
            .map(|name| self.professor_model(name))
            .collect::<Result<Vec<_>>>()?;

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| self.dialect.classify(e, "开启事务失败"))?;

        let mut created = Vec::with_capacity(models.len());
        for model in models {
            let result = model
                .insert(&txn)
                .await
                .map_err(|e| self.dialect.classify(e, "批量创建教师失败"))?;
            created.push(result.into_professor());
        }

        txn.commit()
            .await
            .map_err(|e| self.dialect.classify(e, "提交事务失败"))?;

        Ok(created)
    }

    /// 删除教师
    pub async fn remove_professor_impl(&self, uuid: &str, force_delete: bool) -> Result<()> {
        let uuid = require_non_empty("uuid", uuid)?;

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| self.dialect.classify(e, "开启事务失败"))?;

        if force_delete {
            Scores::delete_many()
                .filter(ScoreColumn::ProfessorUuid.eq(uuid))
                .exec(&txn)
                .await
                .map_err(|e| self.dialect.classify(e, "删除教师评分失败"))?;
        }

        let result = Professors::delete_by_id(uuid.to_string())
            .exec(&txn)
            .await
            .map_err(|e| self.dialect.classify(e, "删除教师失败"))?;

        if result.rows_affected == 0 {
            return Err(RatingsError::not_found(format!("教师不存在: {uuid}")));
        }

        txn.commit()
            .await
            .map_err(|e| self.dialect.classify(e, "提交事务失败"))?;

        Ok(())
    }

    /// 通过 UUID 获取教师
    pub async fn get_professor_impl(&self, uuid: &str) -> Result<Professor> {
        let uuid = uuid.trim();
        let result = Professors::find_by_id(uuid.to_string())
            .one(&self.db)
            .await
            .map_err(|e| self.dialect.classify(e, "查询教师失败"))?;

        result
            .map(|m| m.into_professor())
            .ok_or_else(|| RatingsError::not_found(format!("教师不存在: {uuid}")))
    }

    /// 通过姓名获取教师 UUID
    pub async fn get_professor_uuid_impl(&self, name: &str) -> Result<String> {
        // 与写入时一样去掉首尾空白
        let name = name.trim();
        let result = Professors::find()
            .filter(Column::Name.eq(name))
            .one(&self.db)
            .await
            .map_err(|e| self.dialect.classify(e, "查询教师失败"))?;

        result
            .map(|m| m.uuid)
            .ok_or_else(|| RatingsError::not_found(format!("教师不存在: {name}")))
    }

    /// 最近创建的教师
    pub async fn get_last_professors_impl(&self) -> Result<Vec<Professor>> {
        let professors = Professors::find()
            .order_by_desc(Column::CreatedAt)
            .limit(MAX_LIST_ROWS)
            .all(&self.db)
            .await
            .map_err(|e| self.dialect.classify(e, "查询教师列表失败"))?;

        Ok(professors.into_iter().map(|m| m.into_professor()).collect())
    }
}
