//! 课程存储操作

use super::SeaOrmStorage;
use crate::entity::courses::{ActiveModel, Column, Entity as Courses};
use crate::entity::scores::{Column as ScoreColumn, Entity as Scores};
use crate::errors::{RatingsError, Result};
use crate::models::{
    MAX_LIST_ROWS,
    courses::{entities::Course, requests::NewCourse},
};
use crate::utils::require_non_empty;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};

impl SeaOrmStorage {
    fn course_model(&self, code: &str, name: &str) -> Result<ActiveModel> {
        let code = require_non_empty("code", code)?;
        let name = require_non_empty("name", name)?;

        Ok(ActiveModel {
            code: Set(code.to_string()),
            name: Set(name.to_string()),
            created_at: Set(self.clock.now_micros()),
        })
    }

    /// 创建课程
    pub async fn add_course_impl(&self, code: &str, name: &str) -> Result<Course> {
        let model = self.course_model(code, name)?;

        let result = model
            .insert(&self.db)
            .await
            .map_err(|e| self.dialect.classify(e, "创建课程失败"))?;

        Ok(result.into_course())
    }

    /// 批量创建课程
    pub async fn add_course_many_impl(&self, courses: Vec<NewCourse>) -> Result<Vec<Course>> {
        // 先校验全部输入，避免开启无意义的事务
        let models = courses
            .iter()
            .map(|c| self.course_model(&c.code, &c.name))
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
                .map_err(|e| self.dialect.classify(e, "批量创建课程失败"))?;
            created.push(result.into_course());
        }

        txn.commit()
            .await
            .map_err(|e| self.dialect.classify(e, "提交事务失败"))?;

        Ok(created)
    }

    /// 删除课程
    pub async fn remove_course_impl(&self, code: &str, force_delete: bool) -> Result<()> {
        let code = require_non_empty("code", code)?;

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| self.dialect.classify(e, "开启事务失败"))?;

        if force_delete {
            Scores::delete_many()
                .filter(ScoreColumn::CourseCode.eq(code))
                .exec(&txn)
                .await
                .map_err(|e| self.dialect.classify(e, "删除课程评分失败"))?;
        }

        let result = Courses::delete_by_id(code.to_string())
            .exec(&txn)
            .await
            .map_err(|e| self.dialect.classify(e, "删除课程失败"))?;

        // 未提交的事务在 drop 时回滚
        if result.rows_affected == 0 {
            return Err(RatingsError::not_found(format!("课程不存在: {code}")));
        }

        txn.commit()
            .await
            .map_err(|e| self.dialect.classify(e, "提交事务失败"))?;

        Ok(())
    }

    /// 通过课程代码获取课程
    pub async fn get_course_impl(&self, code: &str) -> Result<Course> {
        let code = code.trim();
        let result = Courses::find_by_id(code.to_string())
            .one(&self.db)
            .await
            .map_err(|e| self.dialect.classify(e, "查询课程失败"))?;

        result
            .map(|m| m.into_course())
            .ok_or_else(|| RatingsError::not_found(format!("课程不存在: {code}")))
    }

    /// 最近创建的课程
    pub async fn get_last_courses_impl(&self) -> Result<Vec<Course>> {
        let courses = Courses::find()
            .order_by_desc(Column::CreatedAt)
            .limit(MAX_LIST_ROWS)
            .all(&self.db)
            .await
            .map_err(|e| self.dialect.classify(e, "查询课程列表失败"))?;

        Ok(courses.into_iter().map(|m| m.into_course()).collect())
    }
}
