//! 评分写入操作
//!
//! 重复评分只依赖 `scores.hash` 上的唯一约束来拒绝，不做“先查后插”。

use super::SeaOrmStorage;
use crate::entity::scores::{ActiveModel, Entity as Scores};
use crate::errors::{RatingsError, Result};
use crate::grading::{grade_hash, prepare_grades};
use crate::models::scores::requests::Grades;
use crate::utils::require_non_empty;
use sea_orm::{EntityTrait, Set, TransactionTrait};
use tracing::debug;

impl SeaOrmStorage {
    /// 建立课程与教师的关联（插入占位行）
    pub async fn add_course_professor_impl(
        &self,
        professor_uuid: &str,
        course_code: &str,
    ) -> Result<()> {
        let professor_uuid = require_non_empty("professor_uuid", professor_uuid)?;
        let course_code = require_non_empty("course_code", course_code)?;

        let model = ActiveModel {
            hash: Set(None),
            professor_uuid: Set(professor_uuid.to_string()),
            course_code: Set(course_code.to_string()),
            score_teaching: Set(None),
            score_coursework: Set(None),
            score_learning: Set(None),
            inserted_at: Set(self.clock.now_micros()),
            ..Default::default()
        };

        Scores::insert(model)
            .exec(&self.db)
            .await
            .map_err(|e| self.dialect.classify(e, "关联课程与教师失败"))?;

        Ok(())
    }

    /// 提交评分
    pub async fn grade_course_professor_impl(
        &self,
        professor_uuid: &str,
        course_code: &str,
        username: &str,
        grades: Grades,
    ) -> Result<()> {
        let professor_uuid = require_non_empty("professor_uuid", professor_uuid)?;
        let course_code = require_non_empty("course_code", course_code)?;
        let username = require_non_empty("username", username)?;
        let [teaching, coursework, learning] = prepare_grades(&grades)?;

        let hash = grade_hash(username, course_code, professor_uuid);

        let model = ActiveModel {
            hash: Set(Some(hash)),
            professor_uuid: Set(professor_uuid.to_string()),
            course_code: Set(course_code.to_string()),
            score_teaching: Set(Some(teaching)),
            score_coursework: Set(Some(coursework)),
            score_learning: Set(Some(learning)),
            inserted_at: Set(self.clock.now_micros()),
            ..Default::default()
        };

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| self.dialect.classify(e, "开启事务失败"))?;

        Scores::insert(model)
            .exec(&txn)
            .await
            .map_err(|e| match self.dialect.classify(e, "提交评分失败") {
                // 唯一可能冲突的唯一约束就是 hash
                RatingsError::DuplicateKey(_) => RatingsError::already_graded(format!(
                    "{username} has already graded {course_code} with professor {professor_uuid}"
                )),
                other => other,
            })?;

        txn.commit()
            .await
            .map_err(|e| self.dialect.classify(e, "提交事务失败"))?;

        debug!(
            "Grade recorded for course {} / professor {}",
            course_code, professor_uuid
        );

        Ok(())
    }
}
