//! 评分提交实体
//!
//! `hash` 为空且三项分数为空的行是课程与教师之间的关联占位行。

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "scores")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique, nullable)]
    pub hash: Option<i64>,
    pub professor_uuid: String,
    pub course_code: String,
    pub score_teaching: Option<f64>,
    pub score_coursework: Option<f64>,
    pub score_learning: Option<f64>,
    pub inserted_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::professors::Entity",
        from = "Column::ProfessorUuid",
        to = "super::professors::Column::Uuid"
    )]
    Professor,
    #[sea_orm(
        belongs_to = "super::courses::Entity",
        from = "Column::CourseCode",
        to = "super::courses::Column::Code"
    )]
    Course,
}

impl Related<super::professors::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Professor.def()
    }
}

impl Related<super::courses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Course.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// 是否为关联占位行
    pub fn is_association(&self) -> bool {
        self.hash.is_none()
    }
}
