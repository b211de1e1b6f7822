//! 聚合评分查询
//!
//! 评分行与课程、教师表连接后按 (教师, 课程) 分组，在读取时计算 AVG()。
//! 两种引擎共用同一条 SQL，只有参数占位符与大小写折叠写法不同。
//! 排序依据是组合内最近一次实际评分的时间；尚未评分的组合才使用关联行的时间。

use super::{Dialect, SeaOrmStorage};
use crate::entity::micros_to_datetime;
use crate::errors::Result;
use crate::grading::Aggregate;
use crate::models::{MAX_LIST_ROWS, scores::entities::Score};
use crate::utils::contains_pattern;
use sea_orm::{ConnectionTrait, FromQueryResult, Statement, Value};

/// 聚合评分的查询条件
#[derive(Debug, Clone, Copy)]
pub(crate) enum ScoreFilter<'a> {
    /// 全部组合，按最近变动排序
    Recent,
    ProfessorUuid(&'a str),
    ProfessorName(&'a str),
    ProfessorNameLike(&'a str),
    CourseCode(&'a str),
    CourseCodeLike(&'a str),
    CourseName(&'a str),
    CourseNameLike(&'a str),
}

impl ScoreFilter<'_> {
    /// 生成 WHERE 子句与参数
    ///
    /// 精确匹配的参数去掉首尾空白，与写入时的处理一致。
    fn predicate(&self, dialect: Dialect) -> Option<(String, Value)> {
        let p = dialect.param(1);
        let like = |column: &str| {
            format!(
                "{} LIKE {} ESCAPE '\\'",
                dialect.fold_case(column),
                dialect.fold_case(&p)
            )
        };
        let (clause, value) = match *self {
            ScoreFilter::Recent => return None,
            ScoreFilter::ProfessorUuid(uuid) => {
                (format!("s.professor_uuid = {p}"), uuid.trim().to_string())
            }
            ScoreFilter::ProfessorName(name) => {
                (format!("p.name = {p}"), name.trim().to_string())
            }
            ScoreFilter::ProfessorNameLike(term) => (like("p.name"), contains_pattern(term)),
            ScoreFilter::CourseCode(code) => {
                (format!("s.course_code = {p}"), code.trim().to_string())
            }
            ScoreFilter::CourseCodeLike(term) => {
                (like("s.course_code"), contains_pattern(term))
            }
            ScoreFilter::CourseName(name) => (format!("c.name = {p}"), name.trim().to_string()),
            ScoreFilter::CourseNameLike(term) => (like("c.name"), contains_pattern(term)),
        };
        Some((clause, Value::from(value)))
    }

    /// 精确匹配返回全部结果，其余最多 100 条
    fn is_bounded(&self) -> bool {
        matches!(
            self,
            ScoreFilter::Recent
                | ScoreFilter::ProfessorNameLike(_)
                | ScoreFilter::CourseCodeLike(_)
                | ScoreFilter::CourseNameLike(_)
        )
    }

    fn to_sql(self, dialect: Dialect) -> (String, Vec<Value>) {
        let (where_clause, values) = match self.predicate(dialect) {
            Some((clause, value)) => (format!("WHERE {clause}"), vec![value]),
            None => (String::new(), Vec::new()),
        };
        let limit = if self.is_bounded() {
            format!("LIMIT {MAX_LIST_ROWS}")
        } else {
            String::new()
        };

        let sql = format!(
            "SELECT s.professor_uuid AS professor_uuid, p.name AS professor_name, \
                    s.course_code AS course_code, c.name AS course_name, \
                    AVG(s.score_teaching) AS avg_teaching, \
                    AVG(s.score_coursework) AS avg_coursework, \
                    AVG(s.score_learning) AS avg_learning, \
                    COUNT(s.hash) AS grade_count, \
                    COALESCE(MAX(CASE WHEN s.hash IS NOT NULL THEN s.inserted_at END), \
                             MAX(s.inserted_at)) AS last_inserted_at \
             FROM scores s \
             JOIN professors p ON p.uuid = s.professor_uuid \
             JOIN courses c ON c.code = s.course_code \
             {where_clause} \
             GROUP BY s.professor_uuid, p.name, s.course_code, c.name \
             ORDER BY last_inserted_at DESC, s.professor_uuid, s.course_code \
             {limit}"
        );
        (sql, values)
    }
}

#[derive(Debug, FromQueryResult)]
struct ScoreRow {
    professor_uuid: String,
    professor_name: String,
    course_code: String,
    course_name: String,
    avg_teaching: Option<f64>,
    avg_coursework: Option<f64>,
    avg_learning: Option<f64>,
    grade_count: i64,
    last_inserted_at: i64,
}

impl ScoreRow {
    fn into_score(self) -> Score {
        let aggregate =
            Aggregate::from_averages(self.avg_teaching, self.avg_coursework, self.avg_learning);

        Score {
            professor_uuid: self.professor_uuid,
            professor_name: self.professor_name,
            course_code: self.course_code,
            course_name: self.course_name,
            score_teaching: aggregate.teaching,
            score_coursework: aggregate.coursework,
            score_learning: aggregate.learning,
            score_average: aggregate.average,
            grade_count: self.grade_count,
            updated_at: micros_to_datetime(self.last_inserted_at),
        }
    }
}

impl SeaOrmStorage {
    /// 按条件查询聚合评分
    pub(crate) async fn find_scores(&self, filter: ScoreFilter<'_>) -> Result<Vec<Score>> {
        let (sql, values) = filter.to_sql(self.dialect);
        let statement =
            Statement::from_sql_and_values(self.db.get_database_backend(), sql, values);

        let rows = ScoreRow::find_by_statement(statement)
            .all(&self.db)
            .await
            .map_err(|e| self.dialect.classify(e, "查询评分失败"))?;

        Ok(rows.into_iter().map(ScoreRow::into_score).collect())
    }
}
