use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::{ConnectionTrait, DatabaseBackend};

#[derive(DeriveMigrationName)]
pub struct Migration;

// 三张表的约束在两种引擎中完全一致，只有列类型写法不同
const SQLITE_TABLES: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS courses (
        code TEXT NOT NULL PRIMARY KEY CHECK (length(code) > 0),
        name TEXT NOT NULL CHECK (length(name) > 0),
        created_at INTEGER NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS professors (
        uuid TEXT NOT NULL PRIMARY KEY CHECK (length(uuid) > 0),
        name TEXT NOT NULL UNIQUE CHECK (length(name) > 0),
        created_at INTEGER NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS scores (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        hash INTEGER UNIQUE,
        professor_uuid TEXT NOT NULL REFERENCES professors (uuid),
        course_code TEXT NOT NULL REFERENCES courses (code),
        score_teaching REAL CHECK (score_teaching >= 0 AND score_teaching <= 5),
        score_coursework REAL CHECK (score_coursework >= 0 AND score_coursework <= 5),
        score_learning REAL CHECK (score_learning >= 0 AND score_learning <= 5),
        inserted_at INTEGER NOT NULL,
        CHECK (
            (hash IS NULL AND score_teaching IS NULL AND score_coursework IS NULL AND score_learning IS NULL)
            OR (hash IS NOT NULL AND score_teaching IS NOT NULL AND score_coursework IS NOT NULL AND score_learning IS NOT NULL)
        )
    )"#,
];

const POSTGRES_TABLES: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS courses (
        code TEXT NOT NULL PRIMARY KEY CHECK (length(code) > 0),
        name TEXT NOT NULL CHECK (length(name) > 0),
        created_at BIGINT NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS professors (
        uuid TEXT NOT NULL PRIMARY KEY CHECK (length(uuid) > 0),
        name TEXT NOT NULL UNIQUE CHECK (length(name) > 0),
        created_at BIGINT NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS scores (
        id BIGSERIAL PRIMARY KEY,
        hash BIGINT UNIQUE,
        professor_uuid TEXT NOT NULL REFERENCES professors (uuid),
        course_code TEXT NOT NULL REFERENCES courses (code),
        score_teaching DOUBLE PRECISION CHECK (score_teaching >= 0 AND score_teaching <= 5),
        score_coursework DOUBLE PRECISION CHECK (score_coursework >= 0 AND score_coursework <= 5),
        score_learning DOUBLE PRECISION CHECK (score_learning >= 0 AND score_learning <= 5),
        inserted_at BIGINT NOT NULL,
        CHECK (
            (hash IS NULL AND score_teaching IS NULL AND score_coursework IS NULL AND score_learning IS NULL)
            OR (hash IS NOT NULL AND score_teaching IS NOT NULL AND score_coursework IS NOT NULL AND score_learning IS NOT NULL)
        )
    )"#,
];

// 课程-教师关联占位行（hash 为空）每对只能有一条
const ASSOCIATION_INDEX: &str = "CREATE UNIQUE INDEX IF NOT EXISTS uq_scores_association \
     ON scores (professor_uuid, course_code) WHERE hash IS NULL";

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let tables = match manager.get_database_backend() {
            DatabaseBackend::Sqlite => SQLITE_TABLES,
            DatabaseBackend::Postgres => POSTGRES_TABLES,
            other => {
                return Err(DbErr::Migration(format!(
                    "unsupported database backend: {other:?}"
                )));
            }
        };

        // 创建表
        let conn = manager.get_connection();
        for ddl in tables {
            conn.execute_unprepared(ddl).await?;
        }
        conn.execute_unprepared(ASSOCIATION_INDEX).await?;

        // 创建索引
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_courses_created_at")
                    .table(Courses::Table)
                    .col(Courses::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_professors_created_at")
                    .table(Professors::Table)
                    .col(Professors::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_scores_professor_uuid")
                    .table(Scores::Table)
                    .col(Scores::ProfessorUuid)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_scores_course_code")
                    .table(Scores::Table)
                    .col(Scores::CourseCode)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_scores_inserted_at")
                    .table(Scores::Table)
                    .col(Scores::InsertedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 按照创建的相反顺序删除
        manager
            .drop_table(Table::drop().table(Scores::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Professors::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Courses::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Courses {
    #[sea_orm(iden = "courses")]
    Table,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Professors {
    #[sea_orm(iden = "professors")]
    Table,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Scores {
    #[sea_orm(iden = "scores")]
    Table,
    ProfessorUuid,
    CourseCode,
    InsertedAt,
}
