use super::SeaOrmStorage;
use crate::config::DatabaseConfig;
use crate::entity::prelude::Scores;
use crate::errors::RatingsError;
use crate::models::courses::requests::NewCourse;
use crate::storage::Storage;
use crate::utils::with_deadline;
use sea_orm::EntityTrait;
use std::sync::Arc;
use std::time::Duration;

async fn test_storage() -> SeaOrmStorage {
    let config = DatabaseConfig {
        url: "sqlite::memory:".to_string(),
        pool_size: 1,
        timeout: 5,
    };
    SeaOrmStorage::connect(&config).await.unwrap()
}

async fn score_rows(storage: &SeaOrmStorage) -> usize {
    Scores::find().all(&storage.db).await.unwrap().len()
}

/// 一门课程 + 一位教师 + 关联
async fn seed_pair(storage: &SeaOrmStorage) -> String {
    storage
        .add_course("S209", "How to replace head gaskets")
        .await
        .unwrap();
    let prof = storage.add_professor("Walter Sobchak").await.unwrap();
    storage
        .add_course_professor(&prof.uuid, "S209")
        .await
        .unwrap();
    prof.uuid
}

#[tokio::test]
async fn test_schema_init_is_idempotent() {
    let storage = test_storage().await;
    storage.add_course("C100", "Intro").await.unwrap();

    // 同一连接上再次运行迁移不会丢失数据
    use migration::{Migrator, MigratorTrait};
    Migrator::up(&storage.db, None).await.unwrap();
    assert_eq!(storage.get_course("C100").await.unwrap().name, "Intro");
}

#[tokio::test]
async fn test_add_course_validation_and_duplicates() {
    let storage = test_storage().await;

    let course = storage.add_course(" S209 ", "Head gaskets").await.unwrap();
    assert_eq!(course.code, "S209");

    let err = storage.add_course("S209", "Other").await.unwrap_err();
    assert!(matches!(err, RatingsError::DuplicateKey(_)), "{err:?}");

    let err = storage.add_course("", "Name").await.unwrap_err();
    assert!(matches!(err, RatingsError::EmptyValue(_)));
    let err = storage.add_course("S300", "  ").await.unwrap_err();
    assert!(matches!(err, RatingsError::EmptyValue(_)));
}

#[tokio::test]
async fn test_add_course_many_is_atomic() {
    let storage = test_storage().await;
    storage.add_course("B2", "Existing").await.unwrap();

    let err = storage
        .add_course_many(vec![NewCourse::new("B1", "First"), NewCourse::new("B2", "Dup")])
        .await
        .unwrap_err();
    assert!(matches!(err, RatingsError::DuplicateKey(_)));
    assert!(matches!(
        storage.get_course("B1").await.unwrap_err(),
        RatingsError::NotFound(_)
    ));

    let created = storage
        .add_course_many(vec![NewCourse::new("B1", "First"), NewCourse::new("B3", "Third")])
        .await
        .unwrap();
    assert_eq!(created.len(), 2);
    assert_eq!(storage.get_last_courses().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_last_courses_bounded_and_ordered() {
    let storage = test_storage().await;
    let courses: Vec<NewCourse> = (0..150)
        .map(|i| NewCourse::new(format!("C{i:03}"), format!("Course {i}")))
        .collect();
    storage.add_course_many(courses).await.unwrap();

    let last = storage.get_last_courses().await.unwrap();
    assert_eq!(last.len(), 100);
    let codes: Vec<String> = last.iter().map(|c| c.code.clone()).collect();
    let expected: Vec<String> = (50..150).rev().map(|i| format!("C{i:03}")).collect();
    assert_eq!(codes, expected);
}

#[tokio::test]
async fn test_last_courses_single_inserts_newest_first() {
    let storage = test_storage().await;
    for code in ["A", "B", "C"] {
        storage.add_course(code, "Course").await.unwrap();
    }
    let codes: Vec<String> = storage
        .get_last_courses()
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.code)
        .collect();
    assert_eq!(codes, vec!["C", "B", "A"]);
}

#[tokio::test]
async fn test_professor_lifecycle() {
    let storage = test_storage().await;

    let prof = storage.add_professor("Maude Lebowski").await.unwrap();
    assert!(uuid::Uuid::parse_str(&prof.uuid).is_ok());
    assert_eq!(
        storage.get_professor_uuid("Maude Lebowski").await.unwrap(),
        prof.uuid
    );
    assert_eq!(storage.get_professor(&prof.uuid).await.unwrap().name, "Maude Lebowski");

    let err = storage.add_professor("Maude Lebowski").await.unwrap_err();
    assert!(matches!(err, RatingsError::DuplicateKey(_)));

    let err = storage.get_professor_uuid("Jackie Treehorn").await.unwrap_err();
    assert!(matches!(err, RatingsError::NotFound(_)));
}

#[tokio::test]
async fn test_add_professor_many() {
    let storage = test_storage().await;
    let created = storage
        .add_professor_many(vec!["Knox".to_string(), "Harmon".to_string()])
        .await
        .unwrap();
    assert_eq!(created.len(), 2);
    assert_ne!(created[0].uuid, created[1].uuid);

    let err = storage
        .add_professor_many(vec!["Bunny".to_string(), "Knox".to_string()])
        .await
        .unwrap_err();
    assert!(matches!(err, RatingsError::DuplicateKey(_)));
    assert!(storage.get_professor_uuid("Bunny").await.is_err());

    let last = storage.get_last_professors().await.unwrap();
    assert_eq!(last[0].name, "Harmon");
    assert_eq!(last[1].name, "Knox");
}

#[tokio::test]
async fn test_association_rules() {
    let storage = test_storage().await;
    let prof_uuid = seed_pair(&storage).await;

    let err = storage
        .add_course_professor(&prof_uuid, "S209")
        .await
        .unwrap_err();
    assert!(matches!(err, RatingsError::DuplicateKey(_)), "{err:?}");

    let err = storage
        .add_course_professor(&prof_uuid, "NOPE")
        .await
        .unwrap_err();
    assert!(matches!(err, RatingsError::ForeignKeyViolation(_)), "{err:?}");

    let err = storage
        .add_course_professor("00000000-0000-4000-8000-000000000000", "S209")
        .await
        .unwrap_err();
    assert!(matches!(err, RatingsError::ForeignKeyViolation(_)));

    // 关联后尚未评分：分数为未定义
    let scores = storage.get_scores_by_course_code("S209").await.unwrap();
    assert_eq!(scores.len(), 1);
    assert_eq!(scores[0].grade_count, 0);
    assert_eq!(scores[0].score_average, None);
    assert_eq!(scores[0].professor_name, "Walter Sobchak");

    let rows = Scores::find().all(&storage.db).await.unwrap();
    assert!(rows.iter().all(|r| r.is_association()));
}

#[tokio::test]
async fn test_grade_is_idempotent() {
    let storage = test_storage().await;
    let prof_uuid = seed_pair(&storage).await;

    storage
        .grade_course_professor(&prof_uuid, "S209", "dude", [5.0, 4.0, 3.0])
        .await
        .unwrap();
    let after_first = storage.get_scores_by_course_code("S209").await.unwrap();

    let err = storage
        .grade_course_professor(&prof_uuid, "S209", "dude", [0.0, 0.0, 0.0])
        .await
        .unwrap_err();
    assert!(matches!(err, RatingsError::AlreadyGraded(_)), "{err:?}");
    assert_eq!(err.status_code(), 403);

    let after_second = storage.get_scores_by_course_code("S209").await.unwrap();
    assert_eq!(after_first, after_second);
    assert_eq!(after_second[0].score_average, Some(4.0));
    assert_eq!(after_second[0].grade_count, 1);
}

#[tokio::test]
async fn test_average_of_two_users() {
    let storage = test_storage().await;
    let prof_uuid = seed_pair(&storage).await;

    storage
        .grade_course_professor(&prof_uuid, "S209", "dude", [5.0, 4.0, 3.0])
        .await
        .unwrap();
    storage
        .grade_course_professor(&prof_uuid, "S209", "walter", [3.0, 4.0, 5.0])
        .await
        .unwrap();

    let scores = storage.get_scores_by_professor_uuid(&prof_uuid).await.unwrap();
    assert_eq!(scores.len(), 1);
    let score = &scores[0];
    assert_eq!(score.score_teaching, Some(4.0));
    assert_eq!(score.score_coursework, Some(4.0));
    assert_eq!(score.score_learning, Some(4.0));
    assert_eq!(score.score_average, Some(4.0));
    assert_eq!(score.grade_count, 2);
}

#[tokio::test]
async fn test_grade_without_association_and_rounding() {
    let storage = test_storage().await;
    storage.add_course("M1", "Bowling").await.unwrap();
    let prof = storage.add_professor("Jesus Quintana").await.unwrap();

    for (user, grades) in [
        ("a", [5.0, 5.0, 5.0]),
        ("b", [4.0, 4.5, 3.0]),
        ("c", [4.0, 4.0, 3.5]),
    ] {
        storage
            .grade_course_professor(&prof.uuid, "M1", user, grades)
            .await
            .unwrap();
    }

    let score = &storage.get_scores_by_professor_name("Jesus Quintana").await.unwrap()[0];
    assert_eq!(score.score_teaching, Some(4.33));
    assert_eq!(score.score_coursework, Some(4.5));
    assert_eq!(score.score_learning, Some(3.83));
    assert_eq!(score.score_average, Some(4.22));
}

#[tokio::test]
async fn test_grade_rejections() {
    let storage = test_storage().await;
    let prof_uuid = seed_pair(&storage).await;

    let err = storage
        .grade_course_professor(&prof_uuid, "S209", "dude", [5.5, 4.0, 3.0])
        .await
        .unwrap_err();
    assert!(matches!(err, RatingsError::OutOfRange(_)), "{err:?}");

    let err = storage
        .grade_course_professor(&prof_uuid, "S209", "dude", [-1.0, 4.0, 3.0])
        .await
        .unwrap_err();
    assert!(matches!(err, RatingsError::OutOfRange(_)));

    let err = storage
        .grade_course_professor(&prof_uuid, "S209", "", [1.0, 1.0, 1.0])
        .await
        .unwrap_err();
    assert!(matches!(err, RatingsError::EmptyValue(_)));

    let err = storage
        .grade_course_professor(&prof_uuid, "NOPE", "dude", [1.0, 1.0, 1.0])
        .await
        .unwrap_err();
    assert!(matches!(err, RatingsError::ForeignKeyViolation(_)));

    // 被拒绝的评分不会留下任何行，之后的合法评分仍可提交
    assert_eq!(score_rows(&storage).await, 1);
    storage
        .grade_course_professor(&prof_uuid, "S209", "dude", [1.0, 2.0, 3.0])
        .await
        .unwrap();
    assert_eq!(score_rows(&storage).await, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_duplicate_grades() {
    // 文件库 + 多连接，写入真正并发
    let dir = tempfile::tempdir().unwrap();
    let config = DatabaseConfig {
        url: dir.path().join("ratings.db").to_string_lossy().into_owned(),
        pool_size: 8,
        timeout: 10,
    };
    let storage: Arc<dyn Storage> = Arc::new(SeaOrmStorage::connect(&config).await.unwrap());
    storage.add_course("S209", "Gaskets").await.unwrap();
    let prof = storage.add_professor("Walter Sobchak").await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let storage = Arc::clone(&storage);
        let uuid = prof.uuid.clone();
        handles.push(tokio::spawn(async move {
            storage
                .grade_course_professor(&uuid, "S209", "dude", [4.0, 4.0, 4.0])
                .await
        }));
    }

    let mut ok = 0;
    let mut already = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(()) => ok += 1,
            Err(RatingsError::AlreadyGraded(_)) => already += 1,
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }
    assert_eq!(ok, 1);
    assert_eq!(already, 7);

    let scores = storage.get_scores_by_course_code("S209").await.unwrap();
    assert_eq!(scores[0].grade_count, 1);
}

#[tokio::test]
async fn test_remove_professor_force_delete() {
    let storage = test_storage().await;
    let prof_uuid = seed_pair(&storage).await;
    storage
        .grade_course_professor(&prof_uuid, "S209", "dude", [5.0, 4.0, 3.0])
        .await
        .unwrap();

    let err = storage
        .remove_professor(&prof_uuid, false)
        .await
        .unwrap_err();
    assert!(matches!(err, RatingsError::ForeignKeyViolation(_)), "{err:?}");
    assert_eq!(score_rows(&storage).await, 2);
    assert!(storage.get_professor(&prof_uuid).await.is_ok());

    storage.remove_professor(&prof_uuid, true).await.unwrap();
    assert_eq!(score_rows(&storage).await, 0);
    assert!(matches!(
        storage.get_professor(&prof_uuid).await.unwrap_err(),
        RatingsError::NotFound(_)
    ));
    // 课程本身不受影响
    assert!(storage.get_course("S209").await.is_ok());
}

#[tokio::test]
async fn test_remove_course() {
    let storage = test_storage().await;
    let prof_uuid = seed_pair(&storage).await;
    storage.add_course("X1", "Unused").await.unwrap();

    storage.remove_course("X1", false).await.unwrap();
    assert!(storage.get_course("X1").await.is_err());

    let err = storage.remove_course("S209", false).await.unwrap_err();
    assert!(matches!(err, RatingsError::ForeignKeyViolation(_)));

    storage.remove_course("S209", true).await.unwrap();
    assert_eq!(score_rows(&storage).await, 0);
    assert!(storage.get_professor(&prof_uuid).await.is_ok());

    let err = storage.remove_course("S209", true).await.unwrap_err();
    assert!(matches!(err, RatingsError::NotFound(_)));
}

#[tokio::test]
async fn test_substring_search() {
    let storage = test_storage().await;
    let prof_uuid = seed_pair(&storage).await;
    storage.add_course("S210", "Bowling for beginners").await.unwrap();
    storage.add_course_professor(&prof_uuid, "S210").await.unwrap();

    let found = storage
        .get_scores_by_course_name_like("How to rep")
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].course_code, "S209");
    assert_eq!(found[0].course_name, "How to replace head gaskets");

    // 大小写不敏感，通配符按字面匹配
    assert_eq!(
        storage
            .get_scores_by_course_name_like("how TO rep")
            .await
            .unwrap()
            .len(),
        1
    );
    assert!(
        storage
            .get_scores_by_course_name_like("%")
            .await
            .unwrap()
            .is_empty()
    );

    let by_code = storage.get_scores_by_course_code_like("S2").await.unwrap();
    assert_eq!(by_code.len(), 2);
    assert_eq!(by_code[0].course_code, "S210");

    let by_prof = storage
        .get_scores_by_professor_name_like("sobch")
        .await
        .unwrap();
    assert_eq!(by_prof.len(), 2);

    let exact = storage
        .get_scores_by_course_name("How to replace head gaskets")
        .await
        .unwrap();
    assert_eq!(exact.len(), 1);
    assert!(
        storage
            .get_scores_by_course_name("How to rep")
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn test_scores_ordered_by_latest_activity() {
    let storage = test_storage().await;
    let prof_uuid = seed_pair(&storage).await;
    storage.add_course("S210", "Bowling").await.unwrap();
    storage.add_course_professor(&prof_uuid, "S210").await.unwrap();

    let last = storage.get_last_scores().await.unwrap();
    assert_eq!(last[0].course_code, "S210");

    // 对较早的组合评分后，它成为最近变动的一项
    storage
        .grade_course_professor(&prof_uuid, "S209", "dude", [1.0, 1.0, 1.0])
        .await
        .unwrap();
    let last = storage.get_last_scores().await.unwrap();
    assert_eq!(last[0].course_code, "S209");
    assert_eq!(last.len(), 2);
}

#[tokio::test]
async fn test_deadline_wraps_storage_calls() {
    let storage = test_storage().await;
    let course = with_deadline(Duration::from_secs(5), storage.add_course("D1", "Deadline"))
        .await
        .unwrap();
    assert_eq!(course.code, "D1");
}

/// 一位教师关联 120 门课程
async fn seed_many_pairs(storage: &SeaOrmStorage) -> String {
    let courses: Vec<NewCourse> = (0..120)
        .map(|i| NewCourse::new(format!("K{i:03}"), format!("Knox course {i}")))
        .collect();
    storage.add_course_many(courses).await.unwrap();
    let prof = storage.add_professor("Knox Harrington").await.unwrap();
    for i in 0..120 {
        storage
            .add_course_professor(&prof.uuid, &format!("K{i:03}"))
            .await
            .unwrap();
    }
    prof.uuid
}

#[tokio::test]
async fn test_like_queries_capped_at_100() {
    let storage = test_storage().await;
    seed_many_pairs(&storage).await;

    let by_name = storage
        .get_scores_by_course_name_like("knox course")
        .await
        .unwrap();
    assert_eq!(by_name.len(), 100);
    assert_eq!(by_name[0].course_code, "K119");
    assert_eq!(by_name[99].course_code, "K020");

    assert_eq!(
        storage.get_scores_by_course_code_like("K").await.unwrap().len(),
        100
    );
    assert_eq!(
        storage
            .get_scores_by_professor_name_like("harr")
            .await
            .unwrap()
            .len(),
        100
    );
}

#[tokio::test]
async fn test_exact_queries_are_not_capped() {
    let storage = test_storage().await;
    let prof_uuid = seed_many_pairs(&storage).await;

    let by_uuid = storage.get_scores_by_professor_uuid(&prof_uuid).await.unwrap();
    assert_eq!(by_uuid.len(), 120);
    assert_eq!(by_uuid[0].course_code, "K119");
    assert_eq!(by_uuid[119].course_code, "K000");

    assert_eq!(
        storage
            .get_scores_by_professor_name("Knox Harrington")
            .await
            .unwrap()
            .len(),
        120
    );
}

#[tokio::test]
async fn test_last_scores_and_professors_capped_at_100() {
    let storage = test_storage().await;
    seed_many_pairs(&storage).await;

    let last = storage.get_last_scores().await.unwrap();
    assert_eq!(last.len(), 100);
    assert_eq!(last[0].course_code, "K119");

    let names: Vec<String> = (0..120).map(|i| format!("Professor {i:03}")).collect();
    storage.add_professor_many(names).await.unwrap();
    let professors = storage.get_last_professors().await.unwrap();
    assert_eq!(professors.len(), 100);
    assert_eq!(professors[0].name, "Professor 119");
    assert_eq!(professors[99].name, "Professor 020");
}

#[tokio::test]
async fn test_late_association_does_not_reorder_graded_pairs() {
    let storage = test_storage().await;
    storage.add_course("A1", "Course A").await.unwrap();
    storage.add_course("B1", "Course B").await.unwrap();
    storage.add_course("C1", "Course C").await.unwrap();
    let prof = storage.add_professor("Jackie Treehorn").await.unwrap();

    storage
        .grade_course_professor(&prof.uuid, "A1", "dude", [3.0, 3.0, 3.0])
        .await
        .unwrap();
    storage
        .grade_course_professor(&prof.uuid, "B1", "dude", [4.0, 4.0, 4.0])
        .await
        .unwrap();
    // 已评分的组合再补建关联，不应算作新的评分
    storage.add_course_professor(&prof.uuid, "A1").await.unwrap();
    // 只有关联的组合按关联时间排序
    storage.add_course_professor(&prof.uuid, "C1").await.unwrap();

    let codes: Vec<String> = storage
        .get_scores_by_course_name_like("course")
        .await
        .unwrap()
        .into_iter()
        .map(|s| s.course_code)
        .collect();
    assert_eq!(codes, vec!["C1", "B1", "A1"]);

    let a1 = storage.get_scores_by_course_code("A1").await.unwrap();
    assert_eq!(a1[0].grade_count, 1);
    assert_eq!(a1[0].score_average, Some(3.0));
}

#[tokio::test]
async fn test_like_case_folding_is_ascii_only() {
    let storage = test_storage().await;
    let prof = storage.add_professor("Da Fino").await.unwrap();
    storage.add_course("F1", "École normale").await.unwrap();
    storage.add_course_professor(&prof.uuid, "F1").await.unwrap();

    assert_eq!(
        storage
            .get_scores_by_course_name_like("ÉCOLE NORMALE")
            .await
            .unwrap()
            .len(),
        1
    );
    assert!(
        storage
            .get_scores_by_course_name_like("é")
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn test_lookups_trim_input() {
    let storage = test_storage().await;
    let prof_uuid = seed_pair(&storage).await;

    assert_eq!(
        storage.get_professor_uuid("  Walter Sobchak ").await.unwrap(),
        prof_uuid
    );
    assert!(storage.get_professor(&format!(" {prof_uuid} ")).await.is_ok());
    assert_eq!(storage.get_course(" S209 ").await.unwrap().code, "S209");

    assert_eq!(storage.get_scores_by_course_code(" S209 ").await.unwrap().len(), 1);
    assert_eq!(
        storage
            .get_scores_by_professor_name(" Walter Sobchak")
            .await
            .unwrap()
            .len(),
        1
    );
    assert_eq!(
        storage
            .get_scores_by_course_name("How to replace head gaskets  ")
            .await
            .unwrap()
            .len(),
        1
    );
}
