mod common;

use classify_core::classifier::{Backends, Classifier};
use classify_core::jobs::{user_argument, JobKind};
use classify_core::models::ModelKind;
use classify_core::pipeline::process_next_batch;
use classify_core::scanner;
use classify_core::settings::{ModelStatus, SqliteSettings};
use common::FakeInvoker;
use serde_json::json;
use sqlx::SqlitePool;
use std::sync::Arc;
use storage::{connect, faces, jobs, migrate, mounts, queue};

async fn pool() -> SqlitePool {
    let pool = connect("sqlite::memory:").await.unwrap();
    migrate(&pool).await.unwrap();
    pool
}

async fn enqueue(pool: &SqlitePool, model: &str, path: &str, root_id: i64) -> i64 {
    let file_id = storage::files::upsert(pool, path, root_id).await.unwrap();
    queue::push(pool, model, file_id, root_id, path).await.unwrap();
    file_id
}

#[tokio::test]
async fn faces_fan_out_through_mounts_and_cluster_once_per_user() {
    let pool = pool().await;
    // Two users, each mounting the same root twice.
    for (user, point) in [("u1", "/"), ("u1", "/photos"), ("u2", "/"), ("u2", "/shared")] {
        mounts::add(&pool, user, 5, point).await.unwrap();
    }
    let file_id = enqueue(&pool, "faces", "/srv/a.jpg", 5).await;

    let invoker = Arc::new(FakeInvoker::replying(vec![(
        file_id,
        json!([
            {"x": 10, "y": 10, "width": 50, "height": 50, "score": 0.9, "vector": [0.1, 0.2]},
            {"x": 90, "y": 10, "width": 20, "height": 20, "score": 0.5, "vector": [0.3, 0.4]}
        ]),
    )]));
    let classifier = Classifier::new(invoker, Backends::sqlite(pool.clone()));

    let report = process_next_batch(&classifier, &pool, ModelKind::ImageFaces, 10)
        .await
        .unwrap()
        .unwrap();

    let rows = faces::find_by_file_id(&pool, file_id).await.unwrap();
    let users: Vec<&str> = rows.iter().map(|r| r.user_id.as_str()).collect();
    assert_eq!(users, vec!["u1", "u2"]);
    assert_eq!(rows[0].vector, "[0.1,0.2]");
    assert_eq!(rows[0].x, 10.0);
    assert_eq!(report.jobs_enqueued, vec!["u1", "u2"]);
    assert_eq!(jobs::count(&pool, JobKind::ClusterFaces.class()).await.unwrap(), 2);
    assert!(jobs::has(&pool, "cluster_faces", &user_argument("u1").unwrap()).await.unwrap());

    let status = ModelStatus::new(Arc::new(SqliteSettings::new(pool.clone())));
    assert!(status.is_ready("faces").await.unwrap());
    assert_eq!(queue::count(&pool, "faces").await.unwrap(), 0);
}

#[tokio::test]
async fn second_pass_replaces_rows_and_keeps_one_job_per_user() {
    let pool = pool().await;
    mounts::add(&pool, "u1", 5, "/").await.unwrap();
    let file_id = enqueue(&pool, "faces", "/srv/a.jpg", 5).await;

    let invoker = Arc::new(FakeInvoker::replying(vec![(
        file_id,
        json!([{"x": 1, "y": 1, "width": 5, "height": 5, "score": 0.99, "vector": [1.0]}]),
    )]));
    let classifier = Classifier::new(invoker.clone(), Backends::sqlite(pool.clone()));
    process_next_batch(&classifier, &pool, ModelKind::ImageFaces, 10)
        .await
        .unwrap();

    invoker.set_outputs(vec![(
        file_id,
        json!([{"x": 2, "y": 2, "width": 5, "height": 5, "score": 0.99, "vector": [2.0]}]),
    )]);
    queue::push(&pool, "faces", file_id, 5, "/srv/a.jpg").await.unwrap();
    let report = process_next_batch(&classifier, &pool, ModelKind::ImageFaces, 10)
        .await
        .unwrap()
        .unwrap();

    let rows = faces::find_by_file_id(&pool, file_id).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].vector, "[2.0]");
    assert_eq!(report.detections_deleted, 1);
    assert!(report.jobs_enqueued.is_empty());
    assert_eq!(jobs::count(&pool, "cluster_faces").await.unwrap(), 1);
}

#[tokio::test]
async fn unreadable_stored_vector_is_still_purged() {
    let pool = pool().await;
    mounts::add(&pool, "u1", 5, "/").await.unwrap();
    let file_id = enqueue(&pool, "faces", "/srv/a.jpg", 5).await;
    for vector in ["not json", "[0.5]"] {
        sqlx::query(
            "INSERT INTO face_detections (user_id, file_id, x, y, width, height, vector) \
             VALUES ('u1', ?1, 0, 0, 1, 1, ?2)",
        )
        .bind(file_id)
        .bind(vector)
        .execute(&pool)
        .await
        .unwrap();
    }

    let invoker = Arc::new(FakeInvoker::replying(vec![(
        file_id,
        json!([{"x": 3, "y": 3, "width": 5, "height": 5, "score": 0.9, "vector": [3.0]}]),
    )]));
    let classifier = Classifier::new(invoker, Backends::sqlite(pool.clone()));
    let report = process_next_batch(&classifier, &pool, ModelKind::ImageFaces, 10)
        .await
        .unwrap()
        .unwrap();

    let rows = faces::find_by_file_id(&pool, file_id).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].vector, "[3.0]");
    assert_eq!(report.detections_deleted, 2);
    assert!(report.is_clean());
}

#[tokio::test]
async fn failed_batch_stays_queued() {
    let pool = pool().await;
    enqueue(&pool, "musicnn", "/srv/a.mp3", 1).await;
    enqueue(&pool, "musicnn", "/srv/b.mp3", 1).await;

    let classifier = Classifier::new(
        Arc::new(FakeInvoker::timing_out()),
        Backends::sqlite(pool.clone()),
    );
    let err = process_next_batch(&classifier, &pool, ModelKind::AudioTags, 10).await;

    assert!(err.is_err());
    assert_eq!(queue::count(&pool, "musicnn").await.unwrap(), 2);
}

#[tokio::test]
async fn tags_are_stored_and_queue_drains_in_batches() {
    let pool = pool().await;
    let a = enqueue(&pool, "musicnn", "/srv/a.mp3", 1).await;
    let b = enqueue(&pool, "musicnn", "/srv/b.mp3", 1).await;
    let c = enqueue(&pool, "musicnn", "/srv/c.mp3", 1).await;

    let invoker = Arc::new(FakeInvoker::replying(vec![
        (a, json!(["rock"])),
        (b, json!([{"label": "jazz", "score": 0.7}])),
        (c, json!(["pop"])),
    ]));
    let classifier = Classifier::new(invoker.clone(), Backends::sqlite(pool.clone()));

    let first = process_next_batch(&classifier, &pool, ModelKind::AudioTags, 2)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.files, 2);
    assert_eq!(queue::count(&pool, "musicnn").await.unwrap(), 1);

    let second = process_next_batch(&classifier, &pool, ModelKind::AudioTags, 2)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(second.files, 1);
    assert!(process_next_batch(&classifier, &pool, ModelKind::AudioTags, 2)
        .await
        .unwrap()
        .is_none());

    let b_tags = storage::tags::for_file(&pool, b).await.unwrap();
    assert_eq!(b_tags.len(), 1);
    assert_eq!(b_tags[0].name, "jazz");
    assert_eq!(b_tags[0].source, "musicnn");
    assert_eq!(storage::tags::for_file(&pool, c).await.unwrap()[0].name, "pop");
}

#[tokio::test]
async fn scanner_queues_matching_files_once() {
    let pool = pool().await;
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("album")).unwrap();
    std::fs::create_dir_all(dir.path().join(".cache")).unwrap();
    std::fs::write(dir.path().join("album/one.MP3"), b"x").unwrap();
    std::fs::write(dir.path().join("album/two.flac"), b"x").unwrap();
    std::fs::write(dir.path().join("album/cover.jpg"), b"x").unwrap();
    std::fs::write(dir.path().join(".cache/three.mp3"), b"x").unwrap();
    std::fs::write(dir.path().join("skip.mp3"), b"x").unwrap();

    let roots = vec![dir.path().to_path_buf()];
    let excludes = vec!["**/skip.mp3".to_string()];
    let summary = scanner::scan(&roots, &excludes, 3, ModelKind::AudioTags, &pool)
        .await
        .unwrap();
    assert_eq!(summary.discovered, 2);
    assert_eq!(summary.enqueued, 2);

    let again = scanner::scan(&roots, &excludes, 3, ModelKind::AudioTags, &pool)
        .await
        .unwrap();
    assert_eq!(again.discovered, 2);
    assert_eq!(again.enqueued, 0);

    let queued = queue::take(&pool, "musicnn", 10).await.unwrap();
    assert!(queued.iter().all(|e| e.root_id == 3));
}
