mod helpers;

use helpers::setup_test_app;
use teachshare_core::AppError;
use uuid::Uuid;

#[tokio::test]
async fn test_two_ratings_average() {
    let t = setup_test_app();
    let doc = t.ingest_text("Quiz", "Quiz", "Maths", "8").await;

    t.app.rate(doc.id, 4).await.unwrap();
    let rating = t.app.rate(doc.id, 2).await.unwrap();

    assert_eq!(rating.times_rated, 2);
    assert_eq!(rating.total_rating, 6);
    assert_eq!(rating.average_rating, 3.0);
    assert_eq!(t.app.rating(doc.id).await.unwrap(), rating);
}

#[tokio::test]
async fn test_average_tracks_every_score() {
    let t = setup_test_app();
    let doc = t.ingest_text("Quiz", "Quiz", "Maths", "8").await;
    let scores = [5, 3, 4, 1, 2, 5, 5];

    for score in scores {
        t.app.rate(doc.id, score).await.unwrap();
    }

    let rating = t.app.rating(doc.id).await.unwrap();
    let sum: i64 = scores.iter().map(|s| i64::from(*s)).sum();
    assert_eq!(rating.times_rated, scores.len() as i64);
    assert_eq!(rating.total_rating, sum);
    assert!((rating.average_rating - sum as f64 / scores.len() as f64).abs() < 1e-9);
}

#[tokio::test]
async fn test_scores_are_not_range_checked() {
    let t = setup_test_app();
    let doc = t.ingest_text("Quiz", "Quiz", "Maths", "8").await;

    t.app.rate(doc.id, 100).await.unwrap();
    let rating = t.app.rate(doc.id, -20).await.unwrap();
    assert_eq!(rating.total_rating, 80);
    assert_eq!(rating.average_rating, 40.0);
}

#[tokio::test]
async fn test_deduplicated_uploads_rate_independently() {
    let t = setup_test_app();
    let first = t.ingest_text("Same", "First", "Maths", "8").await;
    let second = t.ingest_text("Same", "Second", "Maths", "8").await;

    t.app.rate(first.id, 5).await.unwrap();

    assert_eq!(t.app.rating(first.id).await.unwrap().times_rated, 1);
    assert_eq!(t.app.rating(second.id).await.unwrap().times_rated, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_ratings_are_not_lost() {
    let t = setup_test_app();
    let doc = t.ingest_text("Quiz", "Quiz", "Maths", "8").await;

    let handles: Vec<_> = (0..20)
        .map(|_| {
            let app = t.app.clone();
            tokio::spawn(async move { app.rate(doc.id, 3).await })
        })
        .collect();
    for joined in futures::future::join_all(handles).await {
        joined.unwrap().unwrap();
    }

    let rating = t.app.rating(doc.id).await.unwrap();
    assert_eq!(rating.times_rated, 20);
    assert_eq!(rating.total_rating, 60);
    assert_eq!(rating.average_rating, 3.0);
}

#[tokio::test]
async fn test_rating_missing_document_is_not_found() {
    let t = setup_test_app();
    let missing = Uuid::new_v4();

    assert!(matches!(
        t.app.rate(missing, 3).await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        t.app.rating(missing).await,
        Err(AppError::NotFound(_))
    ));
}
