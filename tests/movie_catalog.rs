use std::sync::Arc;

use movies_api::{
    context::Ctx,
    db,
    error::AppError,
    models::Movie,
    repository::{MovieRepository, SqlMovieRepository},
    service::{CatalogService, MovieService},
};
use tokio::time::Instant;

async fn setup() -> (Arc<SqlMovieRepository>, CatalogService) {
    let conn = db::connect("sqlite::memory:", 1).await.expect("open in-memory db");
    let repo = Arc::new(SqlMovieRepository::new(conn));
    let service = CatalogService::new(repo.clone());
    (repo, service)
}

fn movie(id: i32, title: &str, rating: f64, awards: i32) -> Movie {
    Movie { id, title: title.to_string(), rating, awards, ..Default::default() }
}

#[tokio::test]
async fn seeded_movies_come_back_with_absent_optionals() {
    let (_, svc) = setup().await;
    let ctx = Ctx::background();

    svc.save(&ctx, movie(1, "Avatar", 22.0, 99)).await.unwrap();
    svc.save(&ctx, movie(2, "Simpson", 33.0, 11)).await.unwrap();

    let mut all = svc.get_all(&ctx).await.unwrap();
    all.sort_by_key(|m| m.id);

    assert_eq!(all, vec![movie(1, "Avatar", 22.0, 99), movie(2, "Simpson", 33.0, 11)]);
    assert!(all.iter().all(|m| m.length.is_none() && m.genre_id.is_none()));
}

#[tokio::test]
async fn by_id_and_with_context_return_the_same_movie() {
    let (_, svc) = setup().await;
    let ctx = Ctx::with_timeout(std::time::Duration::from_secs(5));
    let heat = Movie { length: Some(170), genre_id: Some(4), ..movie(3, "Heat", 8.3, 0) };

    let saved = svc.save(&ctx, heat.clone()).await.unwrap();
    assert_eq!(saved, heat);

    let by_id = svc.get_movie_by_id(&ctx, 3).await.unwrap();
    let with_ctx = svc.get_movie_with_context(&ctx, 3).await.unwrap();
    assert_eq!(by_id, with_ctx);
    assert_eq!(by_id.length, Some(170));
    assert_eq!(by_id.genre_id, Some(4));
}

#[tokio::test]
async fn genre_filter_matches_only_that_genre() {
    let (_, svc) = setup().await;
    let ctx = Ctx::background();

    svc.save(&ctx, Movie { genre_id: Some(1), ..movie(1, "Alien", 8.5, 1) }).await.unwrap();
    svc.save(&ctx, Movie { genre_id: Some(2), ..movie(2, "Up", 8.2, 2) }).await.unwrap();
    svc.save(&ctx, Movie { genre_id: Some(1), ..movie(3, "Aliens", 8.4, 2) }).await.unwrap();
    svc.save(&ctx, movie(4, "Untagged", 5.0, 0)).await.unwrap();

    let mut sci_fi = svc.get_all_movies_by_genre(&ctx, 1).await.unwrap();
    sci_fi.sort_by_key(|m| m.id);

    assert_eq!(sci_fi.iter().map(|m| m.id).collect::<Vec<_>>(), vec![1, 3]);
    assert!(svc.get_all_movies_by_genre(&ctx, 9).await.unwrap().is_empty());
}

#[tokio::test]
async fn duplicate_save_is_rejected_and_leaves_row_untouched() {
    let (repo, svc) = setup().await;
    let ctx = Ctx::background();

    svc.save(&ctx, movie(1, "Avatar", 22.0, 99)).await.unwrap();
    let err = svc.save(&ctx, movie(1, "Impostor", 1.0, 0)).await.unwrap_err();

    assert!(matches!(err, AppError::DuplicateKey { id: 1 }));
    assert_eq!(err.to_string(), "error: movie id already exists");
    assert_eq!(repo.get_movie_by_id(&ctx, 1).await.unwrap().title, "Avatar");
    assert_eq!(repo.get_all(&ctx).await.unwrap().len(), 1);
}

#[tokio::test]
async fn exists_tracks_save_and_delete() {
    let (repo, svc) = setup().await;
    let ctx = Ctx::background();

    assert!(!repo.exists(&ctx, 5).await);
    svc.save(&ctx, movie(5, "Fargo", 8.1, 7)).await.unwrap();
    assert!(repo.exists(&ctx, 5).await);

    svc.delete(&ctx, 5).await.unwrap();
    assert!(!repo.exists(&ctx, 5).await);

    let err = svc.get_movie_by_id(&ctx, 5).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(5)));
}

#[tokio::test]
async fn update_returns_what_was_stored() {
    let (_, svc) = setup().await;
    let ctx = Ctx::background();
    svc.save(&ctx, Movie { length: Some(100), ..movie(1, "Avatar", 22.0, 99) }).await.unwrap();

    let changes = Movie { length: None, genre_id: Some(6), ..movie(1, "Avatar: Extended", 25.5, 100) };
    let updated = svc.update(&ctx, changes, 1).await.unwrap();

    assert_eq!(updated.id, 1);
    assert_eq!(updated.title, "Avatar: Extended");
    assert_eq!(updated.rating, 25.5);
    assert_eq!(updated.awards, 100);
    assert_eq!(updated.length, None);
    assert_eq!(updated.genre_id, Some(6));
    assert_eq!(svc.get_movie_by_id(&ctx, 1).await.unwrap(), updated);
}

#[tokio::test]
async fn update_and_delete_of_missing_rows_fail() {
    let (_, svc) = setup().await;
    let ctx = Ctx::background();

    let err = svc.update(&ctx, movie(40, "Nowhere", 1.0, 0), 40).await.unwrap_err();
    assert!(matches!(err, AppError::Exec(_)));

    let err = svc.delete(&ctx, 40).await.unwrap_err();
    assert!(matches!(err, AppError::Exec(_)));
}

#[tokio::test]
async fn expired_context_stops_before_touching_the_datastore() {
    let (repo, svc) = setup().await;
    let expired = Ctx::with_deadline(Instant::now());

    let err = svc.get_all(&expired).await.unwrap_err();
    assert!(matches!(err, AppError::DeadlineExceeded));

    let cancelled = Ctx::background();
    cancelled.cancel();
    let err = svc.save(&cancelled, movie(1, "Avatar", 22.0, 99)).await.unwrap_err();
    assert!(matches!(err, AppError::Cancelled));

    assert!(repo.get_all(&Ctx::background()).await.unwrap().is_empty());
}

#[tokio::test]
async fn concurrent_saves_of_one_id_leave_a_single_row() {
    let (repo, svc) = setup().await;
    let ctx = Ctx::background();

    let (a, b) = tokio::join!(
        svc.save(&ctx, movie(1, "First", 1.0, 0)),
        svc.save(&ctx, movie(1, "Second", 2.0, 0)),
    );

    assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);
    let loser = a.err().or(b.err()).unwrap();
    assert!(matches!(loser, AppError::DuplicateKey { .. } | AppError::Exec(_)));
    assert_eq!(repo.get_all(&ctx).await.unwrap().len(), 1);
}
