use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::DbErr;
use tracing::{debug, warn};

use crate::{
    context::Ctx,
    error::{AppError, AppResult},
    models::Movie,
    repository::MovieRepository,
};

/// Catalog operations exposed to the HTTP layer. This is where the uniqueness
/// rule on create lives and where errors are shaped for callers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MovieService: Send + Sync {
    async fn get_all(&self, ctx: &Ctx) -> AppResult<Vec<Movie>>;

    async fn get_all_movies_by_genre(&self, ctx: &Ctx, genre_id: i32) -> AppResult<Vec<Movie>>;

    async fn get_movie_by_id(&self, ctx: &Ctx, id: i32) -> AppResult<Movie>;

    async fn get_movie_with_context(&self, ctx: &Ctx, id: i32) -> AppResult<Movie>;

    /// Inserts `movie` unless its id is already taken.
    ///
    /// The probe and the insert are separate statements. Two concurrent saves
    /// of the same id can both pass the probe; the loser then fails on the
    /// table's primary key with [`AppError::Exec`].
    async fn save(&self, ctx: &Ctx, movie: Movie) -> AppResult<Movie>;

    /// Replaces the mutable fields of movie `id` and returns the stored row.
    ///
    /// If the write succeeds but the read-back fails, the error is
    /// [`AppError::Refetch`] carrying `movie` as sent.
    async fn update(&self, ctx: &Ctx, movie: Movie, id: i32) -> AppResult<Movie>;

    async fn delete(&self, ctx: &Ctx, id: i32) -> AppResult<()>;
}

pub struct CatalogService {
    repo: Arc<dyn MovieRepository>,
}

impl CatalogService {
    pub fn new(repo: Arc<dyn MovieRepository>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl MovieService for CatalogService {
    async fn get_all(&self, ctx: &Ctx) -> AppResult<Vec<Movie>> {
        self.repo.get_all(ctx).await
    }

    async fn get_all_movies_by_genre(&self, ctx: &Ctx, genre_id: i32) -> AppResult<Vec<Movie>> {
        self.repo.get_all_movies_by_genre(ctx, genre_id).await
    }

    async fn get_movie_by_id(&self, ctx: &Ctx, id: i32) -> AppResult<Movie> {
        self.repo.get_movie_by_id(ctx, id).await
    }

    async fn get_movie_with_context(&self, ctx: &Ctx, id: i32) -> AppResult<Movie> {
        self.repo.get_movie_with_context(ctx, id).await
    }

    async fn save(&self, ctx: &Ctx, mut movie: Movie) -> AppResult<Movie> {
        if self.repo.exists(ctx, movie.id).await {
            debug!(movie_id = movie.id, "rejecting duplicate movie id");
            return Err(AppError::DuplicateKey { id: movie.id });
        }

        let new_id = self.repo.save(ctx, &movie).await?;
        movie.id = i32::try_from(new_id)
            .map_err(|e| AppError::Exec(DbErr::Custom(format!("movie id {new_id}: {e}"))))?;
        Ok(movie)
    }

    async fn update(&self, ctx: &Ctx, movie: Movie, id: i32) -> AppResult<Movie> {
        self.repo.update(ctx, &movie, id).await?;

        match self.repo.get_movie_by_id(ctx, id).await {
            Ok(updated) => Ok(updated),
            Err(err) => {
                warn!(movie_id = id, error = %err, "movie updated but could not be read back");
                Err(AppError::Refetch { written: Box::new(movie), source: Box::new(err) })
            },
        }
    }

    async fn delete(&self, ctx: &Ctx, id: i32) -> AppResult<()> {
        self.repo.delete(ctx, id).await
    }
}
