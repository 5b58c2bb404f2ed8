use async_trait::async_trait;
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DbErr, ExecResult, FromQueryResult, Statement, Value,
};
use tracing::{debug, warn};

use crate::{
    context::Ctx,
    error::{AppError, AppResult},
    models::Movie,
};

pub const GET_ALL_MOVIES: &str = "SELECT id, title, rating, awards, length, genre_id FROM movies";

pub const GET_MOVIES_BY_GENRE: &str =
    "SELECT id, title, rating, awards, length, genre_id FROM movies WHERE genre_id = ?";

pub const GET_MOVIE: &str =
    "SELECT id, title, rating, awards, length, genre_id FROM movies WHERE id = ?";

pub const EXIST_MOVIE: &str = "SELECT id FROM movies WHERE id = ?";

pub const SAVE_MOVIE: &str = "INSERT INTO movies (id, title, rating, awards, release_date, length, genre_id) \
     VALUES (?, ?, ?, ?, ?, ?, ?)";

pub const UPDATE_MOVIE: &str = "UPDATE movies SET title = ?, rating = ?, awards = ?, length = ?, genre_id = ?, \
     updated_at = CURRENT_TIMESTAMP WHERE id = ?";

pub const DELETE_MOVIE: &str = "DELETE FROM movies WHERE id = ?";

/// Data access for the `movies` table. Owns every statement and row decode;
/// no business rules live here.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MovieRepository: Send + Sync {
    async fn get_all(&self, ctx: &Ctx) -> AppResult<Vec<Movie>>;

    async fn get_all_movies_by_genre(&self, ctx: &Ctx, genre_id: i32) -> AppResult<Vec<Movie>>;

    async fn get_movie_by_id(&self, ctx: &Ctx, id: i32) -> AppResult<Movie>;

    /// Same lookup as [`MovieRepository::get_movie_by_id`], for callers that
    /// hand in a tight deadline.
    async fn get_movie_with_context(&self, ctx: &Ctx, id: i32) -> AppResult<Movie>;

    /// `true` iff exactly one row has `id`. A failed probe reads as `false`.
    async fn exists(&self, ctx: &Ctx, id: i32) -> bool;

    async fn save(&self, ctx: &Ctx, movie: &Movie) -> AppResult<i64>;

    async fn update(&self, ctx: &Ctx, movie: &Movie, id: i32) -> AppResult<()>;

    async fn delete(&self, ctx: &Ctx, id: i32) -> AppResult<()>;
}

#[derive(Debug, FromQueryResult)]
struct MovieRow {
    id: i32,
    title: String,
    rating: f64,
    awards: i32,
    length: Option<i32>,
    genre_id: Option<i32>,
}

impl From<MovieRow> for Movie {
    fn from(row: MovieRow) -> Self {
        Movie {
            id: row.id,
            title: row.title,
            rating: row.rating,
            awards: row.awards,
            length: row.length,
            genre_id: row.genre_id,
            ..Default::default()
        }
    }
}

pub struct SqlMovieRepository {
    db: DatabaseConnection,
}

impl SqlMovieRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn statement<I>(&self, sql: &str, values: I) -> Statement
    where
        I: IntoIterator<Item = Value>,
    {
        Statement::from_sql_and_values(self.db.get_database_backend(), sql, values)
    }

    async fn fetch_many(&self, ctx: &Ctx, stmt: Statement) -> AppResult<Vec<Movie>> {
        ctx.run(async {
            let rows =
                MovieRow::find_by_statement(stmt).all(&self.db).await.map_err(AppError::Query)?;
            Ok(rows.into_iter().map(Movie::from).collect())
        })
        .await
    }

    async fn fetch_one(&self, ctx: &Ctx, id: i32) -> AppResult<Movie> {
        let stmt = self.statement(GET_MOVIE, [id.into()]);
        ctx.run(async {
            MovieRow::find_by_statement(stmt)
                .one(&self.db)
                .await
                .map_err(AppError::Query)?
                .map(Movie::from)
                .ok_or(AppError::NotFound(id))
        })
        .await
    }

    async fn execute(&self, ctx: &Ctx, stmt: Statement) -> AppResult<ExecResult> {
        ctx.run(async { self.db.execute(stmt).await.map_err(AppError::Exec) }).await
    }
}

#[async_trait]
impl MovieRepository for SqlMovieRepository {
    async fn get_all(&self, ctx: &Ctx) -> AppResult<Vec<Movie>> {
        let movies = self.fetch_many(ctx, self.statement(GET_ALL_MOVIES, [])).await?;
        debug!(count = movies.len(), "loaded movies");
        Ok(movies)
    }

    async fn get_all_movies_by_genre(&self, ctx: &Ctx, genre_id: i32) -> AppResult<Vec<Movie>> {
        let stmt = self.statement(GET_MOVIES_BY_GENRE, [genre_id.into()]);
        let movies = self.fetch_many(ctx, stmt).await?;
        debug!(genre_id = genre_id, count = movies.len(), "loaded movies by genre");
        Ok(movies)
    }

    async fn get_movie_by_id(&self, ctx: &Ctx, id: i32) -> AppResult<Movie> {
        self.fetch_one(ctx, id).await
    }

    async fn get_movie_with_context(&self, ctx: &Ctx, id: i32) -> AppResult<Movie> {
        debug!(movie_id = id, deadline = ?ctx.deadline(), "fetching movie");
        self.fetch_one(ctx, id).await
    }

    async fn exists(&self, ctx: &Ctx, id: i32) -> bool {
        let stmt = self.statement(EXIST_MOVIE, [id.into()]);
        let probe =
            ctx.run(async { self.db.query_all(stmt).await.map_err(AppError::Query) }).await;

        match probe {
            Ok(rows) => rows.len() == 1,
            Err(err) => {
                warn!(movie_id = id, error = %err, "existence probe failed, treating as absent");
                false
            },
        }
    }

    async fn save(&self, ctx: &Ctx, movie: &Movie) -> AppResult<i64> {
        let stmt = self.statement(
            SAVE_MOVIE,
            [
                movie.id.into(),
                movie.title.clone().into(),
                movie.rating.into(),
                movie.awards.into(),
                movie.release_date.clone().into(),
                movie.length.into(),
                movie.genre_id.into(),
            ],
        );

        let res = self.execute(ctx, stmt).await?;
        let id = i64::try_from(res.last_insert_id())
            .map_err(|e| AppError::Exec(DbErr::Custom(e.to_string())))?;
        debug!(movie_id = id, "inserted movie");
        Ok(id)
    }

    async fn update(&self, ctx: &Ctx, movie: &Movie, id: i32) -> AppResult<()> {
        let stmt = self.statement(
            UPDATE_MOVIE,
            [
                movie.title.clone().into(),
                movie.rating.into(),
                movie.awards.into(),
                movie.length.into(),
                movie.genre_id.into(),
                id.into(),
            ],
        );

        let res = self.execute(ctx, stmt).await?;
        if res.rows_affected() == 0 {
            return Err(AppError::Exec(DbErr::RecordNotUpdated));
        }
        debug!(movie_id = id, "updated movie");
        Ok(())
    }

    async fn delete(&self, ctx: &Ctx, id: i32) -> AppResult<()> {
        let res = self.execute(ctx, self.statement(DELETE_MOVIE, [id.into()])).await?;
        if res.rows_affected() == 0 {
            return Err(AppError::Exec(DbErr::RecordNotFound(format!("movie {id}"))));
        }
        debug!(movie_id = id, "deleted movie");
        Ok(())
    }
}
