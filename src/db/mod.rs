use crate::db::models::{
    Job, Leader, NewContact, NewPost, NewProject, NewReport, NewSubscriber, Post, Project, Report,
    ReportRow, StaffMember,
};
use crate::db::schema::{
    contacts, jobs, leadership, newsletter_subscribers, posts, projects, reports, staff,
};
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::result::DatabaseErrorKind;
use std::sync::{Arc, Mutex};
use thiserror::Error;

pub mod models;
pub mod schema;

#[derive(Debug, Error)]
pub enum DbError {
    #[error(transparent)]
    Connection(#[from] diesel::ConnectionError),
    #[error(transparent)]
    Query(#[from] diesel::result::Error),
    #[error("stored value is malformed: {0}")]
    Corrupt(#[from] serde_json::Error),
    #[error("database connection lock poisoned")]
    Poisoned,
    #[error(transparent)]
    Join(#[from] tokio::task::JoinError),
}

impl DbError {
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            DbError::Query(diesel::result::Error::DatabaseError(
                DatabaseErrorKind::UniqueViolation,
                _
            ))
        )
    }
}

/// A single SQLite connection shared by all handlers. Diesel is blocking, so
/// every query hops onto the blocking pool.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<SqliteConnection>>,
}

impl Database {
    #[tracing::instrument]
    pub fn open(path: &str) -> Result<Self, DbError> {
        let mut conn = SqliteConnection::establish(path)?;
        conn.batch_execute(schema::BOOTSTRAP_SQL)?;
        tracing::debug!("database ready");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn in_memory() -> Result<Self, DbError> {
        Self::open(":memory:")
    }

    pub async fn run<F, T>(&self, f: F) -> Result<T, DbError>
    where
        F: FnOnce(&mut SqliteConnection) -> Result<T, DbError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = conn.lock().map_err(|_| DbError::Poisoned)?;
            f(&mut *conn)
        })
        .await?
    }

    pub async fn list_projects(&self) -> Result<Vec<Project>, DbError> {
        self.run(|conn| {
            Ok(projects::table
                .order(projects::id.asc())
                .select(Project::as_select())
                .load(conn)?)
        })
        .await
    }

    pub async fn insert_project(&self, project: NewProject) -> Result<Project, DbError> {
        self.run(move |conn| {
            Ok(diesel::insert_into(projects::table)
                .values(&project)
                .returning(Project::as_returning())
                .get_result(conn)?)
        })
        .await
    }

    pub async fn list_posts(&self) -> Result<Vec<Post>, DbError> {
        self.run(|conn| {
            Ok(posts::table
                .order(posts::date.desc())
                .select(Post::as_select())
                .load(conn)?)
        })
        .await
    }

    pub async fn insert_post(&self, post: NewPost) -> Result<Post, DbError> {
        self.run(move |conn| {
            Ok(diesel::insert_into(posts::table)
                .values(&post)
                .returning(Post::as_returning())
                .get_result(conn)?)
        })
        .await
    }

    /// Newest year first.
    pub async fn list_reports(&self) -> Result<Vec<Report>, DbError> {
        self.run(|conn| {
            let rows = reports::table
                .order((reports::year.desc(), reports::id.desc()))
                .select(ReportRow::as_select())
                .load(conn)?;
            rows.into_iter()
                .map(|row| Report::try_from(row).map_err(DbError::from))
                .collect()
        })
        .await
    }

    pub async fn find_report(&self, id: i32) -> Result<Option<Report>, DbError> {
        self.run(move |conn| {
            let row = reports::table
                .find(id)
                .select(ReportRow::as_select())
                .first(conn)
                .optional()?;
            row.map(|r| Report::try_from(r).map_err(DbError::from))
                .transpose()
        })
        .await
    }

    pub async fn insert_report(&self, report: NewReport) -> Result<Report, DbError> {
        self.run(move |conn| {
            let row = diesel::insert_into(reports::table)
                .values(&report)
                .returning(ReportRow::as_returning())
                .get_result(conn)?;
            Ok(Report::try_from(row)?)
        })
        .await
    }

    pub async fn list_leadership(&self) -> Result<Vec<Leader>, DbError> {
        self.run(|conn| {
            Ok(leadership::table
                .order(leadership::id.asc())
                .select(Leader::as_select())
                .load(conn)?)
        })
        .await
    }

    pub async fn list_staff(&self) -> Result<Vec<StaffMember>, DbError> {
        self.run(|conn| {
            Ok(staff::table
                .order(staff::id.asc())
                .select(StaffMember::as_select())
                .load(conn)?)
        })
        .await
    }

    pub async fn list_jobs(&self) -> Result<Vec<Job>, DbError> {
        self.run(|conn| {
            Ok(jobs::table
                .order(jobs::id.asc())
                .select(Job::as_select())
                .load(conn)?)
        })
        .await
    }

    pub async fn insert_contact(&self, contact: NewContact) -> Result<(), DbError> {
        self.run(move |conn| {
            diesel::insert_into(contacts::table)
                .values(&contact)
                .execute(conn)?;
            Ok(())
        })
        .await
    }

    pub async fn insert_subscriber(&self, subscriber: NewSubscriber) -> Result<(), DbError> {
        self.run(move |conn| {
            diesel::insert_into(newsletter_subscribers::table)
                .values(&subscriber)
                .execute(conn)?;
            Ok(())
        })
        .await
    }
}
