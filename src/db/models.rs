use crate::db::schema::{
    contacts, jobs, leadership, newsletter_subscribers, posts, projects, reports, staff,
};
use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde_derive::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Serialize)]
#[diesel(table_name = projects)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub image: String,
    pub link: String,
    pub is_video: bool,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = projects)]
pub struct NewProject {
    pub title: String,
    pub description: String,
    pub image: String,
    pub link: String,
    pub is_video: bool,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Serialize)]
#[diesel(table_name = posts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Post {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub date: NaiveDateTime,
    pub image: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = posts)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub date: NaiveDateTime,
    pub image: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendingDetail {
    pub category: String,
    pub amount: f64,
    pub description: String,
}

/// Spending details live in a JSON text column; see [`Report`] for the
/// decoded form.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = reports)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ReportRow {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub pdf_link: String,
    pub year: i32,
    pub spending_details: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub pdf_link: String,
    pub year: i32,
    pub spending_details: Vec<SpendingDetail>,
    pub created_at: NaiveDateTime,
}

impl Report {
    pub fn total_spent(&self) -> f64 {
        self.spending_details.iter().map(|d| d.amount).sum()
    }
}

impl TryFrom<ReportRow> for Report {
    type Error = serde_json::Error;

    fn try_from(row: ReportRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            title: row.title,
            description: row.description,
            pdf_link: row.pdf_link,
            year: row.year,
            spending_details: serde_json::from_str(&row.spending_details)?,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = reports)]
pub struct NewReport {
    pub title: String,
    pub description: String,
    pub pdf_link: String,
    pub year: i32,
    pub spending_details: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Serialize)]
#[diesel(table_name = leadership)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Leader {
    pub id: i32,
    pub name: String,
    pub position: String,
    pub bio: String,
    pub image: String,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Serialize)]
#[diesel(table_name = staff)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct StaffMember {
    pub id: i32,
    pub name: String,
    pub role: String,
    pub bio: String,
    pub image: String,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Serialize)]
#[diesel(table_name = jobs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Job {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub location: String,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = contacts)]
pub struct NewContact {
    pub name: String,
    pub email: String,
    pub message: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = newsletter_subscribers)]
pub struct NewSubscriber {
    pub email: String,
    pub created_at: NaiveDateTime,
}
