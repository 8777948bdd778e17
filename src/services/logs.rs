//! Read access to the activity and timeline logs

use crate::{
    error::AppResult,
    models::{
        activity_log::{ActivityLogEntry, ActivityLogQuery},
        parse_date_param,
        timeline_log::{TimelineLogEntry, TimelineLogQuery},
        Page,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct LogsService {
    repository: Repository,
}

impl LogsService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn activity(&self, query: &ActivityLogQuery) -> AppResult<(Vec<ActivityLogEntry>, i64, Page)> {
        let (start, end) = date_range(query.start_date.as_deref(), query.end_date.as_deref())?;
        let page = Page::new(query.page, query.per_page);
        let (entries, total) = self
            .repository
            .activity_logs
            .list(query, start, end, page)
            .await?;
        Ok((entries, total, page))
    }

    pub async fn timeline(&self, query: &TimelineLogQuery) -> AppResult<(Vec<TimelineLogEntry>, i64, Page)> {
        let (start, end) = date_range(query.start_date.as_deref(), query.end_date.as_deref())?;
        let page = Page::new(query.page, query.per_page);
        let (entries, total) = self
            .repository
            .timeline_logs
            .list(query, start, end, page)
            .await?;
        Ok((entries, total, page))
    }
}

fn date_range(
    start: Option<&str>,
    end: Option<&str>,
) -> AppResult<(Option<chrono::NaiveDate>, Option<chrono::NaiveDate>)> {
    let start = start.map(|d| parse_date_param("start_date", d)).transpose()?;
    let end = end.map(|d| parse_date_param("end_date", d)).transpose()?;
    Ok((start, end))
}
