use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use chrono_tz::Tz;
use log::{debug, info};
use regex::Regex;
use reqwest::header::{HeaderMap, LINK};
use serde::de::DeserializeOwned;

use crate::{
    cfg::CanvasConfig,
    error::{check_status, Error},
    task::Assignment,
};

use self::filter::{active_courses, select_assignment, Course, RawAssignment};

pub mod filter;

const SERVICE: &str = "canvas";

/// The upcoming assignments of one course.
#[derive(Debug, Clone, PartialEq)]
pub struct CourseAssignments {
    pub course: String,
    pub assignments: Vec<Assignment>,
}

/// Where the assignments come from.
#[async_trait]
pub trait AssignmentSource: Send + Sync {
    /// Upcoming assignments of the active courses, in the order canvas lists the courses.
    async fn assignments_by_course(&self) -> Result<Vec<CourseAssignments>, Error>;
}

fn link_pattern() -> Result<Regex, regex::Error> {
    Regex::new(r#"^\s*<([^>]*)>.*;\s*rel="?next"?"#)
}

/// Extracts the url of the next page from a `Link` header.
fn next_link(pattern: &Regex, headers: &HeaderMap) -> Option<String> {
    let links = headers.get(LINK)?.to_str().ok()?;

    links
        .split(',')
        .find_map(|link| pattern.captures(link))
        .map(|captures| captures[1].to_string())
}

pub struct CanvasSource {
    client: reqwest::Client,
    config: CanvasConfig,
    link_pattern: Regex,
    window_days: i64,
    timezone: Tz,
}

impl CanvasSource {
    pub fn new(config: &CanvasConfig, window_days: i64, timezone: Tz) -> Result<Self, anyhow::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout()?)
            .build()?;

        Ok(Self {
            client,
            config: config.clone(),
            link_pattern: link_pattern().context("failed to build regex expression")?,
            window_days,
            timezone,
        })
    }

    /// Fetches every page of a listing endpoint.
    async fn get_all<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, Error> {
        let mut items = vec![];
        let mut next = Some(format!(
            "{}/api/v1/{}?per_page=100",
            self.config.base_url.trim_end_matches('/'),
            path
        ));

        while let Some(url) = next {
            debug!("GET {}", url);
            let response = self
                .client
                .get(&url)
                .bearer_auth(&self.config.token)
                .send()
                .await
                .map_err(Error::transport(SERVICE))?;
            let response = check_status(SERVICE, response).await?;

            next = next_link(&self.link_pattern, response.headers());
            let mut page: Vec<T> = response.json().await.map_err(Error::transport(SERVICE))?;
            items.append(&mut page);
        }

        Ok(items)
    }
}

#[async_trait]
impl AssignmentSource for CanvasSource {
    async fn assignments_by_course(&self) -> Result<Vec<CourseAssignments>, Error> {
        let now = Utc::now();
        let courses: Vec<Course> = self.get_all("courses").await?;
        let active = active_courses(&courses, now);
        info!(
            "{} active courses out of {}",
            active.len(),
            courses.len()
        );

        let mut result = Vec::with_capacity(active.len());
        for course in active {
            let raw: Vec<RawAssignment> = self
                .get_all(&format!("courses/{}/assignments", course.id))
                .await?;

            let assignments: Vec<Assignment> = raw
                .iter()
                .filter_map(|assignment| {
                    select_assignment(assignment, now, self.window_days, &self.timezone)
                })
                .collect();
            debug!(
                "{}: {} upcoming assignments out of {}",
                course.name,
                assignments.len(),
                raw.len()
            );

            result.push(CourseAssignments {
                course: course.name.clone(),
                assignments,
            });
        }

        Ok(result)
    }
}
