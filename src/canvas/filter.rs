use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::Deserialize;

use crate::task::Assignment;

#[derive(Deserialize, Debug, Clone)]
pub struct Course {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    pub created_at: Option<DateTime<Utc>>,
    /// Only present on the courses of past (or future) terms.
    pub access_restricted_by_date: Option<bool>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct RawAssignment {
    pub name: String,
    pub due_at: Option<DateTime<Utc>>,
    pub points_possible: Option<f64>,
}

/// Whole days in `delta`, rounded down.
fn whole_days(delta: Duration) -> i64 {
    delta.num_seconds().div_euclid(86_400)
}

/// Picks the courses of the current term.
///
/// Canvas keeps every course a student ever had. Courses restricted by date
/// are dropped, and among the others only the most recently created ones are
/// kept (every course created on that same day counts).
pub fn active_courses(courses: &[Course], now: DateTime<Utc>) -> Vec<&Course> {
    let dated: Vec<(&Course, i64)> = courses
        .iter()
        .filter(|course| course.access_restricted_by_date.is_none())
        .filter_map(|course| {
            course
                .created_at
                .map(|created| (course, whole_days(now - created)))
        })
        .collect();

    let Some(latest) = dated.iter().map(|(_, age)| *age).min() else {
        return vec![];
    };

    dated
        .into_iter()
        .filter(|(_, age)| *age == latest)
        .map(|(course, _)| course)
        .collect()
}

/// Removes the `(NR)` and `(R)` tags teachers put in front of the names.
pub fn clean_name(name: &str) -> String {
    let name = name.strip_prefix("(NR)").unwrap_or(name);
    let name = name.strip_prefix("(R)").unwrap_or(name);

    name.trim().to_string()
}

/// Keeps the graded assignments due within the next `window_days` days.
pub fn select_assignment<Tz: TimeZone>(
    raw: &RawAssignment,
    now: DateTime<Utc>,
    window_days: i64,
    timezone: &Tz,
) -> Option<Assignment> {
    let points = raw.points_possible.filter(|points| *points != 0.0)?;
    let due = raw.due_at?;

    let delta = whole_days(due - now);
    if delta >= window_days || delta < 0 {
        return None;
    }

    Some(Assignment {
        name: clean_name(&raw.name),
        due_date: Some(due.with_timezone(timezone).date_naive()),
        points_possible: points,
    })
}

#[cfg(test)]
mod test {
    use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

    use super::{active_courses, clean_name, select_assignment, Course, RawAssignment};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 4, 15, 0, 0).unwrap()
    }

    fn raw(due_in: Option<Duration>, points: Option<f64>) -> RawAssignment {
        RawAssignment {
            name: "(NR) Essay 2 ".to_string(),
            due_at: due_in.map(|d| now() + d),
            points_possible: points,
        }
    }

    fn course(id: u64, created_days_ago: Option<i64>, restricted: bool) -> Course {
        Course {
            id,
            name: format!("course {}", id),
            created_at: created_days_ago.map(|days| now() - Duration::days(days) - Duration::hours(1)),
            access_restricted_by_date: restricted.then_some(true),
        }
    }

    #[test]
    fn window() {
        let utc = Utc;
        assert!(select_assignment(&raw(Some(Duration::days(20)), Some(10.0)), now(), 14, &utc).is_none());
        assert!(select_assignment(&raw(Some(Duration::days(14)), Some(10.0)), now(), 14, &utc).is_none());
        assert!(select_assignment(&raw(Some(Duration::days(10)), Some(0.0)), now(), 14, &utc).is_none());
        assert!(select_assignment(&raw(Some(Duration::days(-1)), Some(10.0)), now(), 14, &utc).is_none());
        assert!(select_assignment(&raw(Some(Duration::hours(-1)), Some(10.0)), now(), 14, &utc).is_none());
        assert!(select_assignment(&raw(None, Some(10.0)), now(), 14, &utc).is_none());
        assert!(select_assignment(&raw(Some(Duration::days(1)), None), now(), 14, &utc).is_none());

        let assignment = select_assignment(&raw(Some(Duration::days(1)), Some(20.0)), now(), 14, &utc).unwrap();
        assert_eq!(assignment.name, "Essay 2");
        assert_eq!(assignment.due_date, NaiveDate::from_ymd_opt(2025, 3, 5));
        assert_eq!(assignment.points_possible, 20.0);

        // due later today
        assert!(select_assignment(&raw(Some(Duration::hours(3)), Some(5.0)), now(), 14, &utc).is_some());
    }

    #[test]
    fn local_due_date() {
        // 03:59 UTC is still the previous evening in New York
        let assignment = RawAssignment {
            name: "Lab".to_string(),
            due_at: Some(Utc.with_ymd_and_hms(2025, 3, 6, 3, 59, 0).unwrap()),
            points_possible: Some(5.0),
        };

        let selected = select_assignment(&assignment, now(), 14, &chrono_tz::America::New_York).unwrap();
        assert_eq!(selected.due_date, NaiveDate::from_ymd_opt(2025, 3, 5));
    }

    #[test]
    fn names() {
        assert_eq!(clean_name("(NR) Essay 1"), "Essay 1");
        assert_eq!(clean_name("(R)Quiz"), "Quiz");
        assert_eq!(clean_name("(NR)(R) Lab 4 "), "Lab 4");
        assert_eq!(clean_name("Project (R)"), "Project (R)");
    }

    #[test]
    fn current_term() {
        let courses = vec![
            course(1, Some(400), false),
            course(2, Some(30), false),
            course(3, Some(30), false),
            course(4, Some(2), true),
            course(5, None, false),
            course(6, Some(31), false),
        ];

        let ids: Vec<u64> = active_courses(&courses, now()).iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![2, 3]);
        assert!(active_courses(&[], now()).is_empty());
    }
}
