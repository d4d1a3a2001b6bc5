use std::cmp::Ordering;

use crate::models::{Appointment, AppointmentError, AppointmentFilters};
use crate::services::validation::appointment_instant;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;

/// Page number (1-based) and page size. Values are not bounded; see `paginate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    pub fn parse(page: Option<&str>, limit: Option<&str>) -> Result<Self, AppointmentError> {
        fn parse_field(name: &str, raw: Option<&str>, default: i64) -> Result<i64, Vec<String>> {
            match raw.map(str::trim).filter(|v| !v.is_empty()) {
                None => Ok(default),
                Some(value) => value
                    .parse::<i64>()
                    .map_err(|_| vec![format!("{} must be an integer", name)]),
            }
        }

        let page = parse_field("page", page, DEFAULT_PAGE);
        let limit = parse_field("limit", limit, DEFAULT_LIMIT);

        match (page, limit) {
            (Ok(page), Ok(limit)) => Ok(Self { page, limit }),
            (page, limit) => {
                let errors = page.err().into_iter().chain(limit.err()).flatten().collect();
                Err(AppointmentError::ValidationFailed(errors))
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct QueryResult {
    pub items: Vec<Appointment>,
    pub total: usize,
    pub page: i64,
    pub limit: i64,
}

impl AppointmentFilters {
    pub fn matches(&self, appointment: &Appointment) -> bool {
        fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
            haystack.to_lowercase().contains(&needle.to_lowercase())
        }

        let date = appointment.appointment_date.as_str();

        self.doctor_name
            .as_deref()
            .map_or(true, |n| contains_ignore_case(&appointment.doctor_name, n))
            && self
                .patient_email
                .as_deref()
                .map_or(true, |e| contains_ignore_case(&appointment.patient_email, e))
            && self.status.as_deref().map_or(true, |s| appointment.status.as_str() == s)
            && self.appointment_date.as_deref().map_or(true, |d| date == d)
            && self.date_from.as_deref().map_or(true, |from| date >= from)
            && self.date_to.as_deref().map_or(true, |to| date <= to)
            && self.priority.as_deref().map_or(true, |p| appointment.priority.as_str() == p)
            && self
                .appointment_type
                .as_deref()
                .map_or(true, |t| appointment.appointment_type.as_str() == t)
    }
}

pub fn apply_filters(records: Vec<Appointment>, filters: &AppointmentFilters) -> Vec<Appointment> {
    records.into_iter().filter(|a| filters.matches(a)).collect()
}

/// Ascending by combined date and time. Records whose date/time cannot be
/// parsed go last, ordered by their raw strings.
pub fn sort_by_schedule(records: &mut [Appointment]) {
    records.sort_by(|a, b| {
        let ia = appointment_instant(&a.appointment_date, &a.appointment_time);
        let ib = appointment_instant(&b.appointment_date, &b.appointment_time);
        let by_instant = match (ia, ib) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        by_instant
            .then_with(|| a.appointment_date.cmp(&b.appointment_date))
            .then_with(|| a.appointment_time.cmp(&b.appointment_time))
    });
}

/// Slice `[(page-1)*limit, (page-1)*limit + limit)`, clamped to the collection.
/// A zero or negative limit, or a page below 1, yields an empty slice.
pub fn paginate(records: Vec<Appointment>, page: PageRequest) -> Vec<Appointment> {
    let len = records.len() as i64;
    let start = page.page.saturating_sub(1).saturating_mul(page.limit);
    let end = start.saturating_add(page.limit);

    if start < 0 || end <= start || start >= len {
        return Vec::new();
    }

    let start = start as usize;
    let end = end.min(len) as usize;
    records.into_iter().skip(start).take(end - start).collect()
}

/// Filter, sort, then slice one page.
pub fn run_query(records: Vec<Appointment>, filters: &AppointmentFilters, page: PageRequest) -> QueryResult {
    let mut matching = apply_filters(records, filters);
    sort_by_schedule(&mut matching);
    let total = matching.len();

    QueryResult {
        items: paginate(matching, page),
        total,
        page: page.page,
        limit: page.limit,
    }
}
