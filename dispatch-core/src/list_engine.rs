use crate::incidents::{Incident, Priority, Status};
use chrono::{DateTime, NaiveDate, NaiveDateTime};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Open,
    InProgress,
    Done,
}

impl StatusFilter {
    pub fn parse(value: &str) -> StatusFilter {
        match value.to_lowercase().as_str() {
            "open" => StatusFilter::Open,
            "in_progress" => StatusFilter::InProgress,
            "done" => StatusFilter::Done,
            _ => StatusFilter::All,
        }
    }

    fn matches(self, status: &str) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Open => Status::parse(status) == Some(Status::Open),
            StatusFilter::InProgress => Status::parse(status) == Some(Status::InProgress),
            // Selecting "done" also surfaces records still carrying the
            // legacy "closed" value.
            StatusFilter::Done => Status::is_done(status),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum DelegateFilter {
    #[default]
    All,
    Delegate(String),
}

impl DelegateFilter {
    fn matches(&self, delegated_to: Option<&str>) -> bool {
        match self {
            DelegateFilter::All => true,
            DelegateFilter::Delegate(id) => delegated_to == Some(id.as_str()),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OrderBy {
    #[default]
    Reported,
    Priority,
    Status,
}

impl OrderBy {
    pub fn parse(value: &str) -> OrderBy {
        match value.to_lowercase().as_str() {
            "priority" => OrderBy::Priority,
            "status" => OrderBy::Status,
            _ => OrderBy::Reported,
        }
    }
}

/// Unparsable timestamps coerce to epoch 0 so they sort after every valid
/// record in the reported-descending order.
pub fn reported_epoch(reported_at: &str) -> i64 {
    if let Ok(ts) = DateTime::parse_from_rfc3339(reported_at) {
        return ts.timestamp();
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(reported_at, "%Y-%m-%dT%H:%M:%S") {
        return ts.and_utc().timestamp();
    }
    if let Ok(date) = NaiveDate::parse_from_str(reported_at, "%Y-%m-%d") {
        if let Some(ts) = date.and_hms_opt(0, 0, 0) {
            return ts.and_utc().timestamp();
        }
    }
    0
}

/// Filter conjunctively, then order. Returns a fresh vector; the input is
/// never reordered in place.
pub fn filter_and_sort(
    incidents: &[Incident],
    status: StatusFilter,
    delegate: &DelegateFilter,
    order: OrderBy,
) -> Vec<Incident> {
    let mut out: Vec<Incident> = incidents
        .iter()
        .filter(|i| status.matches(&i.status) && delegate.matches(i.delegated_to.as_deref()))
        .cloned()
        .collect();

    match order {
        OrderBy::Reported => {
            out.sort_by_key(|i| std::cmp::Reverse(reported_epoch(&i.reported_at)));
        }
        OrderBy::Priority => {
            out.sort_by_key(|i| std::cmp::Reverse(Priority::rank(&i.priority)));
        }
        OrderBy::Status => {
            out.sort_by(|a, b| {
                let (ra, rb) = (Status::rank(&a.status), Status::rank(&b.status));
                ra.cmp(&rb).then_with(|| {
                    if ra == 99 && rb == 99 {
                        a.status.cmp(&b.status)
                    } else {
                        std::cmp::Ordering::Equal
                    }
                })
            });
        }
    }

    out
}
