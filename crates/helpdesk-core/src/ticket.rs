use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Label shown for any code outside the known set.
pub const UNKNOWN_LABEL: &str = "Unknown";

/// Cards show at most this many characters of the description.
pub const SUMMARY_LEN: usize = 150;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum RequestType {
    Review,
    Development,
    Discuss,
    Unknown(i64),
}

impl RequestType {
    pub const ALL: &[RequestType] = &[
        RequestType::Review,
        RequestType::Development,
        RequestType::Discuss,
    ];

    pub fn code(&self) -> i64 {
        match self {
            RequestType::Review => 0,
            RequestType::Development => 1,
            RequestType::Discuss => 2,
            RequestType::Unknown(code) => *code,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(RequestType::Review),
            1 => Some(RequestType::Development),
            2 => Some(RequestType::Discuss),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RequestType::Review => "Review",
            RequestType::Development => "Development",
            RequestType::Discuss => "Discuss",
            RequestType::Unknown(_) => UNKNOWN_LABEL,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, RequestType::Unknown(_))
    }
}

impl From<i64> for RequestType {
    fn from(code: i64) -> Self {
        RequestType::from_code(code).unwrap_or(RequestType::Unknown(code))
    }
}

impl From<RequestType> for i64 {
    fn from(value: RequestType) -> Self {
        value.code()
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum RequestStatus {
    Pending,
    InProcess,
    Done,
    Unknown(i64),
}

impl RequestStatus {
    pub const ALL: &[RequestStatus] = &[
        RequestStatus::Pending,
        RequestStatus::InProcess,
        RequestStatus::Done,
    ];

    pub fn code(&self) -> i64 {
        match self {
            RequestStatus::Pending => 0,
            RequestStatus::InProcess => 1,
            RequestStatus::Done => 2,
            RequestStatus::Unknown(code) => *code,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(RequestStatus::Pending),
            1 => Some(RequestStatus::InProcess),
            2 => Some(RequestStatus::Done),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "Pending",
            RequestStatus::InProcess => "In Process",
            RequestStatus::Done => "Done",
            RequestStatus::Unknown(_) => UNKNOWN_LABEL,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, RequestStatus::Unknown(_))
    }
}

impl From<i64> for RequestStatus {
    fn from(code: i64) -> Self {
        RequestStatus::from_code(code).unwrap_or(RequestStatus::Unknown(code))
    }
}

impl From<RequestStatus> for i64 {
    fn from(value: RequestStatus) -> Self {
        value.code()
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum RequestPriority {
    CanWait,
    Middle,
    Important,
    Unknown(i64),
}

impl RequestPriority {
    pub const ALL: &[RequestPriority] = &[
        RequestPriority::CanWait,
        RequestPriority::Middle,
        RequestPriority::Important,
    ];

    pub fn code(&self) -> i64 {
        match self {
            RequestPriority::CanWait => 0,
            RequestPriority::Middle => 1,
            RequestPriority::Important => 2,
            RequestPriority::Unknown(code) => *code,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(RequestPriority::CanWait),
            1 => Some(RequestPriority::Middle),
            2 => Some(RequestPriority::Important),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RequestPriority::CanWait => "Can Wait",
            RequestPriority::Middle => "Middle",
            RequestPriority::Important => "Important",
            RequestPriority::Unknown(_) => UNKNOWN_LABEL,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, RequestPriority::Unknown(_))
    }
}

impl From<i64> for RequestPriority {
    fn from(code: i64) -> Self {
        RequestPriority::from_code(code).unwrap_or(RequestPriority::Unknown(code))
    }
}

impl From<RequestPriority> for i64 {
    fn from(value: RequestPriority) -> Self {
        value.code()
    }
}

impl fmt::Display for RequestPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A support request as returned by both the client and support endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: RequestType,
    /// Free-text description.
    pub request: String,
    pub priority: RequestPriority,
    pub status: RequestStatus,
    #[serde(default)]
    pub viewed: bool,
    /// The client endpoints omit this field.
    #[serde(
        default,
        deserialize_with = "deserialize_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
}

impl Ticket {
    /// True until a support user has opened the ticket.
    pub fn is_new(&self) -> bool {
        !self.viewed
    }

    /// Description cut to `max` characters, with "..." appended when cut.
    pub fn summary(&self, max: usize) -> String {
        truncate(&self.request, max)
    }
}

pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max).collect();
    out.push_str("...");
    out
}

/// Parse an RFC 3339 timestamp, or a naive one which is taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(s) => parse_timestamp(&s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {s}"))),
    }
}

/// Returns the status to send, or `None` when the change would be a no-op.
pub fn status_transition(current: RequestStatus, target: RequestStatus) -> Option<RequestStatus> {
    if current == target {
        None
    } else {
        Some(target)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    CreatedAt,
    Priority,
}

impl SortField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::Priority => "priority",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TicketSort {
    pub field: SortField,
    pub order: SortOrder,
}

impl TicketSort {
    const CYCLE: &[TicketSort] = &[
        TicketSort {
            field: SortField::CreatedAt,
            order: SortOrder::Asc,
        },
        TicketSort {
            field: SortField::Priority,
            order: SortOrder::Desc,
        },
        TicketSort {
            field: SortField::Priority,
            order: SortOrder::Asc,
        },
    ];

    pub fn label(sort: Option<TicketSort>) -> &'static str {
        match sort {
            None => "Newest first",
            Some(TicketSort {
                field: SortField::CreatedAt,
                order: SortOrder::Desc,
            }) => "Newest first",
            Some(TicketSort {
                field: SortField::CreatedAt,
                order: SortOrder::Asc,
            }) => "Oldest first",
            Some(TicketSort {
                field: SortField::Priority,
                order: SortOrder::Desc,
            }) => "Most important",
            Some(TicketSort {
                field: SortField::Priority,
                order: SortOrder::Asc,
            }) => "Least important",
        }
    }
}

/// Step an optional selection through `all`, wrapping back to `None` after
/// the last entry. Values not in `all` step to `None`.
pub fn cycle<T: Copy + PartialEq>(all: &[T], current: Option<T>) -> Option<T> {
    match current {
        None => all.first().copied(),
        Some(value) => all
            .iter()
            .position(|v| *v == value)
            .and_then(|idx| all.get(idx + 1))
            .copied(),
    }
}

/// List filters; `None` means "all".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TicketFilter {
    pub kind: Option<RequestType>,
    pub status: Option<RequestStatus>,
    pub priority: Option<RequestPriority>,
    pub viewed: Option<bool>,
    pub sort: Option<TicketSort>,
}

impl TicketFilter {
    pub fn is_empty(&self) -> bool {
        *self == TicketFilter::default()
    }

    pub fn cycle_kind(&mut self) {
        self.kind = cycle(RequestType::ALL, self.kind);
    }

    pub fn cycle_status(&mut self) {
        self.status = cycle(RequestStatus::ALL, self.status);
    }

    pub fn cycle_priority(&mut self) {
        self.priority = cycle(RequestPriority::ALL, self.priority);
    }

    pub fn cycle_viewed(&mut self) {
        self.viewed = cycle(&[true, false], self.viewed);
    }

    pub fn cycle_sort(&mut self) {
        self.sort = cycle(TicketSort::CYCLE, self.sort);
    }

    pub fn clear(&mut self) {
        *self = TicketFilter::default();
    }

    /// Query parameters in wire form; absent filters are left out.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(kind) = self.kind {
            params.push(("type", kind.code().to_string()));
        }
        if let Some(status) = self.status {
            params.push(("status", status.code().to_string()));
        }
        if let Some(priority) = self.priority {
            params.push(("priority", priority.code().to_string()));
        }
        if let Some(viewed) = self.viewed {
            params.push(("viewed", viewed.to_string()));
        }
        if let Some(sort) = self.sort {
            params.push(("sort_by", sort.field.as_str().to_string()));
            params.push(("sort_order", sort.order.as_str().to_string()));
        }
        params
    }

    pub fn viewed_label(&self) -> &'static str {
        match self.viewed {
            None => "All",
            Some(true) => "Viewed",
            Some(false) => "Not Viewed",
        }
    }
}
