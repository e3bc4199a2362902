use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::MessageError;

/// Sent to the dispatched employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignNotice {
    pub assignment_id: i64,
    pub project_id: i64,
    /// Projects without a region send `null`.
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub project_name: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
}

/// Sent to managers when someone is dispatched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignAlert {
    pub assignment_id: i64,
    pub employee_id: i64,
    #[serde(default)]
    pub employee_name: Option<String>,
    #[serde(default)]
    pub project_name: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
}

/// Sent to the assigner a few days before an assignment ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderNotice {
    pub assignment_id: i64,
    pub employee_id: i64,
    pub project_id: i64,
    pub days_before: u32,
    #[serde(default)]
    pub employee_name: Option<String>,
    #[serde(default)]
    pub project_name: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub end_time: Option<String>,
}

/// A decoded inbound message, discriminated by its `type` field.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    Assign(AssignNotice),
    AssignAlert(AssignAlert),
    Reminder(ReminderNotice),
    /// Any other or missing `type`, or a known `type` whose fields did not
    /// decode. The raw payload is kept.
    System { kind: Option<String>, payload: Value },
}

/// Coarse category for icon selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Assign,
    Reminder,
    System,
}

/// Decode the typed fields of a known kind, or keep the raw payload.
fn typed<T: DeserializeOwned>(
    kind: Option<String>,
    value: Value,
    wrap: fn(T) -> Notification,
) -> Notification {
    match T::deserialize(&value) {
        Ok(fields) => wrap(fields),
        Err(e) => {
            debug!("keeping {kind:?} notice untyped: {e}");
            Notification::System { kind, payload: value }
        }
    }
}

impl Notification {
    /// Decode one frame. Only non-JSON and non-object frames fail; every JSON
    /// object becomes a notification.
    pub fn parse(frame: &str) -> Result<Self, MessageError> {
        let value: Value = serde_json::from_str(frame).map_err(MessageError::Json)?;
        let Some(map) = value.as_object() else {
            return Err(MessageError::NotAnObject);
        };
        let kind = map.get("type").and_then(Value::as_str).map(str::to_owned);
        Ok(match kind.as_deref() {
            Some("assign") => typed(kind, value, Notification::Assign),
            Some("assign_alert") => typed(kind, value, Notification::AssignAlert),
            Some("reminder") => typed(kind, value, Notification::Reminder),
            _ => Notification::System { kind, payload: value },
        })
    }

    pub fn kind(&self) -> NoticeKind {
        match self {
            Notification::Assign(_) | Notification::AssignAlert(_) => NoticeKind::Assign,
            Notification::Reminder(_) => NoticeKind::Reminder,
            Notification::System { kind, .. } => match kind.as_deref() {
                Some("assign" | "assign_alert") => NoticeKind::Assign,
                Some("reminder") => NoticeKind::Reminder,
                _ => NoticeKind::System,
            },
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Notification::Assign(_) => "New assignment",
            Notification::AssignAlert(_) => "Employee dispatched",
            Notification::Reminder(_) => "Assignment ending soon",
            Notification::System { .. } => "System notice",
        }
    }

    pub fn summary(&self) -> String {
        match self {
            Notification::Assign(n) => {
                let project = n
                    .project_name
                    .clone()
                    .unwrap_or_else(|| format!("project {}", n.project_id));
                match &n.region {
                    Some(region) => format!("You have been assigned to {project} in {region}"),
                    None => format!("You have been assigned to {project}"),
                }
            }
            Notification::AssignAlert(n) => {
                let who = n
                    .employee_name
                    .clone()
                    .unwrap_or_else(|| format!("Employee {}", n.employee_id));
                let project = n.project_name.as_deref().unwrap_or("a project");
                match &n.region {
                    Some(region) => format!("{who} was dispatched to {region}/{project}"),
                    None => format!("{who} was dispatched to {project}"),
                }
            }
            Notification::Reminder(n) => {
                let who = n
                    .employee_name
                    .clone()
                    .unwrap_or_else(|| format!("employee {}", n.employee_id));
                let unit = if n.days_before == 1 { "day" } else { "days" };
                format!(
                    "Assignment {} for {who} ends in {} {unit}",
                    n.assignment_id, n.days_before
                )
            }
            Notification::System { payload, .. } => payload
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_owned)
                .unwrap_or_else(|| payload.to_string()),
        }
    }
}
