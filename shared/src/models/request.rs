//! Service Request Model

use serde::{Deserialize, Serialize};

/// Service request status.
///
/// `Pending` requests are unassigned; acceptance moves them to
/// `InProgress` and fixes the assignee.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl RequestStatus {
    pub fn next(self) -> Option<RequestStatus> {
        match self {
            RequestStatus::Pending => Some(RequestStatus::InProgress),
            RequestStatus::InProgress => Some(RequestStatus::Completed),
            RequestStatus::Completed => None,
        }
    }

    /// Active requests still demand staff attention.
    pub fn is_active(self) -> bool {
        self != RequestStatus::Completed
    }

    /// Wire/storage string, matches the serde representation.
    pub fn as_str(self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::InProgress => "in_progress",
            RequestStatus::Completed => "completed",
        }
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of assistance a table is asking for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    Waiter,
    Waitress,
    Bartender,
    Security,
    Medical,
    Pos,
    /// Free-text request, requires a message
    Special,
    /// Call a staff member by name, requires the name
    SpecificStaff,
}

impl ServiceType {
    pub fn as_str(self) -> &'static str {
        match self {
            ServiceType::Waiter => "waiter",
            ServiceType::Waitress => "waitress",
            ServiceType::Bartender => "bartender",
            ServiceType::Security => "security",
            ServiceType::Medical => "medical",
            ServiceType::Pos => "pos",
            ServiceType::Special => "special",
            ServiceType::SpecificStaff => "specific_staff",
        }
    }

    /// Display label used by presentation layers.
    pub fn label(self) -> &'static str {
        match self {
            ServiceType::Waiter => "Waiter Request",
            ServiceType::Waitress => "Waitress Request",
            ServiceType::Bartender => "Bartender Request",
            ServiceType::Security => "Security Request",
            ServiceType::Medical => "Medical Emergency",
            ServiceType::Pos => "POS/Receipt Request",
            ServiceType::Special => "Special Request",
            ServiceType::SpecificStaff => "Staff Call",
        }
    }
}

impl std::fmt::Display for ServiceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-type payload of a create-request command.
///
/// `Special` carries the diner's message; `SpecificStaff` carries the
/// named staff member plus optional role and note.
#[derive(Debug, Clone, Default)]
pub struct RequestDetails {
    pub message: Option<String>,
    pub staff_name: Option<String>,
    pub staff_type: Option<String>,
}

impl RequestDetails {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn staff_call(
        name: impl Into<String>,
        staff_type: Option<String>,
        message: Option<String>,
    ) -> Self {
        Self {
            message,
            staff_name: Some(name.into()),
            staff_type,
        }
    }
}

/// Service request entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceRequest {
    pub id: String,
    pub table_number: String,
    pub service_type: ServiceType,
    /// Required for `special`, optional elsewhere
    pub message: Option<String>,
    /// Required for `specific_staff`
    pub staff_name: Option<String>,
    pub staff_type: Option<String>,
    pub status: RequestStatus,
    /// Staff id, set exactly once when the request is accepted
    pub assigned_to: Option<String>,
    /// Server-assigned epoch milliseconds
    pub created_at: i64,
    pub assigned_at: Option<i64>,
    pub completed_at: Option<i64>,
}
