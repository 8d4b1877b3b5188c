use serde::{Deserialize, Serialize};
use sqlx::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "userrole", rename_all = "lowercase")]
pub(crate) enum UserRole {
    Student,
    Admin,
}

impl UserRole {
    pub(crate) fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "student" => Some(UserRole::Student),
            "admin" => Some(UserRole::Admin),
            _ => None,
        }
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            UserRole::Student => "student",
            UserRole::Admin => "admin",
        }
    }
}

/// Any assignee may move a task to any status; no ordering is enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Type)]
#[serde(rename_all = "kebab-case")]
#[sqlx(type_name = "taskstatus", rename_all = "kebab-case")]
pub(crate) enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl TaskStatus {
    pub(crate) fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "pending" => Some(TaskStatus::Pending),
            "in-progress" => Some(TaskStatus::InProgress),
            "completed" => Some(TaskStatus::Completed),
            _ => None,
        }
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Completed => "completed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_status_wire_names_match_parse() {
        for status in [TaskStatus::Pending, TaskStatus::InProgress, TaskStatus::Completed] {
            let json = serde_json::to_value(status).unwrap();
            assert_eq!(json, status.as_str());
            assert_eq!(TaskStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(TaskStatus::parse("done"), None);
        assert_eq!(TaskStatus::parse("in_progress"), None);
    }

    #[test]
    fn user_role_parse_is_exact() {
        assert_eq!(UserRole::parse("admin"), Some(UserRole::Admin));
        assert_eq!(UserRole::parse("student"), Some(UserRole::Student));
        assert_eq!(UserRole::parse("teacher"), None);
        assert_eq!(UserRole::parse("Admin"), None);
    }
}
