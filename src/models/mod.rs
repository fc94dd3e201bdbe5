use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// The role a user signs up with. Fixed for the lifetime of the account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Creator,
    Editor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Creator => "creator",
            Role::Editor => "editor",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "creator" => Ok(Role::Creator),
            "editor" => Ok(Role::Editor),
            other => Err(format!("Unknown role '{}'. Use 'creator' or 'editor'.", other)),
        }
    }
}

/// A directory record. Not `Serialize`; responses carry `UserSummary` or
/// `Profile` instead.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }

    pub fn profile(&self) -> Profile {
        Profile {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoStatus {
    #[default]
    Pending,
    Edited,
    Approved,
}

impl VideoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoStatus::Pending => "pending",
            VideoStatus::Edited => "edited",
            VideoStatus::Approved => "approved",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: Uuid,
    pub url: String,
    pub provider_ref: String,
    pub uploaded_by: Uuid,
    #[serde(default)]
    pub uploaded_for: Option<Uuid>,
    pub original_name: String,
    #[serde(default)]
    pub status: VideoStatus,
    pub uploaded_at: DateTime<Utc>,
    #[serde(default)]
    pub assigned_editors: Vec<Uuid>,
    #[serde(default)]
    pub external_ref: Option<String>,
}

impl Video {
    /// Set insertion: returns `false` when the editor was already assigned.
    pub fn assign_editor(&mut self, editor_id: Uuid) -> bool {
        if self.is_assigned_to(editor_id) {
            return false;
        }
        self.assigned_editors.push(editor_id);
        true
    }

    pub fn is_assigned_to(&self, editor_id: Uuid) -> bool {
        self.assigned_editors.contains(&editor_id)
    }
}

/// A video on an editor's worklist, annotated with who uploaded it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignedVideo {
    pub video: Video,
    pub creator: UserSummary,
}

pub enum VideoAction {
    Assign,
    Delete,
    Approve,
    Publish,
}

pub mod db_operations;
