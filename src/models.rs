use chrono::{DateTime, Utc};
use rocket_db_pools::sqlx::FromRow;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ===== Stored Records =====

/// A registered user as persisted. `password_hash` is a PHC string, never plaintext.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Organisation {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ===== Wire Views =====

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrganisationView {
    pub org_id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

impl From<&Organisation> for OrganisationView {
    fn from(org: &Organisation) -> Self {
        Self {
            org_id: org.id,
            name: org.name.clone(),
            description: org.description.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct OrganisationList {
    pub organisations: Vec<OrganisationView>,
}

/// A single structural defect in a request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

// ===== Requests =====

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CreateOrganisationRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddMemberRequest {
    #[serde(default)]
    pub user_id: Option<String>,
}

// ===== Response Envelope =====

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiResponse<T> {
    pub status: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    pub fn message_only(message: impl Into<String>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
            data: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_never_carries_the_password_hash() {
        let user = User {
            id: Uuid::new_v4(),
            first_name: "John".into(),
            last_name: "Doe".into(),
            email: "john@x.com".into(),
            password_hash: "$argon2id$v=19$m=1024,t=1,p=1$c2FsdA$aGFzaA".into(),
            phone: None,
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(UserProfile::from(&user)).expect("serialize");
        assert_eq!(json["firstName"], "John");
        assert_eq!(json["userId"], user.id.to_string());
        assert!(json.get("password").is_none());
        assert!(json.get("passwordHash").is_none());
        assert!(!json.to_string().contains("argon2"));
    }

    #[test]
    fn message_only_envelope_omits_data() {
        let json = serde_json::to_value(ApiResponse::message_only("done")).expect("serialize");
        assert_eq!(json["status"], "success");
        assert!(json.get("data").is_none());
    }
}
