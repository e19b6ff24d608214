//! Staff accounts, roles and permissions.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Feature area a role may access.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    Patients,
    Appointments,
    Invoices,
    MedicalRecords,
    Statistics,
    Reminders,
    Users,
    Settings,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Practitioner,
    Secretary,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Practitioner => "practitioner",
            Role::Secretary => "secretary",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Role::Admin => "Administrateur",
            Role::Practitioner => "Praticien",
            Role::Secretary => "Secrétaire",
        }
    }

    /// Permissions granted to this role. Admins hold every permission.
    pub fn permissions(&self) -> &'static [Permission] {
        match self {
            Role::Admin => &[
                Permission::Patients,
                Permission::Appointments,
                Permission::Invoices,
                Permission::MedicalRecords,
                Permission::Statistics,
                Permission::Reminders,
                Permission::Users,
                Permission::Settings,
            ],
            Role::Practitioner => &[
                Permission::Patients,
                Permission::Appointments,
                Permission::Invoices,
                Permission::MedicalRecords,
                Permission::Statistics,
            ],
            Role::Secretary => &[
                Permission::Patients,
                Permission::Appointments,
                Permission::Invoices,
                Permission::Reminders,
            ],
        }
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }

    /// May be assigned appointments.
    pub fn is_practitioner(&self) -> bool {
        matches!(self, Role::Admin | Role::Practitioner)
    }
}

/// A staff account as persisted, including its password hash.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    /// Salted hash, or a legacy plaintext value
    #[serde(rename = "password")]
    pub password_hash: String,
    pub role: Role,
    #[serde(default)]
    pub phone: String,
    #[serde(default, deserialize_with = "super::blank::deserialize_opt")]
    pub specialty: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default, deserialize_with = "super::blank::deserialize_opt")]
    pub created_at: Option<NaiveDate>,
}

fn default_active() -> bool {
    true
}

impl User {
    /// Build from creation input. `password_hash` must already be hashed.
    pub fn new(input: NewUser, password_hash: String, created_at: NaiveDate) -> Self {
        Self {
            id: super::new_id(),
            name: input.name.trim().to_string(),
            email: input.email.trim().to_string(),
            password_hash,
            role: input.role,
            phone: input.phone.trim().to_string(),
            specialty: input.specialty,
            is_active: true,
            created_at: Some(created_at),
        }
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile::from(self)
    }
}

/// Public view of a user with the password removed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub phone: String,
    #[serde(default, deserialize_with = "super::blank::deserialize_opt")]
    pub specialty: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default, deserialize_with = "super::blank::deserialize_opt")]
    pub created_at: Option<NaiveDate>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            phone: user.phone.clone(),
            specialty: user.specialty.clone(),
            is_active: user.is_active,
            created_at: user.created_at,
        }
    }
}

/// Caller input for a new account. `password` is plaintext and hashed by the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    #[serde(default)]
    pub phone: String,
    #[serde(default, deserialize_with = "super::blank::deserialize_opt")]
    pub specialty: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    /// New plaintext password; empty means unchanged
    pub password: Option<String>,
    pub role: Option<Role>,
    pub phone: Option<String>,
    pub specialty: Option<Option<String>>,
    pub is_active: Option<bool>,
}

impl UserPatch {
    /// Apply every field except the password, which the store hashes first.
    pub fn apply_to(self, user: &mut User) {
        merge_fields!(self => user; name, email, role, phone, specialty, is_active);
    }

    /// The new password, if one was actually supplied.
    pub fn new_password(&self) -> Option<&str> {
        self.password.as_deref().filter(|p| !p.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_permissions() {
        assert!(Role::Admin.has_permission(Permission::Users));
        assert!(Role::Practitioner.has_permission(Permission::MedicalRecords));
        assert!(!Role::Practitioner.has_permission(Permission::Reminders));
        assert!(Role::Secretary.has_permission(Permission::Reminders));
        assert!(!Role::Secretary.has_permission(Permission::Statistics));
    }

    #[test]
    fn test_profile_has_no_password() {
        let user = User::new(
            NewUser {
                name: "Amal Tazi".into(),
                email: "secretaire@mediplan.ma".into(),
                password: "sec123".into(),
                role: Role::Secretary,
                phone: "0663456789".into(),
                specialty: None,
            },
            "sha256$salt$digest".into(),
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        );
        let json = serde_json::to_value(user.profile()).unwrap();
        assert!(json.get("password").is_none());
        assert_eq!(json["role"], "secretary");
        assert_eq!(json["isActive"], true);

        let stored = serde_json::to_value(&user).unwrap();
        assert_eq!(stored["password"], "sha256$salt$digest");
    }

    #[test]
    fn test_legacy_user_without_created_at() {
        let json = r#"{"id":"u1","email":"admin@mediplan.ma","password":"admin123",
            "name":"Dr. Fatima Alaoui","role":"admin","phone":"0661234567",
            "specialty":"Orthophonie","isActive":true}"#;
        let user: User = serde_json::from_str(json).unwrap();
        assert_eq!(user.password_hash, "admin123");
        assert_eq!(user.created_at, None);
        assert!(user.role.is_practitioner());
    }

    #[test]
    fn test_empty_password_patch_is_ignored() {
        let patch = UserPatch {
            password: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(patch.new_password(), None);
    }
}
