//! Account records and their public projections.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Teacher,
    Student,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Teacher => "teacher",
            Self::Student => "student",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "teacher" => Ok(Self::Teacher),
            "student" => Ok(Self::Student),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

/// Full account row as stored. Never serialized to clients; use
/// [`AccountSummary`] for responses.
#[derive(Clone, Debug)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub role: Role,
    pub failed_logins: i32,
    pub lock_until: Option<DateTime<Utc>>,
    pub totp_secret: Option<String>,
}

impl Account {
    /// A stored secret means two-factor is enrolled.
    #[must_use]
    pub fn second_factor_enrolled(&self) -> bool {
        self.totp_secret.is_some()
    }
}

/// Response shape for the current account; excludes the password hash and
/// TOTP secret.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct AccountSummary {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
}

impl From<&Account> for AccountSummary {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            email: account.email.clone(),
            first_name: account.first_name.clone(),
            last_name: account.last_name.clone(),
            role: account.role,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> Account {
        Account {
            id: Uuid::new_v4(),
            email: "joe@smith.com".to_string(),
            first_name: "Joe".to_string(),
            last_name: "Smith".to_string(),
            password_hash: "$2b$04$placeholder".to_string(),
            role: Role::Student,
            failed_logins: 0,
            lock_until: None,
            totp_secret: None,
        }
    }

    #[test]
    fn role_round_trips() {
        assert_eq!("teacher".parse::<Role>(), Ok(Role::Teacher));
        assert_eq!("student".parse::<Role>(), Ok(Role::Student));
        assert!("admin".parse::<Role>().is_err());
        assert_eq!(Role::Teacher.as_str(), "teacher");
    }

    #[test]
    fn enrollment_follows_secret_presence() {
        let mut account = account();
        assert!(!account.second_factor_enrolled());
        account.totp_secret = Some("JBSWY3DPEHPK3PXP".to_string());
        assert!(account.second_factor_enrolled());
    }

    #[test]
    fn summary_excludes_credentials() -> anyhow::Result<()> {
        let account = account();
        let summary = AccountSummary::from(&account);
        let value = serde_json::to_value(summary)?;
        assert!(value.get("password_hash").is_none());
        assert!(value.get("totp_secret").is_none());
        assert_eq!(
            value.get("email").and_then(serde_json::Value::as_str),
            Some("joe@smith.com")
        );
        Ok(())
    }
}
