//! Account documents and their role-specific payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::branch::Branch;
use super::common::{parse_json, parse_optional};

/// Profile kind an account registers as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AccountRole {
    User,
    Company,
    Wholesaler,
    ServiceProvider,
}

impl AccountRole {
    pub const ALL: [AccountRole; 4] = [
        AccountRole::User,
        AccountRole::Company,
        AccountRole::Wholesaler,
        AccountRole::ServiceProvider,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountRole::User => "user",
            AccountRole::Company => "company",
            AccountRole::Wholesaler => "wholesaler",
            AccountRole::ServiceProvider => "serviceProvider",
        }
    }
}

impl std::fmt::Display for AccountRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AccountRole {
    type Err = String;

    /// Role tags are matched exactly; `Company` is not `company`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AccountRole::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| format!("Unknown user type: {}", s))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Location {
    pub city: String,
    pub country: String,
    pub district: String,
    pub street: String,
    pub postal_code: String,
    pub lat: f64,
    pub lng: f64,
    pub allowed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactDetail {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub phone: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub whatsapp: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub website: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub facebook: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub instagram: String,
}

/// Company payload. The wire name of the category field is `Category`.
///
/// `branches` is never read from client input: the sequence lives in its own
/// column and is attached when an account is loaded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompanyProfile {
    pub name: String,
    #[serde(rename = "Category", alias = "category")]
    pub category: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub custom_category: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub logo: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub sub_category: String,
    #[serde(skip_deserializing, skip_serializing_if = "Vec::is_empty")]
    pub branches: Vec<Branch>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<ContactDetail>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WholesalerProfile {
    pub business_name: String,
    #[serde(rename = "Category", alias = "category")]
    pub category: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub referral_code: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceProviderProfile {
    pub service_type: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub custom_service_type: String,
    pub years_experience: i64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub profile_photo: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub available_hours: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub available_days: Vec<String>,
}

/// Pending one-time-password challenge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpChallenge {
    pub otp: String,
    pub expires_at: DateTime<Utc>,
}

/// Raw `accounts` row; nested documents are JSON text
#[derive(Debug, Clone, FromRow)]
pub struct AccountRow {
    pub id: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub full_name: String,
    pub user_type: String,
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub phone: Option<String>,
    pub referral_code: Option<String>,
    pub interested_deals: Option<String>,
    pub location: Option<String>,
    pub company_info: Option<String>,
    pub wholesaler_info: Option<String>,
    pub service_provider_info: Option<String>,
    pub branches: String,
    pub logo_path: Option<String>,
    pub otp_info: Option<String>,
    pub reset_password_token: Option<String>,
    pub reset_token_expires_at: Option<String>,
    pub google_uid: Option<String>,
    pub profile_pic: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// A registered account as handed to callers and serialized to clients
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub full_name: String,
    pub user_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referral_code: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub interested_deals: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_info: Option<CompanyProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wholesaler_info: Option<WholesalerProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_provider_info: Option<ServiceProviderProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_path: Option<String>,
    #[serde(skip_serializing)]
    pub otp_info: Option<OtpChallenge>,
    #[serde(skip_serializing)]
    pub reset_password_token: Option<String>,
    #[serde(skip_serializing)]
    pub reset_token_expires_at: Option<String>,
    #[serde(rename = "googleUID", skip_serializing_if = "Option::is_none")]
    pub google_uid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_pic: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Account {
    /// Parsed role tag; `None` for rows written with a tag outside the enumeration
    pub fn role(&self) -> Option<AccountRole> {
        self.user_type.parse().ok()
    }

    /// Branch sequence of the company payload, empty when there is none
    pub fn branches(&self) -> &[Branch] {
        self.company_info
            .as_ref()
            .map(|info| info.branches.as_slice())
            .unwrap_or_default()
    }

    /// Every asset path this account still references
    pub fn asset_references(&self) -> Vec<String> {
        let mut refs: Vec<String> = self
            .branches()
            .iter()
            .flat_map(|branch| branch.images.iter().cloned())
            .collect();

        if let Some(logo) = self.company_info.as_ref().map(|c| &c.logo) {
            refs.push(logo.clone());
        }
        if let Some(photo) = self.service_provider_info.as_ref().map(|s| &s.profile_photo) {
            refs.push(photo.clone());
        }
        if let Some(path) = &self.logo_path {
            refs.push(path.clone());
        }

        refs.retain(|r| !r.is_empty());
        refs.dedup();
        refs
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        let branches: Vec<Branch> = parse_json(Some(&row.branches));

        let mut company_info: Option<CompanyProfile> = parse_optional(row.company_info.as_deref());
        if !branches.is_empty() {
            company_info.get_or_insert_with(CompanyProfile::default).branches = branches;
        }

        Self {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            full_name: row.full_name,
            user_type: row.user_type,
            date_of_birth: non_empty(row.date_of_birth),
            gender: non_empty(row.gender),
            phone: non_empty(row.phone),
            referral_code: non_empty(row.referral_code),
            interested_deals: parse_json(row.interested_deals.as_deref()),
            location: parse_optional(row.location.as_deref()),
            company_info,
            wholesaler_info: parse_optional(row.wholesaler_info.as_deref()),
            service_provider_info: parse_optional(row.service_provider_info.as_deref()),
            logo_path: non_empty(row.logo_path),
            otp_info: parse_optional(row.otp_info.as_deref()),
            reset_password_token: non_empty(row.reset_password_token),
            reset_token_expires_at: non_empty(row.reset_token_expires_at),
            google_uid: non_empty(row.google_uid),
            profile_pic: non_empty(row.profile_pic),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> AccountRow {
        AccountRow {
            id: "acc-1".to_string(),
            email: "a@x.com".to_string(),
            password_hash: Some("$argon2id$...".to_string()),
            full_name: "Acme".to_string(),
            user_type: "company".to_string(),
            date_of_birth: None,
            gender: Some(String::new()),
            phone: None,
            referral_code: None,
            interested_deals: None,
            location: None,
            company_info: Some(r#"{"name":"Acme","Category":"food","logo":"/uploads/logos/a.png"}"#.to_string()),
            wholesaler_info: None,
            service_provider_info: None,
            branches: "[]".to_string(),
            logo_path: None,
            otp_info: None,
            reset_password_token: None,
            reset_token_expires_at: None,
            google_uid: None,
            profile_pic: None,
            created_at: "2025-01-01T00:00:00Z".to_string(),
            updated_at: "2025-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_role_tags_are_exact() {
        assert_eq!("serviceProvider".parse::<AccountRole>(), Ok(AccountRole::ServiceProvider));
        assert_eq!("company".parse::<AccountRole>(), Ok(AccountRole::Company));
        assert!("Company".parse::<AccountRole>().is_err());
        assert!("admin".parse::<AccountRole>().is_err());
        assert_eq!(AccountRole::Wholesaler.to_string(), "wholesaler");
    }

    #[test]
    fn test_digest_never_serialized() {
        let account = Account::from(row());
        let json = serde_json::to_value(&account).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["companyInfo"]["Category"], "food");
        assert!(json.get("gender").is_none());
    }

    #[test]
    fn test_branches_attached_to_company_info() {
        let mut raw = row();
        raw.company_info = None;
        raw.branches = r#"[{"id":"b1","name":"Main","location":"","latitude":1.0,"longitude":2.0,
            "category":"","subCategory":"","phone":"","description":"","images":["/uploads/x.jpg"],
            "rate":0,"createdAt":"2025-01-01T00:00:00Z","updatedAt":"2025-01-01T00:00:00Z"}]"#
            .to_string();

        let account = Account::from(raw);
        assert_eq!(account.branches().len(), 1);
        assert_eq!(account.asset_references(), vec!["/uploads/x.jpg".to_string()]);
    }

    #[test]
    fn test_branches_ignored_in_client_payload() {
        let profile: CompanyProfile =
            serde_json::from_str(r#"{"name":"Acme","branches":[{"id":"injected"}]}"#).unwrap();
        assert!(profile.branches.is_empty());
    }
}
