//! Account document store.
//!
//! Each mutation is one SQL statement against one row, so every primitive
//! (push, pull, positional replace, field set) is atomic per account.

use chrono::Utc;

use super::models::{
    serialize_optional, Account, AccountRow, Branch, CompanyProfile, ContactDetail, Location,
    ServiceProviderProfile, WholesalerProfile,
};
use super::DbPool;
use crate::services::ServiceResult;

/// Locates the array index of the branch whose `id` matches the bound value
const BRANCH_INDEX: &str =
    "(SELECT key FROM json_each(accounts.branches) WHERE json_extract(value, '$.id') = ?)";

const BRANCH_EXISTS: &str =
    "EXISTS (SELECT 1 FROM json_each(accounts.branches) WHERE json_extract(value, '$.id') = ?)";

/// Fields of a freshly registered account
#[derive(Debug, Clone, Default)]
pub struct NewAccount {
    pub id: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub full_name: String,
    pub user_type: String,
    pub date_of_birth: Option<String>,
    pub gender: Option<String>,
    pub phone: Option<String>,
    pub referral_code: Option<String>,
    pub interested_deals: Vec<String>,
    pub location: Option<Location>,
    pub company_info: Option<CompanyProfile>,
    pub wholesaler_info: Option<WholesalerProfile>,
    pub service_provider_info: Option<ServiceProviderProfile>,
    pub logo_path: Option<String>,
    pub google_uid: Option<String>,
    pub profile_pic: Option<String>,
}

/// Top-level fields to overwrite; `None` leaves the stored value alone
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub full_name: Option<String>,
    pub gender: Option<String>,
    pub date_of_birth: Option<String>,
    pub location: Option<Location>,
    pub company_info: Option<CompanyProfile>,
    pub service_provider_info: Option<ServiceProviderProfile>,
}

#[derive(Debug, Clone)]
pub struct AccountStore {
    pool: DbPool,
}

impl AccountStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub async fn insert(&self, account: &NewAccount) -> ServiceResult<()> {
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO accounts (
                id, email, password_hash, full_name, user_type, date_of_birth, gender,
                phone, referral_code, interested_deals, location, company_info,
                wholesaler_info, service_provider_info, branches, logo_path,
                google_uid, profile_pic, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, '[]', ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&account.id)
        .bind(&account.email)
        .bind(&account.password_hash)
        .bind(&account.full_name)
        .bind(&account.user_type)
        .bind(&account.date_of_birth)
        .bind(&account.gender)
        .bind(&account.phone)
        .bind(&account.referral_code)
        .bind(serde_json::to_string(&account.interested_deals)?)
        .bind(serialize_optional(account.location.as_ref())?)
        .bind(serialize_optional(account.company_info.as_ref())?)
        .bind(serialize_optional(account.wholesaler_info.as_ref())?)
        .bind(serialize_optional(account.service_provider_info.as_ref())?)
        .bind(&account.logo_path)
        .bind(&account.google_uid)
        .bind(&account.profile_pic)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn find_by_id(&self, id: &str) -> ServiceResult<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>("SELECT * FROM accounts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Account::from))
    }

    pub async fn find_by_email(&self, email: &str) -> ServiceResult<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>("SELECT * FROM accounts WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Account::from))
    }

    /// Overwrite the external identity fields and display name of an account
    pub async fn link_external_identity(
        &self,
        id: &str,
        external_uid: &str,
        full_name: &str,
        picture: &str,
    ) -> ServiceResult<u64> {
        let result = sqlx::query(
            "UPDATE accounts SET google_uid = ?, full_name = ?, profile_pic = ?, updated_at = ? WHERE id = ?",
        )
        .bind(external_uid)
        .bind(full_name)
        .bind(picture)
        .bind(Utc::now().to_rfc3339())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Replace the given top-level fields. A replaced company or provider
    /// payload keeps the stored `logo` / `profilePhoto`: those paths are only
    /// ever written by the upload operations.
    pub async fn update_profile(&self, id: &str, changes: &ProfileChanges) -> ServiceResult<u64> {
        let company_info = serialize_optional(changes.company_info.as_ref())?;
        let provider_info = serialize_optional(changes.service_provider_info.as_ref())?;

        let result = sqlx::query(
            r#"
            UPDATE accounts SET
                full_name = COALESCE(?, full_name),
                gender = COALESCE(?, gender),
                date_of_birth = COALESCE(?, date_of_birth),
                location = COALESCE(?, location),
                company_info = CASE WHEN ? IS NULL THEN company_info ELSE json_set(
                    json(?), '$.logo', COALESCE(json_extract(company_info, '$.logo'), '')
                ) END,
                service_provider_info = CASE WHEN ? IS NULL THEN service_provider_info ELSE json_set(
                    json(?), '$.profilePhoto',
                    COALESCE(json_extract(service_provider_info, '$.profilePhoto'), '')
                ) END,
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&changes.full_name)
        .bind(&changes.gender)
        .bind(&changes.date_of_birth)
        .bind(serialize_optional(changes.location.as_ref())?)
        .bind(&company_info)
        .bind(&company_info)
        .bind(&provider_info)
        .bind(&provider_info)
        .bind(Utc::now().to_rfc3339())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn set_location(&self, id: &str, location: &Location) -> ServiceResult<u64> {
        let result = sqlx::query("UPDATE accounts SET location = ?, updated_at = ? WHERE id = ?")
            .bind(serde_json::to_string(location)?)
            .bind(Utc::now().to_rfc3339())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Set `companyInfo.logo`, creating the company payload when absent
    pub async fn set_company_logo(&self, id: &str, logo: &str) -> ServiceResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET company_info = json_set(COALESCE(company_info, '{}'), '$.logo', ?),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(logo)
        .bind(Utc::now().to_rfc3339())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Replace the company's contact-detail sequence
    pub async fn set_company_details(
        &self,
        id: &str,
        details: &[ContactDetail],
    ) -> ServiceResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET company_info = json_set(COALESCE(company_info, '{}'), '$.details', json(?)),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(serde_json::to_string(details)?)
        .bind(Utc::now().to_rfc3339())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn set_profile_photo(&self, id: &str, photo: &str) -> ServiceResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET service_provider_info =
                    json_set(COALESCE(service_provider_info, '{}'), '$.profilePhoto', ?),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(photo)
        .bind(Utc::now().to_rfc3339())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn set_availability(
        &self,
        id: &str,
        days: &[String],
        hours: &[String],
    ) -> ServiceResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET service_provider_info = json_set(
                    COALESCE(service_provider_info, '{}'),
                    '$.availableDays', json(?),
                    '$.availableHours', json(?)
                ),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(serde_json::to_string(days)?)
        .bind(serde_json::to_string(hours)?)
        .bind(Utc::now().to_rfc3339())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    pub async fn delete(&self, id: &str) -> ServiceResult<u64> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// The owner's branch sequence, or `None` when the account does not exist
    pub async fn branches(&self, id: &str) -> ServiceResult<Option<Vec<Branch>>> {
        let raw: Option<(String,)> = sqlx::query_as("SELECT branches FROM accounts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match raw {
            Some((json,)) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Append to the owner's branch array
    pub async fn push_branch(&self, id: &str, branch: &Branch) -> ServiceResult<u64> {
        let result = sqlx::query(
            "UPDATE accounts SET branches = json_insert(branches, '$[#]', json(?)), updated_at = ? WHERE id = ?",
        )
        .bind(serde_json::to_string(branch)?)
        .bind(Utc::now().to_rfc3339())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Remove the element whose id matches. Zero rows means no such branch.
    pub async fn pull_branch(&self, id: &str, branch_id: &str) -> ServiceResult<u64> {
        let sql = format!(
            "UPDATE accounts SET branches = json_remove(branches, '$[' || {} || ']'), updated_at = ? \
             WHERE id = ? AND {}",
            BRANCH_INDEX, BRANCH_EXISTS
        );

        let result = sqlx::query(&sql)
            .bind(branch_id)
            .bind(Utc::now().to_rfc3339())
            .bind(id)
            .bind(branch_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Overwrite the element whose id matches `branch.id` in place
    pub async fn replace_branch(&self, id: &str, branch: &Branch) -> ServiceResult<u64> {
        let sql = format!(
            "UPDATE accounts SET branches = json_set(branches, '$[' || {} || ']', json(?)), updated_at = ? \
             WHERE id = ? AND {}",
            BRANCH_INDEX, BRANCH_EXISTS
        );

        let result = sqlx::query(&sql)
            .bind(&branch.id)
            .bind(serde_json::to_string(branch)?)
            .bind(Utc::now().to_rfc3339())
            .bind(id)
            .bind(&branch.id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{connect, BranchPatch};
    use crate::services::ServiceError;

    async fn store() -> AccountStore {
        AccountStore::new(connect("sqlite::memory:").await.unwrap())
    }

    fn company(id: &str, email: &str) -> NewAccount {
        NewAccount {
            id: id.to_string(),
            email: email.to_string(),
            password_hash: Some("digest".to_string()),
            full_name: "Acme".to_string(),
            user_type: "company".to_string(),
            company_info: Some(CompanyProfile {
                name: "Acme".to_string(),
                category: "food".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn branch(id: &str, name: &str) -> Branch {
        BranchPatch {
            name: Some(name.to_string()),
            ..Default::default()
        }
        .into_branch(id.to_string(), vec![], Utc::now())
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let store = store().await;
        store.insert(&company("a", "a@x.com")).await.unwrap();

        let err = store.insert(&company("b", "a@x.com")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_push_pull_replace() {
        let store = store().await;
        store.insert(&company("a", "a@x.com")).await.unwrap();

        assert_eq!(store.push_branch("a", &branch("b1", "One")).await.unwrap(), 1);
        assert_eq!(store.push_branch("a", &branch("b2", "Two")).await.unwrap(), 1);

        let mut renamed = branch("b1", "Renamed");
        renamed.latitude = 12.5;
        assert_eq!(store.replace_branch("a", &renamed).await.unwrap(), 1);

        let branches = store.branches("a").await.unwrap().unwrap();
        assert_eq!(branches.len(), 2);
        assert_eq!(branches[0].name, "Renamed");
        assert_eq!(branches[0].latitude, 12.5);
        assert_eq!(branches[1].name, "Two");

        assert_eq!(store.pull_branch("a", "b1").await.unwrap(), 1);
        assert_eq!(store.pull_branch("a", "b1").await.unwrap(), 0);

        let branches = store.branches("a").await.unwrap().unwrap();
        assert_eq!(branches.len(), 1);
        assert_eq!(branches[0].id, "b2");
    }

    #[tokio::test]
    async fn test_branch_ops_scoped_to_owner() {
        let store = store().await;
        store.insert(&company("a", "a@x.com")).await.unwrap();
        store.insert(&company("b", "b@x.com")).await.unwrap();
        store.push_branch("a", &branch("b1", "One")).await.unwrap();

        assert_eq!(store.pull_branch("b", "b1").await.unwrap(), 0);
        assert_eq!(store.replace_branch("b", &branch("b1", "X")).await.unwrap(), 0);
        assert_eq!(store.branches("a").await.unwrap().unwrap().len(), 1);
        assert!(store.branches("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_profile_replace_keeps_branches() {
        let store = store().await;
        store.insert(&company("a", "a@x.com")).await.unwrap();
        store.push_branch("a", &branch("b1", "One")).await.unwrap();

        let changes = ProfileChanges {
            full_name: Some("Acme Ltd".to_string()),
            company_info: Some(CompanyProfile {
                name: "Acme Ltd".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert_eq!(store.update_profile("a", &changes).await.unwrap(), 1);

        let account = store.find_by_id("a").await.unwrap().unwrap();
        assert_eq!(account.full_name, "Acme Ltd");
        assert_eq!(account.branches().len(), 1);
        assert_eq!(account.company_info.unwrap().category, "");
    }

    #[tokio::test]
    async fn test_nested_field_sets() {
        let store = store().await;
        store.insert(&company("a", "a@x.com")).await.unwrap();

        store.set_company_logo("a", "/uploads/logos/l.png").await.unwrap();
        store
            .set_company_details(
                "a",
                &[ContactDetail {
                    phone: "+1".to_string(),
                    ..Default::default()
                }],
            )
            .await
            .unwrap();
        store
            .set_availability("a", &["mon".to_string()], &["9-5".to_string()])
            .await
            .unwrap();

        let account = store.find_by_id("a").await.unwrap().unwrap();
        let info = account.company_info.clone().unwrap();
        assert_eq!(info.logo, "/uploads/logos/l.png");
        assert_eq!(info.name, "Acme");
        assert_eq!(info.details.len(), 1);
        assert_eq!(
            account.service_provider_info.unwrap().available_days,
            vec!["mon".to_string()]
        );
    }
}
