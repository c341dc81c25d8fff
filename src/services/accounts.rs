//! Account directory: registration, credential checks, external identity
//! upsert and the profile mutations of the top-level account document.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::{bounded, ServiceError, ServiceResult};
use super::Upload;
use crate::assets::{AssetStore, CleanupReport, COMPANY_LOGOS, PROFILE_PHOTOS};
use crate::auth::password::{hash_password, verify_password};
use crate::auth::SessionIssuer;
use crate::config::TimeoutConfig;
use crate::db::{
    Account, AccountRole, AccountStore, CompanyProfile, ContactDetail, Location, NewAccount,
    ProfileChanges, ServiceProviderProfile, WholesalerProfile,
};

/// Registration payload, as JSON body or as the `data` part of a multipart form
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub user_type: String,
    pub date_of_birth: String,
    pub gender: String,
    pub phone: String,
    pub referral_code: String,
    pub interested_deals: Vec<String>,
    pub location: Option<Location>,
    pub company_info: Option<CompanyProfile>,
    pub service_provider_info: Option<ServiceProviderProfile>,
    pub wholesaler_info: Option<WholesalerProfile>,
}

/// Identity asserted by an external provider
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ExternalIdentity {
    pub email: String,
    #[serde(rename = "displayName")]
    pub display_name: String,
    #[serde(rename = "photoURL")]
    pub photo_url: String,
    pub uid: String,
}

/// Partial profile update. Empty strings and absent objects leave stored values alone;
/// present sub-objects replace the stored ones wholesale.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileUpdate {
    pub full_name: String,
    pub gender: String,
    pub date_of_birth: String,
    pub location: Option<Location>,
    pub company_info: Option<CompanyProfile>,
    pub service_provider_info: Option<ServiceProviderProfile>,
}

/// Issued credential together with the account it was issued for
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub token: String,
    #[serde(rename = "user")]
    pub account: Account,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanySummary {
    pub name: String,
    #[serde(rename = "Category")]
    pub category: String,
    pub sub_category: String,
    pub logo: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyData {
    pub company_info: CompanySummary,
    pub location: Option<Location>,
}

#[derive(Debug, Clone)]
pub struct AccountDirectory {
    store: AccountStore,
    assets: AssetStore,
    sessions: SessionIssuer,
    timeouts: TimeoutConfig,
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

fn user_not_found() -> ServiceError {
    ServiceError::NotFound("User not found".to_string())
}

fn invalid_credentials() -> ServiceError {
    ServiceError::Unauthorized("Invalid email or password".to_string())
}

impl AccountDirectory {
    pub fn new(
        store: AccountStore,
        assets: AssetStore,
        sessions: SessionIssuer,
        timeouts: TimeoutConfig,
    ) -> Self {
        Self {
            store,
            assets,
            sessions,
            timeouts,
        }
    }

    pub fn sessions(&self) -> &SessionIssuer {
        &self.sessions
    }

    fn session_for(&self, account: Account) -> ServiceResult<AuthSession> {
        let token = self
            .sessions
            .issue(&account.id, &account.email, &account.user_type)?;
        Ok(AuthSession { token, account })
    }

    async fn require(&self, id: &str) -> ServiceResult<Account> {
        self.store.find_by_id(id).await?.ok_or_else(user_not_found)
    }

    /// Register a new account and issue its first session.
    ///
    /// The logo, when attached, is stored before the account row is written.
    pub async fn signup(
        &self,
        mut req: SignupRequest,
        logo: Option<Upload>,
    ) -> ServiceResult<AuthSession> {
        // Stored asset paths are only written by uploads
        if let Some(info) = req.company_info.as_mut() {
            info.logo.clear();
        }
        if let Some(info) = req.service_provider_info.as_mut() {
            info.profile_photo.clear();
        }

        if req.email.is_empty()
            || req.password.is_empty()
            || req.full_name.is_empty()
            || req.user_type.is_empty()
        {
            return Err(ServiceError::InvalidRequest(
                "Missing required fields".to_string(),
            ));
        }

        let role: AccountRole = req
            .user_type
            .parse()
            .map_err(|_| ServiceError::InvalidRequest("Invalid user type".to_string()))?;

        if !self.sessions.is_configured() {
            return Err(ServiceError::Configuration(
                "JWT secret is not configured".to_string(),
            ));
        }

        log_payload_mismatch(role, &req);

        bounded(self.timeouts.upload(), async {
            if self.store.find_by_email(&req.email).await?.is_some() {
                return Err(ServiceError::Conflict(
                    "User with this email already exists".to_string(),
                ));
            }

            let digest = hash_password(&req.password).map_err(|e| {
                ServiceError::Configuration(format!("Failed to hash password: {}", e))
            })?;

            let logo_path = match &logo {
                Some(file) => Some(
                    self.assets
                        .save(&mut &file.data[..], &file.file_name, COMPANY_LOGOS)
                        .await?,
                ),
                None => None,
            };

            let id = Uuid::new_v4().to_string();
            self.store
                .insert(&NewAccount {
                    id: id.clone(),
                    email: req.email.clone(),
                    password_hash: Some(digest),
                    full_name: req.full_name.clone(),
                    user_type: role.as_str().to_string(),
                    date_of_birth: non_empty(req.date_of_birth.clone()),
                    gender: non_empty(req.gender.clone()),
                    phone: non_empty(req.phone.clone()),
                    referral_code: non_empty(req.referral_code.clone()),
                    interested_deals: req.interested_deals.clone(),
                    location: req.location.clone(),
                    company_info: req.company_info.clone(),
                    wholesaler_info: req.wholesaler_info.clone(),
                    service_provider_info: req.service_provider_info.clone(),
                    logo_path,
                    google_uid: None,
                    profile_pic: None,
                })
                .await?;

            let account = self.require(&id).await?;
            tracing::info!(account_id = %account.id, user_type = %role, "Account registered");
            self.session_for(account)
        })
        .await
    }

    /// Verify credentials. A missing account and a wrong password are indistinguishable.
    pub async fn login(&self, email: &str, password: &str) -> ServiceResult<AuthSession> {
        bounded(self.timeouts.request(), async {
            let account = self
                .store
                .find_by_email(email)
                .await?
                .ok_or_else(invalid_credentials)?;

            let verified = account
                .password_hash
                .as_deref()
                .map(|digest| verify_password(password, digest))
                .unwrap_or(false);
            if !verified {
                tracing::debug!(account_id = %account.id, "Rejected login");
                return Err(invalid_credentials());
            }

            self.session_for(account)
        })
        .await
    }

    /// Create a plain user for an unknown email, or refresh the external
    /// identity fields of the existing account. Either way a new session is issued.
    pub async fn upsert_external(&self, identity: ExternalIdentity) -> ServiceResult<AuthSession> {
        if identity.email.is_empty() || identity.uid.is_empty() {
            return Err(ServiceError::InvalidRequest(
                "Email and UID are required".to_string(),
            ));
        }

        bounded(self.timeouts.request(), async {
            let id = match self.store.find_by_email(&identity.email).await? {
                Some(existing) => {
                    self.store
                        .link_external_identity(
                            &existing.id,
                            &identity.uid,
                            &identity.display_name,
                            &identity.photo_url,
                        )
                        .await?;
                    existing.id
                }
                None => {
                    let id = Uuid::new_v4().to_string();
                    self.store
                        .insert(&NewAccount {
                            id: id.clone(),
                            email: identity.email.clone(),
                            full_name: identity.display_name.clone(),
                            user_type: AccountRole::User.as_str().to_string(),
                            google_uid: Some(identity.uid.clone()),
                            profile_pic: non_empty(identity.photo_url.clone()),
                            ..Default::default()
                        })
                        .await?;
                    tracing::info!(account_id = %id, "Account created from external identity");
                    id
                }
            };

            let account = self.require(&id).await?;
            self.session_for(account)
        })
        .await
    }

    pub async fn get_profile(&self, id: &str) -> ServiceResult<Account> {
        bounded(self.timeouts.request(), self.require(id)).await
    }

    pub async fn update_profile(&self, id: &str, update: ProfileUpdate) -> ServiceResult<()> {
        if let Some(info) = &update.service_provider_info {
            if info.service_type == "Other" && info.custom_service_type.is_empty() {
                return Err(ServiceError::InvalidRequest(
                    "Please specify your service type".to_string(),
                ));
            }
        }
        if let Some(info) = &update.company_info {
            if info.category == "Other" && info.custom_category.is_empty() {
                return Err(ServiceError::InvalidRequest(
                    "Please specify your Category type".to_string(),
                ));
            }
        }

        let changes = ProfileChanges {
            full_name: non_empty(update.full_name),
            gender: non_empty(update.gender),
            date_of_birth: non_empty(update.date_of_birth),
            location: update.location,
            company_info: update.company_info,
            service_provider_info: update.service_provider_info,
        };

        bounded(self.timeouts.request(), async {
            if self.store.update_profile(id, &changes).await? == 0 {
                return Err(user_not_found());
            }
            tracing::info!(account_id = %id, "Profile updated");
            Ok(())
        })
        .await
    }

    pub async fn update_location(&self, id: &str, location: Option<Location>) -> ServiceResult<()> {
        let location = location
            .ok_or_else(|| ServiceError::InvalidRequest("Location is required".to_string()))?;

        bounded(self.timeouts.request(), async {
            if self.store.set_location(id, &location).await? == 0 {
                return Err(user_not_found());
            }
            Ok(())
        })
        .await
    }

    /// Remove the account document, then best-effort delete every asset it referenced
    pub async fn delete_account(&self, id: &str) -> ServiceResult<CleanupReport> {
        bounded(self.timeouts.upload(), async {
            let account = self.require(id).await?;

            if self.store.delete(id).await? == 0 {
                return Err(user_not_found());
            }

            let report = self.assets.cleanup(account.asset_references()).await;
            tracing::info!(
                account_id = %id,
                removed = report.removed.len(),
                failed = report.failed.len(),
                "Account deleted"
            );
            Ok(report)
        })
        .await
    }

    pub async fn company_data(&self, id: &str) -> ServiceResult<CompanyData> {
        bounded(self.timeouts.request(), async {
            let account = self
                .store
                .find_by_id(id)
                .await?
                .filter(|a| a.role() == Some(AccountRole::Company))
                .ok_or_else(|| ServiceError::NotFound("Company not found".to_string()))?;

            let info = account.company_info.unwrap_or_default();
            Ok(CompanyData {
                company_info: CompanySummary {
                    name: info.name,
                    category: info.category,
                    sub_category: info.sub_category,
                    logo: info.logo,
                },
                location: account.location,
            })
        })
        .await
    }

    /// Replace the company's contact-detail sequence with `detail`
    pub async fn update_company_contacts(
        &self,
        id: &str,
        detail: ContactDetail,
    ) -> ServiceResult<()> {
        bounded(self.timeouts.request(), async {
            if self.store.set_company_details(id, &[detail]).await? == 0 {
                return Err(user_not_found());
            }
            Ok(())
        })
        .await
    }

    /// Store a new company logo and drop the one it supersedes
    pub async fn upload_logo(&self, id: &str, file: Upload) -> ServiceResult<String> {
        bounded(self.timeouts.upload(), async {
            let account = self.require(id).await?;
            if account.role() != Some(AccountRole::Company) {
                return Err(ServiceError::Forbidden(
                    "Only company accounts can upload a logo".to_string(),
                ));
            }
            if !file.is_image() {
                return Err(ServiceError::InvalidRequest(
                    "Only image files are allowed".to_string(),
                ));
            }

            let reference = self
                .assets
                .save(&mut &file.data[..], &file.file_name, COMPANY_LOGOS)
                .await?;
            if self.store.set_company_logo(id, &reference).await? == 0 {
                return Err(user_not_found());
            }

            let previous = account.company_info.map(|c| c.logo).unwrap_or_default();
            self.assets.cleanup([previous]).await;
            Ok(reference)
        })
        .await
    }

    /// Store a new service-provider photo and drop the one it supersedes
    pub async fn upload_profile_photo(&self, id: &str, file: Upload) -> ServiceResult<String> {
        bounded(self.timeouts.upload(), async {
            let account = self.require(id).await?;
            if account.role() != Some(AccountRole::ServiceProvider) {
                return Err(ServiceError::Forbidden(
                    "Only service providers can upload a profile photo".to_string(),
                ));
            }
            if !file.is_image() {
                return Err(ServiceError::InvalidRequest(
                    "Only image files are allowed".to_string(),
                ));
            }

            let reference = self
                .assets
                .save(&mut &file.data[..], &file.file_name, PROFILE_PHOTOS)
                .await?;
            if self.store.set_profile_photo(id, &reference).await? == 0 {
                return Err(user_not_found());
            }

            let previous = account
                .service_provider_info
                .map(|s| s.profile_photo)
                .unwrap_or_default();
            self.assets.cleanup([previous]).await;
            Ok(reference)
        })
        .await
    }

    pub async fn update_availability(
        &self,
        id: &str,
        days: Vec<String>,
        hours: Vec<String>,
    ) -> ServiceResult<()> {
        bounded(self.timeouts.request(), async {
            let account = self.require(id).await?;
            if account.role() != Some(AccountRole::ServiceProvider) {
                return Err(ServiceError::Forbidden(
                    "Only service providers can update availability".to_string(),
                ));
            }
            if days.is_empty() || hours.is_empty() {
                return Err(ServiceError::InvalidRequest(
                    "Available days and hours are required".to_string(),
                ));
            }

            if self.store.set_availability(id, &days, &hours).await? == 0 {
                return Err(user_not_found());
            }
            Ok(())
        })
        .await
    }
}

/// Role-specific payloads are stored as given; note the ones that do not match the role
fn log_payload_mismatch(role: AccountRole, req: &SignupRequest) {
    let foreign = [
        (AccountRole::Company, req.company_info.is_some(), "companyInfo"),
        (AccountRole::Wholesaler, req.wholesaler_info.is_some(), "wholesalerInfo"),
        (
            AccountRole::ServiceProvider,
            req.service_provider_info.is_some(),
            "serviceProviderInfo",
        ),
    ];

    for (owner, present, field) in foreign {
        if present && owner != role {
            tracing::debug!(user_type = %role, payload = field, "Signup payload does not match user type");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connect;
    use bytes::Bytes;
    use tempfile::TempDir;

    async fn directory() -> (AccountDirectory, TempDir) {
        let tmp = tempfile::tempdir().unwrap();
        let store = AccountStore::new(connect("sqlite::memory:").await.unwrap());
        let assets = AssetStore::new(tmp.path().join("uploads"), "/uploads");
        let sessions = SessionIssuer::new(Some("test-secret".to_string()), 24);
        (
            AccountDirectory::new(store, assets, sessions, TimeoutConfig::default()),
            tmp,
        )
    }

    fn signup_req(email: &str, user_type: &str) -> SignupRequest {
        SignupRequest {
            email: email.to_string(),
            password: "hunter22".to_string(),
            full_name: "Test Account".to_string(),
            user_type: user_type.to_string(),
            ..Default::default()
        }
    }

    fn png(name: &str) -> Upload {
        Upload::new(name, Some("image/png".to_string()), Bytes::from_static(b"\x89PNG"))
    }

    #[tokio::test]
    async fn test_signup_then_login() {
        let (dir, _tmp) = directory().await;

        let session = dir.signup(signup_req("a@x.com", "company"), None).await.unwrap();
        let digest = session.account.password_hash.clone().unwrap();
        assert_ne!(digest, "hunter22");

        let claims = dir.sessions().validate(&session.token).unwrap();
        assert_eq!(claims.subject_id, session.account.id);
        assert_eq!(claims.role, "company");

        let login = dir.login("a@x.com", "hunter22").await.unwrap();
        assert_eq!(login.account.id, session.account.id);
    }

    #[tokio::test]
    async fn test_signup_duplicate_email() {
        let (dir, _tmp) = directory().await;
        dir.signup(signup_req("a@x.com", "user"), None).await.unwrap();

        let err = dir.signup(signup_req("a@x.com", "wholesaler"), None).await.unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM accounts")
            .fetch_one(dir.store.pool())
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_signup_validation() {
        let (dir, _tmp) = directory().await;

        let mut missing = signup_req("a@x.com", "user");
        missing.full_name.clear();
        assert!(matches!(
            dir.signup(missing, None).await,
            Err(ServiceError::InvalidRequest(_))
        ));

        assert!(matches!(
            dir.signup(signup_req("a@x.com", "admin"), None).await,
            Err(ServiceError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_signup_without_secret_creates_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let store = AccountStore::new(connect("sqlite::memory:").await.unwrap());
        let dir = AccountDirectory::new(
            store.clone(),
            AssetStore::new(tmp.path(), "/uploads"),
            SessionIssuer::new(None, 24),
            TimeoutConfig::default(),
        );

        let err = dir.signup(signup_req("a@x.com", "user"), None).await.unwrap_err();
        assert!(matches!(err, ServiceError::Configuration(_)));
        assert!(store.find_by_email("a@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_signup_with_logo() {
        let (dir, tmp) = directory().await;
        let session = dir
            .signup(signup_req("a@x.com", "company"), Some(png("logo.png")))
            .await
            .unwrap();

        let logo = session.account.logo_path.unwrap();
        assert!(logo.starts_with("uploads/logos/"));
        assert!(tmp.path().join(&logo).exists());
    }

    #[tokio::test]
    async fn test_login_failures_look_the_same() {
        let (dir, _tmp) = directory().await;
        dir.signup(signup_req("a@x.com", "user"), None).await.unwrap();

        let unknown = dir.login("nobody@x.com", "hunter22").await.unwrap_err();
        let wrong = dir.login("a@x.com", "nope").await.unwrap_err();
        assert_eq!(unknown.to_string(), wrong.to_string());
        assert!(matches!(unknown, ServiceError::Unauthorized(_)));
        assert!(matches!(wrong, ServiceError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_external_identity_upsert() {
        let (dir, _tmp) = directory().await;
        let identity = ExternalIdentity {
            email: "g@x.com".to_string(),
            display_name: "G".to_string(),
            photo_url: "https://img/p.png".to_string(),
            uid: "uid-1".to_string(),
        };

        let created = dir.upsert_external(identity.clone()).await.unwrap();
        assert_eq!(created.account.user_type, "user");
        assert_eq!(created.account.google_uid.as_deref(), Some("uid-1"));

        let again = dir
            .upsert_external(ExternalIdentity {
                display_name: "G Renamed".to_string(),
                uid: "uid-2".to_string(),
                ..identity
            })
            .await
            .unwrap();
        assert_eq!(again.account.id, created.account.id);
        assert_eq!(again.account.full_name, "G Renamed");
        assert_eq!(again.account.google_uid.as_deref(), Some("uid-2"));

        // No password was ever set for this account
        assert!(dir.login("g@x.com", "").await.is_err());

        let missing = dir.upsert_external(ExternalIdentity::default()).await;
        assert!(matches!(missing, Err(ServiceError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_update_profile_rules() {
        let (dir, _tmp) = directory().await;
        let session = dir.signup(signup_req("s@x.com", "serviceProvider"), None).await.unwrap();
        let id = session.account.id;

        let bad = ProfileUpdate {
            service_provider_info: Some(ServiceProviderProfile {
                service_type: "Other".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        };
        assert!(matches!(
            dir.update_profile(&id, bad).await,
            Err(ServiceError::InvalidRequest(_))
        ));

        let good = ProfileUpdate {
            full_name: "New Name".to_string(),
            gender: String::new(),
            ..Default::default()
        };
        dir.update_profile(&id, good).await.unwrap();

        let account = dir.get_profile(&id).await.unwrap();
        assert_eq!(account.full_name, "New Name");
        assert!(account.gender.is_none());

        assert!(matches!(
            dir.update_profile("ghost", ProfileUpdate::default()).await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_logo_upload_supersedes_previous() {
        let (dir, tmp) = directory().await;
        let id = dir
            .signup(signup_req("c@x.com", "company"), None)
            .await
            .unwrap()
            .account
            .id;

        let first = dir.upload_logo(&id, png("a.png")).await.unwrap();
        let second = dir.upload_logo(&id, png("b.png")).await.unwrap();

        assert!(!tmp.path().join(&first).exists());
        assert!(tmp.path().join(&second).exists());

        let data = dir.company_data(&id).await.unwrap();
        assert_eq!(data.company_info.logo, second);

        let text = Upload::new("a.txt", Some("text/plain".to_string()), Bytes::new());
        assert!(matches!(
            dir.upload_logo(&id, text).await,
            Err(ServiceError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_role_checked_operations() {
        let (dir, _tmp) = directory().await;
        let user = dir.signup(signup_req("u@x.com", "user"), None).await.unwrap().account.id;

        assert!(matches!(
            dir.upload_logo(&user, png("a.png")).await,
            Err(ServiceError::Forbidden(_))
        ));
        assert!(matches!(
            dir.company_data(&user).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            dir.update_availability(&user, vec!["mon".into()], vec!["9-5".into()]).await,
            Err(ServiceError::Forbidden(_))
        ));
        assert!(matches!(
            dir.upload_profile_photo(&user, png("me.png")).await,
            Err(ServiceError::Forbidden(_))
        ));

        let provider = dir
            .signup(signup_req("p@x.com", "serviceProvider"), None)
            .await
            .unwrap()
            .account
            .id;
        assert!(matches!(
            dir.update_availability(&provider, vec![], vec!["9-5".into()]).await,
            Err(ServiceError::InvalidRequest(_))
        ));
        dir.update_availability(&provider, vec!["mon".into()], vec!["9-5".into()])
            .await
            .unwrap();
        let photo = dir.upload_profile_photo(&provider, png("me.png")).await.unwrap();
        assert!(photo.starts_with("uploads/profiles/"));

        let info = dir.get_profile(&provider).await.unwrap().service_provider_info.unwrap();
        assert_eq!(info.available_days, vec!["mon".to_string()]);
        assert_eq!(info.profile_photo, photo);
    }

    #[tokio::test]
    async fn test_delete_account_cleans_assets() {
        let (dir, tmp) = directory().await;
        let id = dir
            .signup(signup_req("c@x.com", "company"), Some(png("logo.png")))
            .await
            .unwrap()
            .account
            .id;
        let logo = dir.upload_logo(&id, png("l.png")).await.unwrap();

        let report = dir.delete_account(&id).await.unwrap();
        assert!(report.is_clean());
        assert_eq!(report.removed.len(), 2);
        assert!(!tmp.path().join(&logo).exists());

        assert!(matches!(dir.get_profile(&id).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(dir.delete_account(&id).await, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_client_supplied_asset_paths_are_ignored() {
        let (dir, tmp) = directory().await;
        let victim = dir
            .signup(signup_req("v@x.com", "company"), None)
            .await
            .unwrap()
            .account
            .id;
        let victim_logo = dir.upload_logo(&victim, png("v.png")).await.unwrap();

        let mut req = signup_req("m@x.com", "user");
        req.company_info = Some(CompanyProfile {
            name: "Mallory".to_string(),
            logo: victim_logo.clone(),
            ..Default::default()
        });
        req.service_provider_info = Some(ServiceProviderProfile {
            profile_photo: victim_logo.clone(),
            ..Default::default()
        });
        let account = dir.signup(req, None).await.unwrap().account;
        assert!(account.asset_references().is_empty());

        let update = ProfileUpdate {
            company_info: Some(CompanyProfile {
                name: "Mallory".to_string(),
                logo: victim_logo.clone(),
                ..Default::default()
            }),
            service_provider_info: Some(ServiceProviderProfile {
                profile_photo: victim_logo.clone(),
                ..Default::default()
            }),
            ..Default::default()
        };
        dir.update_profile(&account.id, update).await.unwrap();
        assert!(dir.get_profile(&account.id).await.unwrap().asset_references().is_empty());

        let report = dir.delete_account(&account.id).await.unwrap();
        assert!(report.removed.is_empty());
        assert!(tmp.path().join(&victim_logo).exists());
    }

    #[tokio::test]
    async fn test_profile_update_keeps_uploaded_logo() {
        let (dir, tmp) = directory().await;
        let id = dir
            .signup(signup_req("c@x.com", "company"), None)
            .await
            .unwrap()
            .account
            .id;
        let logo = dir.upload_logo(&id, png("l.png")).await.unwrap();

        let update = ProfileUpdate {
            company_info: Some(CompanyProfile {
                name: "Renamed".to_string(),
                logo: "uploads/elsewhere.png".to_string(),
                ..Default::default()
            }),
            ..Default::default()
        };
        dir.update_profile(&id, update).await.unwrap();

        let info = dir.get_profile(&id).await.unwrap().company_info.unwrap();
        assert_eq!(info.name, "Renamed");
        assert_eq!(info.logo, logo);
        assert!(tmp.path().join(&logo).exists());
    }

    #[tokio::test]
    async fn test_location_and_contacts() {
        let (dir, _tmp) = directory().await;
        let id = dir
            .signup(signup_req("c@x.com", "company"), None)
            .await
            .unwrap()
            .account
            .id;

        assert!(matches!(
            dir.update_location(&id, None).await,
            Err(ServiceError::InvalidRequest(_))
        ));
        dir.update_location(
            &id,
            Some(Location {
                city: "Beirut".to_string(),
                lat: 33.9,
                ..Default::default()
            }),
        )
        .await
        .unwrap();

        dir.update_company_contacts(
            &id,
            ContactDetail {
                website: "https://acme.test".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let account = dir.get_profile(&id).await.unwrap();
        assert_eq!(account.location.unwrap().city, "Beirut");
        assert_eq!(account.company_info.unwrap().details[0].website, "https://acme.test");
    }
}
