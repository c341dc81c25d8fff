//! Branch lifecycle: create, list, update and delete entries of a company's
//! embedded branch sequence, keeping image files in step with the document.

use chrono::Utc;
use uuid::Uuid;

use super::error::{bounded, ServiceError, ServiceResult};
use super::Upload;
use crate::api::metrics::record_branch_operation;
use crate::assets::{AssetStore, CleanupReport, BRANCH_IMAGES};
use crate::config::TimeoutConfig;
use crate::db::{AccountStore, Branch, BranchPatch};

#[derive(Debug, Clone)]
pub struct BranchManager {
    store: AccountStore,
    assets: AssetStore,
    timeouts: TimeoutConfig,
}

impl BranchManager {
    pub fn new(store: AccountStore, assets: AssetStore, timeouts: TimeoutConfig) -> Self {
        Self {
            store,
            assets,
            timeouts,
        }
    }

    /// Append a new branch to the owner's sequence.
    ///
    /// Images that fail to store are skipped; the branch is created regardless.
    pub async fn create(
        &self,
        owner_id: &str,
        patch: BranchPatch,
        images: Vec<Upload>,
    ) -> ServiceResult<Branch> {
        bounded(self.timeouts.upload(), async {
            if self.store.branches(owner_id).await?.is_none() {
                return Err(ServiceError::NotFound("User not found".to_string()));
            }

            let image_refs = self.save_images(&images).await;
            let branch = patch.into_branch(Uuid::new_v4().to_string(), image_refs, Utc::now());

            if self.store.push_branch(owner_id, &branch).await? == 0 {
                return Err(ServiceError::Persistence("Failed to save branch".to_string()));
            }

            tracing::info!(
                account_id = %owner_id,
                branch_id = %branch.id,
                images = branch.images.len(),
                "Branch created"
            );
            record_branch_operation("create");
            Ok(branch)
        })
        .await
    }

    /// Branches of `owner_id`; an account without any yields an empty list
    pub async fn list(&self, owner_id: &str) -> ServiceResult<Vec<Branch>> {
        bounded(self.timeouts.request(), async {
            self.store
                .branches(owner_id)
                .await?
                .ok_or_else(|| ServiceError::NotFound("Company not found".to_string()))
        })
        .await
    }

    /// Overlay `patch` onto an existing branch and replace it in place.
    ///
    /// New images supersede the old set only when at least one was stored;
    /// the superseded files are removed after the document is written.
    pub async fn update(
        &self,
        owner_id: &str,
        branch_id: &str,
        patch: BranchPatch,
        images: Vec<Upload>,
    ) -> ServiceResult<Branch> {
        bounded(self.timeouts.upload(), async {
            let existing = self.find(owner_id, branch_id).await?;

            let saved = self.save_images(&images).await;
            let (image_refs, superseded) = if saved.is_empty() {
                (existing.images.clone(), Vec::new())
            } else {
                (saved, existing.images.clone())
            };

            let updated = patch.apply_to(&existing, image_refs, Utc::now());

            if self.store.replace_branch(owner_id, &updated).await? == 0 {
                return Err(ServiceError::NotFound("Branch not found".to_string()));
            }

            let report = self.assets.cleanup(&superseded).await;
            tracing::info!(
                account_id = %owner_id,
                branch_id = %branch_id,
                replaced_images = report.removed.len(),
                cleanup_failures = report.failed.len(),
                "Branch updated"
            );
            record_branch_operation("update");
            Ok(updated)
        })
        .await
    }

    /// Remove a branch, then best-effort delete its images.
    ///
    /// The returned report lists image deletions that failed; the branch is
    /// gone from the sequence either way.
    pub async fn delete(&self, owner_id: &str, branch_id: &str) -> ServiceResult<CleanupReport> {
        bounded(self.timeouts.upload(), async {
            let existing = self.find(owner_id, branch_id).await?;

            if self.store.pull_branch(owner_id, branch_id).await? == 0 {
                return Err(ServiceError::NotFound("Branch not found".to_string()));
            }

            let report = self.assets.cleanup(&existing.images).await;
            if !report.is_clean() {
                tracing::warn!(
                    account_id = %owner_id,
                    branch_id = %branch_id,
                    failed = report.failed.len(),
                    "Branch deleted with leftover images"
                );
            } else {
                tracing::info!(account_id = %owner_id, branch_id = %branch_id, "Branch deleted");
            }
            record_branch_operation("delete");
            Ok(report)
        })
        .await
    }

    async fn find(&self, owner_id: &str, branch_id: &str) -> ServiceResult<Branch> {
        self.store
            .branches(owner_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))?
            .into_iter()
            .find(|b| b.id == branch_id)
            .ok_or_else(|| ServiceError::NotFound("Branch not found".to_string()))
    }

    async fn save_images(&self, images: &[Upload]) -> Vec<String> {
        let mut refs = Vec::with_capacity(images.len());
        for image in images {
            match self
                .assets
                .save(&mut &image.data[..], &image.file_name, BRANCH_IMAGES)
                .await
            {
                Ok(reference) => refs.push(reference),
                Err(e) => {
                    tracing::warn!(file = %image.file_name, error = %e, "Skipping branch image");
                }
            }
        }
        refs
    }
}
