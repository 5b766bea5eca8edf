use sea_orm::{ActiveModelTrait, ConnectionTrait, EntityTrait, Set};
use serde::{Deserialize, Serialize};

use crate::entities::pull_request_review;
use crate::error::StoreError;
use crate::types::PullReqReviewDecision;

/// A single submitted review. Immutable once written; the reviewer
/// row's `latest_review_id` points at the newest one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullReqReview {
    pub id: i64,
    pub created_by: i64,
    pub created: i64,
    pub updated: i64,
    pub pullreq_id: i64,
    pub decision: PullReqReviewDecision,
    pub sha: String,
}

const RESOURCE: &str = "pull request review";

impl PullReqReview {
    fn from_model(model: pull_request_review::Model) -> Self {
        PullReqReview {
            id: model.id,
            created_by: model.created_by,
            created: model.created,
            updated: model.updated,
            pullreq_id: model.pullreq_id,
            decision: model.decision,
            sha: model.sha,
        }
    }

    pub async fn find<C: ConnectionTrait>(db: &C, id: i64) -> Result<PullReqReview, StoreError> {
        let model = pull_request_review::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or(StoreError::NotFound(RESOURCE))?;
        Ok(Self::from_model(model))
    }

    /// Inserts the review and writes the generated id back.
    pub async fn create<C: ConnectionTrait>(
        db: &C,
        review: &mut PullReqReview,
    ) -> Result<(), StoreError> {
        let model = pull_request_review::ActiveModel {
            created_by: Set(review.created_by),
            created: Set(review.created),
            updated: Set(review.updated),
            pullreq_id: Set(review.pullreq_id),
            decision: Set(review.decision),
            sha: Set(review.sha.clone()),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(|err| StoreError::from_db(err, RESOURCE))?;

        review.id = model.id;
        Ok(())
    }
}
