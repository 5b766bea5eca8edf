use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set,
};
use serde::{Deserialize, Serialize};

use crate::entities::pull_request_reviewer;
use crate::error::StoreError;
use crate::models::now_millis;
use crate::principal::{self, PrincipalInfo, PrincipalInfoCache};
use crate::types::{PullReqReviewDecision, PullReqReviewerType};

/// Reviewer lists are capped; a pull request with more reviewers than
/// this is pathological.
const MAX_REVIEWERS: u64 = 100;

/// Assignment of a principal as reviewer of a pull request, keyed by
/// `(pullreq_id, principal_id)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullReqReviewer {
    pub pullreq_id: i64,
    pub principal_id: i64,
    pub created_by: i64,
    pub created: i64,
    pub updated: i64,
    pub repo_id: i64,
    pub r#type: PullReqReviewerType,
    pub latest_review_id: Option<i64>,
    pub review_decision: PullReqReviewDecision,
    pub sha: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewer: Option<PrincipalInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub added_by: Option<PrincipalInfo>,
}

const RESOURCE: &str = "pull request reviewer";

impl PullReqReviewer {
    fn from_model(model: pull_request_reviewer::Model) -> Self {
        PullReqReviewer {
            pullreq_id: model.pullreq_id,
            principal_id: model.principal_id,
            created_by: model.created_by,
            created: model.created,
            updated: model.updated,
            repo_id: model.repo_id,
            r#type: model.r#type,
            latest_review_id: model.latest_review_id,
            review_decision: model.review_decision,
            sha: model.sha,
            reviewer: None,
            added_by: None,
        }
    }

    async fn enrich(cache: &PrincipalInfoCache, reviewer: &mut PullReqReviewer) {
        reviewer.reviewer = principal::lookup_info(cache, reviewer.principal_id).await;
        reviewer.added_by = principal::lookup_info(cache, reviewer.created_by).await;
    }

    pub async fn find<C: ConnectionTrait>(
        db: &C,
        cache: &PrincipalInfoCache,
        pullreq_id: i64,
        principal_id: i64,
    ) -> Result<PullReqReviewer, StoreError> {
        let model = pull_request_reviewer::Entity::find_by_id((pullreq_id, principal_id))
            .one(db)
            .await?
            .ok_or(StoreError::NotFound(RESOURCE))?;
        let mut reviewer = Self::from_model(model);
        Self::enrich(cache, &mut reviewer).await;
        Ok(reviewer)
    }

    pub async fn create<C: ConnectionTrait>(
        db: &C,
        reviewer: &PullReqReviewer,
    ) -> Result<(), StoreError> {
        pull_request_reviewer::ActiveModel {
            pullreq_id: Set(reviewer.pullreq_id),
            principal_id: Set(reviewer.principal_id),
            created_by: Set(reviewer.created_by),
            created: Set(reviewer.created),
            updated: Set(reviewer.updated),
            repo_id: Set(reviewer.repo_id),
            r#type: Set(reviewer.r#type),
            latest_review_id: Set(reviewer.latest_review_id),
            review_decision: Set(reviewer.review_decision),
            sha: Set(reviewer.sha.clone()),
        }
        .insert(db)
        .await
        .map_err(|err| StoreError::from_db(err, RESOURCE))?;
        Ok(())
    }

    /// Updates the review outcome of an assignment. The assignment
    /// itself (type, creator) is immutable.
    pub async fn update<C: ConnectionTrait>(
        db: &C,
        reviewer: &mut PullReqReviewer,
    ) -> Result<(), StoreError> {
        let updated_at = now_millis();

        pull_request_reviewer::Entity::update_many()
            .col_expr(pull_request_reviewer::Column::Updated, Expr::value(updated_at))
            .col_expr(
                pull_request_reviewer::Column::LatestReviewId,
                Expr::value(reviewer.latest_review_id),
            )
            .col_expr(
                pull_request_reviewer::Column::ReviewDecision,
                Expr::value(reviewer.review_decision),
            )
            .col_expr(
                pull_request_reviewer::Column::Sha,
                Expr::value(reviewer.sha.clone()),
            )
            .filter(pull_request_reviewer::Column::PullreqId.eq(reviewer.pullreq_id))
            .filter(pull_request_reviewer::Column::PrincipalId.eq(reviewer.principal_id))
            .exec(db)
            .await?;

        reviewer.updated = updated_at;
        Ok(())
    }

    pub async fn delete<C: ConnectionTrait>(
        db: &C,
        pullreq_id: i64,
        principal_id: i64,
    ) -> Result<(), StoreError> {
        pull_request_reviewer::Entity::delete_by_id((pullreq_id, principal_id))
            .exec(db)
            .await?;
        Ok(())
    }

    /// Reviewers of a pull request in assignment order.
    pub async fn list<C: ConnectionTrait>(
        db: &C,
        cache: &PrincipalInfoCache,
        pullreq_id: i64,
    ) -> Result<Vec<PullReqReviewer>, StoreError> {
        let models = pull_request_reviewer::Entity::find()
            .filter(pull_request_reviewer::Column::PullreqId.eq(pullreq_id))
            .order_by_asc(pull_request_reviewer::Column::Created)
            .limit(MAX_REVIEWERS)
            .all(db)
            .await?;

        let mut reviewers: Vec<PullReqReviewer> =
            models.into_iter().map(Self::from_model).collect();

        let mut ids = Vec::with_capacity(2 * reviewers.len());
        for reviewer in &reviewers {
            ids.push(reviewer.principal_id);
            ids.push(reviewer.created_by);
        }
        let infos = principal::lookup_map(cache, &ids).await;
        for reviewer in reviewers.iter_mut() {
            reviewer.reviewer = infos.get(&reviewer.principal_id).cloned();
            reviewer.added_by = infos.get(&reviewer.created_by).cloned();
        }
        Ok(reviewers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::pull_request::tests::{fixture_cache, setup_db};

    fn make_reviewer(pullreq_id: i64, principal_id: i64, created: i64) -> PullReqReviewer {
        PullReqReviewer {
            pullreq_id,
            principal_id,
            created_by: 1,
            created,
            updated: created,
            repo_id: 1,
            r#type: PullReqReviewerType::Requested,
            latest_review_id: None,
            review_decision: PullReqReviewDecision::Pending,
            sha: "sha-1".to_string(),
            reviewer: None,
            added_by: None,
        }
    }

    #[tokio::test]
    async fn create_find_and_delete_by_composite_key() {
        let db = setup_db().await;
        let cache = fixture_cache();

        let reviewer = make_reviewer(1, 2, now_millis());
        PullReqReviewer::create(&db, &reviewer).await.unwrap();

        let err = PullReqReviewer::create(&db, &reviewer).await.unwrap_err();
        assert!(err.is_duplicate());

        let found = PullReqReviewer::find(&db, &cache, 1, 2).await.unwrap();
        assert_eq!(found.review_decision, PullReqReviewDecision::Pending);
        assert_eq!(found.reviewer.as_ref().unwrap().id, 2);
        assert_eq!(found.added_by.as_ref().unwrap().id, 1);

        PullReqReviewer::delete(&db, 1, 2).await.unwrap();
        let err = PullReqReviewer::find(&db, &cache, 1, 2).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn update_changes_decision_but_not_assignment() {
        let db = setup_db().await;
        let cache = fixture_cache();

        let mut reviewer = make_reviewer(1, 2, now_millis());
        PullReqReviewer::create(&db, &reviewer).await.unwrap();

        reviewer.review_decision = PullReqReviewDecision::Approved;
        reviewer.latest_review_id = Some(10);
        reviewer.sha = "sha-2".to_string();
        PullReqReviewer::update(&db, &mut reviewer).await.unwrap();

        let found = PullReqReviewer::find(&db, &cache, 1, 2).await.unwrap();
        assert_eq!(found.review_decision, PullReqReviewDecision::Approved);
        assert_eq!(found.latest_review_id, Some(10));
        assert_eq!(found.sha, "sha-2");
        assert_eq!(found.r#type, PullReqReviewerType::Requested);
    }

    #[tokio::test]
    async fn list_orders_by_assignment_time() {
        let db = setup_db().await;
        let cache = fixture_cache();

        let base = now_millis();
        for (principal_id, offset) in [(3, 2), (2, 1), (4, 3)] {
            let reviewer = make_reviewer(1, principal_id, base + offset);
            PullReqReviewer::create(&db, &reviewer).await.unwrap();
        }
        PullReqReviewer::create(&db, &make_reviewer(2, 2, base)).await.unwrap();

        let listed = PullReqReviewer::list(&db, &cache, 1).await.unwrap();
        let principals: Vec<i64> = listed.iter().map(|r| r.principal_id).collect();
        assert_eq!(principals, vec![2, 3, 4]);
        assert!(listed.iter().all(|r| r.reviewer.is_some()));
    }
}
