use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Select, Set,
};
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::entities::pull_request_activity;
use crate::error::StoreError;
use crate::models::pull_request::PullReq;
use crate::models::{OPT_LOCK_RETRIES, now_millis};
use crate::principal::{self, PrincipalInfo, PrincipalInfoCache};
use crate::types::{
    MergeMethod, PullReqActivityKind, PullReqActivityType, PullReqReviewDecision,
    PullReqReviewerType, PullReqState,
};

/// Sub-state carried by code-comment rows. Present only when
/// `(type, kind)` is `(code-comment, change-comment)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeCommentFields {
    pub outdated: bool,
    pub merge_base_sha: String,
    pub source_sha: String,
    pub path: String,
    pub line_new: i64,
    pub span_new: i64,
    pub line_old: i64,
    pub span_old: i64,
}

/// Structured hints stored next to an activity row, mentions mostly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mentions: Option<MentionsMetadata>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MentionsMetadata {
    pub ids: Vec<i64>,
}

/// System-activity payloads, discriminated by the activity type they
/// produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ActivityPayload {
    StateChange {
        old: PullReqState,
        new: PullReqState,
        #[serde(skip_serializing_if = "Option::is_none")]
        old_draft: Option<bool>,
        #[serde(skip_serializing_if = "Option::is_none")]
        new_draft: Option<bool>,
    },
    TitleChange {
        old: String,
        new: String,
    },
    Merge {
        merge_method: MergeMethod,
        merge_sha: String,
        target_sha: String,
        source_sha: String,
    },
    BranchUpdate {
        old: String,
        new: String,
    },
    BranchDelete {
        sha: String,
    },
    BranchRestore {
        sha: String,
    },
    ReviewSubmit {
        commit_sha: String,
        decision: PullReqReviewDecision,
    },
    ReviewerAdd {
        principal_id: i64,
        reviewer_type: PullReqReviewerType,
    },
    ReviewerDelete {
        principal_id: i64,
    },
}

impl ActivityPayload {
    pub fn activity_type(&self) -> PullReqActivityType {
        match self {
            ActivityPayload::StateChange { .. } => PullReqActivityType::StateChange,
            ActivityPayload::TitleChange { .. } => PullReqActivityType::TitleChange,
            ActivityPayload::Merge { .. } => PullReqActivityType::Merge,
            ActivityPayload::BranchUpdate { .. } => PullReqActivityType::BranchUpdate,
            ActivityPayload::BranchDelete { .. } => PullReqActivityType::BranchDelete,
            ActivityPayload::BranchRestore { .. } => PullReqActivityType::BranchRestore,
            ActivityPayload::ReviewSubmit { .. } => PullReqActivityType::ReviewSubmit,
            ActivityPayload::ReviewerAdd { .. } => PullReqActivityType::ReviewerAdd,
            ActivityPayload::ReviewerDelete { .. } => PullReqActivityType::ReviewerDelete,
        }
    }
}

/// One row of a pull request's journal. Roots have `sub_order=0` and
/// no parent; replies share the root's `order` and advance
/// `sub_order`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullReqActivity {
    pub id: i64,
    pub version: i64,
    pub created_by: i64,
    pub created: i64,
    pub updated: i64,
    pub edited: i64,
    pub deleted: Option<i64>,
    pub parent_id: Option<i64>,
    pub repo_id: i64,
    pub pullreq_id: i64,
    pub order: i64,
    pub sub_order: i64,
    pub reply_seq: i64,
    pub r#type: PullReqActivityType,
    pub kind: PullReqActivityKind,
    pub text: String,
    pub payload: Option<Json>,
    pub metadata: Option<ActivityMetadata>,
    pub resolved_by: Option<i64>,
    pub resolved: Option<i64>,
    pub code_comment: Option<CodeCommentFields>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<PrincipalInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolver: Option<PrincipalInfo>,
}

/// Options shared by [`PullReqActivity::count`] and
/// [`PullReqActivity::list`].
#[derive(Debug, Clone, Default)]
pub struct ActivityFilter {
    pub types: Vec<PullReqActivityType>,
    pub kinds: Vec<PullReqActivityKind>,
    pub after: Option<i64>,
    pub before: Option<i64>,
    pub limit: Option<u64>,
}

const RESOURCE: &str = "pull request activity";

impl PullReqActivity {
    pub fn is_code_comment(&self) -> bool {
        self.r#type == PullReqActivityType::CodeComment
            && self.kind == PullReqActivityKind::ChangeComment
    }

    fn from_model(model: pull_request_activity::Model) -> Result<Self, StoreError> {
        let metadata = model
            .metadata
            .map(serde_json::from_value)
            .transpose()
            .map_err(|err| {
                StoreError::Validation(format!("malformed activity metadata: {err}"))
            })?;

        let code_comment = if model.r#type == PullReqActivityType::CodeComment
            && model.kind == PullReqActivityKind::ChangeComment
        {
            Some(CodeCommentFields {
                outdated: model.outdated.unwrap_or_default(),
                merge_base_sha: model.code_comment_merge_base_sha.unwrap_or_default(),
                source_sha: model.code_comment_source_sha.unwrap_or_default(),
                path: model.code_comment_path.unwrap_or_default(),
                line_new: model.code_comment_line_new.unwrap_or_default(),
                span_new: model.code_comment_span_new.unwrap_or_default(),
                line_old: model.code_comment_line_old.unwrap_or_default(),
                span_old: model.code_comment_span_old.unwrap_or_default(),
            })
        } else {
            None
        };

        Ok(PullReqActivity {
            id: model.id,
            version: model.version,
            created_by: model.created_by,
            created: model.created,
            updated: model.updated,
            edited: model.edited,
            deleted: model.deleted,
            parent_id: model.parent_id,
            repo_id: model.repo_id,
            pullreq_id: model.pullreq_id,
            order: model.order,
            sub_order: model.sub_order,
            reply_seq: model.reply_seq,
            r#type: model.r#type,
            kind: model.kind,
            text: model.text,
            payload: model.payload,
            metadata,
            resolved_by: model.resolved_by,
            resolved: model.resolved,
            code_comment,
            author: None,
            resolver: None,
        })
    }

    fn metadata_json(&self) -> Result<Option<Json>, StoreError> {
        self.metadata
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(|err| {
                StoreError::Validation(format!("failed to serialize activity metadata: {err}"))
            })
    }

    async fn enrich(cache: &PrincipalInfoCache, act: &mut PullReqActivity) {
        act.author = principal::lookup_info(cache, act.created_by).await;
        if let Some(resolved_by) = act.resolved_by {
            act.resolver = principal::lookup_info(cache, resolved_by).await;
        }
    }

    async fn enrich_all(cache: &PrincipalInfoCache, acts: &mut [PullReqActivity]) {
        let mut ids = Vec::with_capacity(2 * acts.len());
        for act in acts.iter() {
            ids.push(act.created_by);
            if let Some(resolved_by) = act.resolved_by {
                ids.push(resolved_by);
            }
        }
        let infos = principal::lookup_map(cache, &ids).await;
        for act in acts.iter_mut() {
            act.author = infos.get(&act.created_by).cloned();
            act.resolver = act.resolved_by.and_then(|id| infos.get(&id).cloned());
        }
    }

    pub async fn find<C: ConnectionTrait>(
        db: &C,
        cache: &PrincipalInfoCache,
        id: i64,
    ) -> Result<PullReqActivity, StoreError> {
        let model = pull_request_activity::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or(StoreError::NotFound(RESOURCE))?;
        let mut act = Self::from_model(model)?;
        Self::enrich(cache, &mut act).await;
        Ok(act)
    }

    /// Inserts a journal row as given; the caller pre-computes `order`
    /// from the pull request's activity sequence. The generated id is
    /// written back.
    pub async fn create<C: ConnectionTrait>(
        db: &C,
        act: &mut PullReqActivity,
    ) -> Result<(), StoreError> {
        let code_comment = act.is_code_comment().then(|| act.code_comment.clone().unwrap_or_default());

        let active = pull_request_activity::ActiveModel {
            version: Set(act.version),
            created_by: Set(act.created_by),
            created: Set(act.created),
            updated: Set(act.updated),
            edited: Set(act.edited),
            deleted: Set(act.deleted),
            parent_id: Set(act.parent_id),
            repo_id: Set(act.repo_id),
            pullreq_id: Set(act.pullreq_id),
            order: Set(act.order),
            sub_order: Set(act.sub_order),
            reply_seq: Set(act.reply_seq),
            r#type: Set(act.r#type),
            kind: Set(act.kind),
            text: Set(act.text.clone()),
            payload: Set(act.payload.clone()),
            metadata: Set(act.metadata_json()?),
            resolved_by: Set(act.resolved_by),
            resolved: Set(act.resolved),
            outdated: Set(code_comment.as_ref().map(|cc| cc.outdated)),
            code_comment_merge_base_sha: Set(code_comment
                .as_ref()
                .map(|cc| cc.merge_base_sha.clone())),
            code_comment_source_sha: Set(code_comment.as_ref().map(|cc| cc.source_sha.clone())),
            code_comment_path: Set(code_comment.as_ref().map(|cc| cc.path.clone())),
            code_comment_line_new: Set(code_comment.as_ref().map(|cc| cc.line_new)),
            code_comment_span_new: Set(code_comment.as_ref().map(|cc| cc.span_new)),
            code_comment_line_old: Set(code_comment.as_ref().map(|cc| cc.line_old)),
            code_comment_span_old: Set(code_comment.as_ref().map(|cc| cc.span_old)),
            ..Default::default()
        };
        let model = active
            .insert(db)
            .await
            .map_err(|err| StoreError::from_db(err, RESOURCE))?;

        act.id = model.id;
        Ok(())
    }

    /// Writes a system activity for `pr` at its current activity
    /// sequence. Callers bump the sequence separately through
    /// [`PullReq::update_activity_seq`].
    pub async fn create_with_payload<C: ConnectionTrait>(
        db: &C,
        pr: &PullReq,
        principal_id: i64,
        payload: &ActivityPayload,
        metadata: Option<ActivityMetadata>,
    ) -> Result<PullReqActivity, StoreError> {
        let now = now_millis();
        let payload_json = serde_json::to_value(payload).map_err(|err| {
            StoreError::Validation(format!("failed to serialize activity payload: {err}"))
        })?;

        let mut act = PullReqActivity {
            id: 0,
            version: 0,
            created_by: principal_id,
            created: now,
            updated: now,
            edited: now,
            deleted: None,
            parent_id: None,
            repo_id: pr.target_repo_id,
            pullreq_id: pr.id,
            order: pr.activity_seq,
            sub_order: 0,
            reply_seq: 0,
            r#type: payload.activity_type(),
            kind: PullReqActivityKind::System,
            text: String::new(),
            payload: Some(payload_json),
            metadata,
            resolved_by: None,
            resolved: None,
            code_comment: None,
            author: None,
            resolver: None,
        };
        Self::create(db, &mut act).await?;
        Ok(act)
    }

    /// Version-guarded update of the mutable journal fields.
    pub async fn update<C: ConnectionTrait>(
        db: &C,
        act: &mut PullReqActivity,
    ) -> Result<(), StoreError> {
        let updated_at = now_millis();
        let metadata = act.metadata_json()?;
        let code_comment = act.is_code_comment().then(|| act.code_comment.clone().unwrap_or_default());

        let result = pull_request_activity::Entity::update_many()
            .col_expr(
                pull_request_activity::Column::Version,
                Expr::value(act.version + 1),
            )
            .col_expr(
                pull_request_activity::Column::Updated,
                Expr::value(updated_at),
            )
            .col_expr(pull_request_activity::Column::Edited, Expr::value(act.edited))
            .col_expr(
                pull_request_activity::Column::Deleted,
                Expr::value(act.deleted),
            )
            .col_expr(
                pull_request_activity::Column::ReplySeq,
                Expr::value(act.reply_seq),
            )
            .col_expr(
                pull_request_activity::Column::Text,
                Expr::value(act.text.clone()),
            )
            .col_expr(
                pull_request_activity::Column::Payload,
                Expr::value(act.payload.clone()),
            )
            .col_expr(
                pull_request_activity::Column::Metadata,
                Expr::value(metadata),
            )
            .col_expr(
                pull_request_activity::Column::ResolvedBy,
                Expr::value(act.resolved_by),
            )
            .col_expr(
                pull_request_activity::Column::Resolved,
                Expr::value(act.resolved),
            )
            .col_expr(
                pull_request_activity::Column::Outdated,
                Expr::value(code_comment.as_ref().map(|cc| cc.outdated)),
            )
            .col_expr(
                pull_request_activity::Column::CodeCommentMergeBaseSha,
                Expr::value(code_comment.as_ref().map(|cc| cc.merge_base_sha.clone())),
            )
            .col_expr(
                pull_request_activity::Column::CodeCommentSourceSha,
                Expr::value(code_comment.as_ref().map(|cc| cc.source_sha.clone())),
            )
            .col_expr(
                pull_request_activity::Column::CodeCommentPath,
                Expr::value(code_comment.as_ref().map(|cc| cc.path.clone())),
            )
            .col_expr(
                pull_request_activity::Column::CodeCommentLineNew,
                Expr::value(code_comment.as_ref().map(|cc| cc.line_new)),
            )
            .col_expr(
                pull_request_activity::Column::CodeCommentSpanNew,
                Expr::value(code_comment.as_ref().map(|cc| cc.span_new)),
            )
            .col_expr(
                pull_request_activity::Column::CodeCommentLineOld,
                Expr::value(code_comment.as_ref().map(|cc| cc.line_old)),
            )
            .col_expr(
                pull_request_activity::Column::CodeCommentSpanOld,
                Expr::value(code_comment.as_ref().map(|cc| cc.span_old)),
            )
            .filter(pull_request_activity::Column::Id.eq(act.id))
            .filter(pull_request_activity::Column::Version.eq(act.version))
            .exec(db)
            .await?;

        if result.rows_affected == 0 {
            return Err(StoreError::VersionConflict(RESOURCE));
        }

        act.version += 1;
        act.updated = updated_at;
        Ok(())
    }

    /// Optimistic-lock retry loop over [`Self::update`].
    pub async fn update_opt_lock<C, F>(
        db: &C,
        cache: &PrincipalInfoCache,
        act: &PullReqActivity,
        mutate: F,
    ) -> Result<PullReqActivity, StoreError>
    where
        C: ConnectionTrait,
        F: Fn(&mut PullReqActivity) -> Result<(), StoreError>,
    {
        let mut current = act.clone();
        for _ in 0..OPT_LOCK_RETRIES {
            let mut next = current.clone();
            mutate(&mut next)?;
            match Self::update(db, &mut next).await {
                Ok(()) => return Ok(next),
                Err(err) if err.is_version_conflict() => {
                    current = Self::find(db, cache, act.id).await?;
                }
                Err(err) => return Err(err),
            }
        }
        Err(StoreError::VersionConflict(RESOURCE))
    }

    pub async fn count<C: ConnectionTrait>(
        db: &C,
        pullreq_id: i64,
        filter: &ActivityFilter,
    ) -> Result<i64, StoreError> {
        let count = apply_filter(
            pull_request_activity::Entity::find()
                .filter(pull_request_activity::Column::PullreqId.eq(pullreq_id)),
            filter,
        )
        .count(db)
        .await?;
        Ok(count as i64)
    }

    /// Journal page for a pull request, in thread order.
    pub async fn list<C: ConnectionTrait>(
        db: &C,
        cache: &PrincipalInfoCache,
        pullreq_id: i64,
        filter: &ActivityFilter,
    ) -> Result<Vec<PullReqActivity>, StoreError> {
        let mut stmt = apply_filter(
            pull_request_activity::Entity::find()
                .filter(pull_request_activity::Column::PullreqId.eq(pullreq_id)),
            filter,
        )
        .order_by_asc(pull_request_activity::Column::Order)
        .order_by_asc(pull_request_activity::Column::SubOrder);
        if let Some(limit) = filter.limit {
            stmt = stmt.limit(limit);
        }

        let models = stmt.all(db).await?;
        let mut acts = models
            .into_iter()
            .map(Self::from_model)
            .collect::<Result<Vec<_>, _>>()?;
        Self::enrich_all(cache, &mut acts).await;
        Ok(acts)
    }

    /// Distinct author ids within one thread, for notification
    /// fan-out.
    pub async fn list_author_ids<C: ConnectionTrait>(
        db: &C,
        pullreq_id: i64,
        order: i64,
    ) -> Result<Vec<i64>, StoreError> {
        let ids = pull_request_activity::Entity::find()
            .select_only()
            .column(pull_request_activity::Column::CreatedBy)
            .distinct()
            .filter(pull_request_activity::Column::PullreqId.eq(pullreq_id))
            .filter(pull_request_activity::Column::Order.eq(order))
            .into_tuple()
            .all(db)
            .await?;
        Ok(ids)
    }

    /// Open comment threads: top-level, non-system, not deleted, not
    /// resolved.
    pub async fn count_unresolved<C: ConnectionTrait>(
        db: &C,
        pullreq_id: i64,
    ) -> Result<i64, StoreError> {
        let count = pull_request_activity::Entity::find()
            .filter(pull_request_activity::Column::PullreqId.eq(pullreq_id))
            .filter(pull_request_activity::Column::SubOrder.eq(0))
            .filter(pull_request_activity::Column::Resolved.is_null())
            .filter(pull_request_activity::Column::Deleted.is_null())
            .filter(pull_request_activity::Column::Kind.ne(PullReqActivityKind::System))
            .count(db)
            .await?;
        Ok(count as i64)
    }
}

fn apply_filter(
    mut stmt: Select<pull_request_activity::Entity>,
    filter: &ActivityFilter,
) -> Select<pull_request_activity::Entity> {
    if !filter.types.is_empty() {
        stmt = stmt.filter(pull_request_activity::Column::Type.is_in(filter.types.iter().copied()));
    }
    if !filter.kinds.is_empty() {
        stmt = stmt.filter(pull_request_activity::Column::Kind.is_in(filter.kinds.iter().copied()));
    }
    if let Some(after) = filter.after {
        stmt = stmt.filter(pull_request_activity::Column::Created.gt(after));
    }
    if let Some(before) = filter.before {
        stmt = stmt.filter(pull_request_activity::Column::Created.lt(before));
    }
    stmt
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::pull_request::tests::{fixture_cache, make_pr, seed_repo, setup_db};

    pub(crate) fn make_activity(
        created_by: i64,
        pullreq_id: i64,
        order: i64,
        sub_order: i64,
        r#type: PullReqActivityType,
        kind: PullReqActivityKind,
    ) -> PullReqActivity {
        let now = now_millis();
        PullReqActivity {
            id: 0,
            version: 0,
            created_by,
            created: now,
            updated: now,
            edited: now,
            deleted: None,
            parent_id: None,
            repo_id: 1,
            pullreq_id,
            order,
            sub_order,
            reply_seq: 0,
            r#type,
            kind,
            text: String::new(),
            payload: None,
            metadata: None,
            resolved_by: None,
            resolved: None,
            code_comment: None,
            author: None,
            resolver: None,
        }
    }

    // One pull request with a mixed journal: a system merge entry, a
    // comment thread at order 2 with two replies, a code comment and a
    // state change.
    async fn seed_journal(db: &sea_orm::DatabaseConnection) -> Vec<PullReqActivity> {
        use PullReqActivityKind as Kind;
        use PullReqActivityType as Type;

        let base = now_millis();
        let rows = [
            (1, 1, 1, Type::Merge, Kind::System, None),
            (2, 2, 1, Type::Comment, Kind::Comment, None),
            (1, 3, 1, Type::Comment, Kind::Comment, Some(2)),
            (1, 4, 1, Type::CodeComment, Kind::ChangeComment, Some(2)),
            (2, 5, 1, Type::StateChange, Kind::Comment, Some(2)),
            (3, 2, 2, Type::TitleChange, Kind::Comment, None),
            (3, 2, 3, Type::StateChange, Kind::Comment, None),
        ];

        let mut created = Vec::new();
        for (i, (author, order, sub_order, r#type, kind, parent)) in rows.into_iter().enumerate() {
            let mut act = make_activity(author, 1, order, sub_order, r#type, kind);
            act.created = base + i as i64;
            act.parent_id = parent;
            if act.is_code_comment() {
                act.code_comment = Some(CodeCommentFields {
                    outdated: false,
                    merge_base_sha: "mb".to_string(),
                    source_sha: "src".to_string(),
                    path: "file.txt".to_string(),
                    line_new: 10,
                    span_new: 2,
                    line_old: 8,
                    span_old: 2,
                });
            }
            PullReqActivity::create(db, &mut act).await.unwrap();
            created.push(act);
        }
        created
    }

    #[tokio::test]
    async fn list_and_count_share_filter_semantics() {
        use PullReqActivityKind as Kind;
        use PullReqActivityType as Type;

        let db = setup_db().await;
        let cache = fixture_cache();
        let seeded = seed_journal(&db).await;
        let pivot = seeded[3].created;

        let cases = [
            (ActivityFilter::default(), 7),
            (
                ActivityFilter {
                    types: vec![Type::StateChange],
                    ..Default::default()
                },
                2,
            ),
            (
                ActivityFilter {
                    types: vec![Type::StateChange, Type::TitleChange],
                    ..Default::default()
                },
                3,
            ),
            (
                ActivityFilter {
                    kinds: vec![Kind::Comment],
                    ..Default::default()
                },
                5,
            ),
            (
                ActivityFilter {
                    kinds: vec![Kind::System, Kind::ChangeComment],
                    ..Default::default()
                },
                2,
            ),
            (
                ActivityFilter {
                    before: Some(pivot),
                    ..Default::default()
                },
                3,
            ),
            (
                ActivityFilter {
                    after: Some(pivot),
                    ..Default::default()
                },
                3,
            ),
        ];

        for (filter, expected) in cases {
            let listed = PullReqActivity::list(&db, &cache, 1, &filter).await.unwrap();
            assert_eq!(listed.len(), expected, "list filter {filter:?}");
            let counted = PullReqActivity::count(&db, 1, &filter).await.unwrap();
            assert_eq!(counted, expected as i64, "count filter {filter:?}");
        }
    }

    #[tokio::test]
    async fn list_orders_by_thread_then_reply() {
        let db = setup_db().await;
        let cache = fixture_cache();
        seed_journal(&db).await;

        let listed = PullReqActivity::list(&db, &cache, 1, &ActivityFilter::default())
            .await
            .unwrap();
        let positions: Vec<(i64, i64)> = listed.iter().map(|a| (a.order, a.sub_order)).collect();
        let mut sorted = positions.clone();
        sorted.sort();
        assert_eq!(positions, sorted);
        assert!(listed.iter().all(|a| a.author.is_some()));
    }

    #[tokio::test]
    async fn list_author_ids_is_distinct_per_thread() {
        let db = setup_db().await;
        seed_journal(&db).await;

        let mut authors = PullReqActivity::list_author_ids(&db, 1, 2).await.unwrap();
        authors.sort();
        assert_eq!(authors, vec![2, 3]);
    }

    #[tokio::test]
    async fn find_returns_code_comment_fields_only_for_code_comments() {
        let db = setup_db().await;
        let cache = fixture_cache();
        let seeded = seed_journal(&db).await;

        let code = PullReqActivity::find(&db, &cache, seeded[3].id).await.unwrap();
        let fields = code.code_comment.unwrap();
        assert_eq!(fields.path, "file.txt");
        assert_eq!(fields.line_new, 10);

        let plain = PullReqActivity::find(&db, &cache, seeded[1].id).await.unwrap();
        assert!(plain.code_comment.is_none());
    }

    #[tokio::test]
    async fn create_with_payload_derives_type_and_order() {
        let db = setup_db().await;
        let cache = fixture_cache();
        seed_repo(&db, 1, 1).await;

        let mut pr = make_pr(1, "feat1");
        PullReq::create(&db, &mut pr).await.unwrap();
        let pr = PullReq::update_activity_seq(&db, &pr).await.unwrap();

        let payload = ActivityPayload::TitleChange {
            old: "old title".to_string(),
            new: "new title".to_string(),
        };
        let act = PullReqActivity::create_with_payload(&db, &pr, 2, &payload, None)
            .await
            .unwrap();

        assert!(act.id > 0);
        assert_eq!(act.order, pr.activity_seq);
        assert_eq!(act.sub_order, 0);
        assert_eq!(act.kind, PullReqActivityKind::System);
        assert_eq!(act.r#type, PullReqActivityType::TitleChange);

        let found = PullReqActivity::find(&db, &cache, act.id).await.unwrap();
        let stored: ActivityPayload = serde_json::from_value(found.payload.unwrap()).unwrap();
        assert_eq!(stored, payload);
    }

    #[tokio::test]
    async fn update_rejects_stale_version_and_opt_lock_retries() {
        use PullReqActivityKind as Kind;
        use PullReqActivityType as Type;

        let db = setup_db().await;
        let cache = fixture_cache();

        let mut act = make_activity(1, 1, 1, 0, Type::Comment, Kind::Comment);
        PullReqActivity::create(&db, &mut act).await.unwrap();

        let stale = act.clone();

        act.text = "first edit".to_string();
        PullReqActivity::update(&db, &mut act).await.unwrap();

        let mut stale_mut = stale.clone();
        stale_mut.text = "stale edit".to_string();
        let err = PullReqActivity::update(&db, &mut stale_mut).await.unwrap_err();
        assert!(err.is_version_conflict());

        let resolved = PullReqActivity::update_opt_lock(&db, &cache, &stale, |act| {
            act.resolved_by = Some(2);
            act.resolved = Some(now_millis());
            Ok(())
        })
        .await
        .unwrap();
        assert_eq!(resolved.text, "first edit");
        assert_eq!(resolved.resolved_by, Some(2));
    }

    #[tokio::test]
    async fn count_unresolved_skips_system_deleted_and_replies() {
        use PullReqActivityKind as Kind;
        use PullReqActivityType as Type;

        let db = setup_db().await;

        // Two open threads, one resolved thread, one deleted thread,
        // one system row and one reply.
        let shapes = [
            (Type::Comment, Kind::Comment, 0, false, false),
            (Type::CodeComment, Kind::ChangeComment, 0, false, false),
            (Type::Comment, Kind::Comment, 0, true, false),
            (Type::Comment, Kind::Comment, 0, false, true),
            (Type::Merge, Kind::System, 0, false, false),
            (Type::Comment, Kind::Comment, 1, false, false),
        ];
        for (i, (r#type, kind, sub_order, resolved, deleted)) in shapes.into_iter().enumerate() {
            let mut act = make_activity(1, 1, i as i64 + 1, sub_order, r#type, kind);
            if act.is_code_comment() {
                act.code_comment = Some(CodeCommentFields::default());
            }
            if resolved {
                act.resolved_by = Some(1);
                act.resolved = Some(now_millis());
            }
            if deleted {
                act.deleted = Some(now_millis());
            }
            PullReqActivity::create(&db, &mut act).await.unwrap();
        }

        let unresolved = PullReqActivity::count_unresolved(&db, 1).await.unwrap();
        assert_eq!(unresolved, 2);
    }
}
