use std::collections::HashMap;

use futures::{Stream, StreamExt};
use sea_orm::sea_query::{Alias, Asterisk, Condition, Expr, ExprTrait, Func, Query};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseBackend, EntityTrait, JoinType,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, QueryTrait, RelationTrait, Select, Set,
    StreamTrait, TransactionSession, TransactionTrait,
};
use serde::{Deserialize, Serialize};

use crate::entities::{pull_request, pull_request_activity, pull_request_label,
    pull_request_reviewer, repository};
use crate::error::StoreError;
use crate::models::{OPT_LOCK_RETRIES, now_millis};
use crate::principal::{self, PrincipalInfo, PrincipalInfoCache};
use crate::types::{
    MergeCheckStatus, MergeMethod, PullReqActivityKind, PullReqFlow, PullReqReviewDecision,
    PullReqSort, PullReqState, SortOrder,
};

/// A pull request with principal info attached where available.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PullReq {
    pub id: i64,
    pub version: i64,
    pub number: i64,
    pub created_by: i64,
    pub created: i64,
    pub updated: i64,
    pub edited: i64,
    pub closed: Option<i64>,
    pub state: PullReqState,
    pub is_draft: bool,
    pub comment_count: i64,
    pub unresolved_count: i64,
    pub title: String,
    pub description: String,
    pub source_repo_id: i64,
    pub source_branch: String,
    pub source_sha: String,
    pub target_repo_id: i64,
    pub target_branch: String,
    pub activity_seq: i64,
    pub merged_by: Option<i64>,
    pub merged: Option<i64>,
    pub merge_method: Option<MergeMethod>,
    pub merge_check_status: MergeCheckStatus,
    pub merge_target_sha: Option<String>,
    pub merge_base_sha: String,
    pub merge_sha: Option<String>,
    pub merge_conflicts: Vec<String>,
    pub rebase_check_status: MergeCheckStatus,
    pub rebase_conflicts: Vec<String>,
    pub commit_count: Option<i64>,
    pub file_count: Option<i64>,
    pub additions: Option<i64>,
    pub deletions: Option<i64>,
    pub flow: PullReqFlow,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<PrincipalInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub merger: Option<PrincipalInfo>,
}

/// Options recognized by [`PullReq::count`] and [`PullReq::list`].
#[derive(Debug, Clone, Default)]
pub struct PullReqFilter {
    pub page: i64,
    pub size: i64,
    pub query: Option<String>,
    pub states: Vec<PullReqState>,
    pub source_repo_id: Option<i64>,
    pub source_branch: Option<String>,
    pub target_repo_id: Option<i64>,
    pub target_branch: Option<String>,
    pub created_by: Vec<i64>,
    pub created_lt: Option<i64>,
    pub created_gt: Option<i64>,
    pub updated_lt: Option<i64>,
    pub updated_gt: Option<i64>,
    pub edited_lt: Option<i64>,
    pub edited_gt: Option<i64>,
    pub author_id: Option<i64>,
    pub commenter_id: Option<i64>,
    /// Counted as a distinct predicate for parity with existing data;
    /// no mention join is applied.
    pub mentioned_id: Option<i64>,
    pub reviewer_id: Option<i64>,
    pub review_decisions: Vec<PullReqReviewDecision>,
    pub space_ids: Vec<i64>,
    pub repo_id_blacklist: Vec<i64>,
    pub label_ids: Vec<i64>,
    pub value_ids: Vec<i64>,
    pub sort: PullReqSort,
    pub order: SortOrder,
}

#[derive(Debug, Clone, Default)]
pub struct PullReqSummaryFilter {
    pub repo_id: i64,
    pub begin: i64,
    pub end: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullReqSummary {
    pub pull_req_count: i64,
    pub push_req_count: i64,
    pub total: i64,
}

const RESOURCE: &str = "pull request";

impl PullReq {
    fn from_model(model: pull_request::Model) -> Self {
        PullReq {
            id: model.id,
            version: model.version,
            number: model.number,
            created_by: model.created_by,
            created: model.created,
            updated: model.updated,
            edited: model.edited,
            closed: model.closed,
            state: model.state,
            is_draft: model.is_draft == "true",
            comment_count: model.comment_count,
            unresolved_count: model.unresolved_count,
            title: model.title,
            description: model.description,
            source_repo_id: model.source_repo_id,
            source_branch: model.source_branch,
            source_sha: model.source_sha,
            target_repo_id: model.target_repo_id,
            target_branch: model.target_branch,
            activity_seq: model.activity_seq,
            merged_by: model.merged_by,
            merged: model.merged,
            merge_method: model.merge_method,
            merge_check_status: model.merge_check_status,
            merge_target_sha: model.merge_target_sha,
            merge_base_sha: model.merge_base_sha,
            merge_sha: model.merge_sha,
            merge_conflicts: split_conflicts(model.merge_conflicts),
            rebase_check_status: model.rebase_check_status,
            rebase_conflicts: split_conflicts(model.rebase_conflicts),
            commit_count: model.commit_count,
            file_count: model.file_count,
            additions: model.additions,
            deletions: model.deletions,
            flow: model.flow,
            author: None,
            merger: None,
        }
    }

    async fn find_model<C: ConnectionTrait>(
        db: &C,
        id: i64,
    ) -> Result<pull_request::Model, StoreError> {
        pull_request::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or(StoreError::NotFound(RESOURCE))
    }

    async fn enrich<C: ConnectionTrait>(
        _db: &C,
        cache: &PrincipalInfoCache,
        pr: &mut PullReq,
    ) {
        pr.author = principal::lookup_info(cache, pr.created_by).await;
        if let Some(merged_by) = pr.merged_by {
            pr.merger = principal::lookup_info(cache, merged_by).await;
        }
    }

    async fn enrich_all(cache: &PrincipalInfoCache, prs: &mut [PullReq]) {
        let mut ids = Vec::with_capacity(prs.len());
        for pr in prs.iter() {
            ids.push(pr.created_by);
            if let Some(merged_by) = pr.merged_by {
                ids.push(merged_by);
            }
        }
        let infos = principal::lookup_map(cache, &ids).await;
        for pr in prs.iter_mut() {
            pr.author = infos.get(&pr.created_by).cloned();
            pr.merger = pr.merged_by.and_then(|id| infos.get(&id).cloned());
        }
    }

    pub async fn find<C: ConnectionTrait>(
        db: &C,
        cache: &PrincipalInfoCache,
        id: i64,
    ) -> Result<PullReq, StoreError> {
        let mut pr = Self::from_model(Self::find_model(db, id).await?);
        Self::enrich(db, cache, &mut pr).await;
        Ok(pr)
    }

    pub async fn find_by_number<C: ConnectionTrait>(
        db: &C,
        cache: &PrincipalInfoCache,
        repo_id: i64,
        number: i64,
    ) -> Result<PullReq, StoreError> {
        Self::find_by_number_inner(db, cache, repo_id, number, false).await
    }

    /// Like [`Self::find_by_number`] but acquires a row-level write
    /// lock on backends that support one. SQLite has no row locks; the
    /// database is single-writer there and callers serialize
    /// externally.
    pub async fn find_by_number_with_lock<C: ConnectionTrait>(
        db: &C,
        cache: &PrincipalInfoCache,
        repo_id: i64,
        number: i64,
    ) -> Result<PullReq, StoreError> {
        Self::find_by_number_inner(db, cache, repo_id, number, true).await
    }

    async fn find_by_number_inner<C: ConnectionTrait>(
        db: &C,
        cache: &PrincipalInfoCache,
        repo_id: i64,
        number: i64,
        lock: bool,
    ) -> Result<PullReq, StoreError> {
        let mut stmt = pull_request::Entity::find()
            .filter(pull_request::Column::TargetRepoId.eq(repo_id))
            .filter(pull_request::Column::Number.eq(number));
        if lock && db.get_database_backend() != DatabaseBackend::Sqlite {
            stmt = stmt.lock_exclusive();
        }
        let model = stmt.one(db).await?.ok_or(StoreError::NotFound(RESOURCE))?;
        let mut pr = Self::from_model(model);
        Self::enrich(db, cache, &mut pr).await;
        Ok(pr)
    }

    /// Returns the open pull request for the given source/target
    /// branch pair, if any. A miss is not an error.
    pub async fn find_open_by_branches<C: ConnectionTrait>(
        db: &C,
        source_repo_id: i64,
        source_branch: &str,
        target_repo_id: i64,
        target_branch: &str,
    ) -> Result<Option<PullReq>, StoreError> {
        let model = pull_request::Entity::find()
            .filter(pull_request::Column::SourceRepoId.eq(source_repo_id))
            .filter(pull_request::Column::SourceBranch.eq(source_branch))
            .filter(pull_request::Column::TargetRepoId.eq(target_repo_id))
            .filter(pull_request::Column::TargetBranch.eq(target_branch))
            .filter(pull_request::Column::State.eq(PullReqState::Open))
            .order_by_desc(pull_request::Column::Updated)
            .one(db)
            .await?;
        Ok(model.map(Self::from_model))
    }

    /// Returns the open pull request of the given flow for the branch
    /// pair; never surfaces NotFound.
    pub async fn get_unmerged<C: ConnectionTrait>(
        db: &C,
        source_repo_id: i64,
        source_branch: &str,
        target_repo_id: i64,
        target_branch: &str,
        flow: PullReqFlow,
    ) -> Result<Option<PullReq>, StoreError> {
        let model = pull_request::Entity::find()
            .filter(pull_request::Column::SourceRepoId.eq(source_repo_id))
            .filter(pull_request::Column::SourceBranch.eq(source_branch))
            .filter(pull_request::Column::TargetRepoId.eq(target_repo_id))
            .filter(pull_request::Column::TargetBranch.eq(target_branch))
            .filter(pull_request::Column::State.eq(PullReqState::Open))
            .filter(pull_request::Column::Flow.eq(flow))
            .order_by_desc(pull_request::Column::Updated)
            .one(db)
            .await?;
        Ok(model.map(Self::from_model))
    }

    /// Inserts a new pull request. The duplicate-open check runs in
    /// the same transaction as the insert; the generated id is written
    /// back into `pr`.
    pub async fn create<C: ConnectionTrait + TransactionTrait>(
        db: &C,
        pr: &mut PullReq,
    ) -> Result<(), StoreError> {
        let txn = db.begin().await?;

        let open = pull_request::Entity::find()
            .filter(pull_request::Column::SourceRepoId.eq(pr.source_repo_id))
            .filter(pull_request::Column::SourceBranch.eq(pr.source_branch.as_str()))
            .filter(pull_request::Column::TargetRepoId.eq(pr.target_repo_id))
            .filter(pull_request::Column::TargetBranch.eq(pr.target_branch.as_str()))
            .filter(pull_request::Column::State.eq(PullReqState::Open))
            .one(&txn)
            .await?;
        if open.is_some() {
            return Err(StoreError::Duplicate(RESOURCE));
        }

        let active = pull_request::ActiveModel {
            version: Set(pr.version),
            number: Set(pr.number),
            created_by: Set(pr.created_by),
            created: Set(pr.created),
            updated: Set(pr.updated),
            edited: Set(pr.edited),
            closed: Set(pr.closed),
            state: Set(pr.state),
            is_draft: Set(draft_text(pr.is_draft)),
            comment_count: Set(pr.comment_count),
            unresolved_count: Set(pr.unresolved_count),
            title: Set(pr.title.clone()),
            description: Set(pr.description.clone()),
            source_repo_id: Set(pr.source_repo_id),
            source_branch: Set(pr.source_branch.clone()),
            source_sha: Set(pr.source_sha.clone()),
            target_repo_id: Set(pr.target_repo_id),
            target_branch: Set(pr.target_branch.clone()),
            activity_seq: Set(pr.activity_seq),
            merged_by: Set(pr.merged_by),
            merged: Set(pr.merged),
            merge_method: Set(pr.merge_method),
            merge_check_status: Set(pr.merge_check_status),
            merge_target_sha: Set(pr.merge_target_sha.clone()),
            merge_base_sha: Set(pr.merge_base_sha.clone()),
            merge_sha: Set(pr.merge_sha.clone()),
            merge_conflicts: Set(join_conflicts(&pr.merge_conflicts)),
            rebase_check_status: Set(pr.rebase_check_status),
            rebase_conflicts: Set(join_conflicts(&pr.rebase_conflicts)),
            commit_count: Set(pr.commit_count),
            file_count: Set(pr.file_count),
            additions: Set(pr.additions),
            deletions: Set(pr.deletions),
            flow: Set(pr.flow),
            ..Default::default()
        };
        let model = active
            .insert(&txn)
            .await
            .map_err(|err| StoreError::from_db(err, RESOURCE))?;
        txn.commit().await?;

        pr.id = model.id;
        Ok(())
    }

    /// Version-guarded update of the mutable fields. On success the
    /// in-memory struct is advanced to the stored version and
    /// timestamps; a stale version leaves the row untouched.
    pub async fn update<C: ConnectionTrait>(db: &C, pr: &mut PullReq) -> Result<(), StoreError> {
        let updated_at = now_millis();

        let result = pull_request::Entity::update_many()
            .col_expr(pull_request::Column::Version, Expr::value(pr.version + 1))
            .col_expr(pull_request::Column::Updated, Expr::value(updated_at))
            .col_expr(pull_request::Column::Edited, Expr::value(updated_at))
            .col_expr(pull_request::Column::State, Expr::value(pr.state))
            .col_expr(
                pull_request::Column::IsDraft,
                Expr::value(draft_text(pr.is_draft)),
            )
            .col_expr(
                pull_request::Column::CommentCount,
                Expr::value(pr.comment_count),
            )
            .col_expr(
                pull_request::Column::UnresolvedCount,
                Expr::value(pr.unresolved_count),
            )
            .col_expr(pull_request::Column::Title, Expr::value(pr.title.clone()))
            .col_expr(
                pull_request::Column::Description,
                Expr::value(pr.description.clone()),
            )
            .col_expr(
                pull_request::Column::ActivitySeq,
                Expr::value(pr.activity_seq),
            )
            .col_expr(
                pull_request::Column::SourceSha,
                Expr::value(pr.source_sha.clone()),
            )
            .col_expr(pull_request::Column::MergedBy, Expr::value(pr.merged_by))
            .col_expr(pull_request::Column::Merged, Expr::value(pr.merged))
            .col_expr(
                pull_request::Column::MergeMethod,
                Expr::value(pr.merge_method),
            )
            .col_expr(
                pull_request::Column::MergeCheckStatus,
                Expr::value(pr.merge_check_status),
            )
            .col_expr(
                pull_request::Column::MergeTargetSha,
                Expr::value(pr.merge_target_sha.clone()),
            )
            .col_expr(
                pull_request::Column::MergeBaseSha,
                Expr::value(pr.merge_base_sha.clone()),
            )
            .col_expr(
                pull_request::Column::MergeSha,
                Expr::value(pr.merge_sha.clone()),
            )
            .col_expr(
                pull_request::Column::MergeConflicts,
                Expr::value(join_conflicts(&pr.merge_conflicts)),
            )
            .col_expr(
                pull_request::Column::RebaseCheckStatus,
                Expr::value(pr.rebase_check_status),
            )
            .col_expr(
                pull_request::Column::RebaseConflicts,
                Expr::value(join_conflicts(&pr.rebase_conflicts)),
            )
            .col_expr(
                pull_request::Column::CommitCount,
                Expr::value(pr.commit_count),
            )
            .col_expr(pull_request::Column::FileCount, Expr::value(pr.file_count))
            .filter(pull_request::Column::Id.eq(pr.id))
            .filter(pull_request::Column::Version.eq(pr.version))
            .exec(db)
            .await?;

        if result.rows_affected == 0 {
            return Err(StoreError::VersionConflict(RESOURCE));
        }

        pr.version += 1;
        pr.updated = updated_at;
        pr.edited = updated_at;
        Ok(())
    }

    /// Optimistic-lock retry loop: applies `mutate` to a copy, tries
    /// [`Self::update`], and re-reads on version conflict.
    pub async fn update_opt_lock<C, F>(
        db: &C,
        pr: &PullReq,
        mutate: F,
    ) -> Result<PullReq, StoreError>
    where
        C: ConnectionTrait,
        F: Fn(&mut PullReq) -> Result<(), StoreError>,
    {
        let mut current = pr.clone();
        for _ in 0..OPT_LOCK_RETRIES {
            let mut next = current.clone();
            mutate(&mut next)?;
            match Self::update(db, &mut next).await {
                Ok(()) => return Ok(next),
                Err(err) if err.is_version_conflict() => {
                    let model = Self::find_model(db, pr.id).await?;
                    let author = current.author.take();
                    let merger = current.merger.take();
                    current = Self::from_model(model);
                    current.author = author;
                    current.merger = merger;
                }
                Err(err) => return Err(err),
            }
        }
        Err(StoreError::VersionConflict(RESOURCE))
    }

    /// Bumps the activity sequence and returns the updated pull
    /// request.
    pub async fn update_activity_seq<C: ConnectionTrait>(
        db: &C,
        pr: &PullReq,
    ) -> Result<PullReq, StoreError> {
        Self::update_opt_lock(db, pr, |pr| {
            pr.activity_seq += 1;
            Ok(())
        })
        .await
    }

    /// Invalidates merge-check results of every pull request still in
    /// flight against the given target branch. `merge_base_sha` is
    /// preserved; versions advance so concurrent updaters notice.
    pub async fn reset_merge_check_status<C: ConnectionTrait>(
        db: &C,
        target_repo_id: i64,
        target_branch: &str,
    ) -> Result<(), StoreError> {
        pull_request::Entity::update_many()
            .col_expr(pull_request::Column::Updated, Expr::value(now_millis()))
            .col_expr(
                pull_request::Column::Version,
                Expr::col(pull_request::Column::Version).add(1),
            )
            .col_expr(
                pull_request::Column::MergeTargetSha,
                Expr::value(None::<String>),
            )
            .col_expr(pull_request::Column::MergeSha, Expr::value(None::<String>))
            .col_expr(
                pull_request::Column::MergeCheckStatus,
                Expr::value(MergeCheckStatus::Unchecked),
            )
            .col_expr(
                pull_request::Column::MergeConflicts,
                Expr::value(None::<String>),
            )
            .col_expr(
                pull_request::Column::RebaseCheckStatus,
                Expr::value(MergeCheckStatus::Unchecked),
            )
            .col_expr(
                pull_request::Column::RebaseConflicts,
                Expr::value(None::<String>),
            )
            .col_expr(pull_request::Column::CommitCount, Expr::value(None::<i64>))
            .col_expr(pull_request::Column::FileCount, Expr::value(None::<i64>))
            .filter(pull_request::Column::TargetRepoId.eq(target_repo_id))
            .filter(pull_request::Column::TargetBranch.eq(target_branch))
            .filter(
                pull_request::Column::State
                    .is_not_in([PullReqState::Closed, PullReqState::Merged]),
            )
            .exec(db)
            .await?;
        Ok(())
    }

    /// Hard delete; succeeds even when the row is already gone.
    pub async fn delete<C: ConnectionTrait>(db: &C, id: i64) -> Result<(), StoreError> {
        pull_request::Entity::delete_by_id(id).exec(db).await?;
        Ok(())
    }

    pub async fn count<C: ConnectionTrait>(
        db: &C,
        filter: &PullReqFilter,
    ) -> Result<i64, StoreError> {
        // Joins can fan out rows, so the count collapses to distinct
        // pull-request ids whenever one of these options is present.
        let distinct = !filter.label_ids.is_empty()
            || !filter.value_ids.is_empty()
            || filter.commenter_id.is_some()
            || filter.mentioned_id.is_some();

        if !distinct && filter.reviewer_id.is_none() && filter.space_ids.is_empty() {
            let count = apply_filter(pull_request::Entity::find(), filter)
                .count(db)
                .await?;
            return Ok(count as i64);
        }

        let mut sub = apply_filter(pull_request::Entity::find(), filter)
            .select_only()
            .column(pull_request::Column::Id)
            .into_query();
        if distinct {
            sub.distinct();
        }
        let query = Query::select()
            .expr_as(Func::count(Expr::col(Asterisk)), Alias::new("cnt"))
            .from_subquery(sub, Alias::new("matched"))
            .to_owned();
        let row = db
            .query_one(&query)
            .await?
            .ok_or(StoreError::NotFound(RESOURCE))?;
        Ok(row.try_get("", "cnt")?)
    }

    pub async fn list<C: ConnectionTrait>(
        db: &C,
        cache: &PrincipalInfoCache,
        filter: &PullReqFilter,
    ) -> Result<Vec<PullReq>, StoreError> {
        let mut stmt = apply_filter(pull_request::Entity::find(), filter);

        let sort_column = match filter.sort {
            PullReqSort::Number => pull_request::Column::Number,
            PullReqSort::Created => pull_request::Column::Created,
            PullReqSort::Updated => pull_request::Column::Updated,
            PullReqSort::Edited => pull_request::Column::Edited,
            PullReqSort::Merged => pull_request::Column::Merged,
        };
        stmt = match filter.order {
            SortOrder::Asc => stmt.order_by_asc(sort_column),
            SortOrder::Desc => stmt.order_by_desc(sort_column),
        };

        let size = if filter.size > 0 { filter.size } else { 100 };
        let page = Ord::max(filter.page, 1);
        stmt = stmt.limit(size as u64).offset(((page - 1) * size) as u64);

        let models = stmt.all(db).await?;
        let mut prs: Vec<PullReq> = models.into_iter().map(Self::from_model).collect();
        Self::enrich_all(cache, &mut prs).await;
        Ok(prs)
    }

    /// Lazy sequence of matching pull requests ordered by `updated`
    /// descending. Rows are not enriched with principal info.
    pub async fn stream<'a, C>(
        db: &'a C,
        filter: &PullReqFilter,
    ) -> Result<impl Stream<Item = Result<PullReq, StoreError>> + 'a, StoreError>
    where
        C: ConnectionTrait + StreamTrait,
    {
        let stream = apply_filter(pull_request::Entity::find(), filter)
            .order_by_desc(pull_request::Column::Updated)
            .stream(db)
            .await?;
        Ok(stream.map(|item| {
            item.map(Self::from_model)
                .map_err(StoreError::from)
        }))
    }

    /// Groups open pull requests of the repository by source branch,
    /// most recently updated first within each group.
    pub async fn list_open_by_branch_name<C: ConnectionTrait>(
        db: &C,
        repo_id: i64,
        branch_names: &[String],
    ) -> Result<HashMap<String, Vec<PullReq>>, StoreError> {
        let models = pull_request::Entity::find()
            .filter(pull_request::Column::SourceRepoId.eq(repo_id))
            .filter(pull_request::Column::SourceBranch.is_in(branch_names.iter().cloned()))
            .filter(pull_request::Column::State.eq(PullReqState::Open))
            .order_by_desc(pull_request::Column::Updated)
            .all(db)
            .await?;

        let mut result: HashMap<String, Vec<PullReq>> = HashMap::new();
        for model in models {
            let pr = Self::from_model(model);
            result.entry(pr.source_branch.clone()).or_default().push(pr);
        }
        Ok(result)
    }

    /// Per-flow totals for the repository within the created window.
    pub async fn summary_count<C: ConnectionTrait>(
        db: &C,
        filter: &PullReqSummaryFilter,
    ) -> Result<PullReqSummary, StoreError> {
        let rows: Vec<(i32, i64)> = pull_request::Entity::find()
            .select_only()
            .column(pull_request::Column::Flow)
            .column_as(
                Expr::col((pull_request::Entity, pull_request::Column::Id)).count(),
                "count",
            )
            .filter(pull_request::Column::TargetRepoId.eq(filter.repo_id))
            .filter(pull_request::Column::Created.gte(filter.begin))
            .filter(pull_request::Column::Created.lte(filter.end))
            .group_by(pull_request::Column::Flow)
            .into_tuple()
            .all(db)
            .await?;

        let mut summary = PullReqSummary::default();
        for (flow, count) in rows {
            summary.total += count;
            if flow == 1 {
                summary.push_req_count += count;
            } else {
                summary.pull_req_count += count;
            }
        }
        Ok(summary)
    }
}

fn apply_filter(
    mut stmt: Select<pull_request::Entity>,
    filter: &PullReqFilter,
) -> Select<pull_request::Entity> {
    if !filter.states.is_empty() {
        stmt = stmt.filter(pull_request::Column::State.is_in(filter.states.iter().copied()));
    }
    if let Some(source_repo_id) = filter.source_repo_id {
        stmt = stmt.filter(pull_request::Column::SourceRepoId.eq(source_repo_id));
    }
    if let Some(source_branch) = &filter.source_branch {
        stmt = stmt.filter(pull_request::Column::SourceBranch.eq(source_branch.as_str()));
    }
    if let Some(target_repo_id) = filter.target_repo_id {
        stmt = stmt.filter(pull_request::Column::TargetRepoId.eq(target_repo_id));
    }
    if let Some(target_branch) = &filter.target_branch {
        stmt = stmt.filter(pull_request::Column::TargetBranch.eq(target_branch.as_str()));
    }
    if let Some(query) = &filter.query {
        stmt = stmt.filter(
            Expr::expr(Func::lower(Expr::col((
                pull_request::Entity,
                pull_request::Column::Title,
            ))))
            .like(format!("%{}%", query.to_lowercase())),
        );
    }
    if !filter.created_by.is_empty() {
        stmt = stmt.filter(pull_request::Column::CreatedBy.is_in(filter.created_by.clone()));
    }
    if let Some(author_id) = filter.author_id {
        stmt = stmt.filter(pull_request::Column::CreatedBy.eq(author_id));
    }
    if let Some(created_lt) = filter.created_lt {
        stmt = stmt.filter(pull_request::Column::Created.lt(created_lt));
    }
    if let Some(created_gt) = filter.created_gt {
        stmt = stmt.filter(pull_request::Column::Created.gt(created_gt));
    }
    if let Some(updated_lt) = filter.updated_lt {
        stmt = stmt.filter(pull_request::Column::Updated.lt(updated_lt));
    }
    if let Some(updated_gt) = filter.updated_gt {
        stmt = stmt.filter(pull_request::Column::Updated.gt(updated_gt));
    }
    if let Some(edited_lt) = filter.edited_lt {
        stmt = stmt.filter(pull_request::Column::Edited.lt(edited_lt));
    }
    if let Some(edited_gt) = filter.edited_gt {
        stmt = stmt.filter(pull_request::Column::Edited.gt(edited_gt));
    }
    if !filter.space_ids.is_empty() {
        stmt = stmt
            .join(
                JoinType::InnerJoin,
                pull_request::Relation::TargetRepository.def(),
            )
            .filter(repository::Column::ParentId.is_in(filter.space_ids.clone()));
    }
    if !filter.repo_id_blacklist.is_empty() {
        stmt = stmt.filter(
            pull_request::Column::TargetRepoId.is_not_in(filter.repo_id_blacklist.clone()),
        );
    }
    if let Some(commenter_id) = filter.commenter_id {
        stmt = stmt
            .join(
                JoinType::InnerJoin,
                pull_request::Relation::Activities.def(),
            )
            .filter(pull_request_activity::Column::Deleted.is_null())
            .filter(pull_request_activity::Column::Kind.is_in([
                PullReqActivityKind::Comment,
                PullReqActivityKind::ChangeComment,
            ]))
            .filter(pull_request_activity::Column::CreatedBy.eq(commenter_id));
    }
    if let Some(reviewer_id) = filter.reviewer_id {
        stmt = stmt
            .join(
                JoinType::InnerJoin,
                pull_request::Relation::Reviewers.def(),
            )
            .filter(pull_request_reviewer::Column::PrincipalId.eq(reviewer_id));
        if !filter.review_decisions.is_empty() {
            stmt = stmt.filter(
                pull_request_reviewer::Column::ReviewDecision
                    .is_in(filter.review_decisions.iter().copied()),
            );
        }
    }
    if !filter.label_ids.is_empty() || !filter.value_ids.is_empty() {
        let mut cond = Condition::any();
        if !filter.label_ids.is_empty() {
            cond = cond.add(pull_request_label::Column::LabelId.is_in(filter.label_ids.clone()));
        }
        if !filter.value_ids.is_empty() {
            cond = cond
                .add(pull_request_label::Column::LabelValueId.is_in(filter.value_ids.clone()));
        }
        let wanted = (filter.label_ids.len() + filter.value_ids.len()) as i64;
        stmt = stmt
            .join(JoinType::InnerJoin, pull_request::Relation::Labels.def())
            .filter(cond)
            .group_by(pull_request::Column::Id)
            .having(
                Expr::expr(Func::count(Expr::col((
                    pull_request_label::Entity,
                    pull_request_label::Column::LabelId,
                ))))
                .eq(wanted),
            );
    }
    stmt
}

fn draft_text(is_draft: bool) -> String {
    if is_draft { "true" } else { "false" }.to_string()
}

fn join_conflicts(conflicts: &[String]) -> Option<String> {
    if conflicts.is_empty() {
        None
    } else {
        Some(conflicts.join("\n"))
    }
}

fn split_conflicts(raw: Option<String>) -> Vec<String> {
    raw.map(|s| s.lines().map(str::to_string).collect())
        .unwrap_or_default()
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Arc;

    use sea_orm::Database;
    use sea_orm_migration::MigratorTrait;

    use super::*;
    use crate::principal::{PrincipalInfo, PrincipalInfoProvider};

    pub(crate) struct FixturePrincipals;

    #[async_trait::async_trait]
    impl PrincipalInfoProvider for FixturePrincipals {
        async fn fetch(&self, id: i64) -> anyhow::Result<Option<PrincipalInfo>> {
            Ok(Some(PrincipalInfo {
                id,
                uid: format!("user_{id}"),
                display_name: format!("User {id}"),
                email: format!("user{id}@example.com"),
            }))
        }
    }

    pub(crate) fn fixture_cache() -> PrincipalInfoCache {
        PrincipalInfoCache::new(Arc::new(FixturePrincipals))
    }

    pub(crate) async fn setup_db() -> sea_orm::DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db_migration::Migrator::up(&db, None).await.unwrap();
        db
    }

    pub(crate) fn make_pr(number: i64, source_branch: &str) -> PullReq {
        let now = now_millis();
        PullReq {
            id: 0,
            version: 1,
            number,
            created_by: 1,
            created: now,
            updated: now,
            edited: now,
            closed: None,
            state: PullReqState::Open,
            is_draft: false,
            comment_count: 0,
            unresolved_count: 0,
            title: format!("pull request {number}"),
            description: String::new(),
            source_repo_id: 1,
            source_branch: source_branch.to_string(),
            source_sha: format!("sha-{number}"),
            target_repo_id: 1,
            target_branch: "main".to_string(),
            activity_seq: 0,
            merged_by: None,
            merged: None,
            merge_method: None,
            merge_check_status: MergeCheckStatus::Unchecked,
            merge_target_sha: None,
            merge_base_sha: "base".to_string(),
            merge_sha: None,
            merge_conflicts: Vec::new(),
            rebase_check_status: MergeCheckStatus::Unchecked,
            rebase_conflicts: Vec::new(),
            commit_count: None,
            file_count: None,
            additions: None,
            deletions: None,
            flow: PullReqFlow::Pull,
            author: None,
            merger: None,
        }
    }

    pub(crate) async fn seed_repo(db: &sea_orm::DatabaseConnection, id: i64, parent_id: i64) {
        use crate::entities::repository;
        use sea_orm::ActiveValue::Set;
        repository::ActiveModel {
            id: Set(id),
            parent_id: Set(parent_id),
            uid: Set(format!("repo_{id}")),
        }
        .insert(db)
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn create_rejects_second_open_pr_for_same_branches() {
        let db = setup_db().await;
        seed_repo(&db, 1, 1).await;

        let mut first = make_pr(1, "feat1");
        PullReq::create(&db, &mut first).await.unwrap();
        assert!(first.id > 0);

        let mut dup = make_pr(2, "feat1");
        let err = PullReq::create(&db, &mut dup).await.unwrap_err();
        assert!(err.is_duplicate());

        // Closing the first frees the branch pair for re-creation.
        first.state = PullReqState::Closed;
        PullReq::update(&db, &mut first).await.unwrap();

        let mut again = make_pr(2, "feat1");
        PullReq::create(&db, &mut again).await.unwrap();
        assert!(again.id > first.id);
    }

    #[tokio::test]
    async fn update_increments_version_and_rejects_stale_writes() {
        let db = setup_db().await;
        let cache = fixture_cache();

        let mut pr = make_pr(1, "feat1");
        PullReq::create(&db, &mut pr).await.unwrap();

        let stale = pr.clone();

        pr.title = "updated title".to_string();
        PullReq::update(&db, &mut pr).await.unwrap();
        assert_eq!(pr.version, stale.version + 1);

        let mut stale = stale;
        let err = PullReq::update(&db, &mut stale).await.unwrap_err();
        assert!(err.is_version_conflict());

        let found = PullReq::find(&db, &cache, pr.id).await.unwrap();
        assert_eq!(found.title, "updated title");
        assert_eq!(found.version, pr.version);
        assert_eq!(found.author.as_ref().unwrap().id, 1);
    }

    #[tokio::test]
    async fn update_opt_lock_retries_past_interleaved_writer() {
        let db = setup_db().await;

        let mut pr = make_pr(1, "feat1");
        PullReq::create(&db, &mut pr).await.unwrap();

        // Another writer advances the row; the caller still holds the
        // old version.
        let mut other = pr.clone();
        other.comment_count = 7;
        PullReq::update(&db, &mut other).await.unwrap();

        let updated = PullReq::update_opt_lock(&db, &pr, |pr| {
            pr.activity_seq += 1;
            Ok(())
        })
        .await
        .unwrap();
        assert_eq!(updated.activity_seq, 1);
        assert_eq!(updated.comment_count, 7);
        assert_eq!(updated.version, other.version + 1);
    }

    #[tokio::test]
    async fn reset_merge_check_status_touches_only_open_prs_on_target() {
        let db = setup_db().await;
        let cache = fixture_cache();

        let mut targets = Vec::new();
        for (number, state, target_branch, target_repo) in [
            (1, PullReqState::Open, "main", 1),
            (2, PullReqState::Open, "main", 1),
            (3, PullReqState::Merged, "test", 1),
            (4, PullReqState::Closed, "test", 1),
            (5, PullReqState::Open, "test", 2),
        ] {
            let mut pr = make_pr(number, &format!("feat{number}"));
            pr.target_branch = target_branch.to_string();
            pr.target_repo_id = target_repo;
            pr.merge_check_status = MergeCheckStatus::Mergeable;
            pr.merge_sha = Some("m".to_string());
            PullReq::create(&db, &mut pr).await.unwrap();
            if state != PullReqState::Open {
                pr.state = state;
                PullReq::update(&db, &mut pr).await.unwrap();
            }
            targets.push(pr);
        }

        // Rows 3 and 4 target branch "test" but share repo 1; make the
        // reset hit repo 1 / "main" only.
        PullReq::reset_merge_check_status(&db, 1, "main").await.unwrap();

        for pr in &targets {
            let found = PullReq::find(&db, &cache, pr.id).await.unwrap();
            if pr.target_repo_id == 1 && pr.target_branch == "main" {
                assert_eq!(found.version, pr.version + 1, "pr {}", pr.number);
                assert_eq!(found.merge_check_status, MergeCheckStatus::Unchecked);
                assert_eq!(found.merge_sha, None);
                assert_eq!(found.merge_base_sha, pr.merge_base_sha);
            } else {
                assert_eq!(found.version, pr.version, "pr {}", pr.number);
                assert_eq!(found.merge_check_status, pr.merge_check_status);
            }
        }
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let db = setup_db().await;

        let mut pr = make_pr(1, "feat1");
        PullReq::create(&db, &mut pr).await.unwrap();

        PullReq::delete(&db, pr.id).await.unwrap();
        PullReq::delete(&db, pr.id).await.unwrap();

        let cache = fixture_cache();
        let err = PullReq::find(&db, &cache, pr.id).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn list_filters_by_state_and_title_query() {
        let db = setup_db().await;
        let cache = fixture_cache();

        for (number, branch, title) in [
            (1, "feat1", "Fix login flow"),
            (2, "feat2", "Add logout button"),
            (3, "feat3", "Refactor login tests"),
        ] {
            let mut pr = make_pr(number, branch);
            pr.title = title.to_string();
            PullReq::create(&db, &mut pr).await.unwrap();
        }

        let filter = PullReqFilter {
            states: vec![PullReqState::Open],
            query: Some("LOGIN".to_string()),
            sort: PullReqSort::Number,
            order: SortOrder::Asc,
            ..Default::default()
        };
        let found = PullReq::list(&db, &cache, &filter).await.unwrap();
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].number, 1);
        assert_eq!(found[1].number, 3);

        let count = PullReq::count(&db, &filter).await.unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn summary_count_buckets_by_flow() {
        let db = setup_db().await;

        for number in 1..=3 {
            let mut pr = make_pr(number, &format!("feat{number}"));
            if number == 3 {
                pr.flow = PullReqFlow::Push;
            }
            PullReq::create(&db, &mut pr).await.unwrap();
        }

        let summary = PullReq::summary_count(
            &db,
            &PullReqSummaryFilter {
                repo_id: 1,
                begin: 0,
                end: now_millis() + 1,
            },
        )
        .await
        .unwrap();
        assert_eq!(summary.pull_req_count, 2);
        assert_eq!(summary.push_req_count, 1);
        assert_eq!(summary.total, 3);
    }

    #[tokio::test]
    async fn get_unmerged_returns_none_without_error() {
        let db = setup_db().await;

        let missing = PullReq::get_unmerged(&db, 1, "feat1", 1, "main", PullReqFlow::Pull)
            .await
            .unwrap();
        assert!(missing.is_none());

        let mut pr = make_pr(1, "feat1");
        PullReq::create(&db, &mut pr).await.unwrap();

        let found = PullReq::get_unmerged(&db, 1, "feat1", 1, "main", PullReqFlow::Pull)
            .await
            .unwrap();
        assert_eq!(found.map(|pr| pr.id), Some(pr.id));
    }

    #[tokio::test]
    async fn list_open_by_branch_name_groups_by_source_branch() {
        let db = setup_db().await;

        for (number, branch) in [(1, "feat1"), (2, "feat2")] {
            let mut pr = make_pr(number, branch);
            PullReq::create(&db, &mut pr).await.unwrap();
        }
        let mut closed = make_pr(3, "feat3");
        PullReq::create(&db, &mut closed).await.unwrap();
        closed.state = PullReqState::Closed;
        PullReq::update(&db, &mut closed).await.unwrap();

        let branches = vec![
            "feat1".to_string(),
            "feat2".to_string(),
            "feat3".to_string(),
        ];
        let grouped = PullReq::list_open_by_branch_name(&db, 1, &branches)
            .await
            .unwrap();
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped["feat1"].len(), 1);
        assert_eq!(grouped["feat2"].len(), 1);
        assert!(!grouped.contains_key("feat3"));
    }

    #[tokio::test]
    async fn stream_yields_rows_ordered_by_updated_desc() {
        use futures::TryStreamExt;

        let db = setup_db().await;

        for (number, branch) in [(1, "feat1"), (2, "feat2"), (3, "feat3")] {
            let mut pr = make_pr(number, branch);
            PullReq::create(&db, &mut pr).await.unwrap();
            // Distinct updated timestamps so the order is stable.
            pr.title = format!("touched {number}");
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
            PullReq::update(&db, &mut pr).await.unwrap();
        }

        let filter = PullReqFilter::default();
        let stream = PullReq::stream(&db, &filter).await.unwrap();
        let prs: Vec<PullReq> = stream.try_collect().await.unwrap();
        assert_eq!(prs.len(), 3);
        assert!(prs.windows(2).all(|w| w[0].updated >= w[1].updated));
    }
}
