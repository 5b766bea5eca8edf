use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};

use crate::entities::pull_request_activity;
use crate::error::StoreError;
use crate::models::now_millis;
use crate::types::{PullReqActivityKind, PullReqActivityType};

/// Positional slice of a code-comment activity, as consumed by the
/// service that re-anchors comments after branch updates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeComment {
    pub id: i64,
    pub version: i64,
    pub updated: i64,
    pub outdated: bool,
    pub merge_base_sha: String,
    pub source_sha: String,
    pub path: String,
    pub line_new: i64,
    pub span_new: i64,
    pub line_old: i64,
    pub span_old: i64,
}

enum ShaPin<'a> {
    MergeBase(&'a str),
    Source(&'a str),
}

impl CodeComment {
    fn from_model(model: pull_request_activity::Model) -> Self {
        CodeComment {
            id: model.id,
            version: model.version,
            updated: model.updated,
            outdated: model.outdated.unwrap_or_default(),
            merge_base_sha: model.code_comment_merge_base_sha.unwrap_or_default(),
            source_sha: model.code_comment_source_sha.unwrap_or_default(),
            path: model.code_comment_path.unwrap_or_default(),
            line_new: model.code_comment_line_new.unwrap_or(1),
            span_new: model.code_comment_span_new.unwrap_or_default(),
            line_old: model.code_comment_line_old.unwrap_or(1),
            span_old: model.code_comment_span_old.unwrap_or_default(),
        }
    }

    /// Active code comments whose source anchor differs from the
    /// given SHA.
    pub async fn list_not_at_source_sha<C: ConnectionTrait>(
        db: &C,
        pullreq_id: i64,
        source_sha: &str,
    ) -> Result<Vec<CodeComment>, StoreError> {
        Self::list(db, pullreq_id, ShaPin::Source(source_sha)).await
    }

    /// Active code comments whose merge-base anchor differs from the
    /// given SHA.
    pub async fn list_not_at_merge_base_sha<C: ConnectionTrait>(
        db: &C,
        pullreq_id: i64,
        merge_base_sha: &str,
    ) -> Result<Vec<CodeComment>, StoreError> {
        Self::list(db, pullreq_id, ShaPin::MergeBase(merge_base_sha)).await
    }

    // Only live thread roots qualify: not outdated, not deleted, not
    // a reply. Ordered by file and new line so the updater walks each
    // file top to bottom.
    async fn list<C: ConnectionTrait>(
        db: &C,
        pullreq_id: i64,
        pin: ShaPin<'_>,
    ) -> Result<Vec<CodeComment>, StoreError> {
        let mut stmt = pull_request_activity::Entity::find()
            .filter(pull_request_activity::Column::PullreqId.eq(pullreq_id))
            .filter(pull_request_activity::Column::Outdated.eq(false))
            .filter(pull_request_activity::Column::Type.eq(PullReqActivityType::CodeComment))
            .filter(pull_request_activity::Column::Kind.eq(PullReqActivityKind::ChangeComment))
            .filter(pull_request_activity::Column::Deleted.is_null())
            .filter(pull_request_activity::Column::ParentId.is_null());

        stmt = match pin {
            ShaPin::MergeBase(sha) => {
                stmt.filter(pull_request_activity::Column::CodeCommentMergeBaseSha.ne(sha))
            }
            ShaPin::Source(sha) => {
                stmt.filter(pull_request_activity::Column::CodeCommentSourceSha.ne(sha))
            }
        };

        let models = stmt
            .order_by_asc(pull_request_activity::Column::CodeCommentPath)
            .order_by_asc(pull_request_activity::Column::CodeCommentLineNew)
            .all(db)
            .await?;
        Ok(models.into_iter().map(Self::from_model).collect())
    }

    /// Writes back re-anchored positions. Each row is version-guarded
    /// individually; a row changed underneath is skipped with a
    /// warning instead of failing the batch.
    pub async fn update_all<C: ConnectionTrait>(
        db: &C,
        code_comments: &mut [CodeComment],
    ) -> Result<(), StoreError> {
        if code_comments.is_empty() {
            return Ok(());
        }

        let updated_at = now_millis();

        for cc in code_comments.iter_mut() {
            let result = pull_request_activity::Entity::update_many()
                .col_expr(
                    pull_request_activity::Column::Version,
                    Expr::value(cc.version + 1),
                )
                .col_expr(pull_request_activity::Column::Updated, Expr::value(updated_at))
                .col_expr(
                    pull_request_activity::Column::Outdated,
                    Expr::value(cc.outdated),
                )
                .col_expr(
                    pull_request_activity::Column::CodeCommentMergeBaseSha,
                    Expr::value(cc.merge_base_sha.clone()),
                )
                .col_expr(
                    pull_request_activity::Column::CodeCommentSourceSha,
                    Expr::value(cc.source_sha.clone()),
                )
                .col_expr(
                    pull_request_activity::Column::CodeCommentPath,
                    Expr::value(cc.path.clone()),
                )
                .col_expr(
                    pull_request_activity::Column::CodeCommentLineNew,
                    Expr::value(cc.line_new),
                )
                .col_expr(
                    pull_request_activity::Column::CodeCommentSpanNew,
                    Expr::value(cc.span_new),
                )
                .col_expr(
                    pull_request_activity::Column::CodeCommentLineOld,
                    Expr::value(cc.line_old),
                )
                .col_expr(
                    pull_request_activity::Column::CodeCommentSpanOld,
                    Expr::value(cc.span_old),
                )
                .filter(pull_request_activity::Column::Id.eq(cc.id))
                .filter(pull_request_activity::Column::Version.eq(cc.version))
                .exec(db)
                .await?;

            if result.rows_affected == 0 {
                tracing::warn!("version conflict while updating code comment {}", cc.id);
                continue;
            }

            cc.version += 1;
            cc.updated = updated_at;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::activity::tests::make_activity;
    use crate::models::activity::{CodeCommentFields, PullReqActivity};
    use crate::models::pull_request::tests::setup_db;

    // Mix of rows on one pull request: five live code comments with
    // varying anchors plus three rows that must never surface (wrong
    // kind, wrong type, outdated).
    async fn seed_comments(db: &sea_orm::DatabaseConnection) {
        use PullReqActivityKind as Kind;
        use PullReqActivityType as Type;

        let rows = [
            (Type::CodeComment, Kind::ChangeComment, false, "m1", "s1", 10),
            (Type::CodeComment, Kind::System, false, "m1", "s1", 10),
            (Type::Merge, Kind::ChangeComment, false, "m1", "s1", 10),
            (Type::CodeComment, Kind::ChangeComment, true, "m1", "s1", 10),
            (Type::CodeComment, Kind::ChangeComment, false, "m2", "s1", 10),
            (Type::CodeComment, Kind::ChangeComment, false, "m1", "s2", 11),
            (Type::CodeComment, Kind::ChangeComment, false, "m3", "s2", 12),
            (Type::CodeComment, Kind::ChangeComment, false, "m4", "s2", 12),
        ];

        for (i, (r#type, kind, outdated, merge_base, source, line_new)) in
            rows.into_iter().enumerate()
        {
            let mut act = make_activity(1, 1, i as i64 + 1, 0, r#type, kind);
            if act.is_code_comment() {
                act.code_comment = Some(CodeCommentFields {
                    outdated,
                    merge_base_sha: merge_base.to_string(),
                    source_sha: source.to_string(),
                    path: "file.txt".to_string(),
                    line_new,
                    span_new: 2,
                    line_old: 9,
                    span_old: 3,
                });
            }
            PullReqActivity::create(db, &mut act).await.unwrap();
        }
    }

    #[tokio::test]
    async fn list_not_at_source_sha_skips_matching_and_ineligible_rows() {
        let db = setup_db().await;
        seed_comments(&db).await;

        for (sha, expected) in [("s1", 3), ("s2", 2), ("s3", 5)] {
            let comments = CodeComment::list_not_at_source_sha(&db, 1, sha).await.unwrap();
            assert_eq!(comments.len(), expected, "source sha {sha}");
        }
    }

    #[tokio::test]
    async fn list_not_at_merge_base_sha_skips_matching_and_ineligible_rows() {
        let db = setup_db().await;
        seed_comments(&db).await;

        for (sha, expected) in [("m1", 3), ("m2", 4), ("m3", 4)] {
            let comments = CodeComment::list_not_at_merge_base_sha(&db, 1, sha)
                .await
                .unwrap();
            assert_eq!(comments.len(), expected, "merge base sha {sha}");
        }
    }

    #[tokio::test]
    async fn list_orders_by_path_then_new_line() {
        let db = setup_db().await;
        seed_comments(&db).await;

        let comments = CodeComment::list_not_at_source_sha(&db, 1, "s0").await.unwrap();
        let lines: Vec<i64> = comments.iter().map(|cc| cc.line_new).collect();
        let mut sorted = lines.clone();
        sorted.sort();
        assert_eq!(lines, sorted);
    }

    #[tokio::test]
    async fn update_all_reanchors_rows_and_skips_stale_versions() {
        let db = setup_db().await;
        seed_comments(&db).await;

        let mut comments = CodeComment::list_not_at_source_sha(&db, 1, "s9").await.unwrap();
        assert_eq!(comments.len(), 5);

        let stale_copy = comments[0].clone();

        for cc in comments.iter_mut() {
            cc.source_sha = "s9".to_string();
            cc.line_new += 1;
        }
        CodeComment::update_all(&db, &mut comments).await.unwrap();

        let remaining = CodeComment::list_not_at_source_sha(&db, 1, "s9").await.unwrap();
        assert!(remaining.is_empty());

        // The first row moved past the stale copy's version; the
        // batch still succeeds and leaves the newer row alone.
        let mut stale = vec![stale_copy];
        stale[0].line_new = 999;
        CodeComment::update_all(&db, &mut stale).await.unwrap();

        let all = CodeComment::list_not_at_merge_base_sha(&db, 1, "m9").await.unwrap();
        assert!(all.iter().all(|cc| cc.line_new != 999));
    }
}
