use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};

use crate::entities::pull_request_file_view;
use crate::error::StoreError;
use crate::models::now_millis;

/// "Viewed" marker for one file of a pull request diff, per principal.
/// Markers go obsolete when the file changes in a later push.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileView {
    pub pullreq_id: i64,
    pub principal_id: i64,
    pub path: String,
    pub sha: String,
    pub obsolete: bool,
    pub created: i64,
    pub updated: i64,
}

impl FileView {
    fn from_model(model: pull_request_file_view::Model) -> Self {
        FileView {
            pullreq_id: model.pullreq_id,
            principal_id: model.principal_id,
            path: model.path,
            sha: model.sha,
            obsolete: model.obsolete,
            created: model.created,
            updated: model.updated,
        }
    }

    /// Inserts the marker or refreshes `sha`, `obsolete` and `updated`
    /// of an existing one. `created` of the original row survives the
    /// refresh and is written back into `view`.
    pub async fn upsert<C: ConnectionTrait>(db: &C, view: &mut FileView) -> Result<(), StoreError> {
        let active = pull_request_file_view::ActiveModel {
            pullreq_id: Set(view.pullreq_id),
            principal_id: Set(view.principal_id),
            path: Set(view.path.clone()),
            sha: Set(view.sha.clone()),
            obsolete: Set(view.obsolete),
            created: Set(view.created),
            updated: Set(view.updated),
        };

        let model = pull_request_file_view::Entity::insert(active)
            .on_conflict(
                OnConflict::columns([
                    pull_request_file_view::Column::PullreqId,
                    pull_request_file_view::Column::PrincipalId,
                    pull_request_file_view::Column::Path,
                ])
                .update_columns([
                    pull_request_file_view::Column::Updated,
                    pull_request_file_view::Column::Sha,
                    pull_request_file_view::Column::Obsolete,
                ])
                .to_owned(),
            )
            .exec_with_returning(db)
            .await?;

        view.created = model.created;
        Ok(())
    }

    pub async fn find_by_file_for_principal<C: ConnectionTrait>(
        db: &C,
        pullreq_id: i64,
        principal_id: i64,
        path: &str,
    ) -> Result<FileView, StoreError> {
        let model =
            pull_request_file_view::Entity::find_by_id((pullreq_id, principal_id, path.to_string()))
                .one(db)
                .await?
                .ok_or(StoreError::NotFound("file view"))?;
        Ok(Self::from_model(model))
    }

    pub async fn delete_by_file_for_principal<C: ConnectionTrait>(
        db: &C,
        pullreq_id: i64,
        principal_id: i64,
        path: &str,
    ) -> Result<(), StoreError> {
        pull_request_file_view::Entity::delete_by_id((pullreq_id, principal_id, path.to_string()))
            .exec(db)
            .await?;
        Ok(())
    }

    /// Flags the markers of changed files, for every principal. Rows
    /// already obsolete keep their `updated` timestamp.
    pub async fn mark_obsolete<C: ConnectionTrait>(
        db: &C,
        pullreq_id: i64,
        paths: &[String],
    ) -> Result<(), StoreError> {
        pull_request_file_view::Entity::update_many()
            .col_expr(pull_request_file_view::Column::Obsolete, Expr::value(true))
            .col_expr(
                pull_request_file_view::Column::Updated,
                Expr::value(now_millis()),
            )
            .filter(pull_request_file_view::Column::PullreqId.eq(pullreq_id))
            .filter(pull_request_file_view::Column::Path.is_in(paths.iter().cloned()))
            .filter(pull_request_file_view::Column::Obsolete.eq(false))
            .exec(db)
            .await?;
        Ok(())
    }

    /// All markers of a principal on a pull request, obsolete ones
    /// included.
    pub async fn list<C: ConnectionTrait>(
        db: &C,
        pullreq_id: i64,
        principal_id: i64,
    ) -> Result<Vec<FileView>, StoreError> {
        let models = pull_request_file_view::Entity::find()
            .filter(pull_request_file_view::Column::PullreqId.eq(pullreq_id))
            .filter(pull_request_file_view::Column::PrincipalId.eq(principal_id))
            .all(db)
            .await?;
        Ok(models.into_iter().map(Self::from_model).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::pull_request::tests::setup_db;

    fn make_view(principal_id: i64, path: &str, sha: &str) -> FileView {
        let now = now_millis();
        FileView {
            pullreq_id: 1,
            principal_id,
            path: path.to_string(),
            sha: sha.to_string(),
            obsolete: false,
            created: now,
            updated: now,
        }
    }

    #[tokio::test]
    async fn upsert_refreshes_sha_and_keeps_created() {
        let db = setup_db().await;

        let mut view = make_view(1, "src/main.rs", "sha-1");
        FileView::upsert(&db, &mut view).await.unwrap();
        let original_created = view.created;

        let mut refreshed = make_view(1, "src/main.rs", "sha-2");
        refreshed.created = original_created + 1000;
        refreshed.updated = original_created + 1000;
        FileView::upsert(&db, &mut refreshed).await.unwrap();
        assert_eq!(refreshed.created, original_created);

        let found = FileView::find_by_file_for_principal(&db, 1, 1, "src/main.rs")
            .await
            .unwrap();
        assert_eq!(found.sha, "sha-2");
        assert_eq!(found.created, original_created);

        let listed = FileView::list(&db, 1, 1).await.unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[tokio::test]
    async fn mark_obsolete_flags_only_named_live_paths() {
        let db = setup_db().await;

        for (principal, path) in [(1, "a.rs"), (1, "b.rs"), (2, "a.rs"), (1, "c.rs")] {
            let mut view = make_view(principal, path, "sha-1");
            FileView::upsert(&db, &mut view).await.unwrap();
        }

        let paths = vec!["a.rs".to_string(), "b.rs".to_string()];
        FileView::mark_obsolete(&db, 1, &paths).await.unwrap();

        let user1 = FileView::list(&db, 1, 1).await.unwrap();
        for view in &user1 {
            assert_eq!(view.obsolete, view.path != "c.rs", "path {}", view.path);
        }

        // Other principals watching the same file go obsolete too.
        let user2 = FileView::list(&db, 1, 2).await.unwrap();
        assert!(user2.iter().all(|v| v.obsolete));
    }

    #[tokio::test]
    async fn delete_removes_one_marker() {
        let db = setup_db().await;

        let mut view = make_view(1, "a.rs", "sha-1");
        FileView::upsert(&db, &mut view).await.unwrap();
        let mut other = make_view(1, "b.rs", "sha-1");
        FileView::upsert(&db, &mut other).await.unwrap();

        FileView::delete_by_file_for_principal(&db, 1, 1, "a.rs")
            .await
            .unwrap();

        let err = FileView::find_by_file_for_principal(&db, 1, 1, "a.rs")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(FileView::list(&db, 1, 1).await.unwrap().len(), 1);
    }
}
