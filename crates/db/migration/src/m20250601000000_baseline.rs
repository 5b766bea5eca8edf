use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::DatabaseBackend;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create().if_not_exists()
                    .table(Repositories::Table)
                    .col(pk_id_col(manager, Repositories::RepoId))
                    .col(id_col(Repositories::RepoParentId))
                    .col(ColumnDef::new(Repositories::RepoUid).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create().if_not_exists()
                    .table(Pullreqs::Table)
                    .col(pk_id_col(manager, Pullreqs::PullreqId))
                    .col(counter_col(Pullreqs::PullreqVersion))
                    .col(id_col(Pullreqs::PullreqNumber))
                    .col(id_col(Pullreqs::PullreqCreatedBy))
                    .col(millis_col(Pullreqs::PullreqCreated))
                    .col(millis_col(Pullreqs::PullreqUpdated))
                    .col(millis_col(Pullreqs::PullreqEdited))
                    .col(ColumnDef::new(Pullreqs::PullreqClosed).big_integer())
                    .col(ColumnDef::new(Pullreqs::PullreqState).string().not_null())
                    .col(
                        ColumnDef::new(Pullreqs::PullreqIsDraft)
                            .string()
                            .not_null()
                            .default(Expr::val("false")),
                    )
                    .col(counter_col(Pullreqs::PullreqCommentCount))
                    .col(counter_col(Pullreqs::PullreqUnresolvedCount))
                    .col(ColumnDef::new(Pullreqs::PullreqTitle).string().not_null())
                    .col(ColumnDef::new(Pullreqs::PullreqDescription).text().not_null())
                    .col(id_col(Pullreqs::PullreqSourceRepoId))
                    .col(ColumnDef::new(Pullreqs::PullreqSourceBranch).string().not_null())
                    .col(ColumnDef::new(Pullreqs::PullreqSourceSha).string().not_null())
                    .col(id_col(Pullreqs::PullreqTargetRepoId))
                    .col(ColumnDef::new(Pullreqs::PullreqTargetBranch).string().not_null())
                    .col(counter_col(Pullreqs::PullreqActivitySeq))
                    .col(ColumnDef::new(Pullreqs::PullreqMergedBy).big_integer())
                    .col(ColumnDef::new(Pullreqs::PullreqMerged).big_integer())
                    .col(ColumnDef::new(Pullreqs::PullreqMergeMethod).string())
                    .col(
                        ColumnDef::new(Pullreqs::PullreqMergeCheckStatus)
                            .string()
                            .not_null()
                            .default(Expr::val("unchecked")),
                    )
                    .col(ColumnDef::new(Pullreqs::PullreqMergeTargetSha).string())
                    .col(ColumnDef::new(Pullreqs::PullreqMergeBaseSha).string().not_null())
                    .col(ColumnDef::new(Pullreqs::PullreqMergeSha).string())
                    .col(ColumnDef::new(Pullreqs::PullreqMergeConflicts).text())
                    .col(
                        ColumnDef::new(Pullreqs::PullreqRebaseCheckStatus)
                            .string()
                            .not_null()
                            .default(Expr::val("unchecked")),
                    )
                    .col(ColumnDef::new(Pullreqs::PullreqRebaseConflicts).text())
                    .col(ColumnDef::new(Pullreqs::PullreqCommitCount).big_integer())
                    .col(ColumnDef::new(Pullreqs::PullreqFileCount).big_integer())
                    .col(ColumnDef::new(Pullreqs::PullreqAdditions).big_integer())
                    .col(ColumnDef::new(Pullreqs::PullreqDeletions).big_integer())
                    .col(
                        ColumnDef::new(Pullreqs::PullreqFlow)
                            .integer()
                            .not_null()
                            .default(Expr::val(0)),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_pullreqs_target_repo_number")
                    .table(Pullreqs::Table)
                    .col(Pullreqs::PullreqTargetRepoId)
                    .col(Pullreqs::PullreqNumber)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_pullreqs_source_repo_branch")
                    .table(Pullreqs::Table)
                    .col(Pullreqs::PullreqSourceRepoId)
                    .col(Pullreqs::PullreqSourceBranch)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_pullreqs_target_repo_branch_state")
                    .table(Pullreqs::Table)
                    .col(Pullreqs::PullreqTargetRepoId)
                    .col(Pullreqs::PullreqTargetBranch)
                    .col(Pullreqs::PullreqState)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create().if_not_exists()
                    .table(PullreqActivities::Table)
                    .col(pk_id_col(manager, PullreqActivities::PullreqActivityId))
                    .col(counter_col(PullreqActivities::PullreqActivityVersion))
                    .col(id_col(PullreqActivities::PullreqActivityCreatedBy))
                    .col(millis_col(PullreqActivities::PullreqActivityCreated))
                    .col(millis_col(PullreqActivities::PullreqActivityUpdated))
                    .col(millis_col(PullreqActivities::PullreqActivityEdited))
                    .col(ColumnDef::new(PullreqActivities::PullreqActivityDeleted).big_integer())
                    .col(ColumnDef::new(PullreqActivities::PullreqActivityParentId).big_integer())
                    .col(id_col(PullreqActivities::PullreqActivityRepoId))
                    .col(id_col(PullreqActivities::PullreqActivityPullreqId))
                    .col(counter_col(PullreqActivities::PullreqActivityOrder))
                    .col(counter_col(PullreqActivities::PullreqActivitySubOrder))
                    .col(counter_col(PullreqActivities::PullreqActivityReplySeq))
                    .col(ColumnDef::new(PullreqActivities::PullreqActivityType).string().not_null())
                    .col(ColumnDef::new(PullreqActivities::PullreqActivityKind).string().not_null())
                    .col(ColumnDef::new(PullreqActivities::PullreqActivityText).text().not_null())
                    .col(ColumnDef::new(PullreqActivities::PullreqActivityPayload).json_binary())
                    .col(ColumnDef::new(PullreqActivities::PullreqActivityMetadata).json_binary())
                    .col(ColumnDef::new(PullreqActivities::PullreqActivityResolvedBy).big_integer())
                    .col(ColumnDef::new(PullreqActivities::PullreqActivityResolved).big_integer())
                    .col(ColumnDef::new(PullreqActivities::PullreqActivityOutdated).boolean())
                    .col(
                        ColumnDef::new(PullreqActivities::PullreqActivityCodeCommentMergeBaseSha)
                            .string(),
                    )
                    .col(
                        ColumnDef::new(PullreqActivities::PullreqActivityCodeCommentSourceSha)
                            .string(),
                    )
                    .col(ColumnDef::new(PullreqActivities::PullreqActivityCodeCommentPath).string())
                    .col(
                        ColumnDef::new(PullreqActivities::PullreqActivityCodeCommentLineNew)
                            .big_integer(),
                    )
                    .col(
                        ColumnDef::new(PullreqActivities::PullreqActivityCodeCommentSpanNew)
                            .big_integer(),
                    )
                    .col(
                        ColumnDef::new(PullreqActivities::PullreqActivityCodeCommentLineOld)
                            .big_integer(),
                    )
                    .col(
                        ColumnDef::new(PullreqActivities::PullreqActivityCodeCommentSpanOld)
                            .big_integer(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_pullreq_activities_pullreq_order")
                    .table(PullreqActivities::Table)
                    .col(PullreqActivities::PullreqActivityPullreqId)
                    .col(PullreqActivities::PullreqActivityOrder)
                    .col(PullreqActivities::PullreqActivitySubOrder)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create().if_not_exists()
                    .table(PullreqReviewers::Table)
                    .col(id_col(PullreqReviewers::PullreqReviewerPullreqId))
                    .col(id_col(PullreqReviewers::PullreqReviewerPrincipalId))
                    .col(id_col(PullreqReviewers::PullreqReviewerCreatedBy))
                    .col(millis_col(PullreqReviewers::PullreqReviewerCreated))
                    .col(millis_col(PullreqReviewers::PullreqReviewerUpdated))
                    .col(id_col(PullreqReviewers::PullreqReviewerRepoId))
                    .col(ColumnDef::new(PullreqReviewers::PullreqReviewerType).string().not_null())
                    .col(
                        ColumnDef::new(PullreqReviewers::PullreqReviewerLatestReviewId)
                            .big_integer(),
                    )
                    .col(
                        ColumnDef::new(PullreqReviewers::PullreqReviewerReviewDecision)
                            .string()
                            .not_null()
                            .default(Expr::val("pending")),
                    )
                    .col(ColumnDef::new(PullreqReviewers::PullreqReviewerSha).string().not_null())
                    .primary_key(
                        Index::create()
                            .col(PullreqReviewers::PullreqReviewerPullreqId)
                            .col(PullreqReviewers::PullreqReviewerPrincipalId),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create().if_not_exists()
                    .table(PullreqReviews::Table)
                    .col(pk_id_col(manager, PullreqReviews::PullreqReviewId))
                    .col(id_col(PullreqReviews::PullreqReviewCreatedBy))
                    .col(millis_col(PullreqReviews::PullreqReviewCreated))
                    .col(millis_col(PullreqReviews::PullreqReviewUpdated))
                    .col(id_col(PullreqReviews::PullreqReviewPullreqId))
                    .col(ColumnDef::new(PullreqReviews::PullreqReviewDecision).string().not_null())
                    .col(ColumnDef::new(PullreqReviews::PullreqReviewSha).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_pullreq_reviews_pullreq_id")
                    .table(PullreqReviews::Table)
                    .col(PullreqReviews::PullreqReviewPullreqId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create().if_not_exists()
                    .table(PullreqFileViews::Table)
                    .col(id_col(PullreqFileViews::PullreqFileViewPullreqId))
                    .col(id_col(PullreqFileViews::PullreqFileViewPrincipalId))
                    .col(ColumnDef::new(PullreqFileViews::PullreqFileViewPath).string().not_null())
                    .col(ColumnDef::new(PullreqFileViews::PullreqFileViewSha).string().not_null())
                    .col(
                        ColumnDef::new(PullreqFileViews::PullreqFileViewObsolete)
                            .boolean()
                            .not_null()
                            .default(Expr::val(false)),
                    )
                    .col(millis_col(PullreqFileViews::PullreqFileViewCreated))
                    .col(millis_col(PullreqFileViews::PullreqFileViewUpdated))
                    .primary_key(
                        Index::create()
                            .col(PullreqFileViews::PullreqFileViewPullreqId)
                            .col(PullreqFileViews::PullreqFileViewPrincipalId)
                            .col(PullreqFileViews::PullreqFileViewPath),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create().if_not_exists()
                    .table(PullreqLabels::Table)
                    .col(id_col(PullreqLabels::PullreqLabelPullreqId))
                    .col(id_col(PullreqLabels::PullreqLabelLabelId))
                    .col(ColumnDef::new(PullreqLabels::PullreqLabelLabelValueId).big_integer())
                    .col(millis_col(PullreqLabels::PullreqLabelCreated))
                    .col(millis_col(PullreqLabels::PullreqLabelUpdated))
                    .primary_key(
                        Index::create()
                            .col(PullreqLabels::PullreqLabelPullreqId)
                            .col(PullreqLabels::PullreqLabelLabelId),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create().if_not_exists()
                    .table(GitspaceConfigs::Table)
                    .col(pk_id_col(manager, GitspaceConfigs::GconfId))
                    .col(ColumnDef::new(GitspaceConfigs::GconfUid).string().not_null())
                    .col(ColumnDef::new(GitspaceConfigs::GconfDisplayName).string().not_null())
                    .col(ColumnDef::new(GitspaceConfigs::GconfIde).string().not_null())
                    .col(id_col(GitspaceConfigs::GconfInfraProviderResourceId))
                    .col(ColumnDef::new(GitspaceConfigs::GconfCodeAuthType).string().not_null())
                    .col(ColumnDef::new(GitspaceConfigs::GconfCodeAuthId).string().not_null())
                    .col(ColumnDef::new(GitspaceConfigs::GconfCodeRepoType).string().not_null())
                    .col(
                        ColumnDef::new(GitspaceConfigs::GconfCodeRepoIsPrivate)
                            .boolean()
                            .not_null()
                            .default(Expr::val(false)),
                    )
                    .col(ColumnDef::new(GitspaceConfigs::GconfCodeRepoRef).string())
                    .col(ColumnDef::new(GitspaceConfigs::GconfCodeRepoUrl).string().not_null())
                    .col(ColumnDef::new(GitspaceConfigs::GconfDevcontainerPath).string())
                    .col(ColumnDef::new(GitspaceConfigs::GconfBranch).string().not_null())
                    .col(ColumnDef::new(GitspaceConfigs::GconfUserUid).string().not_null())
                    .col(id_col(GitspaceConfigs::GconfSpaceId))
                    .col(millis_col(GitspaceConfigs::GconfCreated))
                    .col(millis_col(GitspaceConfigs::GconfUpdated))
                    .col(
                        ColumnDef::new(GitspaceConfigs::GconfIsDeleted)
                            .boolean()
                            .not_null()
                            .default(Expr::val(false)),
                    )
                    .col(
                        ColumnDef::new(GitspaceConfigs::GconfSshTokenIdentifier)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(GitspaceConfigs::GconfCreatedBy).big_integer())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_gitspace_configs_space_uid")
                    .table(GitspaceConfigs::Table)
                    .col(GitspaceConfigs::GconfSpaceId)
                    .col(GitspaceConfigs::GconfUid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create().if_not_exists()
                    .table(Gitspaces::Table)
                    .col(pk_id_col(manager, Gitspaces::GitsId))
                    .col(id_col(Gitspaces::GitsGitspaceConfigId))
                    .col(ColumnDef::new(Gitspaces::GitsUrl).string())
                    .col(ColumnDef::new(Gitspaces::GitsState).string().not_null())
                    .col(ColumnDef::new(Gitspaces::GitsUserUid).string().not_null())
                    .col(ColumnDef::new(Gitspaces::GitsResourceUsage).text())
                    .col(id_col(Gitspaces::GitsSpaceId))
                    .col(millis_col(Gitspaces::GitsLastUsed))
                    .col(counter_col(Gitspaces::GitsTotalTimeUsed))
                    .col(ColumnDef::new(Gitspaces::GitsTrackedChanges).text())
                    .col(ColumnDef::new(Gitspaces::GitsAccessType).string().not_null())
                    .col(ColumnDef::new(Gitspaces::GitsAccessKeyRef).string())
                    .col(ColumnDef::new(Gitspaces::GitsMachineUser).string())
                    .col(ColumnDef::new(Gitspaces::GitsUid).string().not_null())
                    .col(millis_col(Gitspaces::GitsCreated))
                    .col(millis_col(Gitspaces::GitsUpdated))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_gitspaces_uid")
                    .table(Gitspaces::Table)
                    .col(Gitspaces::GitsUid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_gitspaces_config_id")
                    .table(Gitspaces::Table)
                    .col(Gitspaces::GitsGitspaceConfigId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create().if_not_exists()
                    .table(GitspaceEvents::Table)
                    .col(pk_id_col(manager, GitspaceEvents::GevenId))
                    .col(ColumnDef::new(GitspaceEvents::GevenEvent).string().not_null())
                    .col(millis_col(GitspaceEvents::GevenCreated))
                    .col(ColumnDef::new(GitspaceEvents::GevenEntityType).string().not_null())
                    .col(ColumnDef::new(GitspaceEvents::GevenQueryKey).string())
                    .col(id_col(GitspaceEvents::GevenEntityId))
                    .col(millis_col(GitspaceEvents::GevenTimestamp))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_gitspace_events_entity_event")
                    .table(GitspaceEvents::Table)
                    .col(GitspaceEvents::GevenEntityId)
                    .col(GitspaceEvents::GevenEvent)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create().if_not_exists()
                    .table(InfraProviderConfigs::Table)
                    .col(pk_id_col(manager, InfraProviderConfigs::IpconfId))
                    .col(ColumnDef::new(InfraProviderConfigs::IpconfUid).string().not_null())
                    .col(
                        ColumnDef::new(InfraProviderConfigs::IpconfDisplayName)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(InfraProviderConfigs::IpconfType).string().not_null())
                    .col(id_col(InfraProviderConfigs::IpconfSpaceId))
                    .col(millis_col(InfraProviderConfigs::IpconfCreated))
                    .col(millis_col(InfraProviderConfigs::IpconfUpdated))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_infra_provider_configs_space_uid")
                    .table(InfraProviderConfigs::Table)
                    .col(InfraProviderConfigs::IpconfSpaceId)
                    .col(InfraProviderConfigs::IpconfUid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create().if_not_exists()
                    .table(InfraProviderResources::Table)
                    .col(pk_id_col(manager, InfraProviderResources::IpresoId))
                    .col(ColumnDef::new(InfraProviderResources::IpresoUid).string().not_null())
                    .col(
                        ColumnDef::new(InfraProviderResources::IpresoDisplayName)
                            .string()
                            .not_null(),
                    )
                    .col(id_col(InfraProviderResources::IpresoInfraProviderConfigId))
                    .col(ColumnDef::new(InfraProviderResources::IpresoType).string().not_null())
                    .col(id_col(InfraProviderResources::IpresoSpaceId))
                    .col(ColumnDef::new(InfraProviderResources::IpresoCpu).string())
                    .col(ColumnDef::new(InfraProviderResources::IpresoMemory).string())
                    .col(ColumnDef::new(InfraProviderResources::IpresoDisk).string())
                    .col(ColumnDef::new(InfraProviderResources::IpresoNetwork).string())
                    .col(ColumnDef::new(InfraProviderResources::IpresoRegion).string().not_null())
                    .col(ColumnDef::new(InfraProviderResources::IpresoOpentofuParams).json_binary())
                    .col(
                        ColumnDef::new(InfraProviderResources::IpresoInfraProviderTemplateId)
                            .big_integer(),
                    )
                    .col(millis_col(InfraProviderResources::IpresoCreated))
                    .col(millis_col(InfraProviderResources::IpresoUpdated))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_infra_provider_resources_space_uid")
                    .table(InfraProviderResources::Table)
                    .col(InfraProviderResources::IpresoSpaceId)
                    .col(InfraProviderResources::IpresoUid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create().if_not_exists()
                    .table(InfraProviderTemplates::Table)
                    .col(pk_id_col(manager, InfraProviderTemplates::IptempId))
                    .col(ColumnDef::new(InfraProviderTemplates::IptempUid).string().not_null())
                    .col(id_col(InfraProviderTemplates::IptempInfraProviderConfigId))
                    .col(
                        ColumnDef::new(InfraProviderTemplates::IptempDescription)
                            .text()
                            .not_null(),
                    )
                    .col(id_col(InfraProviderTemplates::IptempSpaceId))
                    .col(ColumnDef::new(InfraProviderTemplates::IptempData).text().not_null())
                    .col(counter_col(InfraProviderTemplates::IptempVersion))
                    .col(millis_col(InfraProviderTemplates::IptempCreated))
                    .col(millis_col(InfraProviderTemplates::IptempUpdated))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_infra_provider_templates_space_uid")
                    .table(InfraProviderTemplates::Table)
                    .col(InfraProviderTemplates::IptempSpaceId)
                    .col(InfraProviderTemplates::IptempUid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create().if_not_exists()
                    .table(InfraProvisioned::Table)
                    .col(pk_id_col(manager, InfraProvisioned::IprovId))
                    .col(id_col(InfraProvisioned::IprovGitspaceId))
                    .col(ColumnDef::new(InfraProvisioned::IprovType).string().not_null())
                    .col(id_col(InfraProvisioned::IprovInfraProviderResourceId))
                    .col(id_col(InfraProvisioned::IprovSpaceId))
                    .col(millis_col(InfraProvisioned::IprovCreated))
                    .col(millis_col(InfraProvisioned::IprovUpdated))
                    .col(ColumnDef::new(InfraProvisioned::IprovResponseMetadata).text())
                    .col(ColumnDef::new(InfraProvisioned::IprovOpentofuParams).text().not_null())
                    .col(ColumnDef::new(InfraProvisioned::IprovInfraStatus).string().not_null())
                    .col(ColumnDef::new(InfraProvisioned::IprovServerHostIp).string().not_null())
                    .col(ColumnDef::new(InfraProvisioned::IprovServerHostPort).string().not_null())
                    .col(ColumnDef::new(InfraProvisioned::IprovProxyHost).string().not_null())
                    .col(
                        ColumnDef::new(InfraProvisioned::IprovProxyPort)
                            .integer()
                            .not_null()
                            .default(Expr::val(0)),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_infra_provisioned_gitspace_id")
                    .table(InfraProvisioned::Table)
                    .col(InfraProvisioned::IprovGitspaceId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_infra_provisioned_proxy_status")
                    .table(InfraProvisioned::Table)
                    .col(InfraProvisioned::IprovProxyHost)
                    .col(InfraProvisioned::IprovInfraStatus)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in [
            "infra_provisioned",
            "infra_provider_templates",
            "infra_provider_resources",
            "infra_provider_configs",
            "gitspace_events",
            "gitspaces",
            "gitspace_configs",
            "pullreq_labels",
            "pullreq_file_views",
            "pullreq_reviews",
            "pullreq_reviewers",
            "pullreq_activities",
            "pullreqs",
            "repositories",
        ] {
            manager
                .drop_table(Table::drop().table(Alias::new(table)).if_exists().to_owned())
                .await?;
        }
        Ok(())
    }
}

fn pk_id_col<T: Iden>(manager: &SchemaManager, col: T) -> ColumnDef {
    let mut col = ColumnDef::new(col);
    match manager.get_database_backend() {
        DatabaseBackend::Sqlite => {
            col.integer();
        }
        _ => {
            col.big_integer();
        }
    }
    col.not_null().auto_increment().primary_key().to_owned()
}

fn id_col<T: Iden>(col: T) -> ColumnDef {
    ColumnDef::new(col).big_integer().not_null().to_owned()
}

fn counter_col<T: Iden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .big_integer()
        .not_null()
        .default(Expr::val(0))
        .to_owned()
}

fn millis_col<T: Iden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .big_integer()
        .not_null()
        .default(Expr::val(0))
        .to_owned()
}

#[derive(Iden)]
enum Repositories {
    Table,
    RepoId,
    RepoParentId,
    RepoUid,
}

#[derive(Iden)]
enum Pullreqs {
    Table,
    PullreqId,
    PullreqVersion,
    PullreqNumber,
    PullreqCreatedBy,
    PullreqCreated,
    PullreqUpdated,
    PullreqEdited,
    PullreqClosed,
    PullreqState,
    PullreqIsDraft,
    PullreqCommentCount,
    PullreqUnresolvedCount,
    PullreqTitle,
    PullreqDescription,
    PullreqSourceRepoId,
    PullreqSourceBranch,
    PullreqSourceSha,
    PullreqTargetRepoId,
    PullreqTargetBranch,
    PullreqActivitySeq,
    PullreqMergedBy,
    PullreqMerged,
    PullreqMergeMethod,
    PullreqMergeCheckStatus,
    PullreqMergeTargetSha,
    PullreqMergeBaseSha,
    PullreqMergeSha,
    PullreqMergeConflicts,
    PullreqRebaseCheckStatus,
    PullreqRebaseConflicts,
    PullreqCommitCount,
    PullreqFileCount,
    PullreqAdditions,
    PullreqDeletions,
    PullreqFlow,
}

#[derive(Iden)]
enum PullreqActivities {
    Table,
    PullreqActivityId,
    PullreqActivityVersion,
    PullreqActivityCreatedBy,
    PullreqActivityCreated,
    PullreqActivityUpdated,
    PullreqActivityEdited,
    PullreqActivityDeleted,
    PullreqActivityParentId,
    PullreqActivityRepoId,
    PullreqActivityPullreqId,
    PullreqActivityOrder,
    PullreqActivitySubOrder,
    PullreqActivityReplySeq,
    PullreqActivityType,
    PullreqActivityKind,
    PullreqActivityText,
    PullreqActivityPayload,
    PullreqActivityMetadata,
    PullreqActivityResolvedBy,
    PullreqActivityResolved,
    PullreqActivityOutdated,
    PullreqActivityCodeCommentMergeBaseSha,
    PullreqActivityCodeCommentSourceSha,
    PullreqActivityCodeCommentPath,
    PullreqActivityCodeCommentLineNew,
    PullreqActivityCodeCommentSpanNew,
    PullreqActivityCodeCommentLineOld,
    PullreqActivityCodeCommentSpanOld,
}

#[derive(Iden)]
enum PullreqReviewers {
    Table,
    PullreqReviewerPullreqId,
    PullreqReviewerPrincipalId,
    PullreqReviewerCreatedBy,
    PullreqReviewerCreated,
    PullreqReviewerUpdated,
    PullreqReviewerRepoId,
    PullreqReviewerType,
    PullreqReviewerLatestReviewId,
    PullreqReviewerReviewDecision,
    PullreqReviewerSha,
}

#[derive(Iden)]
enum PullreqReviews {
    Table,
    PullreqReviewId,
    PullreqReviewCreatedBy,
    PullreqReviewCreated,
    PullreqReviewUpdated,
    PullreqReviewPullreqId,
    PullreqReviewDecision,
    PullreqReviewSha,
}

#[derive(Iden)]
enum PullreqFileViews {
    Table,
    PullreqFileViewPullreqId,
    PullreqFileViewPrincipalId,
    PullreqFileViewPath,
    PullreqFileViewSha,
    PullreqFileViewObsolete,
    PullreqFileViewCreated,
    PullreqFileViewUpdated,
}

#[derive(Iden)]
enum PullreqLabels {
    Table,
    PullreqLabelPullreqId,
    PullreqLabelLabelId,
    PullreqLabelLabelValueId,
    PullreqLabelCreated,
    PullreqLabelUpdated,
}

#[derive(Iden)]
enum GitspaceConfigs {
    Table,
    GconfId,
    GconfUid,
    GconfDisplayName,
    GconfIde,
    GconfInfraProviderResourceId,
    GconfCodeAuthType,
    GconfCodeAuthId,
    GconfCodeRepoType,
    GconfCodeRepoIsPrivate,
    GconfCodeRepoRef,
    GconfCodeRepoUrl,
    GconfDevcontainerPath,
    GconfBranch,
    GconfUserUid,
    GconfSpaceId,
    GconfCreated,
    GconfUpdated,
    GconfIsDeleted,
    GconfSshTokenIdentifier,
    GconfCreatedBy,
}

#[derive(Iden)]
enum Gitspaces {
    Table,
    GitsId,
    GitsGitspaceConfigId,
    GitsUrl,
    GitsState,
    GitsUserUid,
    GitsResourceUsage,
    GitsSpaceId,
    GitsLastUsed,
    GitsTotalTimeUsed,
    GitsTrackedChanges,
    GitsAccessType,
    GitsAccessKeyRef,
    GitsMachineUser,
    GitsUid,
    GitsCreated,
    GitsUpdated,
}

#[derive(Iden)]
enum GitspaceEvents {
    Table,
    GevenId,
    GevenEvent,
    GevenCreated,
    GevenEntityType,
    GevenQueryKey,
    GevenEntityId,
    GevenTimestamp,
}

#[derive(Iden)]
enum InfraProviderConfigs {
    Table,
    IpconfId,
    IpconfUid,
    IpconfDisplayName,
    IpconfType,
    IpconfSpaceId,
    IpconfCreated,
    IpconfUpdated,
}

#[derive(Iden)]
enum InfraProviderResources {
    Table,
    IpresoId,
    IpresoUid,
    IpresoDisplayName,
    IpresoInfraProviderConfigId,
    IpresoType,
    IpresoSpaceId,
    IpresoCpu,
    IpresoMemory,
    IpresoDisk,
    IpresoNetwork,
    IpresoRegion,
    IpresoOpentofuParams,
    IpresoInfraProviderTemplateId,
    IpresoCreated,
    IpresoUpdated,
}

#[derive(Iden)]
enum InfraProviderTemplates {
    Table,
    IptempId,
    IptempUid,
    IptempInfraProviderConfigId,
    IptempDescription,
    IptempSpaceId,
    IptempData,
    IptempVersion,
    IptempCreated,
    IptempUpdated,
}

#[derive(Iden)]
enum InfraProvisioned {
    Table,
    IprovId,
    IprovGitspaceId,
    IprovType,
    IprovInfraProviderResourceId,
    IprovSpaceId,
    IprovCreated,
    IprovUpdated,
    IprovResponseMetadata,
    IprovOpentofuParams,
    IprovInfraStatus,
    IprovServerHostIp,
    IprovServerHostPort,
    IprovProxyHost,
    IprovProxyPort,
}
