//! GitHub platform service implementation

use crate::auth::get_github_auth;
use crate::error::{Error, Result};
use crate::platform::PlatformService;
use crate::types::{
    MergeMethod, MergeResult, MergeStateStatus, MergeStatus, Mergeable, PlatformConfig, PrState,
    PullRequestRef,
};
use async_trait::async_trait;
use octocrab::Octocrab;
use octocrab::models::pulls::{MergeableState, PullRequest};
use tokio::sync::OnceCell;
use tracing::debug;

/// GitHub service using octocrab.
///
/// The token is resolved on first use, so constructing the service never
/// fails for lack of credentials; [`PlatformService::check_auth`] reports it.
pub struct GitHubService {
    client: OnceCell<Octocrab>,
    config: PlatformConfig,
}

impl GitHubService {
    /// Create a service for the given repository
    pub fn new(config: PlatformConfig) -> Self {
        Self {
            client: OnceCell::new(),
            config,
        }
    }

    async fn client(&self) -> Result<&Octocrab> {
        self.client
            .get_or_try_init(|| async {
                let auth = get_github_auth(self.config.host.as_deref()).await?;
                debug!(source = ?auth.source, "resolved GitHub token");
                build_client(&auth.token, self.config.host.as_deref())
            })
            .await
    }
}

fn build_client(token: &str, host: Option<&str>) -> Result<Octocrab> {
    let mut builder = Octocrab::builder().personal_token(token.to_string());

    if let Some(h) = host {
        let base_url = format!("https://{h}/api/v3");
        builder = builder
            .base_uri(&base_url)
            .map_err(|e| Error::GitHubApi(e.to_string()))?;
    }

    builder.build().map_err(|e| Error::GitHubApi(e.to_string()))
}

fn pr_state(pr: &PullRequest) -> PrState {
    match pr.state {
        Some(octocrab::models::IssueState::Open) => PrState::Open,
        Some(_) if pr.merged_at.is_some() => PrState::Merged,
        // IssueState is non-exhaustive
        Some(_) | None => PrState::Closed,
    }
}

fn merge_state_status(state: Option<&MergeableState>) -> MergeStateStatus {
    match state {
        Some(MergeableState::Clean | MergeableState::HasHooks) => MergeStateStatus::Clean,
        Some(MergeableState::Dirty) => MergeStateStatus::Dirty,
        Some(MergeableState::Blocked | MergeableState::Draft) => MergeStateStatus::Blocked,
        Some(MergeableState::Behind) => MergeStateStatus::Behind,
        Some(MergeableState::Unstable) => MergeStateStatus::Unstable,
        // MergeableState is non-exhaustive
        Some(_) | None => MergeStateStatus::Unknown,
    }
}

fn to_pr_ref(pr: &PullRequest) -> PullRequestRef {
    PullRequestRef {
        number: pr.number,
        url: pr
            .html_url
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default(),
        state: pr_state(pr),
        base_branch: pr.base.ref_field.clone(),
        head_branch: pr.head.ref_field.clone(),
        title: pr.title.clone().unwrap_or_default(),
        mergeable: Mergeable::from_flag(pr.mergeable),
        merge_state_status: merge_state_status(pr.mergeable_state.as_ref()),
        is_draft: pr.draft.unwrap_or(false),
    }
}

#[async_trait]
impl PlatformService for GitHubService {
    async fn check_auth(&self) -> Result<String> {
        let user = self
            .client()
            .await?
            .current()
            .user()
            .await
            .map_err(|e| Error::Auth(format!("Invalid token: {e}")))?;
        debug!(login = %user.login, "GitHub auth ok");
        Ok(user.login)
    }

    async fn find_pr_for_branch(&self, branch: &str) -> Result<Option<PullRequestRef>> {
        debug!(branch, "looking up PR for branch");
        let head = format!("{}:{}", &self.config.owner, branch);

        let prs = self
            .client()
            .await?
            .pulls(&self.config.owner, &self.config.repo)
            .list()
            .head(head)
            .state(octocrab::params::State::All)
            .sort(octocrab::params::pulls::Sort::Created)
            .direction(octocrab::params::Direction::Descending)
            .send()
            .await?;

        let found = prs.items.first().map(to_pr_ref);
        debug!(branch, pr = ?found.as_ref().map(|p| p.number), "PR lookup done");
        Ok(found)
    }

    async fn get_pr(&self, pr_number: u64) -> Result<PullRequestRef> {
        debug!(pr_number, "getting PR");
        let pr = self
            .client()
            .await?
            .pulls(&self.config.owner, &self.config.repo)
            .get(pr_number)
            .await?;
        Ok(to_pr_ref(&pr))
    }

    async fn update_pr_base(&self, pr_number: u64, new_base: &str) -> Result<()> {
        debug!(pr_number, new_base, "updating PR base");
        self.client()
            .await?
            .pulls(&self.config.owner, &self.config.repo)
            .update(pr_number)
            .base(new_base)
            .send()
            .await?;
        Ok(())
    }

    async fn get_merge_status(&self, pr_number: u64) -> Result<MergeStatus> {
        let pr = self.get_pr(pr_number).await?;
        debug!(
            pr_number,
            mergeable = ?pr.mergeable,
            merge_state = %pr.merge_state_status,
            "got merge status"
        );
        Ok(MergeStatus {
            mergeable: pr.mergeable,
            merge_state_status: pr.merge_state_status,
        })
    }

    async fn update_pr_metadata(&self, pr_number: u64, title: &str, body: &str) -> Result<()> {
        debug!(pr_number, "updating PR title and body");
        self.client()
            .await?
            .pulls(&self.config.owner, &self.config.repo)
            .update(pr_number)
            .title(title)
            .body(body)
            .send()
            .await?;
        Ok(())
    }

    async fn merge_pr(&self, pr_number: u64, method: MergeMethod) -> Result<MergeResult> {
        debug!(pr_number, %method, "merging PR");

        let octocrab_method = match method {
            MergeMethod::Squash => octocrab::params::pulls::MergeMethod::Squash,
            MergeMethod::Merge => octocrab::params::pulls::MergeMethod::Merge,
            MergeMethod::Rebase => octocrab::params::pulls::MergeMethod::Rebase,
        };

        let result = self
            .client()
            .await?
            .pulls(&self.config.owner, &self.config.repo)
            .merge(pr_number)
            .method(octocrab_method)
            .send()
            .await
            .map_err(|e| Error::GitHubApi(format!("Merge failed: {e}")))?;

        let merge_result = MergeResult {
            merged: result.merged,
            sha: result.sha,
            message: result.message,
        };
        debug!(
            pr_number,
            merged = merge_result.merged,
            sha = ?merge_result.sha,
            "merge complete"
        );
        Ok(merge_result)
    }

    async fn get_pr_diff(&self, pr_number: u64) -> Result<String> {
        debug!(pr_number, "fetching PR diff");
        Ok(self
            .client()
            .await?
            .pulls(&self.config.owner, &self.config.repo)
            .get_diff(pr_number)
            .await?)
    }

    fn config(&self) -> &PlatformConfig {
        &self.config
    }
}
