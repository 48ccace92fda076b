//! Change Planner (C4): compute per-file index/delete actions between two
//! commits, or enumerate a full index from a clean checkout.

use std::path::Path;

use chunkforge_parsing::languages::get_language_for_path;
use git2::{Delta, DiffFindOptions, DiffOptions, Repository};
use ignore::WalkBuilder;

use crate::error::{GitError, Result};

/// A single file-level intent produced by the planner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeAction {
    DeleteOnly { path: String },
    IndexOnly { path: String },
    DeleteAndIndex { path: String },
}

impl ChangeAction {
    pub fn path(&self) -> &str {
        match self {
            Self::DeleteOnly { path } | Self::IndexOnly { path } | Self::DeleteAndIndex { path } => path,
        }
    }
}

/// Tallies produced alongside a plan's action list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanSummary {
    pub index_only: usize,
    pub delete_only: usize,
    pub delete_and_index: usize,
    pub old_commit: Option<String>,
    pub new_commit: Option<String>,
}

/// The result of planning: the actions to apply and a summary for logging.
#[derive(Debug, Clone, Default)]
pub struct Plan {
    pub actions: Vec<ChangeAction>,
    pub summary: PlanSummary,
}

fn is_supported_extension(path: &str) -> bool {
    get_language_for_path(path).is_some()
}

fn tally(summary: &mut PlanSummary, action: &ChangeAction) {
    match action {
        ChangeAction::IndexOnly { .. } => summary.index_only += 1,
        ChangeAction::DeleteOnly { .. } => summary.delete_only += 1,
        ChangeAction::DeleteAndIndex { .. } => summary.delete_and_index += 1,
    }
}

/// Enumerate every indexable file under `root`, honoring `.gitignore` and an
/// optional `.indexerignore`, for a clean (from-scratch) index run.
pub fn plan_full(root: &Path) -> Result<Plan> {
    let mut walker = WalkBuilder::new(root);
    walker.add_custom_ignore_filename(".indexerignore");
    walker.hidden(false);

    let mut plan = Plan::default();
    for entry in walker.build() {
        let entry = entry.map_err(|e| GitError::Git(e.to_string()))?;
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(root)
            .map_err(|_| GitError::path_outside_repo(entry.path().display().to_string()))?;
        let relative = relative.to_string_lossy().replace('\\', "/");

        if !is_supported_extension(&relative) {
            continue;
        }
        let action = ChangeAction::IndexOnly { path: relative };
        tally(&mut plan.summary, &action);
        plan.actions.push(action);
    }
    Ok(plan)
}

/// Fast-forward `branch` against its upstream tracking remote. A no-op if
/// the local branch has no upstream configured.
pub fn pull(repo: &Repository, branch: &str) -> Result<()> {
    let local_branch = match repo.find_branch(branch, git2::BranchType::Local) {
        Ok(b) => b,
        Err(_) => return Ok(()),
    };
    let upstream = match local_branch.upstream() {
        Ok(u) => u,
        Err(_) => return Ok(()),
    };
    let upstream_name = upstream
        .name()?
        .ok_or_else(|| GitError::Git("upstream branch has no name".to_string()))?
        .to_string();

    let (remote_name, remote_branch) = upstream_name
        .split_once('/')
        .ok_or_else(|| GitError::Git(format!("cannot parse upstream ref '{upstream_name}'")))?;

    let mut remote = repo.find_remote(remote_name)?;
    remote.fetch(&[remote_branch], None, None)?;
    drop(upstream);

    let upstream_ref = repo.find_reference(&format!("refs/remotes/{upstream_name}"))?;
    let upstream_commit = upstream_ref.peel_to_commit()?;
    let annotated = repo.reference_to_annotated_commit(&upstream_ref)?;
    let analysis = repo.merge_analysis(&[&annotated])?;

    if analysis.0.is_up_to_date() {
        return Ok(());
    }
    if !analysis.0.is_fast_forward() {
        return Err(GitError::Git(format!(
            "branch '{branch}' has diverged from its upstream; fast-forward pull refused"
        )));
    }

    let refname = local_branch.get().name().unwrap_or_default().to_string();
    let mut reference = repo.find_reference(&refname)?;
    reference.set_target(upstream_commit.id(), "fast-forward pull")?;
    repo.set_head(&refname)?;
    repo.checkout_head(Some(git2::build::CheckoutBuilder::new().force()))?;
    Ok(())
}

/// Compute the incremental plan between `anchor_commit` and `HEAD` on `branch`.
///
/// Pulls the branch first, then name-status-diffs the anchor tree against
/// `HEAD`'s tree. Returns [`GitError::MissingAnchor`] if `anchor_commit` is
/// `None` — incremental mode always requires a prior full index.
pub fn plan_incremental(repo: &Repository, branch: &str, anchor_commit: Option<&str>) -> Result<Plan> {
    let Some(anchor) = anchor_commit else {
        return Err(GitError::missing_anchor(
            "no commit anchor recorded for this (index, branch); run a full index first",
        ));
    };

    pull(repo, branch)?;

    let old_oid = git2::Oid::from_str(anchor)?;
    let old_commit = repo.find_commit(old_oid)?;
    let old_tree = old_commit.tree()?;

    let head = repo.head()?;
    let new_commit = head.peel_to_commit()?;
    let new_tree = new_commit.tree()?;

    let mut diff_opts = DiffOptions::new();
    diff_opts.include_untracked(false);

    let mut diff = repo.diff_tree_to_tree(Some(&old_tree), Some(&new_tree), Some(&mut diff_opts))?;
    let mut find_opts = DiffFindOptions::new();
    find_opts.renames(true).copies(true);
    diff.find_similar(Some(&mut find_opts))?;

    let mut plan = Plan::default();
    plan.summary.old_commit = Some(old_oid.to_string());
    plan.summary.new_commit = Some(new_commit.id().to_string());

    for delta in diff.deltas() {
        let old_path = delta.old_file().path().map(|p| p.to_string_lossy().replace('\\', "/"));
        let new_path = delta.new_file().path().map(|p| p.to_string_lossy().replace('\\', "/"));

        let actions = match delta.status() {
            Delta::Added => new_path
                .filter(|p| is_supported_extension(p))
                .map(|path| vec![ChangeAction::IndexOnly { path }])
                .unwrap_or_default(),
            Delta::Modified => new_path
                .filter(|p| is_supported_extension(p))
                .map(|path| vec![ChangeAction::DeleteAndIndex { path }])
                .unwrap_or_default(),
            Delta::Deleted => old_path
                .map(|path| vec![ChangeAction::DeleteOnly { path }])
                .unwrap_or_default(),
            Delta::Renamed => {
                let mut actions = Vec::new();
                if let Some(old) = old_path {
                    actions.push(ChangeAction::DeleteOnly { path: old });
                }
                if let Some(new) = new_path.filter(|p| is_supported_extension(p)) {
                    actions.push(ChangeAction::IndexOnly { path: new });
                }
                actions
            }
            Delta::Copied => new_path
                .filter(|p| is_supported_extension(p))
                .map(|path| vec![ChangeAction::IndexOnly { path }])
                .unwrap_or_default(),
            Delta::Typechange => new_path
                .map(|path| {
                    if is_supported_extension(&path) {
                        vec![ChangeAction::DeleteAndIndex { path }]
                    } else {
                        vec![ChangeAction::DeleteOnly { path }]
                    }
                })
                .unwrap_or_default(),
            _ => Vec::new(),
        };

        for action in actions {
            tally(&mut plan.summary, &action);
            plan.actions.push(action);
        }
    }

    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn init_repo_with_commit(dir: &Path, files: &[(&str, &str)]) -> Repository {
        let repo = Repository::init(dir).unwrap();
        for (name, content) in files {
            let path = dir.join(name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(path, content).unwrap();
        }
        let sig = git2::Signature::now("Test User", "test@example.com").unwrap();
        let mut index = repo.index().unwrap();
        index.add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None).unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        repo.commit(Some("HEAD"), &sig, &sig, "initial", &tree, &[]).unwrap();
        repo
    }

    fn commit_all(repo: &Repository, message: &str) -> git2::Oid {
        let sig = git2::Signature::now("Test User", "test@example.com").unwrap();
        let mut index = repo.index().unwrap();
        index.add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None).unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let parent = repo.head().unwrap().peel_to_commit().unwrap();
        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &[&parent]).unwrap()
    }

    #[test]
    fn plan_full_only_includes_supported_extensions_and_skips_gitignored_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".gitignore"), "ignored.rs\n").unwrap();
        fs::write(dir.path().join("main.rs"), "fn main() {}").unwrap();
        fs::write(dir.path().join("ignored.rs"), "fn nope() {}").unwrap();
        fs::write(dir.path().join("notes.txt.unsupportedext"), "hi").unwrap();
        Repository::init(dir.path()).unwrap();

        let plan = plan_full(dir.path()).unwrap();
        let paths: Vec<_> = plan.actions.iter().map(ChangeAction::path).collect();
        assert!(paths.contains(&"main.rs"));
        assert!(!paths.contains(&"ignored.rs"));
        assert_eq!(plan.summary.index_only, plan.actions.len());
    }

    #[test]
    fn plan_incremental_without_anchor_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let repo = init_repo_with_commit(dir.path(), &[("main.rs", "fn main() {}")]);
        let err = plan_incremental(&repo, "master", None).unwrap_err();
        assert!(matches!(err, GitError::MissingAnchor(_)));
    }

    #[test]
    fn plan_incremental_classifies_add_modify_delete() {
        let dir = tempfile::tempdir().unwrap();
        let repo = init_repo_with_commit(
            dir.path(),
            &[("keep.rs", "fn keep() {}"), ("remove.rs", "fn gone() {}")],
        );
        let anchor = repo.head().unwrap().peel_to_commit().unwrap().id().to_string();

        fs::write(dir.path().join("keep.rs"), "fn keep() { /* changed */ }").unwrap();
        fs::remove_file(dir.path().join("remove.rs")).unwrap();
        fs::write(dir.path().join("added.rs"), "fn added() {}").unwrap();
        commit_all(&repo, "edits");

        let branch = repo.head().unwrap().shorthand().unwrap().to_string();
        let plan = plan_incremental(&repo, &branch, Some(&anchor)).unwrap();

        assert!(plan
            .actions
            .contains(&ChangeAction::DeleteAndIndex { path: "keep.rs".to_string() }));
        assert!(plan
            .actions
            .contains(&ChangeAction::DeleteOnly { path: "remove.rs".to_string() }));
        assert!(plan
            .actions
            .contains(&ChangeAction::IndexOnly { path: "added.rs".to_string() }));
        assert_eq!(plan.summary.old_commit.as_deref(), Some(anchor.as_str()));
    }
}
