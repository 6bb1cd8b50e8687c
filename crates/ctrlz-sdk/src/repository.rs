use std::fs;
use std::path::{Path, PathBuf};

use ctrlz_graph::CommitGraph;
use ctrlz_index::{compute_status, Index, IndexEntry, WorkdirStatus};
use ctrlz_refs::{branch_ref, FsRefStore, Head, RefStore, DEFAULT_BRANCH};
use ctrlz_store::{Commit, LooseObjectStore, ObjectKind, ObjectStore, StoredObject, Tree, TreeEntry};
use ctrlz_sync::{HttpTransport, PushEngine, PushReport, RemoteTransport};
use ctrlz_types::ObjectId;
use ctrlz_worktree::{CheckoutSummary, IgnoreRules, Materializer, TreeBuilder, META_DIR};
use tracing::{info, warn};

use crate::config::{RepoConfig, CONFIG_FILE};
use crate::error::{SdkError, SdkResult};

const INDEX_FILE: &str = "index";

/// A ctrlz repository: a working directory plus its `.git` metadata.
///
/// Every operation goes through this handle; nothing is cached between
/// calls except paths, so several handles on one directory see each
/// other's writes.
#[derive(Debug)]
pub struct Repository {
    root: PathBuf,
    meta_dir: PathBuf,
    store: LooseObjectStore,
    refs: FsRefStore,
}

impl Repository {
    /// Create the metadata directory under `root`.
    ///
    /// Fails if `root` already holds a repository.
    pub fn init(root: impl Into<PathBuf>) -> SdkResult<Self> {
        let root = root.into();
        let meta_dir = root.join(META_DIR);
        if meta_dir.exists() {
            return Err(SdkError::PreconditionFailed(format!(
                "repository already exists at {}",
                meta_dir.display()
            )));
        }
        fs::create_dir_all(meta_dir.join("objects"))?;
        fs::create_dir_all(meta_dir.join("refs").join("heads"))?;

        let repo = Self::at(root, meta_dir);
        repo.refs
            .set_head(&Head::Symbolic(branch_ref(DEFAULT_BRANCH)))?;
        info!(path = %repo.meta_dir.display(), "initialized repository");
        Ok(repo)
    }

    /// Open the repository whose working directory is `root`.
    pub fn open(root: impl Into<PathBuf>) -> SdkResult<Self> {
        let root = root.into();
        let meta_dir = root.join(META_DIR);
        if !meta_dir.is_dir() {
            return Err(SdkError::NotInitialized(root));
        }
        Ok(Self::at(root, meta_dir))
    }

    /// Open the repository containing `start`, searching parent directories.
    pub fn discover(start: impl AsRef<Path>) -> SdkResult<Self> {
        let start = start.as_ref();
        start
            .ancestors()
            .find(|dir| dir.join(META_DIR).is_dir())
            .map(|root| Self::at(root.to_path_buf(), root.join(META_DIR)))
            .ok_or_else(|| SdkError::NotInitialized(start.to_path_buf()))
    }

    fn at(root: PathBuf, meta_dir: PathBuf) -> Self {
        Self {
            store: LooseObjectStore::new(meta_dir.join("objects")),
            refs: FsRefStore::new(&meta_dir),
            root,
            meta_dir,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn meta_dir(&self) -> &Path {
        &self.meta_dir
    }

    pub fn store(&self) -> &LooseObjectStore {
        &self.store
    }

    pub fn refs(&self) -> &FsRefStore {
        &self.refs
    }

    // ---- Settings ----

    pub fn config(&self) -> SdkResult<RepoConfig> {
        RepoConfig::load(&self.meta_dir.join(CONFIG_FILE))
    }

    pub fn save_config(&self, config: &RepoConfig) -> SdkResult<()> {
        config.save(&self.meta_dir.join(CONFIG_FILE))
    }

    /// Record the remote user and repository names used by [`push`](Self::push).
    pub fn set_repo_info(&self, user: &str, repo: &str) -> SdkResult<()> {
        if user.trim().is_empty() || repo.trim().is_empty() {
            return Err(SdkError::PreconditionFailed(
                "user and repository names must not be empty".into(),
            ));
        }
        let mut config = self.config()?;
        config.user_name = Some(user.to_string());
        config.repo_name = Some(repo.to_string());
        self.save_config(&config)?;
        info!(user, repo, "saved remote repository info");
        Ok(())
    }

    fn ignore_rules(&self) -> SdkResult<IgnoreRules> {
        Ok(IgnoreRules::load(&self.root)?)
    }

    fn index(&self) -> SdkResult<Index> {
        Ok(Index::open(self.meta_dir.join(INDEX_FILE))?)
    }

    /// The commit the current branch points at, if any.
    pub fn head(&self) -> SdkResult<Option<ObjectId>> {
        Ok(self.refs.resolve_head()?)
    }

    fn head_tree(&self) -> SdkResult<Option<ObjectId>> {
        match self.head()? {
            Some(head) => Ok(Some(self.graph().read_commit(&head)?.tree)),
            None => Ok(None),
        }
    }

    fn graph(&self) -> CommitGraph<'_> {
        let identity = self.config().map(|c| c.identity()).unwrap_or_else(|e| {
            warn!(error = %e, "ignoring unreadable config");
            RepoConfig::default().identity()
        });
        CommitGraph::new(&self.store).with_identity(identity)
    }

    // ---- Object plumbing ----

    /// Read any stored object by its hex id.
    pub fn cat_file(&self, hash: &str) -> SdkResult<StoredObject> {
        let id: ObjectId = hash.parse()?;
        Ok(self.store.get(&id)?)
    }

    /// Snapshot a file (as a blob) or directory (as a tree) into the store.
    pub fn hash_object(&self, path: &Path) -> SdkResult<TreeEntry> {
        let rules = self.ignore_rules()?;
        let builder = TreeBuilder::new(&self.store, &self.root).with_filter(&rules);
        builder
            .build_entry(&self.resolve(path))?
            .ok_or_else(|| SdkError::PreconditionFailed(format!("{} is ignored", path.display())))
    }

    /// List a tree. A commit id lists the commit's tree.
    pub fn ls_tree(&self, hash: &str) -> SdkResult<Tree> {
        let obj = self.cat_file(hash)?;
        let obj = if obj.kind == ObjectKind::Commit {
            let commit = Commit::from_stored_object(&obj)?;
            self.store.get(&commit.tree)?
        } else {
            obj
        };
        Ok(Tree::from_stored_object(&obj)?)
    }

    /// Snapshot the whole working directory and return the root tree id.
    pub fn write_tree(&self) -> SdkResult<ObjectId> {
        let rules = self.ignore_rules()?;
        let id = TreeBuilder::new(&self.store, &self.root)
            .with_filter(&rules)
            .write_tree()?;
        Ok(id)
    }

    /// Store a commit for an existing tree without touching any ref.
    pub fn commit_tree(
        &self,
        tree: &str,
        message: &str,
        parent: Option<&str>,
    ) -> SdkResult<ObjectId> {
        let tree: ObjectId = tree.parse()?;
        let parent = parent.map(str::parse::<ObjectId>).transpose()?;
        Ok(self.graph().commit(tree, message, parent)?)
    }

    // ---- Porcelain ----

    /// Stage paths for the next commit. `.` stages every top-level entry
    /// that is not ignored.
    pub fn add<P: AsRef<Path>>(&self, paths: &[P]) -> SdkResult<Vec<IndexEntry>> {
        let rules = self.ignore_rules()?;
        let builder = TreeBuilder::new(&self.store, &self.root).with_filter(&rules);
        let mut index = self.index()?;
        let mut staged = Vec::new();

        let mut targets = Vec::new();
        for path in paths {
            let path = path.as_ref();
            if path == Path::new(".") {
                let mut children: Vec<PathBuf> = fs::read_dir(&self.root)?
                    .map(|entry| entry.map(|e| e.path()))
                    .collect::<Result<_, _>>()?;
                children.sort();
                targets.extend(children);
            } else {
                targets.push(self.resolve(path));
            }
        }

        for target in targets {
            let Some(tree_entry) = builder.build_entry(&target)? else {
                if !target.starts_with(&self.meta_dir) {
                    warn!(path = %target.display(), "not staging ignored path");
                }
                continue;
            };
            let rel = builder.relative_path(&target)?;
            let rel = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            let entry = IndexEntry::new(tree_entry.mode, rel, tree_entry.object_id)?;
            index.stage(entry.clone())?;
            staged.push(entry);
        }
        Ok(staged)
    }

    /// Commit the staged entries on top of the current head.
    pub fn commit(&self, message: &str) -> SdkResult<ObjectId> {
        let mut index = self.index()?;
        if index.is_empty() {
            return Err(SdkError::PreconditionFailed(
                "nothing staged; use `add` first".into(),
            ));
        }
        let staged = index.len();
        let parent = self.head()?;
        let base = self.head_tree()?;
        let tree = index.write_tree(&self.store, base.as_ref())?;
        let id = self.graph().commit(tree, message, parent)?;
        self.refs.advance_head(&id)?;
        index.clear()?;
        info!(commit = %id.short_hex(), staged, "committed");
        Ok(id)
    }

    /// Compare head, index and working directory.
    pub fn status(&self) -> SdkResult<WorkdirStatus> {
        let rules = self.ignore_rules()?;
        let index = self.index()?;
        let head_tree = self.head_tree()?;
        Ok(compute_status(
            &self.store,
            &self.root,
            head_tree.as_ref(),
            index.entries(),
            &rules,
        )?)
    }

    /// Every commit on the current branch, newest first.
    pub fn ls_commits(&self) -> SdkResult<Vec<(ObjectId, Commit)>> {
        match self.head()? {
            Some(head) => Ok(self.graph().history(head)?),
            None => Ok(Vec::new()),
        }
    }

    /// Replace the working directory with the snapshot of `hash` and move
    /// the branch there. Staged entries are discarded.
    pub fn checkout(&self, hash: &str) -> SdkResult<CheckoutSummary> {
        let id: ObjectId = hash.parse()?;
        let commit = self.graph().read_commit(&id)?;
        let mut index = self.index()?;
        let summary = Materializer::new(&self.store, &self.root).checkout_tree(&commit.tree)?;
        index.clear()?;
        self.refs.advance_head(&id)?;
        info!(commit = %id.short_hex(), "checked out commit");
        Ok(summary)
    }

    /// Push the current branch to the configured remote over HTTP.
    pub fn push(&self) -> SdkResult<PushReport> {
        let config = self.config()?;
        let Some((user, repo)) = config.remote_repo() else {
            return Err(SdkError::PreconditionFailed(
                "remote repository not configured; run `setRepoInfo <user> <repo>` first".into(),
            ));
        };
        let transport = HttpTransport::new(config.remote_url(), user, repo);
        self.push_with(&transport)
    }

    /// Push the current branch through any transport.
    pub fn push_with(&self, transport: &dyn RemoteTransport) -> SdkResult<PushReport> {
        let Some(head) = self.head()? else {
            return Err(SdkError::PreconditionFailed("no commits to push".into()));
        };
        let engine = PushEngine::with_config(&self.store, transport, self.config()?.sync_config());
        Ok(engine.push(head)?)
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ctrlz_index::{FileStatus, StatusEntry};
    use ctrlz_store::EntryMode;
    use ctrlz_sync::mock::MockTransport;
    use ctrlz_sync::SyncError;

    fn repo() -> (tempfile::TempDir, Repository) {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        (dir, repo)
    }

    fn write(repo: &Repository, rel: &str, contents: &str) {
        let path = repo.root().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn init_lays_out_metadata() {
        let (dir, repo) = repo();
        let meta = dir.path().join(".git");
        assert!(meta.join("objects").is_dir());
        assert!(meta.join("refs/heads").is_dir());
        assert_eq!(
            fs::read_to_string(meta.join("HEAD")).unwrap(),
            "ref: refs/heads/main\n"
        );
        assert_eq!(repo.head().unwrap(), None);
    }

    #[test]
    fn init_twice_is_precondition_failure() {
        let (dir, _repo) = repo();
        assert!(matches!(
            Repository::init(dir.path()),
            Err(SdkError::PreconditionFailed(_))
        ));
    }

    #[test]
    fn open_requires_metadata() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            Repository::open(dir.path()),
            Err(SdkError::NotInitialized(_))
        ));
    }

    #[test]
    fn discover_walks_up() {
        let (dir, _repo) = repo();
        let nested = dir.path().join("a/b");
        fs::create_dir_all(&nested).unwrap();
        let found = Repository::discover(&nested).unwrap();
        assert_eq!(found.root(), dir.path());
    }

    #[test]
    fn hash_object_then_cat_file() {
        let (_dir, repo) = repo();
        write(&repo, "hello.txt", "hello\n");
        let entry = repo.hash_object(Path::new("hello.txt")).unwrap();
        assert_eq!(entry.object_id.to_hex(), "ce013625030ba8dba906f756967f9e9ca394464a");

        let obj = repo.cat_file(&entry.object_id.to_hex()).unwrap();
        assert_eq!(obj.kind, ObjectKind::Blob);
        assert_eq!(obj.data, b"hello\n");
    }

    #[test]
    fn cat_file_errors() {
        let (_dir, repo) = repo();
        assert!(matches!(repo.cat_file("xyz"), Err(SdkError::InvalidId(_))));
        let err = repo.cat_file(&"0".repeat(40)).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn write_tree_and_ls_tree() {
        let (_dir, repo) = repo();
        write(&repo, "b.txt", "b");
        write(&repo, "a/inner.txt", "i");
        let tree = repo.write_tree().unwrap();
        let listing = repo.ls_tree(&tree.to_hex()).unwrap();
        let names: Vec<&str> = listing.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b.txt"]);
        assert_eq!(listing.entries[0].mode, EntryMode::Directory);
    }

    #[test]
    fn write_tree_honors_ignore_file() {
        let (_dir, repo) = repo();
        write(&repo, ".gitignore", "*.tmp\n");
        write(&repo, "keep.txt", "k");
        write(&repo, "scratch.tmp", "s");
        let listing = repo.ls_tree(&repo.write_tree().unwrap().to_hex()).unwrap();
        let names: Vec<&str> = listing.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec![".gitignore", "keep.txt"]);
    }

    #[test]
    fn commit_tree_does_not_move_head() {
        let (_dir, repo) = repo();
        write(&repo, "f.txt", "f");
        let tree = repo.write_tree().unwrap();
        let c1 = repo.commit_tree(&tree.to_hex(), "first", None).unwrap();
        let c2 = repo
            .commit_tree(&tree.to_hex(), "second", Some(&c1.to_hex()))
            .unwrap();
        assert_eq!(repo.head().unwrap(), None);

        let listing = repo.ls_tree(&c2.to_hex()).unwrap();
        assert_eq!(listing.entries[0].name, "f.txt");
    }

    #[test]
    fn commit_with_empty_index_fails() {
        let (_dir, repo) = repo();
        assert!(matches!(
            repo.commit("nothing"),
            Err(SdkError::PreconditionFailed(_))
        ));
    }

    #[test]
    fn add_commit_and_log() {
        let (dir, repo) = repo();
        write(&repo, "a.txt", "a1");
        repo.add(&["a.txt"]).unwrap();
        let c1 = repo.commit("first").unwrap();

        write(&repo, "a.txt", "a2");
        write(&repo, "docs/readme.md", "hi");
        repo.add(&["a.txt", "docs/readme.md"]).unwrap();
        let c2 = repo.commit("second").unwrap();

        assert_eq!(repo.head().unwrap(), Some(c2));
        assert_eq!(
            fs::read_to_string(dir.path().join(".git/refs/heads/main")).unwrap(),
            format!("{c2}\n")
        );
        assert_eq!(fs::read_to_string(dir.path().join(".git/index")).unwrap(), "");

        let log = repo.ls_commits().unwrap();
        let ids: Vec<ObjectId> = log.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![c2, c1]);
        assert_eq!(log[0].1.parent, Some(c1));
        assert_eq!(log[0].1.message, "second");

        let root = repo.ls_tree(&c2.to_hex()).unwrap();
        let names: Vec<&str> = root.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a.txt", "docs"]);
    }

    #[test]
    fn add_dot_skips_metadata_and_ignored() {
        let (_dir, repo) = repo();
        write(&repo, ".gitignore", "target/\n");
        write(&repo, "src/main.rs", "fn main() {}");
        write(&repo, "target/debug.bin", "bin");
        let staged = repo.add(&["."]).unwrap();
        let paths: Vec<&str> = staged.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec![".gitignore", "src"]);
    }

    #[test]
    fn add_missing_path_is_not_found() {
        let (_dir, repo) = repo();
        let err = repo.add(&["ghost.txt"]).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn status_tracks_the_workflow() {
        let (_dir, repo) = repo();
        write(&repo, "a.txt", "a");
        let status = repo.status().unwrap();
        assert_eq!(status.untracked, vec!["a.txt"]);

        repo.add(&["a.txt"]).unwrap();
        let status = repo.status().unwrap();
        assert_eq!(status.staged, vec![StatusEntry::new("a.txt", FileStatus::New)]);
        assert!(status.untracked.is_empty());

        repo.commit("add a").unwrap();
        assert!(repo.status().unwrap().is_clean());

        write(&repo, "a.txt", "changed");
        let status = repo.status().unwrap();
        assert_eq!(status.modified, vec![StatusEntry::new("a.txt", FileStatus::Modified)]);
    }

    #[test]
    fn checkout_restores_earlier_commit() {
        let (dir, repo) = repo();
        write(&repo, "a.txt", "v1");
        repo.add(&["."]).unwrap();
        let c1 = repo.commit("v1").unwrap();

        write(&repo, "a.txt", "v2");
        write(&repo, "b.txt", "new");
        repo.add(&["."]).unwrap();
        let c2 = repo.commit("v2").unwrap();
        assert_ne!(c1, c2);

        repo.checkout(&c1.to_hex()).unwrap();
        assert_eq!(fs::read_to_string(dir.path().join("a.txt")).unwrap(), "v1");
        assert!(!dir.path().join("b.txt").exists());
        assert!(dir.path().join(".git/HEAD").exists());
        assert_eq!(repo.head().unwrap(), Some(c1));
        assert_eq!(repo.write_tree().unwrap(), repo.ls_tree_id(&c1));
    }

    #[test]
    fn checkout_discards_staged_entries() {
        let (dir, repo) = repo();
        write(&repo, "a.txt", "v1");
        repo.add(&["a.txt"]).unwrap();
        let c1 = repo.commit("v1").unwrap();

        write(&repo, "b.txt", "staged only");
        repo.add(&["b.txt"]).unwrap();
        repo.checkout(&c1.to_hex()).unwrap();
        assert!(!dir.path().join("b.txt").exists());
        assert!(fs::read_to_string(dir.path().join(".git/index")).unwrap().is_empty());
        assert!(!repo.status().unwrap().has_staged_changes());

        write(&repo, "a.txt", "v2");
        repo.add(&["a.txt"]).unwrap();
        let c2 = repo.commit("v2").unwrap();
        let names: Vec<String> = repo
            .ls_tree(&c2.to_hex())
            .unwrap()
            .entries
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["a.txt"]);
    }

    #[test]
    fn commit_with_unencodable_author_leaves_head_alone() {
        let (_dir, repo) = repo();
        write(&repo, "a.txt", "a");
        repo.add(&["a.txt"]).unwrap();
        let c1 = repo.commit("first").unwrap();

        repo.save_config(&RepoConfig {
            author_name: Some("Ann\nEvil".into()),
            ..RepoConfig::default()
        })
        .unwrap();
        write(&repo, "a.txt", "b");
        repo.add(&["a.txt"]).unwrap();
        assert!(repo.commit("second").is_err());
        assert_eq!(repo.head().unwrap(), Some(c1));
        assert_eq!(repo.ls_commits().unwrap().len(), 1);
        assert!(repo.status().unwrap().has_staged_changes());
    }

    #[test]
    fn checkout_unknown_commit_touches_nothing() {
        let (dir, repo) = repo();
        write(&repo, "keep.txt", "k");
        let err = repo.checkout(&"ab".repeat(20)).unwrap_err();
        assert!(err.is_not_found());
        assert!(dir.path().join("keep.txt").exists());
    }

    #[test]
    fn push_without_repo_info_fails_early() {
        let (_dir, repo) = repo();
        write(&repo, "a.txt", "a");
        repo.add(&["a.txt"]).unwrap();
        repo.commit("a").unwrap();
        assert!(matches!(repo.push(), Err(SdkError::PreconditionFailed(_))));
    }

    #[test]
    fn push_without_commits_fails() {
        let (_dir, repo) = repo();
        let remote = MockTransport::new();
        assert!(matches!(
            repo.push_with(&remote),
            Err(SdkError::PreconditionFailed(_))
        ));
        assert!(remote.operations().is_empty());
    }

    #[test]
    fn push_sends_history_and_moves_remote_ref() {
        let (_dir, repo) = repo();
        repo.set_repo_info("ann", "notes").unwrap();
        write(&repo, "a.txt", "a");
        repo.add(&["a.txt"]).unwrap();
        let c1 = repo.commit("first").unwrap();

        let remote = MockTransport::new();
        let report = repo.push_with(&remote).unwrap();
        assert_eq!(report.commits, vec![c1]);
        assert_eq!(report.objects_sent, 3);
        assert_eq!(remote.remote_ref("main"), Some(c1));

        let again = repo.push_with(&remote).unwrap();
        assert!(again.is_up_to_date());
        assert_eq!(again.objects_sent, 0);
        assert_eq!(remote.remote_ref("main"), Some(c1));
    }

    #[test]
    fn push_honors_missing_object_policy() {
        let (_dir, repo) = repo();
        write(&repo, "a.txt", "a");
        let blob = repo.hash_object(Path::new("a.txt")).unwrap().object_id;
        repo.add(&["a.txt"]).unwrap();
        repo.commit("a").unwrap();
        fs::remove_file(repo.store().object_path(&blob)).unwrap();

        let remote = MockTransport::new();
        let err = repo.push_with(&remote).unwrap_err();
        assert!(matches!(err, SdkError::Sync(SyncError::MissingObjects(_))));
        assert!(remote.batches().is_empty());

        let mut config = repo.config().unwrap();
        config.missing_objects = Some(ctrlz_sync::MissingObjectPolicy::Skip);
        repo.save_config(&config).unwrap();
        let report = repo.push_with(&remote).unwrap();
        assert_eq!(report.skipped, vec![blob]);
    }

    impl Repository {
        fn ls_tree_id(&self, commit: &ObjectId) -> ObjectId {
            self.graph().read_commit(commit).unwrap().tree
        }
    }
}
