use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "ctrlz",
    about = "ctrlz: a minimal content-addressed version control tool",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create an empty repository
    Init(InitArgs),
    /// Print a stored object
    CatFile(CatFileArgs),
    /// Store a file or directory and print its hash
    HashObject(HashObjectArgs),
    /// List the entries of a tree
    LsTree(LsTreeArgs),
    /// Snapshot the working directory as a tree
    WriteTree,
    /// Create a commit object for a tree
    CommitTree(CommitTreeArgs),
    /// Stage paths for the next commit
    Add(AddArgs),
    /// Commit the staged paths
    Commit(CommitArgs),
    /// Show staged, modified and untracked files
    Status,
    /// List the commits on the current branch
    LsCommits,
    /// Restore the working directory to a commit
    Checkout(CheckoutArgs),
    /// Set the remote user and repository names
    #[command(name = "setRepoInfo")]
    SetRepoInfo(SetRepoInfoArgs),
    /// Upload missing objects and move the remote branch
    Push,
}

#[derive(Args)]
pub struct InitArgs {
    pub path: Option<PathBuf>,
}

#[derive(Args)]
pub struct CatFileArgs {
    /// Pretty-print the object contents
    #[arg(short = 'p')]
    pub pretty: bool,
    pub hash: String,
}

#[derive(Args)]
pub struct HashObjectArgs {
    pub path: PathBuf,
}

#[derive(Args)]
pub struct LsTreeArgs {
    /// Print entry names only
    #[arg(long)]
    pub name_only: bool,
    pub hash: String,
}

#[derive(Args)]
pub struct CommitTreeArgs {
    pub tree: String,
    #[arg(short, long, default_value = "")]
    pub message: String,
    #[arg(short, long)]
    pub parent: Option<String>,
}

#[derive(Args)]
pub struct AddArgs {
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
}

#[derive(Args)]
pub struct CommitArgs {
    pub message: String,
}

#[derive(Args)]
pub struct CheckoutArgs {
    pub hash: String,
}

#[derive(Args)]
pub struct SetRepoInfoArgs {
    pub user: String,
    pub repo: String,
}
