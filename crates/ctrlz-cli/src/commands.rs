use std::io::Write;

use anyhow::Context;
use colored::Colorize;
use ctrlz_sdk::{Blob, ObjectKind, Repository, StoredObject, Tree};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Init(args) => cmd_init(args),
        Command::CatFile(args) => cmd_cat_file(args),
        Command::HashObject(args) => cmd_hash_object(args),
        Command::LsTree(args) => cmd_ls_tree(args),
        Command::WriteTree => cmd_write_tree(),
        Command::CommitTree(args) => cmd_commit_tree(args),
        Command::Add(args) => cmd_add(args),
        Command::Commit(args) => cmd_commit(args),
        Command::Status => cmd_status(),
        Command::LsCommits => cmd_ls_commits(),
        Command::Checkout(args) => cmd_checkout(args),
        Command::SetRepoInfo(args) => cmd_set_repo_info(args),
        Command::Push => cmd_push(),
    }
}

fn open_repo() -> anyhow::Result<Repository> {
    let cwd = std::env::current_dir().context("cannot read current directory")?;
    Ok(Repository::discover(cwd)?)
}

fn cmd_init(args: InitArgs) -> anyhow::Result<()> {
    let path = match args.path {
        Some(path) => path,
        None => std::env::current_dir().context("cannot read current directory")?,
    };
    let repo = Repository::init(&path)?;
    println!(
        "{} Initialized empty repository in {}",
        "✓".green().bold(),
        repo.meta_dir().display().to_string().bold()
    );
    println!("  Branch: {}", "main".yellow());
    Ok(())
}

fn cmd_cat_file(args: CatFileArgs) -> anyhow::Result<()> {
    let repo = open_repo()?;
    let obj = repo.cat_file(&args.hash)?;
    if args.pretty {
        print_object(&obj)
    } else {
        println!("{} {}", obj.kind, obj.size);
        Ok(())
    }
}

fn print_object(obj: &StoredObject) -> anyhow::Result<()> {
    match obj.kind {
        ObjectKind::Blob => {
            let blob = Blob::from_stored_object(obj)?;
            let mut out = std::io::stdout().lock();
            out.write_all(&blob.data)?;
            out.flush()?;
        }
        ObjectKind::Tree => print_tree(&Tree::from_stored_object(obj)?, false),
        ObjectKind::Commit => {
            let text = String::from_utf8_lossy(&obj.data);
            print!("{text}");
            if !text.ends_with('\n') {
                println!();
            }
        }
    }
    Ok(())
}

fn print_tree(tree: &Tree, name_only: bool) {
    for entry in &tree.entries {
        if name_only {
            println!("{}", entry.name);
        } else {
            println!(
                "{:0>6} {} {}\t{}",
                entry.mode.as_str(),
                entry.mode.object_kind(),
                entry.object_id,
                entry.name
            );
        }
    }
}

fn cmd_hash_object(args: HashObjectArgs) -> anyhow::Result<()> {
    let repo = open_repo()?;
    let entry = repo
        .hash_object(&args.path)
        .with_context(|| format!("cannot hash {}", args.path.display()))?;
    println!("{}", entry.object_id);
    Ok(())
}

fn cmd_ls_tree(args: LsTreeArgs) -> anyhow::Result<()> {
    let repo = open_repo()?;
    print_tree(&repo.ls_tree(&args.hash)?, args.name_only);
    Ok(())
}

fn cmd_write_tree() -> anyhow::Result<()> {
    let repo = open_repo()?;
    println!("{}", repo.write_tree()?);
    Ok(())
}

fn cmd_commit_tree(args: CommitTreeArgs) -> anyhow::Result<()> {
    let repo = open_repo()?;
    let id = repo.commit_tree(&args.tree, &args.message, args.parent.as_deref())?;
    println!("{id}");
    Ok(())
}

fn cmd_add(args: AddArgs) -> anyhow::Result<()> {
    let repo = open_repo()?;
    for entry in repo.add(args.paths.as_slice())? {
        println!("  {} {}", "staged:".green(), entry.path);
    }
    Ok(())
}

fn cmd_commit(args: CommitArgs) -> anyhow::Result<()> {
    let repo = open_repo()?;
    let id = repo.commit(&args.message)?;
    println!(
        "{} [{} {}] {}",
        "✓".green().bold(),
        "main".yellow(),
        id.short_hex().dimmed(),
        args.message
    );
    Ok(())
}

fn cmd_status() -> anyhow::Result<()> {
    let repo = open_repo()?;
    let status = repo.status()?;
    println!("On branch {}", "main".yellow().bold());
    if status.is_clean() {
        println!("\nNothing to commit, working directory clean.");
        return Ok(());
    }
    if !status.staged.is_empty() {
        println!("\nChanges to be committed:");
        for entry in &status.staged {
            println!("  {:<10} {}", format!("{:?}:", entry.status).to_lowercase().green(), entry.path.green());
        }
    }
    if !status.modified.is_empty() || !status.deleted.is_empty() {
        println!("\nChanges not staged for commit:");
        for entry in &status.modified {
            println!("  {:<10} {}", "modified:".red(), entry.path.red());
        }
        for path in &status.deleted {
            println!("  {:<10} {}", "deleted:".red(), path.red());
        }
    }
    if !status.untracked.is_empty() {
        println!("\nUntracked files:");
        for path in &status.untracked {
            println!("  {}", path.red());
        }
    }
    Ok(())
}

fn cmd_ls_commits() -> anyhow::Result<()> {
    let repo = open_repo()?;
    let history = repo.ls_commits()?;
    if history.is_empty() {
        println!("No commits yet.");
    }
    for (id, commit) in history {
        println!("{} {}", "commit".yellow(), id.to_string().yellow());
        println!("Author: {}", commit.author);
        println!("Date:   {}", commit.timestamp.to_rfc2822());
        println!();
        for line in commit.message.lines() {
            println!("    {line}");
        }
        println!();
    }
    Ok(())
}

fn cmd_checkout(args: CheckoutArgs) -> anyhow::Result<()> {
    let repo = open_repo()?;
    let summary = repo.checkout(&args.hash)?;
    println!(
        "{} Checked out {} ({} files, {} directories)",
        "✓".green().bold(),
        args.hash.yellow(),
        summary.files,
        summary.dirs
    );
    Ok(())
}

fn cmd_set_repo_info(args: SetRepoInfoArgs) -> anyhow::Result<()> {
    let repo = open_repo()?;
    repo.set_repo_info(&args.user, &args.repo)?;
    println!(
        "{} Remote repository set to {}/{}",
        "✓".green().bold(),
        args.user.bold(),
        args.repo.bold()
    );
    Ok(())
}

fn cmd_push() -> anyhow::Result<()> {
    let repo = open_repo()?;
    let report = repo.push()?;
    if report.is_up_to_date() {
        println!("{} Everything up to date.", "✓".green().bold());
    } else {
        println!(
            "{} Pushed {} commit(s): {} object(s) in {} batch(es), {} bytes",
            "✓".green().bold(),
            report.commits.len(),
            report.objects_sent,
            report.batches,
            report.bytes_sent
        );
    }
    for id in &report.skipped {
        println!("  {} {}", "skipped missing object".yellow(), id);
    }
    if let Some(head) = report.new_head {
        let from = report
            .remote_head
            .map(|id| id.short_hex())
            .unwrap_or_else(|| "(none)".into());
        println!("  main: {} -> {}", from.dimmed(), head.short_hex().green());
    }
    Ok(())
}
