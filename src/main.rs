use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::fs;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use tokensync::bridge::{serve, JsonLineChannel};
use tokensync::settings::default_filename;
use tokensync::sync::{build_export, preview_against_branch};
use tokensync::{
    CommitRequest, GitHubClient, GitHubConfig, RefUpdatePolicy, StoredSettings, VariableDocument,
};

#[derive(Parser, Debug)]
#[command(name = "tokensync")]
#[command(about = "Sync design variables to GitHub as design tokens", long_about = None)]
struct Cli {
    #[command(flatten)]
    repo: RepoArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct RepoArgs {
    /// GitHub organization (falls back to stored settings)
    #[arg(long, global = true)]
    org: Option<String>,
    /// GitHub repository (falls back to stored settings)
    #[arg(long, global = true)]
    repo: Option<String>,
    /// API token (falls back to GITHUB_TOKEN, then stored settings)
    #[arg(long, global = true)]
    token: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the design-tokens export for a variables document
    Export {
        /// Variables document produced by the host bridge
        input: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Diff the local export against the file committed to a branch
    Diff {
        input: PathBuf,
        #[arg(short, long)]
        branch: String,
        #[arg(short, long, default_value = "variables.json")]
        path: String,
    },
    /// Commit the export to a branch
    Commit {
        input: PathBuf,
        #[arg(short, long)]
        branch: String,
        #[arg(short, long)]
        message: String,
        #[arg(short, long, default_value = "variables.json")]
        path: String,
        /// Reject the commit instead of overwriting concurrent changes
        #[arg(long)]
        fast_forward_only: bool,
    },
    /// Find (or open) a pull request for a head/base branch pair
    Pr {
        head: String,
        base: String,
        /// Open a pull request if none exists
        #[arg(long)]
        create: bool,
        #[arg(long, requires = "create")]
        title: Option<String>,
    },
    /// List branches of the configured repository
    Branches,
    /// Answer host bridge messages over stdin/stdout
    Serve { input: PathBuf },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Export { input, output } => cmd_export(&input, output.as_deref()),
        Commands::Diff {
            input,
            branch,
            path,
        } => cmd_diff(&cli.repo, &input, &branch, &path),
        Commands::Commit {
            input,
            branch,
            message,
            path,
            fast_forward_only,
        } => cmd_commit(&cli.repo, &input, &branch, &message, &path, fast_forward_only),
        Commands::Pr {
            head,
            base,
            create,
            title,
        } => cmd_pr(&cli.repo, &head, &base, create, title.as_deref()),
        Commands::Branches => cmd_branches(&cli.repo),
        Commands::Serve { input } => cmd_serve(&input),
    }
}

fn cmd_export(input: &Path, output: Option<&Path>) -> Result<()> {
    let document = VariableDocument::load(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let snapshot = build_export(&document);

    match output {
        Some(path) => fs::write(path, &snapshot.content)
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => println!("{}", snapshot.content),
    }
    Ok(())
}

fn cmd_diff(repo: &RepoArgs, input: &Path, branch: &str, path: &str) -> Result<()> {
    let client = github_client(repo)?;
    let document = VariableDocument::load(input)?;
    let snapshot = build_export(&document);

    let preview = preview_against_branch(&client, &snapshot, path, branch)?;
    if preview.is_empty() {
        println!("No changes against {branch}:{path}");
    } else {
        println!("{}", preview.text);
    }
    Ok(())
}

fn cmd_commit(
    repo: &RepoArgs,
    input: &Path,
    branch: &str,
    message: &str,
    path: &str,
    fast_forward_only: bool,
) -> Result<()> {
    let client = github_client(repo)?;
    let document = VariableDocument::load(input)?;
    let snapshot = build_export(&document);

    let policy = if fast_forward_only {
        RefUpdatePolicy::FastForwardOnly
    } else {
        RefUpdatePolicy::Force
    };

    let outcome = client.commit_changes(&CommitRequest {
        branch: branch.to_string(),
        message: message.to_string(),
        path: path.to_string(),
        content: snapshot.content,
        policy,
    })?;

    println!("Committed {} to {branch}", outcome.sha);
    if !outcome.url.is_empty() {
        println!("  {}", outcome.url);
    }
    Ok(())
}

fn cmd_pr(repo: &RepoArgs, head: &str, base: &str, create: bool, title: Option<&str>) -> Result<()> {
    let client = github_client(repo)?;

    if let Some(existing) = client.find_pull_request(head, base)? {
        println!("#{} {}", existing.number, existing.title);
        println!("  {}", existing.html_url);
        return Ok(());
    }

    if !create {
        println!("No open pull request for {head} -> {base}");
        return Ok(());
    }

    let title = title
        .map(str::to_string)
        .unwrap_or_else(|| format!("Update {}", default_filename()));
    let pull = client.create_pull_request(
        &title,
        head,
        base,
        "Synced design variables from the design tool.",
    )?;
    println!("Opened #{} {}", pull.number, pull.html_url);
    Ok(())
}

fn cmd_branches(repo: &RepoArgs) -> Result<()> {
    let client = github_client(repo)?;
    for branch in client.list_branches()? {
        if branch.protected {
            println!("{} (protected)", branch.name);
        } else {
            println!("{}", branch.name);
        }
    }
    Ok(())
}

fn cmd_serve(input: &Path) -> Result<()> {
    let document = VariableDocument::load(input)?;
    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let mut channel = JsonLineChannel::new(BufReader::new(stdin.lock()), stdout.lock());
    serve(&document, &mut channel)?;
    Ok(())
}

fn github_client(repo: &RepoArgs) -> Result<GitHubClient> {
    let settings = match StoredSettings::default_path() {
        Some(path) => StoredSettings::load(&path)?,
        None => StoredSettings::default(),
    };

    let organization = repo
        .org
        .clone()
        .or_else(|| non_empty(settings.organization.clone()));
    let repository = repo
        .repo
        .clone()
        .or_else(|| non_empty(settings.repository.clone()));
    let token = repo
        .token
        .clone()
        .or_else(|| std::env::var("GITHUB_TOKEN").ok())
        .or_else(|| non_empty(settings.token.clone()));

    let Some(organization) = organization else {
        bail!("no organization configured (use --org or stored settings)");
    };
    let Some(repository) = repository else {
        bail!("no repository configured (use --repo or stored settings)");
    };
    let Some(token) = token else {
        bail!("no token configured (use --token, GITHUB_TOKEN, or stored settings)");
    };

    Ok(GitHubClient::new(GitHubConfig::new(
        &token,
        &organization,
        &repository,
    )))
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
