//! `taxi-lite`: spawns the broker, both dispatchers and the health monitor as local
//! child processes for manual testing and demos, the way `trace-lite`'s `cmd_up`
//! brings up the trace harness's services.

use std::{
    path::{Path, PathBuf},
    process::Stdio,
};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::process::{Child, Command};

#[derive(Parser, Debug)]
#[command(name = "taxi-lite")]
#[command(about = "Grid taxi dispatch local dev-stack runner", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: CommandKind,
}

#[derive(Subcommand, Debug)]
enum CommandKind {
    /// Build and run broker + primary dispatcher + standby dispatcher + monitor in
    /// the foreground until Ctrl-C.
    Up,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let repo = find_repo_root().context("find workspace root (run from inside the repo)")?;

    match cli.command {
        CommandKind::Up => cmd_up(&repo).await,
    }
}

async fn cmd_up(repo: &Path) -> anyhow::Result<()> {
    cargo_build(repo, &["taxi-broker", "taxi-dispatcher", "taxi-monitor"])
        .await
        .context("cargo build required packages")?;

    let broker_bin = bin_path(repo, "taxi-broker");
    let dispatcher_bin = bin_path(repo, "taxi-dispatcher");
    let monitor_bin = bin_path(repo, "taxi-monitor");

    let mut broker = spawn(&broker_bin, &[]).context("start broker")?;
    let mut primary = spawn(&dispatcher_bin, &["--role", "primary"]).context("start primary dispatcher")?;
    let mut standby = spawn(&dispatcher_bin, &["--role", "standby"]).context("start standby dispatcher")?;
    let mut monitor = spawn(&monitor_bin, &[]).context("start health monitor")?;

    eprintln!(
        "\ntaxi-lite up: stack running (broker 5559/5560, primary 5555, standby 5556)\n\
\n\
Ctrl-C stops all local processes.\n"
    );

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            eprintln!("taxi-lite up: ctrl-c received, stopping...");
        }
        status = broker.wait() => {
            eprintln!("taxi-lite up: broker exited: {status:?}");
        }
        status = primary.wait() => {
            eprintln!("taxi-lite up: primary dispatcher exited: {status:?}");
        }
        status = standby.wait() => {
            eprintln!("taxi-lite up: standby dispatcher exited: {status:?}");
        }
        status = monitor.wait() => {
            eprintln!("taxi-lite up: monitor exited: {status:?}");
        }
    }

    kill_and_wait("broker", &mut broker).await;
    kill_and_wait("primary dispatcher", &mut primary).await;
    kill_and_wait("standby dispatcher", &mut standby).await;
    kill_and_wait("monitor", &mut monitor).await;

    Ok(())
}

fn spawn(bin: &Path, args: &[&str]) -> anyhow::Result<Child> {
    Command::new(bin)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .with_context(|| format!("spawn {}", bin.display()))
}

async fn kill_and_wait(name: &str, child: &mut Child) {
    if let Some(pid) = child.id() {
        eprintln!("taxi-lite up: stopping {name} (pid {pid})");
    }
    let _ = child.kill().await;
    let _ = child.wait().await;
}

async fn cargo_build(repo: &Path, packages: &[&str]) -> anyhow::Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.current_dir(repo).arg("build");
    for p in packages {
        cmd.arg("-p").arg(p);
    }
    let status = cmd.status().await.context("spawn cargo build")?;
    if !status.success() {
        anyhow::bail!("cargo build failed: {status}");
    }
    Ok(())
}

fn bin_path(repo: &Path, name: &str) -> PathBuf {
    let target_dir = std::env::var_os("CARGO_TARGET_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| repo.join("target"));
    target_dir
        .join("debug")
        .join(format!("{name}{}", std::env::consts::EXE_SUFFIX))
}

fn find_repo_root() -> anyhow::Result<PathBuf> {
    let mut dir = std::env::current_dir().context("read cwd")?;
    for _ in 0..8 {
        if dir.join("Cargo.toml").exists() && dir.join("crates").join("taxi-core").exists() {
            return Ok(dir);
        }
        let Some(parent) = dir.parent() else {
            break;
        };
        dir = parent.to_path_buf();
    }
    anyhow::bail!("could not locate workspace root (expected crates/taxi-core)")
}
