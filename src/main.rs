use std::path::PathBuf;

use anyhow::{bail, Context as _};
use clap::{command, Arg, ArgMatches, Command};
use context::Context;
use log::info;

use crate::{access::Tier, publish::Publisher, server::App};

mod access;
mod auth;
mod context;
mod error;
mod frontmatter;
mod metadata;
mod navigation;
mod publish;
mod repository;
mod server;
mod site_config;
mod storage;

fn publish_args() -> [Arg; 2] {
    [
        Arg::new("build_cmd")
            .long("build-cmd")
            .help("Command that builds the static site")
            .default_value("mkdocs build"),
        Arg::new("deploy_cmd")
            .long("deploy-cmd")
            .help("Command that publishes the built site")
            .default_value("mkdocs gh-deploy"),
    ]
}

fn publisher(ctx: &Context, matches: &ArgMatches) -> Publisher {
    let build: &String = matches.get_one("build_cmd").unwrap();
    let deploy: &String = matches.get_one("deploy_cmd").unwrap();
    Publisher::new(ctx.root.clone(), build, deploy)
}

fn main() -> anyhow::Result<()> {
    // `.env` is optional
    let _ = dotenvy::dotenv();
    env_logger::init();

    let matches = command!()
        .about("Personal markdown journal with mkdocs navigation")
        .subcommand_required(true)
        .args(&[
            Arg::new("root")
                .long("root")
                .global(true)
                .help("Journal directory holding docs/, metadata.json and mkdocs.yml")
                .value_parser(clap::value_parser!(PathBuf))
                .default_value("."),
            Arg::new("secrets")
                .long("secrets")
                .global(true)
                .help("TOML file with ADMIN_ID, ADMIN_PW, WORK_ID and WORK_PW")
                .value_parser(clap::value_parser!(PathBuf))
                .default_value(".streamlit/secrets.toml"),
        ])
        .subcommands([
            Command::new("serve")
                .about("Serve the journal web form")
                .arg(
                    Arg::new("bind")
                        .long("bind")
                        .help("Address to listen on")
                        .default_value("127.0.0.1:8501"),
                )
                .args(publish_args()),
            Command::new("publish")
                .about("Build and deploy the static site")
                .args(publish_args()),
            Command::new("sync-nav")
                .about("Rebuild mkdocs.yml navigation for a tier")
                .arg(
                    Arg::new("tier")
                        .long("tier")
                        .value_parser(["admin", "work"])
                        .default_value("admin"),
                ),
            Command::new("reindex").about("Rebuild metadata.json from the files in docs/"),
            Command::new("hash-password")
                .about("Print a bcrypt hash for ADMIN_PW or WORK_PW")
                .arg(Arg::new("password").required(true)),
        ])
        .get_matches();

    let root: &PathBuf = matches.get_one("root").unwrap();
    if root.exists() && !root.is_dir() {
        bail!("root must be a directory.");
    }
    let secrets: &PathBuf = matches.get_one("secrets").unwrap();
    let ctx = Context::init(root.to_owned(), secrets);

    match matches.subcommand() {
        Some(("serve", sub)) => {
            let bind: &String = sub.get_one("bind").unwrap();
            let mut app = App::new(ctx.repository(), ctx.gate.clone(), publisher(&ctx, sub));
            server::serve(&mut app, bind)?;
        }
        Some(("publish", sub)) => {
            publisher(&ctx, sub).publish()?;
        }
        Some(("sync-nav", sub)) => {
            let tier: Tier = sub
                .get_one::<String>("tier")
                .unwrap()
                .parse()
                .map_err(anyhow::Error::msg)?;
            let repo = ctx.repository();
            let entries = navigation::build(Some(tier), &repo.index()?);
            site_config::sync_navigation(repo.storage(), &entries)
                .context("while rebuilding navigation")?;
            info!("navigation rebuilt for {tier} ({} documents)", entries.len());
        }
        Some(("reindex", _)) => {
            let count = ctx.repository().reindex().context("while reindexing")?;
            println!("{count} documents indexed");
        }
        Some(("hash-password", sub)) => {
            let password: &String = sub.get_one("password").unwrap();
            println!("{}", bcrypt::hash(password, bcrypt::DEFAULT_COST)?);
        }
        _ => unreachable!("subcommand_required"),
    }

    Ok(())
}
