mod config;
mod github;
mod logging;
mod mirror;
mod report;
mod store;

use clap::Parser;
use std::sync::Arc;
use tracing::{info, info_span, Instrument};

use crate::github::GitHubClient;
use crate::logging::DebugLog;
use crate::mirror::Mirror;
use crate::store::Store;

/// Issue Mirror — copies every open issue of jekyll/jekyll, and all of its
/// comments, into a local tree of JSON files.
///
/// Set GITHUB_TOKEN to authenticate. Settings are read from
/// .issue-mirror.toml in the working directory when present.
#[derive(Parser, Debug)]
#[command(name = "issue-mirror", version, about)]
struct Cli {}

#[tokio::main]
async fn main() {
    let debug_log = DebugLog::new();
    logging::init(&debug_log);

    let _cli = Cli::parse();

    let config = match config::Config::load() {
        Ok(config) => config,
        Err(err) => fail(&debug_log, &err),
    };
    let store = match Store::open(config.store_root()) {
        Ok(store) => store,
        Err(err) => fail(&debug_log, &err),
    };

    let client = GitHubClient::from_config(&config);
    info!(repo = %client.repo(), root = %store.root().display(), "mirroring open issues");

    let mirror = Mirror::new(Arc::new(client), store.clone());
    match mirror
        .run()
        .instrument(info_span!("mirror", root = %store.root().display()))
        .await
    {
        Ok(summary) => report::print_summary(&summary, store.root()),
        Err(err) => fail(&debug_log, &err),
    }
}

/// Report a fatal error on stderr, then exit non-zero.
fn fail(debug_log: &DebugLog, err: &dyn std::error::Error) -> ! {
    eprint!("{}", logging::fatal(err, debug_log));
    std::process::exit(1)
}
