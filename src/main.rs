//! Gather demo
//!
//! Renders the discussion views for a route against the seeded in-memory
//! service and prints the resulting node tree as JSON.
//!
//! ```text
//! gather /community/7                  community page: slug redirect + section
//! gather /community/7/hiking-club/discussions --load-more 1
//! gather /discussion/100
//! ```

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use serde_json::json;

use gather_core::navigation::{CommunityTab, MemoryNavigator};
use gather_core::views::{DiscussionPage, DiscussionsListPage, DiscussionsSection, Node};
use gather_core::{Error, GatherCore, InMemoryService, QueryConfig, Result, Service};

// ── CLI Arguments ─────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "gather", version, about = "Render Gather discussion views as JSON")]
struct Args {
    /// Route to render
    #[arg(default_value = "/community/7")]
    route: String,

    /// Extra pages to load on list routes
    #[arg(long, default_value_t = 0)]
    load_more: usize,

    /// Seconds an unused cache entry is kept
    #[arg(long, env = "GATHER_QUERY_GC_SECS")]
    gc_secs: Option<String>,

    /// Page size requested for event lists
    #[arg(long, env = "GATHER_EVENTS_PAGE_SIZE")]
    events_page_size: Option<u32>,

    /// Simulated service latency in milliseconds
    #[arg(long, default_value_t = 0, env = "GATHER_DEMO_LATENCY_MS")]
    latency_ms: u64,

    /// Print compact JSON
    #[arg(long)]
    compact: bool,
}

// ── Entry Point ───────────────────────────────────────────────────────────────

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let default_filter = if cfg!(feature = "verbose-logging") {
        "gather_core=debug,gather=debug"
    } else {
        "gather_core=info,gather=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut config = QueryConfig::from_env();
    match args.gc_secs.as_deref().map(str::trim) {
        Some("never") | Some("off") => config = config.without_eviction(),
        Some(secs) => {
            let secs = secs
                .parse::<u64>()
                .map_err(|_| Error::Internal(format!("invalid --gc-secs value: {secs}")))?;
            config = config.with_gc_time(Duration::from_secs(secs));
        }
        None => {}
    }
    if args.events_page_size.is_some() {
        config.events_page_size = args.events_page_size;
    }

    let mut backend = InMemoryService::demo();
    if args.latency_ms > 0 {
        backend = backend.with_latency(Duration::from_millis(args.latency_ms));
    }
    let core = GatherCore::new(Service::from_backend(Arc::new(backend)), config);

    let navigator = MemoryNavigator::at(&args.route);
    let params = navigator.params();
    tracing::info!(route = %args.route, "Rendering");

    let nodes: Vec<Node> = if let Some(discussion_id) = params.discussion_id() {
        let mut page = DiscussionPage::new(core.queries(), discussion_id)?;
        page.settled().await?;
        page.render()
    } else if params.community_id.is_some() {
        render_community(&core, &navigator, args.load_more).await?
    } else {
        return Err(Error::Internal(format!("unknown route: {}", args.route)));
    };

    let output = json!({
        "location": navigator.location(),
        "nodes": nodes,
    });
    let text = if args.compact {
        serde_json::to_string(&output)?
    } else {
        serde_json::to_string_pretty(&output)?
    };
    println!("{text}");
    Ok(())
}

async fn render_community(
    core: &GatherCore,
    navigator: &MemoryNavigator,
    load_more: usize,
) -> Result<Vec<Node>> {
    let params = navigator.params();
    let mut community = core.queries().community(None, &params)?;
    let snapshot = community.settled().await;
    community.sync(&navigator.params(), navigator);

    let Some(data) = snapshot.data else {
        let message = snapshot
            .error
            .map(|err| err.message)
            .unwrap_or_else(|| Error::CommunityNotFound.to_string());
        return Ok(vec![Node::Alert { message }]);
    };

    let params = navigator.params();
    if params.community_tab.as_deref() == Some(CommunityTab::Discussions.as_str()) {
        let mut page = DiscussionsListPage::new(core.queries(), data.community_id)?;
        page.settled().await;
        for _ in 0..load_more {
            if !page.load_more() {
                break;
            }
            page.settled().await;
        }
        Ok(page.render())
    } else {
        let mut section = DiscussionsSection::new(core.queries(), data)?;
        section.settled().await;
        Ok(section.render())
    }
}
