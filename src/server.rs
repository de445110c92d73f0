//! Development server
//!
//! Rebuilds the snapshot whenever one of its input files changes and serves the
//! output directory with live reload. Custom time ranges, which the static page
//! cannot prerender, are rendered on request under [`TIME_ENDPOINT`].

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use chrono::NaiveDate;
use notify::{Event, RecursiveMode, Watcher};
use serde::Deserialize;
use tokio::sync::mpsc;
use tower_http::services::ServeDir;
use tower_livereload::LiveReloadLayer;
use tracing::{error, info, warn};

use crate::site::{SiteJob, TIME_ENDPOINT};
use crate::views::time::filter::{TimeFilterMode, TimeFilterState};

/// Quiet period letting a burst of file events settle before rebuilding
const REBUILD_DEBOUNCE_MS: u64 = 100;

/// Directories to watch for a set of input files
fn watch_dirs(files: &[&Path]) -> BTreeSet<PathBuf> {
    files
        .iter()
        .map(|file| match file.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        })
        .collect()
}

fn rebuild(job: &SiteJob) {
    match job.run() {
        Ok(summary) => info!(nodes = summary.nodes, edges = summary.edges, "rebuilt snapshot"),
        Err(e) => error!(error = %e, "rebuild failed"),
    }
}

/// Query string of a time dashboard request
#[derive(Debug, Default, Deserialize)]
struct TimeQuery {
    filter: Option<String>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
}

impl TimeQuery {
    /// A known preset wins, anything else is a custom range over `from`/`to`
    fn filter_state(&self) -> TimeFilterState {
        match self.filter.as_deref().and_then(TimeFilterMode::parse) {
            Some(mode) if mode != TimeFilterMode::Custom => TimeFilterState::preset(mode),
            _ => TimeFilterState::custom(self.from, self.to),
        }
    }
}

async fn time_fragment(
    State(job): State<Arc<SiteJob>>,
    Query(query): Query<TimeQuery>,
) -> Response {
    let filter = query.filter_state();
    match tokio::task::spawn_blocking(move || job.time_fragment(filter)).await {
        Ok(Ok(markup)) => Html(markup).into_response(),
        Ok(Err(e)) => {
            warn!(error = %e, "time dashboard unavailable");
            (StatusCode::SERVICE_UNAVAILABLE, e.to_string()).into_response()
        }
        Err(e) => {
            error!(error = %e, "time dashboard task panicked");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

fn router(job: &SiteJob, livereload: LiveReloadLayer) -> Router {
    Router::new()
        .route(&format!("/{TIME_ENDPOINT}"), get(time_fragment))
        .fallback_service(ServeDir::new(&job.output))
        .layer(livereload)
        .with_state(Arc::new(job.clone()))
}

/// Start the development server with hot reload
pub async fn serve(job: SiteJob, port: u16) -> anyhow::Result<()> {
    let summary = job.run()?;
    info!(
        output = %job.output.display(),
        nodes = summary.nodes,
        "generated initial snapshot"
    );

    let (tx, mut rx) = mpsc::channel::<()>(1);

    let watched: BTreeSet<PathBuf> = job
        .watched_files()
        .into_iter()
        .map(Path::to_path_buf)
        .collect();
    let mut watcher = notify::recommended_watcher(move |res: Result<Event, _>| {
        if let Ok(event) = res {
            let relevant = event
                .paths
                .iter()
                .any(|p| watched.iter().any(|w| p.ends_with(w) || w.ends_with(p)));
            if relevant && (event.kind.is_modify() || event.kind.is_create()) {
                let _ = tx.try_send(());
            }
        }
    })?;
    for dir in watch_dirs(&job.watched_files()) {
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;
    }

    let rebuild_job = job.clone();
    tokio::spawn(async move {
        while rx.recv().await.is_some() {
            tokio::time::sleep(tokio::time::Duration::from_millis(REBUILD_DEBOUNCE_MS)).await;
            while rx.try_recv().is_ok() {}

            let job = rebuild_job.clone();
            if let Err(e) = tokio::task::spawn_blocking(move || rebuild(&job)).await {
                error!(error = %e, "rebuild task panicked");
            }
        }
    });

    let livereload = LiveReloadLayer::new();
    let reloader = livereload.reloader();

    let mut output_watcher = notify::recommended_watcher(move |res: Result<Event, _>| {
        if let Ok(event) = res {
            if event.kind.is_modify() || event.kind.is_create() {
                reloader.reload();
            }
        }
    })?;
    output_watcher.watch(&job.output, RecursiveMode::Recursive)?;

    let app = router(&job, livereload);

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    println!("Development server running at http://localhost:{port}");
    println!("Watching {} for changes...", job.input.display());
    println!("Press Ctrl+C to stop");

    // Keep watchers alive
    let _watcher = watcher;
    let _output_watcher = output_watcher;

    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watch_dirs_deduplicates_parents() {
        let files = [
            Path::new("data/graph.json"),
            Path::new("data/todos.json"),
            Path::new("notegraph.yaml"),
        ];
        let dirs: Vec<PathBuf> = watch_dirs(&files).into_iter().collect();
        assert_eq!(dirs, vec![PathBuf::from("."), PathBuf::from("data")]);
    }

    fn query(uri: &str) -> TimeQuery {
        let uri: axum::http::Uri = uri.parse().unwrap();
        Query::<TimeQuery>::try_from_uri(&uri).unwrap().0
    }

    #[test]
    fn time_query_reads_custom_ranges() {
        let state = query("/api/time?from=2026-02-01&to=2026-02-28").filter_state();
        assert_eq!(state.mode, TimeFilterMode::Custom);
        assert_eq!(state.custom_from, NaiveDate::from_ymd_opt(2026, 2, 1));
        assert_eq!(state.custom_to, NaiveDate::from_ymd_opt(2026, 2, 28));
    }

    #[test]
    fn time_query_prefers_a_known_preset() {
        let state = query("/api/time?filter=year&from=2026-02-01").filter_state();
        assert_eq!(state, TimeFilterState::preset(TimeFilterMode::Year));

        let open = query("/api/time?filter=fortnight").filter_state();
        assert_eq!(open, TimeFilterState::custom(None, None));
    }

    #[test]
    fn time_query_rejects_malformed_dates() {
        let uri: axum::http::Uri = "/api/time?from=february".parse().unwrap();
        assert!(Query::<TimeQuery>::try_from_uri(&uri).is_err());
    }

    #[tokio::test]
    async fn time_endpoint_serves_the_dashboard_fragment() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("graph.json");
        std::fs::write(&input, r#"{"nodes": [{"id": "a", "label": "A"}], "edges": []}"#).unwrap();
        let todos = dir.path().join("todos.json");
        std::fs::write(
            &todos,
            r#"[{"id": "t1", "done": true, "actualMin": 25, "category": "Work",
                 "completedAt": "2026-02-10T09:00:00Z"}]"#,
        )
        .unwrap();
        let mut job = SiteJob::new(input, dir.path().join("site"));
        job.todos = Some(todos);

        let response = time_fragment(
            State(Arc::new(job)),
            Query(query("/api/time?from=2026-02-01&to=2026-02-28")),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn time_endpoint_reports_a_missing_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let job = SiteJob::new(dir.path().join("missing.json"), dir.path().join("site"));
        let response = time_fragment(State(Arc::new(job)), Query(TimeQuery::default())).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
