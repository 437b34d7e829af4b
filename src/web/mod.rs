// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Read-only web dashboard for the study desk

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, Json},
    routing::get,
    Router,
};
use chrono::{Datelike, Local};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::calendar::{self, CalendarEvent, CalendarStore};
use crate::config::AppConfig;
use crate::db::{ArtifactRecord, Database, DbStats, FocusSession};
use crate::library;
use crate::notes::{Note, NoteStore};

/// Shared application state
pub struct AppState {
    pub db: Database,
    pub config: AppConfig,
}

impl AppState {
    fn notes(&self) -> NoteStore {
        NoteStore::new(self.config.storage.notes_path())
    }

    fn calendar(&self) -> CalendarStore {
        CalendarStore::new(self.config.storage.calendar_path())
    }
}

type ApiResult<T> = std::result::Result<Json<T>, (StatusCode, String)>;

fn internal(e: crate::LuminaraError) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

/// Create the web application router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index_page))
        .route("/api/library", get(api_library))
        .route("/api/notes", get(api_notes))
        .route("/api/calendar", get(api_calendar))
        .route("/api/artifacts", get(api_artifacts))
        .route("/api/focus", get(api_focus))
        .route("/api/stats", get(api_stats))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// === Page Handlers ===

async fn index_page(State(state): State<Arc<AppState>>) -> Html<String> {
    let stats = state.db.stats().unwrap_or(DbStats {
        artifact_count: 0,
        focus_session_count: 0,
        focus_minutes: 0,
    });
    let artifacts = state.db.recent_artifacts(10).unwrap_or_default();
    let upcoming = state
        .calendar()
        .upcoming(Local::now().date_naive(), 10)
        .unwrap_or_default();
    let pdfs = library::list_pdfs(Path::new(&state.config.storage.library_dir)).unwrap_or_default();

    Html(render_index(&stats, &artifacts, &upcoming, &pdfs))
}

// === API Handlers ===

#[derive(Serialize)]
struct LibraryResponse {
    dir: String,
    files: Vec<String>,
}

async fn api_library(State(state): State<Arc<AppState>>) -> ApiResult<LibraryResponse> {
    let dir = state.config.storage.library_dir.clone();
    let files = library::list_pdfs(Path::new(&dir)).map_err(internal)?;
    Ok(Json(LibraryResponse { dir, files }))
}

#[derive(Deserialize)]
struct NotesQuery {
    q: Option<String>,
}

async fn api_notes(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NotesQuery>,
) -> ApiResult<Vec<Note>> {
    let store = state.notes();
    let notes = match query.q.as_deref().map(str::trim) {
        Some(q) if !q.is_empty() => store.search(q),
        _ => store.list(),
    }
    .map_err(internal)?;
    Ok(Json(notes))
}

#[derive(Deserialize)]
struct CalendarQuery {
    month: Option<String>,
}

async fn api_calendar(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CalendarQuery>,
) -> ApiResult<Vec<CalendarEvent>> {
    let store = state.calendar();
    let events = match query.month {
        Some(month) => {
            let (year, month) = calendar::parse_month(&month)
                .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
            store.month(year, month)
        }
        None => store.all(),
    }
    .map_err(internal)?;
    Ok(Json(events))
}

#[derive(Deserialize)]
struct LimitQuery {
    limit: Option<usize>,
}

async fn api_artifacts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LimitQuery>,
) -> ApiResult<Vec<ArtifactRecord>> {
    let records = state
        .db
        .recent_artifacts(query.limit.unwrap_or(50))
        .map_err(internal)?;
    Ok(Json(records))
}

async fn api_focus(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LimitQuery>,
) -> ApiResult<Vec<FocusSession>> {
    let sessions = state
        .db
        .recent_focus_sessions(query.limit.unwrap_or(50))
        .map_err(internal)?;
    Ok(Json(sessions))
}

#[derive(Serialize)]
struct StatsResponse {
    #[serde(flatten)]
    db: DbStats,
    note_count: usize,
    library_count: usize,
    events_this_month: usize,
}

async fn api_stats(State(state): State<Arc<AppState>>) -> ApiResult<StatsResponse> {
    let db = state.db.stats().map_err(internal)?;
    let note_count = state.notes().read_all().map_err(internal)?.len();
    let library_count = library::list_pdfs(Path::new(&state.config.storage.library_dir))
        .map_err(internal)?
        .len();
    let today = Local::now().date_naive();
    let events_this_month = state
        .calendar()
        .month(today.year(), today.month())
        .map_err(internal)?
        .len();

    Ok(Json(StatsResponse {
        db,
        note_count,
        library_count,
        events_this_month,
    }))
}

// === Template Rendering ===

fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn base_template(title: &str, content: &str) -> String {
    format!(r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{} - Luminara</title>
    <style>
        :root {{
            --bg-primary: #121218;
            --bg-card: #1e1e2a;
            --text-primary: #ececf1;
            --text-secondary: #9a9aa8;
            --accent: #f5b942;
            --border: #2c2c3a;
        }}
        * {{ box-sizing: border-box; margin: 0; padding: 0; }}
        body {{
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            background: var(--bg-primary);
            color: var(--text-primary);
            line-height: 1.6;
        }}
        .container {{ max-width: 1200px; margin: 0 auto; padding: 20px; }}
        header {{ padding: 15px 20px; border-bottom: 1px solid var(--border); }}
        header .logo {{ font-size: 1.5em; font-weight: bold; color: var(--accent); }}
        .grid {{ display: grid; grid-template-columns: repeat(auto-fit, minmax(320px, 1fr)); gap: 20px; }}
        .card {{ background: var(--bg-card); border-radius: 12px; padding: 20px; margin-bottom: 20px; }}
        .card h2 {{ margin-bottom: 12px; color: var(--accent); font-size: 1.1em; }}
        .stat {{ text-align: center; }}
        .stat .number {{ font-size: 2.2em; font-weight: bold; color: var(--accent); }}
        .stat .label {{ color: var(--text-secondary); font-size: 0.9em; }}
        table {{ width: 100%; border-collapse: collapse; }}
        th, td {{ padding: 8px; text-align: left; border-bottom: 1px solid var(--border); }}
        th {{ color: var(--text-secondary); font-weight: 500; }}
        .empty {{ color: var(--text-secondary); }}
    </style>
</head>
<body>
    <header><span class="logo">Luminara</span></header>
    <main class="container">
        {}
    </main>
</body>
</html>"#, escape_html(title), content)
}

fn stat_card(number: impl std::fmt::Display, label: &str) -> String {
    format!(
        r#"<div class="card stat"><div class="number">{}</div><div class="label">{}</div></div>"#,
        number, label
    )
}

fn table_or_empty(headers: &[&str], rows: Vec<String>, empty: &str) -> String {
    if rows.is_empty() {
        return format!(r#"<p class="empty">{}</p>"#, empty);
    }
    let head: String = headers.iter().map(|h| format!("<th>{}</th>", h)).collect();
    format!("<table><tr>{}</tr>{}</table>", head, rows.concat())
}

fn render_index(
    stats: &DbStats,
    artifacts: &[ArtifactRecord],
    upcoming: &[CalendarEvent],
    pdfs: &[String],
) -> String {
    let stats_html = [
        stat_card(pdfs.len(), "PDFs in library"),
        stat_card(stats.artifact_count, "Cheatsheets &amp; quizzes"),
        stat_card(stats.focus_session_count, "Focus sessions"),
        stat_card(stats.focus_minutes, "Focus minutes"),
    ]
    .concat();

    let event_rows: Vec<String> = upcoming
        .iter()
        .map(|e| format!("<tr><td>{}</td><td>{}</td></tr>", e.date, escape_html(&e.text)))
        .collect();

    let artifact_rows: Vec<String> = artifacts
        .iter()
        .map(|a| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                a.kind.as_str(),
                escape_html(&a.source_path),
                a.item_count,
                a.created_at.format("%Y-%m-%d %H:%M")
            )
        })
        .collect();

    let library_rows: Vec<String> = pdfs
        .iter()
        .map(|name| format!("<tr><td>{}</td></tr>", escape_html(name)))
        .collect();

    let content = format!(
        r#"
        <div class="grid">{}</div>
        <div class="grid">
            <div class="card"><h2>Upcoming</h2>{}</div>
            <div class="card"><h2>Library</h2>{}</div>
        </div>
        <div class="card"><h2>Recent cheatsheets and quizzes</h2>{}</div>
    "#,
        stats_html,
        table_or_empty(&["Date", "Event"], event_rows, "Nothing scheduled."),
        table_or_empty(&["File"], library_rows, "No PDFs yet."),
        table_or_empty(&["Kind", "Source", "Items", "Created"], artifact_rows, "Nothing generated yet."),
    );

    base_template("Dashboard", &content)
}

/// Start the web server with config and database
pub async fn start_server(config: AppConfig, db: Database) -> crate::Result<()> {
    let addr = format!("{}:{}", config.web.host, config.web.port);
    let state = Arc::new(AppState { db, config });

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Web UI available at http://{}", addr);

    let router = create_router(state);
    axum::serve(listener, router)
        .await
        .map_err(|e| crate::LuminaraError::Config(format!("Server error: {}", e)))?;

    Ok(())
}
