use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use notegraph::coordinator::ViewKind;
use notegraph::model::EdgeKind;
use notegraph::site::SiteJob;
use notegraph::sources::{DatasetSources, JsonTodosStore, TodoSnapshot, TodosStore};
use notegraph::theme::ThemeMode;
use notegraph::views::time::filter::{TimeFilterMode, TimeFilterState};
use notegraph::views::time::{analyze, range_label};

/// Multi-view knowledge graph renderer for a personal notes application.
#[derive(Parser)]
#[command(name = "notegraph")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Where the dataset and todos come from
#[derive(Args, Debug, Clone)]
struct InputArgs {
    /// Static graph document (.json), or note records when --notes is given
    #[arg(short, long)]
    input: PathBuf,

    /// Treat the input as a JSON array of note records
    #[arg(long)]
    notes: bool,

    /// Static graph document used when the note records cannot be read
    #[arg(long, requires = "notes")]
    fallback: Option<PathBuf>,

    /// JSON array of todos for the time dashboard
    #[arg(long)]
    todos: Option<PathBuf>,
}

impl InputArgs {
    fn sources(&self, base_url: &str) -> DatasetSources {
        DatasetSources::from_file(&self.input, self.notes, self.fallback.as_deref(), base_url)
    }
}

/// Options shared by generate and serve
#[derive(Args, Debug, Clone)]
struct SiteArgs {
    #[command(flatten)]
    input: InputArgs,

    /// YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Color theme of the snapshot
    #[arg(long, default_value = "light", value_parser = parse_theme)]
    theme: ThemeMode,

    /// Path of the page the snapshot is embedded in; its note is highlighted
    #[arg(long)]
    current_path: Option<String>,

    /// JSON file remembering the selected view and time filter between runs
    #[arg(long)]
    state: Option<PathBuf>,

    /// View to show, remembered in the state file
    #[arg(long, value_parser = parse_view)]
    view: Option<ViewKind>,

    /// Time filter to apply (week, month, year, all or custom)
    #[arg(long, value_parser = parse_time_filter)]
    filter: Option<TimeFilterMode>,

    /// First day of a custom time range (YYYY-MM-DD)
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Last day of a custom time range (YYYY-MM-DD)
    #[arg(long)]
    to: Option<NaiveDate>,

    /// Output directory for the generated snapshot
    #[arg(short, long, default_value = "output")]
    output: PathBuf,
}

impl SiteArgs {
    /// Dates alone select a custom range
    fn time_filter(&self) -> Option<TimeFilterState> {
        let dated = self.from.is_some() || self.to.is_some();
        match self.filter {
            Some(TimeFilterMode::Custom) => Some(TimeFilterState::custom(self.from, self.to)),
            Some(mode) => Some(TimeFilterState::preset(mode)),
            None if dated => Some(TimeFilterState::custom(self.from, self.to)),
            None => None,
        }
    }

    fn into_job(self) -> SiteJob {
        let time_filter = self.time_filter();
        let mut job = SiteJob::new(self.input.input, self.output);
        job.notes = self.input.notes;
        job.fallback = self.input.fallback;
        job.todos = self.input.todos;
        job.config = self.config;
        job.state = self.state;
        job.theme = self.theme;
        job.current_path = self.current_path;
        job.view = self.view;
        job.time_filter = time_filter;
        job
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Render every view and write the static snapshot
    Generate {
        #[command(flatten)]
        site: SiteArgs,
    },
    /// Start development server with hot reload
    Serve {
        #[command(flatten)]
        site: SiteArgs,

        /// Port to run the server on
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
    /// Print dataset counts and time aggregation as JSON
    Stats {
        #[command(flatten)]
        input: InputArgs,

        /// Time range for the aggregation
        #[arg(long, default_value = "month", value_parser = parse_filter)]
        filter: TimeFilterMode,
    },
}

fn parse_theme(value: &str) -> Result<ThemeMode, String> {
    ThemeMode::parse(value)
        .ok_or_else(|| format!("unknown theme '{value}' (expected light or dark)"))
}

fn parse_view(value: &str) -> Result<ViewKind, String> {
    ViewKind::parse(value).ok_or_else(|| {
        format!("unknown view '{value}' (expected graph, grid, radial or time)")
    })
}

fn parse_time_filter(value: &str) -> Result<TimeFilterMode, String> {
    TimeFilterMode::parse(value).ok_or_else(|| {
        format!("unknown filter '{value}' (expected week, month, year, all or custom)")
    })
}

fn parse_filter(value: &str) -> Result<TimeFilterMode, String> {
    match TimeFilterMode::parse(value) {
        Some(TimeFilterMode::Custom) | None => Err(format!(
            "unknown filter '{value}' (expected week, month, year or all)"
        )),
        Some(mode) => Ok(mode),
    }
}

fn generate(job: &SiteJob) -> anyhow::Result<()> {
    let summary = job.run()?;
    println!(
        "Generated knowledge graph with {} notes and {} links in {}",
        summary.nodes,
        summary.edges,
        job.output.display()
    );
    Ok(())
}

fn stats(input: &InputArgs, filter: TimeFilterMode) -> anyhow::Result<()> {
    let dataset = input.sources("").load().ok_or_else(|| {
        anyhow::anyhow!("no dataset could be loaded from {}", input.input.display())
    })?;

    let mut categories: BTreeMap<&str, usize> = BTreeMap::new();
    for node in dataset.nodes() {
        *categories.entry(node.category.as_str()).or_default() += 1;
    }
    let tag_edges = dataset
        .edges()
        .iter()
        .filter(|e| e.kind == EdgeKind::Tag)
        .count();

    let store = input.todos.as_ref().map(JsonTodosStore::new);
    let todos = TodoSnapshot::pull(store.as_ref().map(|s| s as &dyn TodosStore));
    let state = TimeFilterState::preset(filter);
    let (time, empty) = match analyze(&todos, &state, Local::now()) {
        Ok(aggregation) => (Some(aggregation), None),
        Err(reason) => (None, Some(reason.message())),
    };

    let report = serde_json::json!({
        "nodes": dataset.nodes().len(),
        "edges": dataset.edges().len(),
        "tag_edges": tag_edges,
        "backlink_edges": dataset.edges().len() - tag_edges,
        "categories": categories,
        "filter": filter.as_str(),
        "range": range_label(&state),
        "time": time,
        "time_empty": empty,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("notegraph=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate { site } => generate(&site.into_job())?,
        Commands::Serve { site, port } => notegraph::server::serve(site.into_job(), port).await?,
        Commands::Stats { input, filter } => stats(&input, filter)?,
    }

    Ok(())
}
