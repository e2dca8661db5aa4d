use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tabled::{builder::Builder, settings::Style, Table, Tabled};

use recliq::api::{ApiClient, Credentials};
use recliq::config::{
    config_dir, ensure_initialized, load_config, load_state, resolve_output_dir, save_state,
    Config, CONFIG_TEMPLATE,
};
use recliq::domain::{self, escrow, Dataset, DatasetRecord};
use recliq::drawer::{DetailDrawer, LogSink, Role};
use recliq::error::{RecliqError, Result};
use recliq::format::{format_money, format_percent};
use recliq::listview::{
    csv_filename, CsvQuoting, DirectorySink, ExportScope, FileSink, ListView, Listable, Page,
    ViewState, CSV_MIME,
};
use recliq::wizard::{PricingRule, PricingRuleBook, PricingRuleWizard};

#[derive(Parser)]
#[command(name = "recliq")]
#[command(version, about = "RecliQ finance back-office lists", long_about = None)]
struct Cli {
    /// Path to config directory (default: ~/.recliq or XDG config)
    #[arg(short = 'C', long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Flags shaping a list view. Omitted flags keep the saved view state.
#[derive(Args, Clone, Debug, Default)]
struct ViewArgs {
    /// Case-insensitive search over the dataset's searchable fields
    #[arg(short, long)]
    query: Option<String>,

    /// Categorical filter in format "name=value" (can be repeated; value "all" clears)
    #[arg(short, long, value_name = "NAME=VALUE")]
    filter: Vec<String>,

    /// Sort key (e.g. amount, frequency)
    #[arg(short, long)]
    sort: Option<String>,

    /// Page to show (1-based; out-of-range pages show the last page)
    #[arg(short, long)]
    page: Option<usize>,

    /// Records per page (default: list.page_size from config.toml)
    #[arg(long)]
    page_size: Option<usize>,

    /// Forget the saved query, filters, sort and page first
    #[arg(long)]
    reset: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize config directory with a template config.toml
    Init,

    /// List available datasets
    Datasets,

    /// Show one page of a dataset
    List {
        /// Dataset name (payments, escrows, users)
        dataset: String,

        #[command(flatten)]
        view: ViewArgs,
    },

    /// Export a dataset view to CSV
    Export {
        /// Dataset name (payments, escrows, users)
        dataset: String,

        #[command(flatten)]
        view: ViewArgs,

        /// What to export: page, filtered or all (default: export.scope from config.toml)
        #[arg(long)]
        scope: Option<String>,

        /// Write plain comma-joined lines without CSV quoting
        #[arg(long)]
        legacy_csv: bool,

        /// Output directory (default: export.output_dir from config.toml)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the detail drawer for one record
    Show {
        /// Dataset name (payments, escrows, users)
        dataset: String,

        /// Record ID (e.g., EP-1001)
        id: String,

        /// Role to render for (default: session.role from config.toml)
        #[arg(long)]
        role: Option<String>,
    },

    /// Request a drawer action on one record
    Action {
        /// Dataset name (payments, escrows, users)
        dataset: String,

        /// Record ID (e.g., ESC-0301)
        id: String,

        /// Action name as shown by 'show' (e.g., hold_payout)
        action: String,

        /// Role requesting the action (default: session.role from config.toml)
        #[arg(long)]
        role: Option<String>,
    },

    /// List active escrows past their SLA deadline
    Overdue {
        /// Evaluate as of this date (YYYY-MM-DD, default: today)
        #[arg(long)]
        today: Option<String>,
    },

    /// List pricing rules
    PricingRules,

    /// Create a pricing rule through the five-step wizard
    AddPricingRule {
        /// Rule name
        #[arg(long)]
        name: String,

        /// Material (plastic, paper, metal, glass, e_waste, organic)
        #[arg(long)]
        material: String,

        /// Service zone (can be repeated)
        #[arg(long)]
        zone: Vec<String>,

        /// Customer segment (residential, enterprise, municipal)
        #[arg(long)]
        segment: String,

        /// Rate unit (per_kg, per_pickup, flat)
        #[arg(long)]
        unit: String,

        /// Base rate in whole currency units
        #[arg(long)]
        rate: i64,

        /// Minimum billable quantity
        #[arg(long, default_value_t = 1)]
        min_quantity: u32,

        /// Effective from (YYYY-MM-DD, default: today)
        #[arg(long)]
        from: Option<String>,

        /// Effective until (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
    },

    /// Fetch the user summary from the API
    Summary,

    /// Sign in against the API
    Login {
        #[arg(long, default_value = "")]
        email: String,

        #[arg(long, default_value = "")]
        password: String,
    },
}

/// Run `$body` with `$records` bound to the record store of `$dataset`.
macro_rules! with_dataset {
    ($dataset:expr, $records:ident => $body:expr) => {
        match $dataset {
            Dataset::Payments => {
                let $records = domain::payments::records();
                $body
            }
            Dataset::Escrows => {
                let $records = domain::escrow::records();
                $body
            }
            Dataset::Users => {
                let $records = domain::users::records();
                $body
            }
        }
    };
}

fn main() {
    init_tracing();
    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    // Determine config directory
    let cfg_dir = match cli.config_dir {
        Some(p) => p,
        None => config_dir()?,
    };

    if !matches!(cli.command, Commands::Init) {
        ensure_initialized(&cfg_dir)?;
    }

    match cli.command {
        Commands::Init => cmd_init(&cfg_dir),
        Commands::Datasets => cmd_datasets(),
        Commands::List { dataset, view } => cmd_list(&cfg_dir, &dataset, &view),
        Commands::Export {
            dataset,
            view,
            scope,
            legacy_csv,
            output,
        } => cmd_export(&cfg_dir, &dataset, &view, scope, legacy_csv, output),
        Commands::Show { dataset, id, role } => cmd_show(&cfg_dir, &dataset, &id, role),
        Commands::Action {
            dataset,
            id,
            action,
            role,
        } => cmd_action(&cfg_dir, &dataset, &id, &action, role),
        Commands::Overdue { today } => cmd_overdue(&cfg_dir, today),
        Commands::PricingRules => cmd_pricing_rules(),
        Commands::AddPricingRule {
            name,
            material,
            zone,
            segment,
            unit,
            rate,
            min_quantity,
            from,
            to,
        } => cmd_add_pricing_rule(
            name,
            &material,
            zone,
            &segment,
            &unit,
            rate,
            min_quantity,
            from,
            to,
        ),
        Commands::Summary => cmd_summary(&cfg_dir),
        Commands::Login { email, password } => cmd_login(&cfg_dir, email, password),
    }
}

/// Initialize config directory with template files
fn cmd_init(cfg_dir: &Path) -> Result<()> {
    use std::fs;

    if cfg_dir.exists() {
        return Err(RecliqError::AlreadyInitialized(cfg_dir.to_path_buf()));
    }

    fs::create_dir_all(cfg_dir)?;
    fs::write(cfg_dir.join("config.toml"), CONFIG_TEMPLATE)?;

    println!("Initialized recliq config at: {}", cfg_dir.display());
    println!();
    println!("Next steps:");
    println!(
        "  1. Adjust page size, export and API settings:  $EDITOR {}/config.toml",
        cfg_dir.display()
    );
    println!("  2. Browse a dataset:                            recliq list payments");

    Ok(())
}

// Table row structs for tabled
#[derive(Tabled)]
struct DatasetRow {
    #[tabled(rename = "DATASET")]
    name: String,
    #[tabled(rename = "DESCRIPTION")]
    title: String,
    #[tabled(rename = "RECORDS")]
    records: usize,
    #[tabled(rename = "EXPORT FILE")]
    export: String,
}

#[derive(Tabled)]
struct PricingRuleRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "MATERIAL")]
    material: String,
    #[tabled(rename = "SEGMENT")]
    segment: String,
    #[tabled(rename = "RATE")]
    rate: String,
    #[tabled(rename = "ZONES")]
    zones: String,
    #[tabled(rename = "EFFECTIVE")]
    effective: String,
}

impl From<&PricingRule> for PricingRuleRow {
    fn from(rule: &PricingRule) -> Self {
        Self {
            id: rule.id.clone(),
            name: rule.name.clone(),
            material: rule.material.to_string(),
            segment: rule.segment.to_string(),
            rate: format!("{} {}", format_money(rule.base_rate, "$"), rule.unit),
            zones: rule.zones.join(", "),
            effective: match rule.effective_to {
                Some(to) => format!("{} .. {}", rule.effective_from, to),
                None => format!("{} ..", rule.effective_from),
            },
        }
    }
}

fn parse_dataset(name: &str) -> Result<Dataset> {
    name.parse()
}

fn parse_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .map_err(|_| RecliqError::InvalidDate(input.to_string()))
}

/// Parse a filter like "status=paid" into (name, value)
fn parse_filter(input: &str) -> Result<(&str, &str)> {
    match input.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => Ok((name.trim(), value.trim())),
        _ => Err(RecliqError::InvalidFilterFormat(input.to_string())),
    }
}

fn resolve_role(config: &Config, role: Option<String>) -> Result<Role> {
    match role {
        Some(r) => r.parse(),
        None => Ok(config.session.role),
    }
}

fn render_table(headers: &[&str], rows: Vec<Vec<String>>) -> String {
    let mut builder = Builder::default();
    builder.push_record(headers.iter().map(|h| h.to_string()));
    for row in rows {
        builder.push_record(row);
    }
    builder.build().with(Style::rounded()).to_string()
}

/// Apply saved state, then the command-line flags, to a fresh view.
fn open_view<'a, T: DatasetRecord>(
    records: &'a [T],
    page_size: usize,
    saved: &ViewState,
    args: &ViewArgs,
) -> Result<ListView<'a, T>> {
    let saved = if args.reset {
        ViewState::default()
    } else {
        saved.clone()
    };
    let mut view = ListView::new(records, T::schema(), page_size)?.with_state(&saved)?;

    if let Some(query) = &args.query {
        view.set_query(query);
    }
    for input in &args.filter {
        let (name, value) = parse_filter(input)?;
        view.set_filter(name, value)?;
    }
    if let Some(key) = &args.sort {
        view.set_sort(key)?;
    }
    if let Some(page) = args.page {
        view.set_page(page);
    }
    Ok(view)
}

fn describe_view<T: DatasetRecord>(view: &mut ListView<'_, T>) -> Option<String> {
    let state = view.state();
    let mut parts = Vec::new();
    if !state.query.is_empty() {
        parts.push(format!("query '{}'", state.query));
    }
    for (name, value) in &state.filters {
        parts.push(format!("{name}={value}"));
    }
    if let Some(sort) = &state.sort {
        parts.push(format!("sorted by {sort}"));
    }
    (!parts.is_empty()).then(|| parts.join(", "))
}

fn print_page_footer(page: &Page<'_, impl Listable>) {
    let w = page.window;
    if w.is_empty() {
        println!("Page {} of {} (0 of {} records)", w.page, w.total_pages, w.total_items);
    } else {
        println!(
            "Page {} of {} (showing {}-{} of {} records)",
            w.page,
            w.total_pages,
            w.start + 1,
            w.end,
            w.total_items
        );
    }
}

/// List available datasets
fn cmd_datasets() -> Result<()> {
    let rows: Vec<DatasetRow> = Dataset::ALL
        .iter()
        .map(|d| {
            let (subject, description) = d.export_name();
            DatasetRow {
                name: d.name().to_string(),
                title: d.title().to_string(),
                records: d.record_count(),
                export: csv_filename(subject, description),
            }
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{table}");

    Ok(())
}

/// Show one page of a dataset and remember the view
fn cmd_list(cfg_dir: &Path, dataset_name: &str, args: &ViewArgs) -> Result<()> {
    let dataset = parse_dataset(dataset_name)?;
    let config = load_config(cfg_dir)?;
    let mut state = load_state(cfg_dir)?;
    let page_size = args.page_size.unwrap_or(config.list.page_size);
    let saved = state.view(dataset.name());

    let new_state = with_dataset!(dataset, records => {
        list_records(dataset, records, page_size, &saved, args, &config)?
    });

    state.set_view(dataset.name(), new_state);
    save_state(cfg_dir, &state)?;
    Ok(())
}

fn list_records<T: DatasetRecord>(
    dataset: Dataset,
    records: &[T],
    page_size: usize,
    saved: &ViewState,
    args: &ViewArgs,
    config: &Config,
) -> Result<ViewState> {
    let mut view = open_view(records, page_size, saved, args)?;
    let page = view.visible();

    println!("{}", dataset.title());
    if let Some(description) = describe_view(&mut view) {
        println!("Filtered by {description}");
    }

    if page.records.is_empty() {
        println!("No records match the current filters.");
    } else {
        let symbol = &config.list.currency_symbol;
        let rows = page.records.iter().map(|r| r.table_row(symbol)).collect();
        println!("{}", render_table(T::TABLE_HEADERS, rows));
    }
    print_page_footer(&page);

    if let Some(summary) = T::summary(&view.filtered_sorted(), &config.list.currency_symbol) {
        println!("{summary}");
    }

    Ok(view.state())
}

/// Export a dataset view to <subject>-<description>.csv
fn cmd_export(
    cfg_dir: &Path,
    dataset_name: &str,
    args: &ViewArgs,
    scope: Option<String>,
    legacy_csv: bool,
    output: Option<PathBuf>,
) -> Result<()> {
    let dataset = parse_dataset(dataset_name)?;
    let config = load_config(cfg_dir)?;
    let mut state = load_state(cfg_dir)?;
    let page_size = args.page_size.unwrap_or(config.list.page_size);
    let saved = state.view(dataset.name());

    let scope = match scope {
        Some(s) => s.parse()?,
        None => config.export.scope,
    };
    let quoting = if legacy_csv {
        CsvQuoting::Legacy
    } else {
        config.export.quoting
    };
    let out_dir =
        output.unwrap_or_else(|| resolve_output_dir(&config.export.output_dir, cfg_dir));
    let mut sink = DirectorySink::new(&out_dir);

    let new_state = with_dataset!(dataset, records => {
        export_records(dataset, records, page_size, &saved, args, scope, quoting, &mut sink)?
    });

    state.set_view(dataset.name(), new_state);
    save_state(cfg_dir, &state)?;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn export_records<T: DatasetRecord>(
    dataset: Dataset,
    records: &[T],
    page_size: usize,
    saved: &ViewState,
    args: &ViewArgs,
    scope: ExportScope,
    quoting: CsvQuoting,
    sink: &mut dyn FileSink,
) -> Result<ViewState> {
    let mut view = open_view(records, page_size, saved, args)?;
    let csv = view.export_csv(&T::csv_columns(), scope, quoting)?;
    let count = match scope {
        ExportScope::Page => view.visible().records.len(),
        ExportScope::Filtered => view.filtered_count(),
        ExportScope::All => records.len(),
    };

    let (subject, description) = dataset.export_name();
    let path = sink.deliver(&csv_filename(subject, description), CSV_MIME, csv.as_bytes())?;

    println!("Exported {count} {} record(s) ({scope} scope)", dataset.name());
    println!("  Saved: {}", path.display());

    Ok(view.state())
}

/// Render the detail drawer for one record
fn cmd_show(cfg_dir: &Path, dataset_name: &str, id: &str, role: Option<String>) -> Result<()> {
    let dataset = parse_dataset(dataset_name)?;
    let config = load_config(cfg_dir)?;
    let role = resolve_role(&config, role)?;

    with_dataset!(dataset, records => show_record(dataset, records, id, role))
}

fn find_record<'a, T: Listable>(dataset: Dataset, records: &'a [T], id: &str) -> Result<&'a T> {
    records
        .iter()
        .find(|r| r.id().eq_ignore_ascii_case(id))
        .ok_or_else(|| RecliqError::RecordNotFound {
            dataset: dataset.name().to_string(),
            id: id.to_string(),
        })
}

fn show_record<T: DatasetRecord>(
    dataset: Dataset,
    records: &[T],
    id: &str,
    role: Role,
) -> Result<()> {
    let record = find_record(dataset, records, id)?;
    let drawer = DetailDrawer::show(record);
    let Some(contents) = drawer.render(role) else {
        return Ok(());
    };

    println!("{}", contents.title);
    println!("{}", "-".repeat(50));
    let width = contents
        .fields
        .iter()
        .map(|f| f.label.len())
        .max()
        .unwrap_or(0)
        + 1;
    for field in &contents.fields {
        println!("{:<width$} {}", format!("{}:", field.label), field.value);
    }

    println!();
    println!("Actions (as {role}):");
    for (button, spec) in contents.actions.iter().zip(T::ACTIONS) {
        let mark = if button.enabled { "x" } else { " " };
        if button.enabled {
            println!("  [{mark}] {:<18} {}", button.name, button.label);
        } else {
            println!(
                "  [{mark}] {:<18} {} (requires {})",
                button.name, button.label, spec.required_role
            );
        }
    }
    if let Some(notice) = contents.notice {
        println!();
        println!("{notice}");
    }

    Ok(())
}

/// Request a drawer action; the request is logged, never applied
fn cmd_action(
    cfg_dir: &Path,
    dataset_name: &str,
    id: &str,
    action: &str,
    role: Option<String>,
) -> Result<()> {
    let dataset = parse_dataset(dataset_name)?;
    let config = load_config(cfg_dir)?;
    let role = resolve_role(&config, role)?;

    let event = with_dataset!(dataset, records => {
        let record = find_record(dataset, records, id)?;
        DetailDrawer::show(record).request(action, role, &mut LogSink)?
    });

    println!(
        "Requested {} on {} as {} at {}",
        event.action,
        event.record_id,
        event.role,
        event.requested_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("No changes were made; the request was handed to the action log.");

    Ok(())
}

/// List active escrows past their SLA deadline
fn cmd_overdue(cfg_dir: &Path, today: Option<String>) -> Result<()> {
    let config = load_config(cfg_dir)?;
    let today = match today {
        Some(s) => parse_date(&s)?,
        None => chrono::Local::now().date_naive(),
    };

    let flagged = escrow::overdue(escrow::records(), today);
    if flagged.is_empty() {
        println!("No escrows past their SLA deadline as of {today}.");
        return Ok(());
    }

    let rows = flagged
        .iter()
        .map(|e| {
            let mut row = e.table_row(&config.list.currency_symbol);
            row.push((today - e.sla_deadline).num_days().to_string());
            row
        })
        .collect();
    let mut headers = escrow::EscrowRecord::TABLE_HEADERS.to_vec();
    headers.push("DAYS LATE");
    println!("{}", render_table(&headers, rows));

    let held: i64 = flagged.iter().map(|e| e.amount).sum();
    println!();
    println!(
        "{} escrow(s) past SLA as of {today}, holding {}",
        flagged.len(),
        format_money(held, &config.list.currency_symbol)
    );

    Ok(())
}

/// List pricing rules, newest first
fn cmd_pricing_rules() -> Result<()> {
    print_rule_book(&PricingRuleBook::seeded());
    Ok(())
}

fn print_rule_book(book: &PricingRuleBook) {
    let rows: Vec<PricingRuleRow> = book.rules().iter().map(PricingRuleRow::from).collect();
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{table}");
}

/// Run the pricing-rule wizard from flags and show the updated book
#[allow(clippy::too_many_arguments)]
fn cmd_add_pricing_rule(
    name: String,
    material: &str,
    zones: Vec<String>,
    segment: &str,
    unit: &str,
    rate: i64,
    min_quantity: u32,
    from: Option<String>,
    to: Option<String>,
) -> Result<()> {
    let mut wizard = PricingRuleWizard::new();
    wizard.draft.name = name;
    wizard.draft.material = Some(material.parse()?);
    wizard.draft.zones = zones;
    wizard.draft.segment = Some(segment.parse()?);
    wizard.draft.unit = Some(unit.parse()?);
    wizard.draft.base_rate = rate;
    wizard.draft.min_quantity = min_quantity;
    wizard.draft.effective_from = Some(match from {
        Some(s) => parse_date(&s)?,
        None => chrono::Local::now().date_naive(),
    });
    wizard.draft.effective_to = to.as_deref().map(parse_date).transpose()?;

    wizard.run_to_review()?;

    let mut book = PricingRuleBook::seeded();
    let rule = wizard.submit(book.next_id())?;
    println!("Created {} ({})", rule.id, rule.name);
    book.prepend(rule);
    print_rule_book(&book);

    Ok(())
}

fn api_client(config: &Config) -> ApiClient {
    ApiClient::new(
        &config.api.base_url,
        Duration::from_secs(config.api.timeout_secs),
    )
}

/// Fetch the user summary from the API
fn cmd_summary(cfg_dir: &Path) -> Result<()> {
    let config = load_config(cfg_dir)?;
    let summary = api_client(&config).fetch_user_summary()?;

    println!("User Summary");
    println!("{}", "-".repeat(50));
    println!("Total users:      {}", summary.total_users);
    println!(
        "Active users:     {} ({})",
        summary.active_users,
        format_percent(summary.active_users as i64, summary.total_users as i64)
    );
    println!("At-risk users:    {}", summary.at_risk_users);
    println!("Recycled:         {:.1} kg", summary.total_kg_recycled);

    Ok(())
}

/// Sign in against the API
fn cmd_login(cfg_dir: &Path, email: String, password: String) -> Result<()> {
    let config = load_config(cfg_dir)?;
    let credentials = Credentials::new(email, password);
    credentials.validate()?;

    let name = api_client(&config).login(&credentials)?;
    println!("Signed in as {name}");

    Ok(())
}
