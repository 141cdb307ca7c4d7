use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use erp_client::config::{ClientConfig, ConfigError};
use erp_client::dashboard::{DashboardAggregator, DashboardFilter, QueryState, parse_date};
use erp_client::deletion::{DeleteOutcome, UsageGuard, confirm_delete};
use erp_client::drafts::{CreateOutcome, DraftStore, create_with_fallback, sync_drafts};
use erp_client::forms::{FormMode, submit};
use erp_client::model::{
    Item, ItemDraft, ItemGroup, ItemGroupDraft, LineItemDraft, Machine, MachineDraft, Requisition, RequisitionDraft,
    RequisitionStatus, Resource, Site, SiteDraft, Unit, UnitDraft,
};
use erp_client::net::api::{fetch_scheduled_maintenance, fetch_site};
use erp_client::net::gateway::ApiClient;
use erp_client::net::transport::TransportError;
use erp_client::notify::NotificationCenter;
use erp_client::state::ResourceStore;
use erp_client::workflow::{RequisitionAction, UnknownAction, WorkflowController};
use erp_client::{AppContext, ClientError, ErrorCode};
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("http client setup failed: {0}")]
    Transport(#[from] TransportError),
    #[error("[{code}] {0}", code = .0.error_code())]
    Client(#[from] ClientError),
    #[error(transparent)]
    Action(#[from] UnknownAction),
    #[error("missing site; pass --site or set ERP_SITE_ID")]
    MissingSite,
    #[error("{0}")]
    Refused(String),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "erp", about = "Plant and fleet ERP client")]
struct Cli {
    #[arg(long, env = "ERP_BASE_URL")]
    base_url: Option<String>,

    #[arg(long, env = "ERP_API_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Site(SiteCommand),
    Machine(MachineCommand),
    Unit(UnitCommand),
    ItemGroup(ItemGroupCommand),
    Item(ItemCommand),
    Requisition(RequisitionCommand),
    Dashboard(DashboardArgs),
}

// =============================================================================
// SITES AND MACHINES
// =============================================================================

#[derive(Args, Debug)]
struct SiteCommand {
    #[command(subcommand)]
    command: SiteSubcommand,
}

#[derive(Subcommand, Debug)]
enum SiteSubcommand {
    List {
        #[arg(long)]
        search: Option<String>,
    },
    Show {
        id: String,
    },
    Create(SiteFields),
    Update {
        id: String,
        #[command(flatten)]
        fields: SiteFields,
    },
}

#[derive(Args, Debug)]
struct SiteFields {
    #[arg(long)]
    name: String,
    #[arg(long)]
    short_name: String,
    #[arg(long)]
    location: Option<String>,
}

impl From<SiteFields> for SiteDraft {
    fn from(f: SiteFields) -> Self {
        Self { name: f.name, short_name: f.short_name, location: f.location }
    }
}

#[derive(Args, Debug)]
struct MachineCommand {
    #[command(subcommand)]
    command: MachineSubcommand,
}

#[derive(Subcommand, Debug)]
enum MachineSubcommand {
    List {
        #[arg(long)]
        search: Option<String>,
    },
    Show {
        id: String,
    },
    Create(MachineFields),
    Update {
        id: String,
        #[command(flatten)]
        fields: MachineFields,
    },
    /// Scheduled maintenance for one machine.
    Maintenance {
        id: String,
    },
}

#[derive(Args, Debug)]
struct MachineFields {
    #[arg(long)]
    name: String,
    #[arg(long)]
    machine_type: String,
    #[arg(long)]
    registration_number: Option<String>,
    #[arg(long, env = "ERP_SITE_ID")]
    site: String,
}

impl From<MachineFields> for MachineDraft {
    fn from(f: MachineFields) -> Self {
        Self { name: f.name, machine_type: f.machine_type, registration_number: f.registration_number, site: f.site }
    }
}

// =============================================================================
// UNITS, ITEM GROUPS, ITEMS
// =============================================================================

#[derive(Args, Debug)]
struct UnitCommand {
    #[command(subcommand)]
    command: UnitSubcommand,
}

#[derive(Subcommand, Debug)]
enum UnitSubcommand {
    List {
        #[arg(long)]
        search: Option<String>,
    },
    Create(UnitFields),
    Update {
        id: String,
        #[command(flatten)]
        fields: UnitFields,
    },
    /// Delete a unit no item references.
    Delete {
        id: String,
    },
}

#[derive(Args, Debug)]
struct UnitFields {
    #[arg(long)]
    name: String,
    #[arg(long)]
    short_name: String,
}

impl From<UnitFields> for UnitDraft {
    fn from(f: UnitFields) -> Self {
        Self { name: f.name, short_name: f.short_name }
    }
}

#[derive(Args, Debug)]
struct ItemGroupCommand {
    #[command(subcommand)]
    command: ItemGroupSubcommand,
}

#[derive(Subcommand, Debug)]
enum ItemGroupSubcommand {
    List {
        #[arg(long)]
        search: Option<String>,
    },
    /// Create an item group, keeping a local draft if the server is unreachable.
    Create(ItemGroupFields),
    Update {
        id: String,
        #[command(flatten)]
        fields: ItemGroupFields,
    },
    Delete {
        id: String,
    },
    /// Show locally stored drafts.
    Drafts,
    /// Send stored drafts to the server.
    Sync,
}

#[derive(Args, Debug)]
struct ItemGroupFields {
    #[arg(long)]
    name: String,
    #[arg(long)]
    short_name: String,
    #[arg(long)]
    description: Option<String>,
}

impl From<ItemGroupFields> for ItemGroupDraft {
    fn from(f: ItemGroupFields) -> Self {
        Self { name: f.name, short_name: f.short_name, description: f.description }
    }
}

#[derive(Args, Debug)]
struct ItemCommand {
    #[command(subcommand)]
    command: ItemSubcommand,
}

#[derive(Subcommand, Debug)]
enum ItemSubcommand {
    List {
        #[arg(long)]
        search: Option<String>,
    },
    Show {
        id: String,
    },
    Create(ItemFields),
    Update {
        id: String,
        #[command(flatten)]
        fields: ItemFields,
    },
}

#[derive(Args, Debug)]
struct ItemFields {
    #[arg(long)]
    name: String,
    #[arg(long)]
    part_number: Option<String>,
    #[arg(long)]
    unit: String,
    #[arg(long)]
    item_group: String,
}

impl From<ItemFields> for ItemDraft {
    fn from(f: ItemFields) -> Self {
        Self { name: f.name, part_number: f.part_number, unit: f.unit, item_group: f.item_group }
    }
}

// =============================================================================
// REQUISITIONS AND DASHBOARD
// =============================================================================

#[derive(Args, Debug)]
struct RequisitionCommand {
    #[command(subcommand)]
    command: RequisitionSubcommand,
}

#[derive(Subcommand, Debug)]
enum RequisitionSubcommand {
    List {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        status: Option<RequisitionStatus>,
    },
    Show {
        id: String,
    },
    Create {
        #[arg(long)]
        site: Option<String>,
        #[arg(long)]
        requester: String,
        /// `ITEM_ID:QUANTITY[:REMARKS]`, repeatable.
        #[arg(long = "line", value_parser = parse_line_item)]
        lines: Vec<LineItemDraft>,
    },
    /// Run a workflow action: pm-approve, ho-approve, site-reject, ho-reject,
    /// forward, issue, receive.
    Transition {
        id: String,
        action: String,
        #[arg(long)]
        reason: Option<String>,
    },
}

#[derive(Args, Debug)]
struct DashboardArgs {
    #[arg(long)]
    site: Option<String>,
    /// Start date, YYYY-MM-DD.
    #[arg(long)]
    from: Option<String>,
    /// End date, YYYY-MM-DD. Defaults to today (UTC).
    #[arg(long)]
    to: Option<String>,
    /// Window length when --from is not given.
    #[arg(long, default_value_t = 30)]
    days: u16,
}

fn parse_line_item(raw: &str) -> Result<LineItemDraft, String> {
    let mut parts = raw.splitn(3, ':');
    let item = parts.next().unwrap_or_default().trim();
    let quantity = parts
        .next()
        .ok_or_else(|| format!("expected ITEM_ID:QUANTITY, got {raw:?}"))?
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid quantity in {raw:?}: {e}"))?;
    let remarks = parts.next().map(str::trim).filter(|r| !r.is_empty()).map(ToOwned::to_owned);
    Ok(LineItemDraft { item: item.to_owned(), quantity, remarks })
}

// =============================================================================
// ENTRY
// =============================================================================

#[tokio::main]
async fn main() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let mut config = ClientConfig::from_env()?;
    if let Some(base_url) = &cli.base_url {
        config = config.with_base_url(base_url)?;
    }
    if cli.token.is_some() {
        config.api_token = cli.token;
    }

    tracing::debug!(base_url = %config.base_url, site = ?config.site_id, "configuration loaded");

    let notices = Arc::new(NotificationCenter::new());
    let ctx = AppContext::from_config(&config, notices.clone())?;

    let result = run(&ctx, &config, cli.command).await;
    print_notifications(&notices);
    result
}

async fn run(ctx: &AppContext, config: &ClientConfig, command: Command) -> Result<(), CliError> {
    let api = &ctx.api;
    match command {
        Command::Site(site) => match site.command {
            SiteSubcommand::List { search } => list::<Site>(api, search.as_deref()).await,
            SiteSubcommand::Show { id } => print_json(&fetch_site(api, &id).await?),
            SiteSubcommand::Create(fields) => save::<Site>(api, FormMode::Create, fields.into()).await,
            SiteSubcommand::Update { id, fields } => save::<Site>(api, FormMode::Edit(id), fields.into()).await,
        },
        Command::Machine(machine) => match machine.command {
            MachineSubcommand::List { search } => list::<Machine>(api, search.as_deref()).await,
            MachineSubcommand::Show { id } => show::<Machine>(api, &id).await,
            MachineSubcommand::Create(fields) => save::<Machine>(api, FormMode::Create, fields.into()).await,
            MachineSubcommand::Update { id, fields } => {
                save::<Machine>(api, FormMode::Edit(id), fields.into()).await
            }
            MachineSubcommand::Maintenance { id } => print_json(&fetch_scheduled_maintenance(api, &id).await?),
        },
        Command::Unit(unit) => match unit.command {
            UnitSubcommand::List { search } => list::<Unit>(api, search.as_deref()).await,
            UnitSubcommand::Create(fields) => save::<Unit>(api, FormMode::Create, fields.into()).await,
            UnitSubcommand::Update { id, fields } => save::<Unit>(api, FormMode::Edit(id), fields.into()).await,
            UnitSubcommand::Delete { id } => delete::<Unit>(api, &id).await,
        },
        Command::ItemGroup(group) => run_item_group(api, config, group.command).await,
        Command::Item(item) => match item.command {
            ItemSubcommand::List { search } => list::<Item>(api, search.as_deref()).await,
            ItemSubcommand::Show { id } => show::<Item>(api, &id).await,
            ItemSubcommand::Create(fields) => save::<Item>(api, FormMode::Create, fields.into()).await,
            ItemSubcommand::Update { id, fields } => save::<Item>(api, FormMode::Edit(id), fields.into()).await,
        },
        Command::Requisition(requisition) => run_requisition(ctx, requisition.command).await,
        Command::Dashboard(args) => run_dashboard(ctx, config, args).await,
    }
}

async fn run_item_group(api: &ApiClient, config: &ClientConfig, command: ItemGroupSubcommand) -> Result<(), CliError> {
    let drafts = DraftStore::new(&config.drafts_dir);
    match command {
        ItemGroupSubcommand::List { search } => list::<ItemGroup>(api, search.as_deref()).await,
        ItemGroupSubcommand::Create(fields) => {
            let mut store = ResourceStore::new();
            match create_with_fallback::<ItemGroup>(api, &mut store, &drafts, &fields.into()).await? {
                CreateOutcome::Created(group) => print_saved(group.as_ref()),
                CreateOutcome::Drafted { pending } => {
                    println!("saved as draft ({pending} pending in {})", drafts.dir().display());
                    Ok(())
                }
            }
        }
        ItemGroupSubcommand::Update { id, fields } => {
            save::<ItemGroup>(api, FormMode::Edit(id), fields.into()).await
        }
        ItemGroupSubcommand::Delete { id } => delete::<ItemGroup>(api, &id).await,
        ItemGroupSubcommand::Drafts => {
            print_json(&drafts.load::<ItemGroupDraft>(ItemGroup::COLLECTION)?)
        }
        ItemGroupSubcommand::Sync => {
            let mut store = ResourceStore::new();
            let report = sync_drafts::<ItemGroup>(api, &mut store, &drafts).await?;
            for reason in &report.rejected {
                eprintln!("rejected: {reason}");
            }
            println!(
                "created {}, rejected {}, still pending {}",
                report.created,
                report.rejected.len(),
                report.remaining
            );
            Ok(())
        }
    }
}

async fn run_requisition(ctx: &AppContext, command: RequisitionSubcommand) -> Result<(), CliError> {
    let api = &ctx.api;
    match command {
        RequisitionSubcommand::List { search, status } => {
            let mut store = ResourceStore::<Requisition>::new();
            store.refresh(api).await?;
            let rows: Vec<&Requisition> = store
                .filter(search.as_deref().unwrap_or_default())
                .into_iter()
                .filter(|r| status.is_none_or(|s| r.status == s))
                .collect();
            print_json(&rows)
        }
        RequisitionSubcommand::Show { id } => show::<Requisition>(api, &id).await,
        RequisitionSubcommand::Create { site, requester, lines } => {
            let site = site.or_else(|| ctx.session.site_id.clone()).ok_or(CliError::MissingSite)?;
            let draft = RequisitionDraft { site, requester, line_items: lines };
            save::<Requisition>(api, FormMode::Create, draft).await
        }
        RequisitionSubcommand::Transition { id, action, reason } => {
            let action = RequisitionAction::from_name(&action, reason)?;
            let mut store = ResourceStore::<Requisition>::new();
            store.refresh(api).await?;
            let controller = WorkflowController::new(ctx.clone());
            controller.apply_in_store(&mut store, &id, &action).await?;
            match store.get(&id) {
                Some(requisition) => print_json(requisition),
                None => Ok(()),
            }
        }
    }
}

async fn run_dashboard(ctx: &AppContext, config: &ClientConfig, args: DashboardArgs) -> Result<(), CliError> {
    let site = args.site.or_else(|| ctx.session.site_id.clone());
    let to = match &args.to {
        Some(raw) => parse_date("to", raw)?,
        None => time::OffsetDateTime::now_utc().date(),
    };
    let filter = match &args.from {
        Some(raw) => DashboardFilter::new(site, parse_date("from", raw)?, to)?,
        None => DashboardFilter::last_days(site, to, args.days)?,
    };

    let aggregator = DashboardAggregator::new(ctx.api.clone(), config.dashboard_cache_ttl);
    let snapshot = aggregator
        .load_with(&filter, |progress| {
            let settled = progress.queries.iter().filter(|(_, s)| !matches!(s, QueryState::Pending)).count();
            tracing::debug!(settled, loading = progress.is_loading(), "dashboard progress");
        })
        .await;

    let mut metrics = Map::new();
    let mut errors = Map::new();
    for (metric, state) in &snapshot.queries {
        match state {
            QueryState::Ready(value) => {
                metrics.insert(metric.name().to_owned(), value.clone());
            }
            QueryState::Failed(message) => {
                errors.insert(metric.name().to_owned(), Value::String(message.clone()));
            }
            QueryState::Pending => {}
        }
    }
    let mut out = Map::new();
    out.insert("metrics".to_owned(), Value::Object(metrics));
    if snapshot.is_error() {
        out.insert("errors".to_owned(), Value::Object(errors));
    }
    print_json(&Value::Object(out))
}

// =============================================================================
// GENERIC FLOWS
// =============================================================================

async fn list<T: Resource>(api: &ApiClient, search: Option<&str>) -> Result<(), CliError> {
    let mut store = ResourceStore::<T>::new();
    store.refresh(api).await?;
    print_json(&store.filter(search.unwrap_or_default()))
}

async fn show<T: Resource>(api: &ApiClient, id: &str) -> Result<(), CliError> {
    let record: T = api.get(&T::item_path(id)).await?;
    print_json(&record)
}

async fn save<T: Resource>(api: &ApiClient, mode: FormMode, draft: T::Draft) -> Result<(), CliError> {
    let mut store = ResourceStore::<T>::new();
    let saved = submit(api, &mut store, &mode, &draft).await?;
    print_saved(saved.as_ref())
}

async fn delete<T: UsageGuard>(api: &ApiClient, id: &str) -> Result<(), CliError> {
    let mut store = ResourceStore::<T>::new();
    store.refresh(api).await?;
    let mut items = ResourceStore::<Item>::new();
    items.refresh(api).await?;

    match confirm_delete(api, &mut store, &items.items, id).await? {
        DeleteOutcome::Deleted => {
            println!("deleted {id}");
            Ok(())
        }
        DeleteOutcome::InUse { count } => Err(CliError::Refused(format!(
            "{} {id} is used by {count} item(s)",
            T::LABEL
        ))),
        DeleteOutcome::Rejected { message } => Err(CliError::Refused(message)),
    }
}

// =============================================================================
// OUTPUT
// =============================================================================

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}

/// Print the saved record, or a plain acknowledgement when the server's reply
/// did not carry one.
fn print_saved<T: Resource>(saved: Option<&T>) -> Result<(), CliError> {
    match saved {
        Some(record) => print_json(record),
        None => {
            println!("{} saved", T::LABEL);
            Ok(())
        }
    }
}

fn print_notifications(center: &NotificationCenter) {
    for notification in center.drain() {
        if notification.is_destructive() {
            eprintln!("! {}: {}", notification.title, notification.description);
        } else {
            eprintln!("{}: {}", notification.title, notification.description);
        }
    }
}
