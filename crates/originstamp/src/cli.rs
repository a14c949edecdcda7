//! CLI command definitions and handlers for the `originstamp` binary.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use bytes::Bytes;
use clap::{Parser, Subcommand};
use comfy_table::{presets, Cell, Color, ContentArrangement, Table};

use originstamp::client::{HttpTimestampApi, SpoolMailer};
use originstamp::core::{fingerprint_bytes, ContentDigest, EditEvent, Settings};
use originstamp::store::{Ledger, LedgerAdmin, SettingsStore, SqliteLedger};
use originstamp::{AppConfig, AppState, GatewayError, SaveReport, Services, SubmissionState};

/// Fingerprint authored content and timestamp it with OriginStamp.
#[derive(Parser)]
#[command(name = "originstamp", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file.
    #[arg(
        long,
        global = true,
        env = "ORIGINSTAMP_CONFIG",
        default_value = "originstamp.toml"
    )]
    pub config: PathBuf,

    /// Ledger database, overriding the configuration file.
    #[arg(long, global = true, env = "ORIGINSTAMP_DATABASE")]
    pub database: Option<PathBuf>,

    /// Output machine-readable JSON.
    #[arg(long, global = true)]
    pub json: bool,

    /// Detailed output (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP service.
    Serve {
        /// Listen address, overriding the configuration file.
        #[arg(long)]
        bind: Option<String>,
    },

    /// Stamp a piece of content as if it had just been saved.
    Stamp {
        #[arg(long)]
        title: String,
        /// Body text; read from --body-file when omitted.
        #[arg(long, conflicts_with = "body_file")]
        body: Option<String>,
        #[arg(long)]
        body_file: Option<PathBuf>,
        #[arg(long, default_value = "cli")]
        content_id: String,
    },

    /// Print the digest and normalized payload without recording anything.
    Hash {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "", conflicts_with = "body_file")]
        body: String,
        /// Read the body from a file; it must be UTF-8.
        #[arg(long)]
        body_file: Option<PathBuf>,
    },

    /// Write the stored text for a digest.
    Download {
        digest: String,
        /// Output file; stdout when omitted.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show one page of the remote submission history.
    History {
        #[arg(short, long, default_value_t = 1)]
        page: u64,
    },

    /// Show ledger and settings status.
    Status {
        /// Number of most recent records to list.
        #[arg(long, default_value_t = 5)]
        recent: usize,
    },

    /// Show or change the credential and notification address.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Drop all ledger tables.
    Teardown {
        /// Confirm the irreversible drop.
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show the effective settings. The API key is never printed.
    Show,
    /// Update the stored settings. Omitted values are kept.
    Set {
        #[arg(long)]
        api_key: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
}

type LiveServices = Services<SqliteLedger, HttpTimestampApi, SpoolMailer>;

/// Opened ledger plus resolved configuration.
pub struct Context {
    pub config: AppConfig,
    pub ledger: Arc<SqliteLedger>,
    pub json: bool,
}

impl Context {
    pub async fn open(cli: &Cli) -> anyhow::Result<Self> {
        let mut config = originstamp::load_config(&cli.config).await;
        if let Some(database) = &cli.database {
            config.database_path = database.clone();
        }
        let path = &config.database_path;
        let ledger = SqliteLedger::open(path)
            .with_context(|| format!("failed to open ledger at {}", path.display()))?;

        Ok(Self {
            config,
            ledger: Arc::new(ledger),
            json: cli.json,
        })
    }

    async fn settings(&self) -> anyhow::Result<Settings> {
        Ok(originstamp::resolve_settings(self.ledger.as_ref()).await?)
    }

    fn api(&self) -> anyhow::Result<Arc<HttpTimestampApi>> {
        let api = HttpTimestampApi::new(self.config.http_config())?;
        Ok(Arc::new(api))
    }

    fn mailer(&self) -> Arc<SpoolMailer> {
        Arc::new(SpoolMailer::new(
            self.config.spool_dir.clone(),
            self.config.mail_from.clone(),
        ))
    }

    async fn services(&self) -> anyhow::Result<LiveServices> {
        Ok(Services::build(
            self.settings().await?,
            Arc::clone(&self.ledger),
            self.api()?,
            self.mailer(),
            self.config.gateway_config(),
        ))
    }
}

pub async fn serve(ctx: &Context, bind: Option<String>) -> anyhow::Result<()> {
    let bind = bind.unwrap_or_else(|| ctx.config.bind_addr.clone());
    let state = AppState::new(
        ctx.settings().await?,
        Arc::clone(&ctx.ledger),
        ctx.api()?,
        ctx.mailer(),
        ctx.config.gateway_config(),
    );

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed to bind {}", bind))?;
    println!("OriginStamp listening on http://{}", listener.local_addr()?);
    originstamp::serve(listener, state).await?;
    Ok(())
}

pub async fn stamp(
    ctx: &Context,
    content_id: String,
    title: String,
    body: Option<String>,
    body_file: Option<PathBuf>,
) -> anyhow::Result<()> {
    let body = match (body, body_file) {
        (Some(body), _) => body,
        (None, Some(path)) => tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?,
        (None, None) => String::new(),
    };

    let services = ctx.services().await?;
    let report = services
        .stamper
        .on_save(&EditEvent::new(content_id, title, body))
        .await;

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    match report {
        SaveReport::SkippedRevision { content_id } => println!("Skipped revision {}", content_id),
        SaveReport::Stamped {
            digest,
            ledger,
            submission,
            ..
        } => {
            println!("Digest:     {}", digest);
            println!("Ledger:     {:?}", ledger);
            println!("Submission: {:?}", submission.remote);
            println!("Email:      {:?}", submission.email);
        }
    }
    Ok(())
}

pub async fn hash(
    title: &str,
    body: &str,
    body_file: Option<PathBuf>,
    json: bool,
) -> anyhow::Result<()> {
    let body = match body_file {
        Some(path) => tokio::fs::read(&path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => body.as_bytes().to_vec(),
    };
    let fp = fingerprint_bytes(title.as_bytes(), &body)?;
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "digest": fp.digest,
                "payload": fp.payload(),
            }))?
        );
    } else {
        println!("{}", fp.digest);
        println!("{}", fp.payload());
    }
    Ok(())
}

pub async fn download(ctx: &Context, digest: &str, output: Option<PathBuf>) -> anyhow::Result<()> {
    let payload = fetch_payload(ctx, digest).await?;

    match output {
        Some(path) => {
            tokio::fs::write(&path, &payload)
                .await
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("Wrote {} bytes to {}", payload.len(), path.display());
        }
        None => write_payload(&mut std::io::stdout().lock(), &payload)?,
    }
    Ok(())
}

async fn fetch_payload(ctx: &Context, digest: &str) -> anyhow::Result<Bytes> {
    let digest: ContentDigest = digest.parse()?;
    let services = ctx.services().await?;

    match services.gateway.fetch_local(&digest).await {
        Ok(payload) => Ok(payload),
        Err(GatewayError::NotFound(_)) => anyhow::bail!(originstamp::error::NOT_FOUND_MESSAGE),
        Err(e) => Err(e.into()),
    }
}

/// The stored bytes exactly, so the output re-hashes to the digest.
fn write_payload(out: &mut impl Write, payload: &[u8]) -> std::io::Result<()> {
    out.write_all(payload)?;
    out.flush()
}

pub async fn history(ctx: &Context, page: u64) -> anyhow::Result<()> {
    let services = ctx.services().await?;
    if services.settings.api_key().is_none() {
        eprintln!("No API key configured; set one with `originstamp config set --api-key`.");
    }
    let page = services.gateway.fetch_remote_page(page).await?;

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(&page)?);
        return Ok(());
    }

    let w = page.window;
    println!(
        "Page {} of {} pages, displaying {}-{} of {} results",
        w.page, w.num_pages, w.start, w.end, w.total
    );

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Date created").fg(Color::White),
        Cell::new("Hash string (SHA256)").fg(Color::White),
        Cell::new("Status").fg(Color::White),
        Cell::new("Data").fg(Color::White),
    ]);

    for row in &page.rows {
        let status = match row.status {
            SubmissionState::Confirmed => Cell::new("confirmed").fg(Color::Green),
            SubmissionState::Pending => Cell::new("pending").fg(Color::Yellow),
        };
        let data = if row.stored_locally {
            Cell::new(&row.download_path)
        } else {
            Cell::new("-").fg(Color::DarkGrey)
        };
        table.add_row(vec![
            Cell::new(row.created_display()),
            Cell::new(&row.verify_url).fg(Color::Cyan),
            status,
            data,
        ]);
    }
    println!("{table}");
    Ok(())
}

pub async fn status(ctx: &Context, recent: usize) -> anyhow::Result<()> {
    let status = ctx.ledger.status().await?;
    let settings = ctx.settings().await?;
    let records = if status.table_exists {
        ctx.ledger.list_recent(recent).await?
    } else {
        Vec::new()
    };

    if ctx.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "ledger": status,
                "database": ctx.config.database_path,
                "api_key_configured": settings.api_key().is_some(),
                "notify_email": settings.notify_email(),
                "recent": records,
            }))?
        );
        return Ok(());
    }

    let mark = |ok: bool| if ok { "yes" } else { "no" };
    println!("Database:       {}", ctx.config.database_path.display());
    println!("Table:          {}", status.table);
    println!("Table exists:   {}", mark(status.table_exists));
    println!("Records:        {}", status.records);
    println!("Schema version: {}", status.schema_version);
    println!("API key:        {}", mark(settings.api_key().is_some()));
    println!(
        "Notify email:   {}",
        settings.notify_email().unwrap_or("(none)")
    );

    if !records.is_empty() {
        let mut table = Table::new();
        table.load_preset(presets::UTF8_FULL_CONDENSED);
        table.set_header(vec!["Stored", "Digest", "Bytes"]);
        for record in &records {
            let stored = chrono::DateTime::from_timestamp_millis(record.created_at)
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_default();
            table.add_row(vec![
                Cell::new(stored),
                Cell::new(record.digest),
                Cell::new(record.payload().len()),
            ]);
        }
        println!("{table}");
    }
    Ok(())
}

pub async fn config(ctx: &Context, action: ConfigAction) -> anyhow::Result<()> {
    if let ConfigAction::Set { api_key, email } = action {
        let stored = ctx.ledger.load_settings().await?;
        let updated = stored.merged_with(Settings::new(api_key, email));
        ctx.ledger.save_settings(&updated).await?;
        tracing::info!("Settings saved");
    }

    let settings = ctx.settings().await?;
    if ctx.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "api_key_configured": settings.api_key().is_some(),
                "notify_email": settings.notify_email(),
            }))?
        );
    } else {
        let key = settings.api_key().map_or("(none)", |_| "configured");
        println!("API key:      {}", key);
        println!(
            "Notify email: {}",
            settings.notify_email().unwrap_or("(none)")
        );
    }
    Ok(())
}

pub async fn teardown(ctx: &Context, yes: bool) -> anyhow::Result<()> {
    if !yes {
        anyhow::bail!("refusing to drop the ledger without --yes");
    }
    ctx.ledger.teardown().await?;
    println!(
        "Dropped all tables in {}",
        ctx.config.database_path.display()
    );
    Ok(())
}
