use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use kiosk_config::{KioskConfig, UnusedKeyPolicy};
use kiosk_schemas::Permissions;
use sqlx::SqlitePool;
use tracing::warn;

const ENV_CONFIG: &str = "KIOSK_CONFIG";

#[derive(Parser)]
#[command(name = "kiosk")]
#[command(about = "Event kiosk operator CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Database commands
    Db {
        #[command(subcommand)]
        cmd: DbCmd,
    },

    /// Compute layered config hash + print canonical JSON
    ConfigHash {
        /// Paths in merge order (base -> site overrides ...)
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Staff and admin accounts
    Account {
        #[command(subcommand)]
        cmd: AccountCmd,
    },

    /// Order maintenance
    Orders {
        #[command(subcommand)]
        cmd: OrdersCmd,
    },

    /// Sales summary for one business day
    Stats {
        /// Business day (YYYY-MM-DD). Defaults to today.
        #[arg(long)]
        date: Option<String>,
    },
}

#[derive(Subcommand)]
enum DbCmd {
    Status,

    /// Apply SQL migrations.
    Migrate,
}

#[derive(Subcommand)]
enum AccountCmd {
    /// Create an account
    Create {
        #[arg(long)]
        username: String,

        #[arg(long)]
        password: String,

        /// Create an admin account
        #[arg(long, default_value_t = false)]
        admin: bool,

        /// Deny access to the cooking screen
        #[arg(long = "no-cooking", default_value_t = false)]
        no_cooking: bool,

        /// Deny access to the order-entry screen
        #[arg(long = "no-order", default_value_t = false)]
        no_order: bool,
    },

    /// Print every account
    List,
}

#[derive(Subcommand)]
enum OrdersCmd {
    /// Print orders still pending or cooking
    Active,

    /// Delete every order and restart numbering. Guardrail: refuses while
    /// any order is pending or cooking unless --yes is provided.
    Clear {
        /// Acknowledge that open orders will be discarded.
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::ConfigHash { paths } => {
            let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
            let loaded = kiosk_config::load_layered_yaml(&path_refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }

        Commands::Db { cmd } => {
            let config = load_config()?;
            let pool = connect(&config).await?;
            match cmd {
                DbCmd::Status => {
                    let s = kiosk_db::status(&pool).await?;
                    println!("db_ok={} has_orders_table={}", s.ok, s.has_orders_table);
                }
                DbCmd::Migrate => {
                    kiosk_db::migrate(&pool).await?;
                    println!("migrations_applied=true");
                }
            }
        }

        Commands::Account { cmd } => {
            let config = load_config()?;
            let pool = connect(&config).await?;
            match cmd {
                AccountCmd::Create {
                    username,
                    password,
                    admin,
                    no_cooking,
                    no_order,
                } => {
                    let account = kiosk_db::create_account(
                        &pool,
                        &kiosk_db::NewAccount {
                            username,
                            password,
                            is_admin: admin,
                            permissions: Permissions {
                                can_access_cooking: !no_cooking,
                                can_access_order: !no_order,
                            },
                        },
                    )
                    .await?;
                    println!(
                        "created=true id={} username={} is_admin={}",
                        account.id, account.username, account.is_admin
                    );
                }
                AccountCmd::List => {
                    for a in kiosk_db::list_accounts(&pool).await? {
                        println!(
                            "id={} username={} is_admin={} can_access_cooking={} can_access_order={}",
                            a.id, a.username, a.is_admin, a.can_access_cooking, a.can_access_order
                        );
                    }
                }
            }
        }

        Commands::Orders { cmd } => {
            let config = load_config()?;
            let pool = connect(&config).await?;
            match cmd {
                OrdersCmd::Active => {
                    let orders = kiosk_db::list_active_orders(&pool).await?;
                    println!("active_orders={}", orders.len());
                    for o in orders {
                        println!(
                            "id={} order_number={} status={} total_price={} created_at={}",
                            o.id,
                            o.order_number,
                            o.status,
                            o.total_price,
                            o.created_at.to_rfc3339()
                        );
                    }
                }
                OrdersCmd::Clear { yes } => {
                    let n = kiosk_db::count_active_orders(&pool).await?;
                    if n > 0 && !yes {
                        anyhow::bail!(
                            "REFUSING CLEAR: {} order(s) still pending or cooking. Re-run with: `kiosk orders clear --yes`",
                            n
                        );
                    }
                    let today = kiosk_db::business_date(
                        Utc::now(),
                        config.business_day.utc_offset_minutes,
                    );
                    let removed = kiosk_db::clear_all_orders(&pool, today).await?;
                    println!("cleared=true removed={}", removed);
                }
            }
        }

        Commands::Stats { date } => {
            let config = load_config()?;
            let pool = connect(&config).await?;
            let day = match date {
                Some(d) => NaiveDate::parse_from_str(&d, "%Y-%m-%d")
                    .with_context(|| format!("invalid --date '{d}', expected YYYY-MM-DD"))?,
                None => kiosk_db::business_date(Utc::now(), config.business_day.utc_offset_minutes),
            };
            let report = kiosk_db::daily_stats(&pool, day).await?;
            println!("business_date={}", day);
            println!("total_orders={}", report.today.total_orders);
            println!("total_revenue={}", report.today.total_revenue);
            println!("completed_orders={}", report.today.completed_orders);
            for (rank, m) in report.menu_ranking.iter().enumerate() {
                println!(
                    "rank={} name={} total_quantity={} total_revenue={}",
                    rank + 1,
                    m.name,
                    m.total_quantity,
                    m.total_revenue
                );
            }
        }
    }

    Ok(())
}

/// Diagnostics go to stderr so stdout stays `key=value` only.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

/// Same layering as the daemon: `KIOSK_CONFIG` lists YAML paths, base first.
fn load_config() -> Result<KioskConfig> {
    let raw = std::env::var(ENV_CONFIG).unwrap_or_default();
    let paths: Vec<&str> = raw
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    let loaded = kiosk_config::load_layered_yaml(&paths)?;
    let report = kiosk_config::report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn)?;
    for pointer in &report.unused_leaf_pointers {
        warn!(pointer = %pointer, "unused config key");
    }
    loaded.typed()
}

async fn connect(config: &KioskConfig) -> Result<SqlitePool> {
    let url = kiosk_db::database_url(&config.database.url);
    kiosk_db::connect(&url, 1)
        .await
        .with_context(|| format!("open database {url}"))
}
