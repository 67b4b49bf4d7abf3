use anyhow::{anyhow, bail, Context, Result};
use std::env;
use std::sync::Arc;

use shop_ledger::{
    csv_io, report, AppConfig, CredentialGate, DashboardHost, DebtDraft, ExpenseDraft,
    Granularity, MemoryStore, RecordKind, RecordStore, SaleDraft, Session, SessionHolder,
};

const USAGE: &str = "Usage: shop-ledger [--user U] [--password P] <command>

Commands:
  report [granularity]                   Dashboard (or one of monthly|daily|hourly|weekday)
  debts                                  Pending and paid debts
  add-sale <amount> <date> [notes]       Record a sale
  add-expense <amount> <date> <desc>     Record an expense
  add-debt <buyer> <amount> <date>       Record a pending debt
  toggle-debt <id>                       Flip a debt between pending and paid
  delete <sale|expense|debt> <id>        Delete a record";

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let mut args: Vec<String> = env::args().skip(1).collect();
    let user = take_flag(&mut args, "--user")
        .or_else(|| env::var("SHOP_LEDGER_USER").ok())
        .unwrap_or_default();
    let password = take_flag(&mut args, "--password")
        .or_else(|| env::var("SHOP_LEDGER_PASSWORD").ok())
        .unwrap_or_default();

    if args.first().map(String::as_str) == Some("help") {
        println!("{}", USAGE);
        return Ok(());
    }

    let config = AppConfig::load()?;
    let session = CredentialGate::from_config(&config)
        .sign_in(&user, &password)
        .context("Sign-in failed (use --user/--password or SHOP_LEDGER_USER/SHOP_LEDGER_PASSWORD)")?;

    let store = Arc::new(csv_io::load_store(&config)?);
    let host = DashboardHost::from_config(Arc::clone(&store) as Arc<dyn RecordStore>, &config)?;
    host.attach();

    let command = args.first().cloned().unwrap_or_else(|| "report".to_string());
    let rest = args.get(1..).unwrap_or(&[]);

    match command.as_str() {
        "report" => run_report(&host, &session, &config, rest)?,
        "debts" => println!("{}", report::render_debts(&store.list_debts()?)),
        "add-sale" | "add-expense" | "add-debt" | "toggle-debt" | "delete" => {
            run_mutation(&host, &session, &command, rest)?;
            save(&config, &store)?;
        }
        other => bail!("Unknown command: {}\n\n{}", other, USAGE),
    }

    Ok(())
}

/// Remove `--name value` from args and return the value
fn take_flag(args: &mut Vec<String>, name: &str) -> Option<String> {
    let pos = args.iter().position(|a| a == name)?;
    if pos + 1 >= args.len() {
        args.remove(pos);
        return None;
    }
    let value = args.remove(pos + 1);
    args.remove(pos);
    Some(value)
}

fn arg<'a>(rest: &'a [String], index: usize, name: &str) -> Result<&'a str> {
    rest.get(index)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("Missing argument <{}>\n\n{}", name, USAGE))
}

fn run_report(
    host: &DashboardHost,
    session: &Session,
    config: &AppConfig,
    rest: &[String],
) -> Result<()> {
    let dashboard = host.current(session, config.now()?)?;

    match rest.first() {
        Some(name) => {
            let granularity = Granularity::parse(name)
                .ok_or_else(|| anyhow!("Unknown granularity: {}", name))?;
            println!("{}", report::render_breakdown(dashboard.breakdown(granularity)));
        }
        None => println!(
            "{}",
            report::render_dashboard(&dashboard, session.current_user_label())
        ),
    }

    Ok(())
}

fn run_mutation(
    host: &DashboardHost,
    session: &Session,
    command: &str,
    rest: &[String],
) -> Result<()> {
    match command {
        "add-sale" => {
            let sale = host.record_sale(
                session,
                &SaleDraft {
                    amount: arg(rest, 0, "amount")?.to_string(),
                    occurred_at: arg(rest, 1, "date")?.to_string(),
                    notes: rest.get(2..).unwrap_or(&[]).join(" "),
                },
            )?;
            println!("✓ Sale recorded: {}", sale.id);
        }
        "add-expense" => {
            let expense = host.record_expense(
                session,
                &ExpenseDraft {
                    amount: arg(rest, 0, "amount")?.to_string(),
                    occurred_at: arg(rest, 1, "date")?.to_string(),
                    description: rest.get(2..).unwrap_or(&[]).join(" "),
                },
            )?;
            println!("✓ Expense recorded: {}", expense.id);
        }
        "add-debt" => {
            let debt = host.record_debt(
                session,
                &DebtDraft {
                    buyer: arg(rest, 0, "buyer")?.to_string(),
                    amount: arg(rest, 1, "amount")?.to_string(),
                    occurred_at: arg(rest, 2, "date")?.to_string(),
                },
            )?;
            println!("✓ Debt recorded: {} ({})", debt.id, debt.status.as_str());
        }
        "toggle-debt" => {
            let debt = host.toggle_debt(session, arg(rest, 0, "id")?)?;
            println!("✓ Debt {} is now {}", debt.id, debt.status.as_str());
        }
        "delete" => {
            let kind_name = arg(rest, 0, "kind")?;
            let kind = RecordKind::parse(kind_name)
                .ok_or_else(|| anyhow!("Unknown record kind: {}", kind_name))?;
            let id = arg(rest, 1, "id")?;
            host.delete(session, kind, id)?;
            println!("✓ Deleted {} {}", kind.name(), id);
        }
        other => bail!("Unknown command: {}", other),
    }

    Ok(())
}

fn save(config: &AppConfig, store: &MemoryStore) -> Result<()> {
    csv_io::save_store(config, store)
        .with_context(|| format!("Failed to save data to {}", config.data_dir.display()))
}
