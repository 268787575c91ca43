use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use otop_costing::{
    app::{CostingSession, Notice, NoticeKind},
    config::Settings,
    domain::{parse_amount, parse_optional_amount, CostingDraft, CostingResults, IngredientInput, Unit},
    util::{
        format::{format_currency, format_number},
        version::{version_label, APP_NAME},
    },
};

#[derive(Parser)]
#[command(name = "otop-costing", about = "Smart Costing for OTOP products", version)]
struct Cli {
    /// Owner id stamped on saved records (overrides the stored session).
    #[arg(long, global = true)]
    owner: Option<String>,
    /// Backend web-app URL.
    #[arg(long, global = true)]
    api_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the current draft.
    Show,
    /// Set the product name.
    Product { name: String },
    /// Choose a category; pre-fills marketing and profit percentages.
    Category { category: String },
    /// Add a named ingredient, filling the blank line if there is one.
    Add(LineArgs),
    /// Edit the named ingredient at a 1-based position.
    Edit {
        position: usize,
        #[command(flatten)]
        line: LineArgs,
    },
    /// Remove the named ingredient at a 1-based position.
    Remove { position: usize },
    /// Set yield and overhead inputs.
    Costs(CostArgs),
    /// Calculate unit cost and recommended price.
    Calculate,
    /// Calculate and submit the costing to the backend.
    Save,
    /// Clear the draft.
    Reset {
        #[arg(long)]
        yes: bool,
    },
    /// List costings saved by the current owner.
    History,
    /// Check that the backend is reachable.
    Ping,
}

#[derive(Args)]
struct LineArgs {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    qty: Option<String>,
    /// Unit label or code (kg, g, l, ml, pc, ...).
    #[arg(long)]
    unit: Option<String>,
    #[arg(long)]
    price: Option<String>,
}

#[derive(Args)]
struct CostArgs {
    #[arg(long = "yield")]
    yield_quantity: Option<String>,
    #[arg(long)]
    packaging: Option<String>,
    #[arg(long)]
    label: Option<String>,
    #[arg(long)]
    labor: Option<String>,
    #[arg(long)]
    marketing: Option<String>,
    #[arg(long)]
    profit: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let mut settings = Settings::load().context("loading settings")?;
    if let Some(url) = cli.api_url {
        settings.api_url = url;
    }
    if let Some(owner) = cli.owner {
        settings.owner_id = Some(owner);
    }

    let mut session = CostingSession::open(&settings).context("initialising backend client")?;

    let notice = match cli.command {
        Command::Show => None,
        Command::Product { name } => {
            session.engine_mut().set_product_name(name);
            None
        }
        Command::Category { category } => {
            session.engine_mut().select_category(&category);
            None
        }
        Command::Add(line) => {
            let name = line
                .name
                .filter(|name| !name.trim().is_empty())
                .context("an ingredient needs --name")?;
            let unit = parse_unit(line.unit.as_deref())?;
            session.engine_mut().fill_ingredient_line(IngredientInput {
                name,
                quantity: line.qty.as_deref().map(parse_amount).unwrap_or(0.0),
                unit,
                price_per_unit: line.price.as_deref().map(parse_amount).unwrap_or(0.0),
            });
            None
        }
        Command::Edit { position, line } => {
            edit_line(&mut session, position, line)?;
            None
        }
        Command::Remove { position } => {
            let id = line_id_at(session.engine().draft(), position)?;
            session.engine_mut().remove_ingredient_line(&id);
            None
        }
        Command::Costs(costs) => {
            apply_costs(&mut session, costs);
            None
        }
        Command::Calculate => {
            let (notice, results) = session.calculate();
            if let Some(results) = results {
                print_results(&results);
            }
            Some(notice)
        }
        Command::Save => {
            let (notice, results) = session.calculate();
            match results {
                Some(results) => {
                    print_results(&results);
                    Some(session.save().await)
                }
                None => Some(notice),
            }
        }
        Command::Reset { yes } => Some(session.reset(yes)),
        Command::History => {
            match session.history().await {
                Ok(rows) => {
                    if rows.is_empty() {
                        println!("No saved costings.");
                    }
                    for row in rows {
                        println!(
                            "{:<30} {:>12}  {}",
                            row.product_name,
                            row.recommended_price()
                                .map(format_currency)
                                .unwrap_or_else(|| "-".to_string()),
                            row.created_at.unwrap_or_default()
                        );
                    }
                    None
                }
                Err(notice) => Some(notice),
            }
        }
        Command::Ping => Some(session.ping().await),
    };

    print_draft(&session);
    if let Some(notice) = notice {
        print_notice(&notice);
        if !notice.is_success() {
            std::process::exit(1);
        }
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn parse_unit(input: Option<&str>) -> anyhow::Result<Option<Unit>> {
    match input {
        None => Ok(None),
        Some(text) => Unit::parse(text).map(Some).with_context(|| {
            let known: Vec<&str> = Unit::ALL.iter().map(Unit::code).collect();
            format!("unknown unit '{text}' (expected one of {})", known.join(", "))
        }),
    }
}

fn line_id_at(draft: &CostingDraft, position: usize) -> anyhow::Result<String> {
    draft
        .named_line(position)
        .map(|line| line.id().to_string())
        .with_context(|| format!("no ingredient line at position {position}"))
}

fn edit_line(session: &mut CostingSession, position: usize, line: LineArgs) -> anyhow::Result<()> {
    let id = line_id_at(session.engine().draft(), position)?;
    let unit = parse_unit(line.unit.as_deref())?;
    let engine = session.engine_mut();
    if let Some(name) = line.name {
        engine.set_line_name(&id, name);
    }
    if let Some(qty) = line.qty {
        engine.set_line_quantity(&id, parse_amount(&qty));
    }
    if let Some(unit) = unit {
        engine.set_line_unit(&id, unit);
    }
    if let Some(price) = line.price {
        engine.set_line_price(&id, parse_amount(&price));
    }
    Ok(())
}

fn apply_costs(session: &mut CostingSession, costs: CostArgs) {
    let engine = session.engine_mut();
    if let Some(value) = costs.yield_quantity {
        engine.set_yield_quantity(parse_optional_amount(&value));
    }
    if let Some(value) = costs.packaging {
        engine.set_packaging_cost(parse_amount(&value));
    }
    if let Some(value) = costs.label {
        engine.set_label_cost(parse_amount(&value));
    }
    if let Some(value) = costs.labor {
        engine.set_labor_cost(parse_amount(&value));
    }
    if let Some(value) = costs.marketing {
        engine.set_marketing_percent(parse_amount(&value));
    }
    if let Some(value) = costs.profit {
        engine.set_profit_percent(parse_amount(&value));
    }
}

fn print_draft(session: &CostingSession) {
    let engine = session.engine();
    let draft = engine.draft();
    println!("{APP_NAME} {}", version_label());
    println!(
        "Product:   {}",
        if draft.product_name.is_empty() { "-" } else { draft.product_name.as_str() }
    );
    println!(
        "Category:  {}",
        draft
            .category
            .map(|category| format!("{} ({})", category.label(), category.code()))
            .unwrap_or_else(|| "-".to_string())
    );
    println!("Ingredients:");
    if draft.named_ingredients().next().is_none() {
        println!("  (none)");
    }
    for (idx, line) in draft.named_ingredients().enumerate() {
        println!(
            "  {:>2}. {:<24} {:>10} {:<10} x {:>10} = {:>12}",
            idx + 1,
            line.name,
            format_number(line.quantity, 2),
            line.unit.label(),
            format_number(line.price_per_unit, 2),
            format_number(line.line_total(), 2)
        );
    }
    println!("Subtotal:  {}", format_currency(engine.ingredients_subtotal()));
    println!(
        "Yield {} | packaging {} | label {} | labor {} | marketing {}% | profit {}%",
        draft
            .yield_quantity
            .map(|value| format_number(value, 2))
            .unwrap_or_else(|| "-".to_string()),
        format_number(draft.packaging_cost, 2),
        format_number(draft.label_cost, 2),
        format_number(draft.labor_cost, 2),
        format_number(draft.marketing_percent, 2),
        format_number(draft.profit_percent, 2)
    );
}

fn print_results(results: &CostingResults) {
    println!("Cost per unit:        {}", format_currency(results.cost_per_unit));
    println!("Total cost per unit:  {}", format_currency(results.total_cost_per_unit));
    println!("Marketing cost:       {}", format_currency(results.marketing_cost));
    println!("Profit margin:        {}", format_currency(results.profit_margin));
    println!("Recommended price:    {}", format_currency(results.recommended_price));
}

fn print_notice(notice: &Notice) {
    let tag = match notice.kind {
        NoticeKind::Info => "info",
        NoticeKind::Success => "ok",
        NoticeKind::Warning => "warning",
        NoticeKind::Error => "error",
    };
    println!("[{tag}] {}", notice.text);
}
