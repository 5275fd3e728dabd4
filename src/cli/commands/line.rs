//! `kit line` command - line management

use chrono::NaiveDate;
use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use rust_decimal::Decimal;
use std::io::Write;

use crate::cli::helpers::{collect_line_ids, format_short_id};
use crate::cli::output::{render_line, render_lines};
use crate::cli::{GlobalOpts, OutputFormat, Workspace};
use crate::core::identity::{LineId, ShipmentId};
use crate::core::line::{LineChanges, NewLine, ShipmentRefs};
use crate::core::store::LineFilter;

#[derive(Subcommand, Debug)]
pub enum LineCommands {
    /// Create a line and explode its kit
    New(NewArgs),

    /// Change lines; kits are re-exploded when product, quantity or unit change
    Set(SetArgs),

    /// Delete lines together with their kit components
    Rm(RmArgs),

    /// Show a line's details
    Show(ShowArgs),

    /// List lines (root lines only unless --all)
    List(ListArgs),

    /// Show the explosion tree below a line
    Tree(TreeArgs),
}

/// Shipment references shared by `new` and `set`
#[derive(clap::Args, Debug, Default)]
pub struct ShipmentArgs {
    /// Outgoing shipment
    #[arg(long)]
    pub shipment_out: Option<String>,

    /// Incoming shipment
    #[arg(long)]
    pub shipment_in: Option<String>,

    /// Outgoing return shipment
    #[arg(long)]
    pub shipment_out_return: Option<String>,

    /// Incoming return shipment
    #[arg(long)]
    pub shipment_in_return: Option<String>,

    /// Internal shipment
    #[arg(long)]
    pub shipment_internal: Option<String>,
}

impl ShipmentArgs {
    fn is_set(&self) -> bool {
        self.shipment_out.is_some()
            || self.shipment_in.is_some()
            || self.shipment_out_return.is_some()
            || self.shipment_in_return.is_some()
            || self.shipment_internal.is_some()
    }

    fn to_refs(&self) -> ShipmentRefs {
        let id = |s: &Option<String>| s.as_deref().map(ShipmentId::new);
        ShipmentRefs {
            outgoing: id(&self.shipment_out),
            incoming: id(&self.shipment_in),
            outgoing_return: id(&self.shipment_out_return),
            incoming_return: id(&self.shipment_in_return),
            internal: id(&self.shipment_internal),
        }
    }
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Product to move
    #[arg(long, short = 'p')]
    pub product: String,

    /// Quantity, in --unit
    #[arg(long, short = 'q')]
    pub quantity: Decimal,

    /// Unit of measure
    #[arg(long, short = 'u', default_value = "unit")]
    pub unit: String,

    /// Source location
    #[arg(long, default_value = "storage")]
    pub from: String,

    /// Destination location
    #[arg(long, default_value = "customer")]
    pub to: String,

    /// Unit price
    #[arg(long)]
    pub price: Option<Decimal>,

    /// Company
    #[arg(long, default_value = "main")]
    pub company: String,

    /// Ordering among root lines
    #[arg(long)]
    pub sequence: Option<i64>,

    /// Planned date (YYYY-MM-DD)
    #[arg(long)]
    pub planned_date: Option<NaiveDate>,

    #[command(flatten)]
    pub shipments: ShipmentArgs,
}

#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Line ids (read from stdin if omitted)
    pub ids: Vec<String>,

    #[arg(long, short = 'p')]
    pub product: Option<String>,

    #[arg(long, short = 'q')]
    pub quantity: Option<Decimal>,

    #[arg(long, short = 'u')]
    pub unit: Option<String>,

    #[arg(long)]
    pub from: Option<String>,

    #[arg(long)]
    pub to: Option<String>,

    #[arg(long, conflicts_with = "clear_price")]
    pub price: Option<Decimal>,

    /// Remove the unit price
    #[arg(long)]
    pub clear_price: bool,

    #[arg(long)]
    pub company: Option<String>,

    #[arg(long)]
    pub sequence: Option<i64>,

    #[arg(long, conflicts_with = "clear_planned_date")]
    pub planned_date: Option<NaiveDate>,

    /// Remove the planned date
    #[arg(long)]
    pub clear_planned_date: bool,

    /// Replace all shipment references with the given ones
    #[command(flatten)]
    pub shipments: ShipmentArgs,
}

impl SetArgs {
    fn changes(&self) -> LineChanges {
        LineChanges {
            product: self.product.as_deref().map(Into::into),
            quantity: self.quantity,
            unit: self.unit.as_deref().map(Into::into),
            from_location: self.from.as_deref().map(Into::into),
            to_location: self.to.as_deref().map(Into::into),
            unit_price: if self.clear_price {
                Some(None)
            } else {
                self.price.map(Some)
            },
            company: self.company.as_deref().map(Into::into),
            sequence: self.sequence,
            planned_date: if self.clear_planned_date {
                Some(None)
            } else {
                self.planned_date.map(Some)
            },
            shipments: self.shipments.is_set().then(|| self.shipments.to_refs()),
        }
    }
}

#[derive(clap::Args, Debug)]
pub struct RmArgs {
    /// Line ids (read from stdin if omitted)
    pub ids: Vec<String>,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Line id
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Include kit component lines
    #[arg(long, short = 'a')]
    pub all: bool,

    #[arg(long, short = 'p')]
    pub product: Option<String>,

    #[arg(long)]
    pub from: Option<String>,

    #[arg(long)]
    pub to: Option<String>,

    /// Lines attached to this shipment
    #[arg(long)]
    pub shipment: Option<String>,

    /// Show only count
    #[arg(long)]
    pub count: bool,
}

#[derive(clap::Args, Debug)]
pub struct TreeArgs {
    /// Line id
    pub id: String,
}

pub fn run(cmd: LineCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        LineCommands::New(args) => run_new(args, global),
        LineCommands::Set(args) => run_set(args),
        LineCommands::Rm(args) => run_rm(args),
        LineCommands::Show(args) => run_show(args, global),
        LineCommands::List(args) => run_list(args, global),
        LineCommands::Tree(args) => run_tree(args, global),
    }
}

fn parse_id(id: &str) -> Result<LineId> {
    id.parse().map_err(|e| miette::miette!("{}", e))
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let mut ws = Workspace::open()?;

    let new = NewLine {
        product: args.product.into(),
        quantity: args.quantity,
        unit: args.unit.into(),
        from_location: args.from.into(),
        to_location: args.to.into(),
        unit_price: args.price,
        company: args.company.into(),
        sequence: args.sequence,
        planned_date: args.planned_date,
        shipments: args.shipments.to_refs(),
    };

    let id = ws.manager.create_line(new)?;
    let components = ws.manager.list_descendants(&id)?.len();

    match global.format {
        OutputFormat::Id => println!("{}", id),
        _ => {
            println!(
                "{} Created line {}",
                style("✓").green(),
                style(&id).cyan()
            );
            if components > 0 {
                println!("   Exploded into {} component lines", style(components).yellow());
            }
        }
    }
    Ok(())
}

fn run_set(args: SetArgs) -> Result<()> {
    let ids = collect_line_ids(&args.ids)?;
    let changes = args.changes();
    if changes.is_empty() {
        return Err(miette::miette!("Nothing to change"));
    }

    let mut ws = Workspace::open()?;
    ws.manager.update_lines(&ids, &changes)?;

    println!(
        "{} Updated {} line{}",
        style("✓").green(),
        ids.len(),
        if ids.len() == 1 { "" } else { "s" }
    );
    Ok(())
}

fn run_rm(args: RmArgs) -> Result<()> {
    let ids = collect_line_ids(&args.ids)?;
    let mut ws = Workspace::open()?;
    let removed = ws.manager.delete_lines(&ids)?;

    println!(
        "{} Deleted {} line{}",
        style("✓").green(),
        removed,
        if removed == 1 { "" } else { "s" }
    );
    Ok(())
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let ws = Workspace::open()?;
    let line = ws.manager.get_line(&parse_id(&args.id)?)?;
    print!("{}", render_line(&line, global.format)?);
    Ok(())
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let ws = Workspace::open()?;

    let filter = LineFilter {
        roots_only: !args.all,
        product: args.product.map(Into::into),
        from_location: args.from.map(Into::into),
        to_location: args.to.map(Into::into),
        shipment: args.shipment.map(ShipmentId::new),
    };
    let lines = ws.manager.list_lines(&filter)?;

    if args.count {
        println!("{}", lines.len());
        return Ok(());
    }
    if lines.is_empty() && global.format == OutputFormat::Auto {
        println!("No lines found.");
        return Ok(());
    }

    let pretty = global.format == OutputFormat::Auto;
    print!("{}", render_lines(&lines, global.format, pretty)?);
    Ok(())
}

fn run_tree(args: TreeArgs, global: &GlobalOpts) -> Result<()> {
    let ws = Workspace::open()?;
    let root = ws.manager.get_line(&parse_id(&args.id)?)?;

    let mut lines = vec![root.clone()];
    for id in ws.manager.list_descendants(&root.id)? {
        lines.push(ws.manager.get_line(&id)?);
    }

    if global.format != OutputFormat::Auto {
        print!("{}", render_lines(&lines, global.format, false)?);
        return Ok(());
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    for line in &lines {
        let indent = "  ".repeat((line.kit_depth - root.kit_depth) as usize);
        writeln!(
            out,
            "{}{} {} {} {}",
            indent,
            style(format_short_id(&line.id)).dim(),
            style(&line.product).cyan(),
            line.quantity,
            line.unit
        )
        .into_diagnostic()?;
    }
    Ok(())
}
