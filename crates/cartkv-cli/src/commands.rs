use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use cartkv_core::keys::cart_key;
use cartkv_core::money::format_cents;
use cartkv_core::{migrate, write_legacy_cart, CartContext, CartSettings, ItemHandle, KvStore, Ttl};
use cartkv_store::{InMemoryKvStore, KeyspaceSnapshot, SystemClock};
use cartkv_types::{FieldValue, Record, ID_FIELD, TYPE_FIELD};
use colored::Colorize;
use tracing::debug;

use crate::cli::*;

/// A keyspace loaded from its snapshot file, written back after each command.
struct Workspace {
    path: PathBuf,
    store: Arc<InMemoryKvStore>,
    ctx: CartContext,
    format: OutputFormat,
}

impl Workspace {
    fn open(cli: &Cli) -> anyhow::Result<Self> {
        let settings = match &cli.config {
            Some(path) => CartSettings::load(path)
                .with_context(|| format!("reading config {}", path.display()))?,
            None => CartSettings::default(),
        };
        let snapshot = KeyspaceSnapshot::load_from(&cli.keyspace)
            .with_context(|| format!("reading keyspace {}", cli.keyspace.display()))?;
        debug!(keys = snapshot.entries.len(), path = %cli.keyspace.display(), "keyspace loaded");
        let store = Arc::new(InMemoryKvStore::from_snapshot(snapshot, Arc::new(SystemClock)));
        let ctx = CartContext::new(settings, store.clone())?;
        Ok(Self {
            path: cli.keyspace.clone(),
            store,
            ctx,
            format: cli.format,
        })
    }

    fn persist(&self) -> anyhow::Result<()> {
        let snapshot = self.store.snapshot()?;
        snapshot
            .save_to(&self.path)
            .with_context(|| format!("writing keyspace {}", self.path.display()))?;
        debug!(keys = snapshot.entries.len(), "keyspace saved");
        Ok(())
    }

    fn json(&self) -> bool {
        self.format == OutputFormat::Json
    }
}

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let ws = Workspace::open(&cli)?;
    match cli.command {
        Command::Show(args) => cmd_show(&ws, args),
        Command::Add(args) => cmd_add(&ws, args),
        Command::Remove(args) => cmd_remove(&ws, args),
        Command::Set(args) => cmd_set(&ws, args),
        Command::Total(args) => cmd_total(&ws, args),
        Command::Ttl(args) => cmd_ttl(&ws, args),
        Command::Touch(args) => cmd_touch(&ws, args),
        Command::Destroy(args) => cmd_destroy(&ws, args),
        Command::Reassign(args) => cmd_reassign(&ws, args),
        Command::SeedLegacy(args) => cmd_seed_legacy(&ws, args),
        Command::Migrate(args) => cmd_migrate(&ws, args),
        Command::Keys(args) => cmd_keys(&ws, args),
    }?;
    // Loading a legacy cart converts it, so even reads may have written.
    ws.persist()
}

fn cmd_show(ws: &Workspace, args: CartArgs) -> anyhow::Result<()> {
    let mut cart = ws.ctx.cart(&args.cart);
    if ws.json() {
        println!("{}", serde_json::to_string_pretty(&cart.document()?)?);
        return Ok(());
    }
    let items = cart.items(None)?;
    println!("Cart {} ({} items)", args.cart.yellow().bold(), items.len());
    for item in &items {
        let fields: Vec<String> = item
            .record()
            .fields()
            .iter()
            .filter(|(name, _)| name.as_str() != ID_FIELD && name.as_str() != TYPE_FIELD)
            .map(|(name, value)| format!("{name}={value}"))
            .collect();
        println!(
            "  {}/{}  {}  {}",
            item.item_type().cyan(),
            item.id().bold(),
            fields.join(" "),
            format_cents(item.cost_cents()).green()
        );
    }
    Ok(())
}

fn cmd_add(ws: &Workspace, args: AddArgs) -> anyhow::Result<()> {
    let fields = args
        .fields
        .iter()
        .map(|f| parse_assignment(f).map(|(k, v)| (k, FieldValue::Text(v))))
        .collect::<anyhow::Result<Vec<_>>>()?;
    let mut cart = ws.ctx.cart(&args.cart);
    let handle = cart.add_item(args.id, args.item_type, fields)?;
    cart.save()?;
    println!(
        "{} Added {}/{} to cart {}",
        "✓".green().bold(),
        handle.item_type.cyan(),
        handle.id.bold(),
        args.cart.yellow()
    );
    Ok(())
}

fn cmd_remove(ws: &Workspace, args: ItemArgs) -> anyhow::Result<()> {
    let handle = ItemHandle::new(args.item_type, args.id);
    let mut cart = ws.ctx.cart(&args.cart);
    if !cart.destroy_item(&handle)? {
        bail!("cart {} has no item {}/{}", args.cart, handle.item_type, handle.id);
    }
    println!(
        "{} Removed {}/{} from cart {}",
        "✓".green().bold(),
        handle.item_type.cyan(),
        handle.id.bold(),
        args.cart.yellow()
    );
    Ok(())
}

fn cmd_set(ws: &Workspace, args: SetArgs) -> anyhow::Result<()> {
    let handle = ItemHandle::new(args.item_type, args.id);
    let mut cart = ws.ctx.cart(&args.cart);
    let previous = match cart.item_mut(&handle)? {
        Some(mut item) => item.set(&args.field, args.value.as_str())?,
        None => bail!("cart {} has no item {}/{}", args.cart, handle.item_type, handle.id),
    };
    cart.save()?;
    println!(
        "{} {}/{} {}: {} -> {}",
        "✓".green().bold(),
        handle.item_type.cyan(),
        handle.id.bold(),
        args.field,
        previous.to_string().dimmed(),
        args.value
    );
    Ok(())
}

fn cmd_total(ws: &Workspace, args: CartArgs) -> anyhow::Result<()> {
    let mut cart = ws.ctx.cart(&args.cart);
    let count = cart.count()?;
    let quantity = cart.quantity()?;
    let total = format_cents(cart.total_cents()?);
    if ws.json() {
        let summary = serde_json::json!({
            "cart": args.cart,
            "items": count,
            "quantity": quantity,
            "total": total,
        });
        println!("{summary}");
    } else {
        println!("Cart {}", args.cart.yellow().bold());
        println!("  Items: {count}");
        println!("  Quantity: {quantity}");
        println!("  Total: {}", total.green().bold());
    }
    Ok(())
}

fn cmd_ttl(ws: &Workspace, args: CartArgs) -> anyhow::Result<()> {
    let ttl = ws.ctx.cart(&args.cart).ttl()?;
    let rendered = match ttl {
        Ttl::Missing => "not stored".dimmed().to_string(),
        Ttl::Persistent => "no expiry".to_string(),
        Ttl::Expires(left) => format!("{}s", left.as_secs()),
    };
    println!("Cart {} expires in {}", args.cart.yellow(), rendered);
    Ok(())
}

fn cmd_touch(ws: &Workspace, args: CartArgs) -> anyhow::Result<()> {
    if !ws.ctx.cart(&args.cart).touch()? {
        bail!("cart {} is not stored", args.cart);
    }
    println!(
        "{} Cart {} expires in {}s",
        "✓".green().bold(),
        args.cart.yellow(),
        ws.ctx.settings().cart_expires_in_secs
    );
    Ok(())
}

fn cmd_destroy(ws: &Workspace, args: CartArgs) -> anyhow::Result<()> {
    if ws.ctx.cart(&args.cart).destroy()? {
        println!("{} Destroyed cart {}", "✓".green().bold(), args.cart.yellow());
    } else {
        println!("Cart {} was not stored", args.cart.yellow());
    }
    Ok(())
}

fn cmd_reassign(ws: &Workspace, args: ReassignArgs) -> anyhow::Result<()> {
    ws.ctx.cart(&args.cart).reassign(&args.new_id)?;
    println!(
        "{} Cart {} is now {}",
        "✓".green().bold(),
        args.cart.yellow(),
        args.new_id.yellow().bold()
    );
    Ok(())
}

fn cmd_seed_legacy(ws: &Workspace, args: SeedLegacyArgs) -> anyhow::Result<()> {
    let records = args
        .items
        .iter()
        .map(|spec| parse_item_spec(spec))
        .collect::<anyhow::Result<Vec<_>>>()?;
    write_legacy_cart(&ws.ctx, &args.cart, &records)?;
    println!(
        "{} Wrote legacy cart {} with {} items",
        "✓".green().bold(),
        args.cart.yellow(),
        records.len()
    );
    Ok(())
}

fn cmd_migrate(ws: &Workspace, args: CartArgs) -> anyhow::Result<()> {
    let key = cart_key(&ws.ctx.settings().key_prefix, &args.cart);
    match ws.store.kind(&key)? {
        Some("set") => {
            let migrated = migrate(&ws.ctx, &key, &args.cart)?;
            println!(
                "{} Migrated cart {} ({} items)",
                "✓".green().bold(),
                args.cart.yellow(),
                migrated
            );
        }
        Some("string") => println!("Cart {} is already a document", args.cart.yellow()),
        Some(other) => bail!("key {key} holds a {other}, not a cart"),
        None => println!("Cart {} is not stored", args.cart.yellow()),
    }
    Ok(())
}

fn cmd_keys(ws: &Workspace, args: KeysArgs) -> anyhow::Result<()> {
    for key in ws.store.keys(&args.pattern)? {
        let kind = ws.store.kind(&key)?.unwrap_or("?");
        println!("{:<7} {}", kind.dimmed(), key);
    }
    Ok(())
}

/// Parse `name=value`.
fn parse_assignment(text: &str) -> anyhow::Result<(String, String)> {
    match text.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => bail!("expected NAME=VALUE, got {text:?}"),
    }
}

/// Parse `Type:id[:name=value,...]` into a record.
fn parse_item_spec(spec: &str) -> anyhow::Result<Record> {
    let mut parts = spec.splitn(3, ':');
    let (Some(item_type), Some(id)) = (parts.next(), parts.next()) else {
        bail!("expected Type:id[:name=value,...], got {spec:?}");
    };
    if item_type.is_empty() || id.is_empty() {
        bail!("item type and id must not be empty in {spec:?}");
    }
    let fields = match parts.next() {
        Some(rest) if !rest.is_empty() => rest
            .split(',')
            .map(parse_assignment)
            .collect::<anyhow::Result<Vec<_>>>()?,
        _ => Vec::new(),
    };
    Ok(Record::new(id, item_type, fields))
}
