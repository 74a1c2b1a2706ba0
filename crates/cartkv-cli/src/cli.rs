use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "cartkv",
    about = "Inspect and edit shopping carts stored in a cartkv keyspace",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Keyspace snapshot file; created on first write
    #[arg(short, long, global = true, default_value = "cartkv-keyspace.json")]
    pub keyspace: PathBuf,

    /// TOML file with cart settings
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// List the items of a cart
    Show(CartArgs),
    /// Add or replace an item
    Add(AddArgs),
    /// Remove an item
    Remove(ItemArgs),
    /// Update one declared field of an item
    Set(SetArgs),
    /// Show item count, quantity, and total cost
    Total(CartArgs),
    /// Show the remaining time-to-live of a cart
    Ttl(CartArgs),
    /// Reset a cart's expiry
    Touch(CartArgs),
    /// Delete a cart
    Destroy(CartArgs),
    /// Move a cart to a new id, keeping content and expiry
    Reassign(ReassignArgs),
    /// Write a cart in the legacy multi-key layout
    SeedLegacy(SeedLegacyArgs),
    /// Convert a legacy cart to a single document now
    Migrate(CartArgs),
    /// List keys matching a glob pattern
    Keys(KeysArgs),
}

#[derive(Args)]
pub struct CartArgs {
    pub cart: String,
}

#[derive(Args)]
pub struct ItemArgs {
    pub cart: String,
    pub item_type: String,
    pub id: String,
}

#[derive(Args)]
pub struct AddArgs {
    pub cart: String,
    pub item_type: String,
    pub id: String,
    /// Field assignment `name=value`; repeatable
    #[arg(short, long = "field", value_name = "NAME=VALUE")]
    pub fields: Vec<String>,
}

#[derive(Args)]
pub struct SetArgs {
    pub cart: String,
    pub item_type: String,
    pub id: String,
    pub field: String,
    pub value: String,
}

#[derive(Args)]
pub struct ReassignArgs {
    pub cart: String,
    pub new_id: String,
}

#[derive(Args)]
pub struct SeedLegacyArgs {
    pub cart: String,
    /// Item as `Type:id[:name=value,...]`; repeatable
    #[arg(short, long = "item", value_name = "ITEM")]
    pub items: Vec<String>,
}

#[derive(Args)]
pub struct KeysArgs {
    #[arg(default_value = "*")]
    pub pattern: String,
}
