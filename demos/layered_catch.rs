//! Example: layered catch stages over a parsing pipeline
//!
//! Each line of a small inventory is split into items and parsed. Different
//! failures are handled by different stages: unknown sections are skipped,
//! bad quantities are dropped or replaced, and anything else reaches the
//! consumer.

use anyhow::anyhow;
use catchable::{result, wrap, Enumerable, Error, Seq};
use std::num::ParseIntError;

#[derive(thiserror::Error, Debug)]
pub enum InventoryError {
    #[error("line {0}: expected `[section] items`")]
    Malformed(usize),

    #[error("unknown section: {0}")]
    UnknownSection(String),

    #[error("item without quantity: {0}")]
    MissingQuantity(String),
}

#[derive(thiserror::Error, Debug)]
#[error("bad quantity for {item}")]
pub struct QuantityError {
    item: String,
    #[source]
    cause: ParseIntError,
}

const INVENTORY: &[&str] = &[
    "[tools] hammer=3, saw=2",
    "[garden] hose=1, rake=two",
    "[attic] boxes=12",
    "[tools] drill=1, level",
];

fn section(line: &str, index: usize) -> Result<(String, String), InventoryError> {
    let (name, items) = line
        .strip_prefix('[')
        .and_then(|rest| rest.split_once(']'))
        .ok_or(InventoryError::Malformed(index + 1))?;
    match name {
        "tools" | "garden" => Ok((name.to_string(), items.to_string())),
        other => Err(InventoryError::UnknownSection(other.to_string())),
    }
}

fn parse_item(section: &str, raw: &str) -> Result<(String, u32), Error> {
    let (item, qty) = raw
        .split_once('=')
        .ok_or_else(|| InventoryError::MissingQuantity(raw.to_string()))?;
    let qty = qty.parse().map_err(|cause| QuantityError {
        item: item.to_string(),
        cause,
    })?;
    Ok((format!("{section}/{item}"), qty))
}

fn stock() -> Seq<impl Enumerable<Item = (String, u32)> + Clone> {
    wrap(INVENTORY.to_vec())
        .map_indexed(|line, index| section(line, index))
        // Sections we don't stock are skipped.
        .catch(|e: &InventoryError| println!("   skipped: {e}"))
        .flat_map_with(
            |(_, items)| result::Ok(items.split(',').map(|s| s.trim().to_string()).collect::<Vec<_>>()),
            |(name, _), raw| parse_item(name, &raw),
        )
}

fn main() -> anyhow::Result<()> {
    println!("=== layered catch ===\n");

    println!("1. Bad quantities and incomplete items dropped:");
    let listed = stock()
        .catch_any(|e: &ParseIntError| println!("   bad quantity: {e}"))
        .catch(|e: &InventoryError| println!("   incomplete: {e}"))
        .map(|(item, qty)| result::Ok(format!("{item}: {qty}")));
    for line in listed.to_vec().map_err(|e| anyhow!("{e:#}"))? {
        println!("   {line}");
    }

    println!("\n2. Bad quantities replaced instead:");
    let stocked = stock()
        .catch_replace(|e: &QuantityError| println!("   replacing {e}"), |e| (e.item.clone(), 0))
        .catch_replace_with(|_: &InventoryError| {}, || ("unknown".to_string(), 0));
    for (item, qty) in stocked.to_vec().map_err(|e| anyhow!("{e:#}"))? {
        println!("   {item}: {qty}");
    }

    println!("\n3. Nothing catches the bad quantity:");
    match stock().to_vec() {
        Ok(items) => println!("   {} items", items.len()),
        Err(e) => {
            println!("   Error: {}", e.message());
            println!("   Trace depth: {}", e.depth());
            println!("{e:#}");
        }
    }

    Ok(())
}
