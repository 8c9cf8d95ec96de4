//! Read-only access to game state over any [State].
//!
//! The loaders fill in defaults for records that are created lazily; the
//! `get_*` functions assemble the API views served to clients.

use clickfarm_types::{
    api::{AuctionView, FactoryView, QueueEntryView, QueueView, ToolView, UpgradeView},
    execution::{Key, Value},
    factory::{
        Asset, Auction, Catalog, Distribution, Error, Factory, QueueCursor, QueueEntry,
        MAX_QUEUE_FRAGMENT, QUEUE_CAPACITY,
    },
};
use commonware_cryptography::ed25519::PublicKey;
use commonware_utils::hex;

use crate::{pricing, progression, State};

pub async fn catalog<S: State>(state: &S) -> Catalog {
    match state.get(&Key::Catalog).await {
        Some(Value::Catalog(catalog)) => catalog,
        _ => Catalog::default(),
    }
}

/// The auction record, or a fresh one starting at `now` if none exists yet.
pub async fn auction<S: State>(state: &S, now: u64) -> Auction {
    match state.get(&Key::Auction).await {
        Some(Value::Auction(auction)) => auction,
        _ => Auction::new(now),
    }
}

pub async fn distribution<S: State>(state: &S) -> Option<Distribution> {
    match state.get(&Key::Distribution).await {
        Some(Value::Distribution(distribution)) => Some(distribution),
        _ => None,
    }
}

pub async fn owner<S: State>(state: &S, pass: u64) -> Option<PublicKey> {
    match state.get(&Key::Pass(pass)).await {
        Some(Value::Pass(owner)) => Some(owner),
        _ => None,
    }
}

pub async fn factory<S: State>(state: &S, pass: u64) -> Option<Factory> {
    match state.get(&Key::Factory(pass)).await {
        Some(Value::Factory(factory)) => Some(factory),
        _ => None,
    }
}

/// Id the next minted pass receives. Ids start at 1.
pub async fn next_pass<S: State>(state: &S) -> u64 {
    match state.get(&Key::Registry).await {
        Some(Value::Registry(next)) => next,
        _ => 1,
    }
}

pub async fn balance_of<S: State>(state: &S, asset: Asset, account: &PublicKey) -> u128 {
    match state.get(&Key::Balance(asset, account.clone())).await {
        Some(Value::Balance(balance)) => balance,
        _ => 0,
    }
}

pub async fn queue_cursor<S: State>(state: &S) -> QueueCursor {
    match state.get(&Key::Queue).await {
        Some(Value::Queue(cursor)) => cursor,
        _ => QueueCursor::default(),
    }
}

/// Entry at absolute `index`, if it is still retained.
pub async fn queue_entry<S: State>(state: &S, index: u64) -> Option<QueueEntry> {
    let cursor = queue_cursor(state).await;
    if index < cursor.head || index >= cursor.tail {
        return None;
    }
    match state.get(&Key::QueueSlot(index % QUEUE_CAPACITY)).await {
        Some(Value::QueueEntry(entry)) if entry.index == index => Some(entry),
        _ => None,
    }
}

/// Progression summary of `pass` at `now`, including unclaimed accrual.
pub async fn get_factory<S: State>(
    state: &S,
    pass: u64,
    now: u64,
) -> Result<Option<FactoryView>, Error> {
    let (Some(owner), Some(factory)) = (owner(state, pass).await, factory(state, pass).await) else {
        return Ok(None);
    };
    Ok(Some(FactoryView {
        pass,
        owner: hex(owner.as_ref()),
        last_claim: factory.last_claim,
        level: factory.level,
        power: factory.power,
        evolution: factory.evolution,
        balance: balance_of(state, Asset::Resource, &owner).await,
        pending: progression::accrued(&factory, now)?,
        rate: factory.rate,
        total_earned: factory.total_earned,
        total_spent: factory.total_spent,
    }))
}

/// Per-slot holdings of `pass` against the current catalog.
pub async fn get_tools<S: State>(state: &S, pass: u64) -> Result<Option<Vec<ToolView>>, Error> {
    let Some(factory) = factory(state, pass).await else {
        return Ok(None);
    };
    let catalog = catalog(state).await;
    let mut tools = Vec::with_capacity(catalog.tools.len());
    for (slot, tool) in (0u32..).zip(&catalog.tools) {
        let amount = factory.holding(slot).amount;
        let next_cost = if amount < tool.max_amount {
            Some(progression::range_cost(&catalog, slot, amount, 1)?)
        } else {
            None
        };
        tools.push(ToolView {
            slot,
            amount,
            max_amount: tool.max_amount,
            unlock_level: tool.unlock_level,
            yield_per_second: tool.yield_per_second,
            next_cost,
        });
    }
    Ok(Some(tools))
}

/// Per-slot upgrade levels of `pass` and the cost of the next level.
pub async fn get_upgrades<S: State>(
    state: &S,
    pass: u64,
) -> Result<Option<Vec<UpgradeView>>, Error> {
    let Some(factory) = factory(state, pass).await else {
        return Ok(None);
    };
    let catalog = catalog(state).await;
    let mut upgrades = Vec::with_capacity(catalog.tools.len());
    for (slot, tool) in (0u32..).zip(&catalog.tools) {
        let level = factory.holding(slot).level;
        let schedule = catalog.upgrades_of(tool);
        upgrades.push(UpgradeView {
            slot,
            level,
            max_level: schedule.max_tier(),
            multiplier: schedule.multiplier(level),
            next_cost: progression::upgrade_cost(&catalog, slot, level)?,
        });
    }
    Ok(Some(upgrades))
}

pub async fn get_price<S: State>(state: &S, now: u64) -> u128 {
    pricing::decayed_price(&auction(state, now).await, now)
}

pub async fn get_auction<S: State>(state: &S, now: u64) -> AuctionView {
    let auction = auction(state, now).await;
    AuctionView {
        epoch_id: auction.epoch_id,
        price: pricing::decayed_price(&auction, now),
        last_action: auction.last_action,
        floor_price: auction.floor_price,
        pooled: auction.pooled,
    }
}

/// The configured catalog. Unconfigured games read as an empty catalog.
pub async fn get_catalog<S: State>(state: &S) -> Catalog {
    catalog(state).await
}

/// Every retained queue entry, oldest first.
pub async fn get_queue<S: State>(state: &S) -> QueueView {
    let cursor = queue_cursor(state).await;
    read_queue(state, cursor, cursor.head, cursor.tail).await
}

/// Up to `limit` entries starting `offset` past the head, oldest first.
/// `limit` is clamped to [MAX_QUEUE_FRAGMENT].
pub async fn get_queue_fragment<S: State>(state: &S, offset: u64, limit: u64) -> QueueView {
    let cursor = queue_cursor(state).await;
    let start = cursor.head.saturating_add(offset).min(cursor.tail);
    let end = start
        .saturating_add(limit.min(MAX_QUEUE_FRAGMENT))
        .min(cursor.tail);
    read_queue(state, cursor, start, end).await
}

async fn read_queue<S: State>(state: &S, cursor: QueueCursor, start: u64, end: u64) -> QueueView {
    let mut entries = Vec::with_capacity((end - start) as usize);
    for index in start..end {
        if let Some(entry) = queue_entry(state, index).await {
            entries.push(QueueEntryView {
                index: entry.index,
                actor: hex(entry.actor.as_ref()),
                pass: entry.pass,
                payment: entry.payment,
                message: entry.message,
                timestamp: entry.timestamp,
                epoch_id: entry.epoch_id,
            });
        }
    }
    QueueView {
        head: cursor.head,
        tail: cursor.tail,
        count: cursor.count(),
        entries,
    }
}
