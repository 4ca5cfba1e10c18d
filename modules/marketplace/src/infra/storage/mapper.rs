use anyhow::{anyhow, Context};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sea_orm::Set;

use crate::contract::model::{Account, Listing};
use crate::contract::text::{fold, search_key};
use crate::infra::storage::entity::{account, listing};

pub fn price_to_cents(price: Decimal) -> anyhow::Result<i64> {
    (price.round_dp(2) * Decimal::ONE_HUNDRED)
        .to_i64()
        .ok_or_else(|| anyhow!("price {price} does not fit in cents"))
}

pub fn cents_to_price(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

pub fn account_from_model(m: account::Model) -> anyhow::Result<Account> {
    let role = m
        .role
        .parse()
        .map_err(|e: String| anyhow!(e))
        .with_context(|| format!("account {}", m.id))?;
    Ok(Account {
        id: m.id,
        external_id: m.external_id,
        email: m.email,
        first_name: m.first_name,
        last_name: m.last_name,
        role,
        created_at: m.created_at,
        updated_at: m.updated_at,
    })
}

pub fn listing_from_model(m: listing::Model) -> anyhow::Result<Listing> {
    let status = m
        .status
        .parse()
        .map_err(|e: String| anyhow!(e))
        .with_context(|| format!("listing {}", m.id))?;
    let images: Vec<String> = serde_json::from_str(&m.images)
        .with_context(|| format!("listing {} has malformed images", m.id))?;
    Ok(Listing {
        id: m.id,
        owner_id: m.owner_id,
        title: m.title,
        description: m.description,
        price: cents_to_price(m.price_cents),
        category: m.category,
        location: m.location,
        condition: m.condition,
        images,
        contact_number: m.contact_number,
        status,
        view_count: m.view_count,
        created_at: m.created_at,
        updated_at: m.updated_at,
    })
}

pub fn account_to_active(a: Account) -> account::ActiveModel {
    account::ActiveModel {
        id: Set(a.id),
        external_id: Set(a.external_id),
        email: Set(a.email),
        first_name: Set(a.first_name),
        last_name: Set(a.last_name),
        role: Set(a.role.as_str().to_string()),
        created_at: Set(a.created_at),
        updated_at: Set(a.updated_at),
    }
}

pub fn listing_to_active(l: Listing) -> anyhow::Result<listing::ActiveModel> {
    Ok(listing::ActiveModel {
        id: Set(l.id),
        owner_id: Set(l.owner_id),
        category_key: Set(fold(&l.category)),
        location_key: Set(fold(&l.location)),
        search_key: Set(search_key(&l.title, &l.description)),
        title: Set(l.title),
        description: Set(l.description),
        price_cents: Set(price_to_cents(l.price)?),
        category: Set(l.category),
        location: Set(l.location),
        condition: Set(l.condition),
        images: Set(serde_json::to_string(&l.images)?),
        contact_number: Set(l.contact_number),
        status: Set(l.status.as_str().to_string()),
        view_count: Set(l.view_count),
        created_at: Set(l.created_at),
        updated_at: Set(l.updated_at),
    })
}
