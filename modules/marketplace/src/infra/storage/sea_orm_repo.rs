//! SeaORM-backed implementation of the domain persistence ports.
//!
//! Generic over the connection so it works with a `DatabaseConnection` or a
//! transaction. Multi-statement writes open their own transaction and must not
//! touch `self.conn` until it is committed (in-memory SQLite runs on a single
//! pooled connection).

use std::collections::HashSet;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, Func, LikeExpr, OnConflict, Query};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::contract::model::{
    display_name, Account, GlobalStats, Listing, ListingFilter, ListingStatus, ListingView, Role,
    UserStats,
};
use crate::domain::repo::{AccountsRepository, LikesRepository, ListingsRepository, OwnerGuard};
use crate::infra::storage::entity::{account, like, listing};
use crate::infra::storage::mapper::{
    account_from_model, account_to_active, cents_to_price, listing_from_model, listing_to_active,
};

pub struct SeaOrmMarketRepository<C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync,
{
    conn: C,
}

impl<C> SeaOrmMarketRepository<C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync,
{
    pub fn new(conn: C) -> Self {
        Self { conn }
    }
}

fn owner_condition(guard: OwnerGuard) -> Condition {
    match guard {
        OwnerGuard::Any => Condition::all(),
        OwnerGuard::Owner(owner) => Condition::all().add(listing::Column::OwnerId.eq(owner)),
    }
}

/// `%` and `_` in user input match literally.
fn like_pattern(term: &str) -> LikeExpr {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    LikeExpr::new(format!("%{escaped}%")).escape('\\')
}

#[async_trait]
impl<C> AccountsRepository for SeaOrmMarketRepository<C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync + 'static,
{
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Account>> {
        account::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("accounts.find_by_id failed")?
            .map(account_from_model)
            .transpose()
    }

    async fn find_by_external_id(&self, external_id: &str) -> anyhow::Result<Option<Account>> {
        account::Entity::find()
            .filter(account::Column::ExternalId.eq(external_id))
            .one(&self.conn)
            .await
            .context("accounts.find_by_external_id failed")?
            .map(account_from_model)
            .transpose()
    }

    async fn find_by_email(&self, email: &str) -> anyhow::Result<Option<Account>> {
        account::Entity::find()
            .filter(
                Expr::expr(Func::lower(Expr::col(account::Column::Email)))
                    .eq(email.to_lowercase()),
            )
            .order_by_asc(account::Column::CreatedAt)
            .one(&self.conn)
            .await
            .context("accounts.find_by_email failed")?
            .map(account_from_model)
            .transpose()
    }

    async fn insert_if_absent(&self, account: Account) -> anyhow::Result<bool> {
        let inserted = account::Entity::insert(account_to_active(account))
            .on_conflict(
                OnConflict::column(account::Column::ExternalId)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await;
        match inserted {
            Ok(rows) => Ok(rows > 0),
            Err(DbErr::RecordNotInserted) => Ok(false),
            Err(e) => Err(e).context("accounts.insert_if_absent failed"),
        }
    }

    async fn update_names(
        &self,
        id: Uuid,
        first_name: Option<Option<String>>,
        last_name: Option<Option<String>>,
        at: DateTime<Utc>,
    ) -> anyhow::Result<Option<Account>> {
        let Some(found) = account::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("accounts.update_names lookup failed")?
        else {
            return Ok(None);
        };
        let mut am = found.into_active_model();
        if let Some(first) = first_name {
            am.first_name = Set(first);
        }
        if let Some(last) = last_name {
            am.last_name = Set(last);
        }
        am.updated_at = Set(at);
        let saved = am
            .update(&self.conn)
            .await
            .context("accounts.update_names failed")?;
        account_from_model(saved).map(Some)
    }

    async fn set_role(
        &self,
        id: Uuid,
        role: Role,
        at: DateTime<Utc>,
    ) -> anyhow::Result<Option<Account>> {
        let Some(found) = account::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("accounts.set_role lookup failed")?
        else {
            return Ok(None);
        };
        let mut am = found.into_active_model();
        am.role = Set(role.as_str().to_string());
        am.updated_at = Set(at);
        let saved = am
            .update(&self.conn)
            .await
            .context("accounts.set_role failed")?;
        account_from_model(saved).map(Some)
    }

    async fn list(&self) -> anyhow::Result<Vec<Account>> {
        account::Entity::find()
            .order_by_desc(account::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("accounts.list failed")?
            .into_iter()
            .map(account_from_model)
            .collect()
    }

    async fn delete_cascade(&self, id: Uuid) -> anyhow::Result<bool> {
        let txn = self
            .conn
            .begin()
            .await
            .context("accounts.delete_cascade begin failed")?;

        like::Entity::delete_many()
            .filter(
                Condition::any().add(like::Column::AccountId.eq(id)).add(
                    like::Column::ListingId.in_subquery(
                        Query::select()
                            .column(listing::Column::Id)
                            .from(listing::Entity)
                            .and_where(listing::Column::OwnerId.eq(id))
                            .to_owned(),
                    ),
                ),
            )
            .exec(&txn)
            .await
            .context("accounts.delete_cascade likes failed")?;

        listing::Entity::delete_many()
            .filter(listing::Column::OwnerId.eq(id))
            .exec(&txn)
            .await
            .context("accounts.delete_cascade listings failed")?;

        let res = account::Entity::delete_by_id(id)
            .exec(&txn)
            .await
            .context("accounts.delete_cascade account failed")?;

        txn.commit()
            .await
            .context("accounts.delete_cascade commit failed")?;
        Ok(res.rows_affected > 0)
    }
}

#[async_trait]
impl<C> ListingsRepository for SeaOrmMarketRepository<C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync + 'static,
{
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Listing>> {
        listing::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("listings.find_by_id failed")?
            .map(listing_from_model)
            .transpose()
    }

    async fn insert(&self, l: Listing) -> anyhow::Result<()> {
        let m = listing_to_active(l)?;
        let _ = m.insert(&self.conn).await.context("listings.insert failed")?;
        Ok(())
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> anyhow::Result<Vec<Listing>> {
        listing::Entity::find()
            .filter(listing::Column::OwnerId.eq(owner_id))
            .order_by_desc(listing::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("listings.list_by_owner failed")?
            .into_iter()
            .map(listing_from_model)
            .collect()
    }

    async fn list_active(&self, filter: &ListingFilter) -> anyhow::Result<Vec<ListingView>> {
        let mut cond = Condition::all().add(listing::Column::Status.eq(ListingStatus::Active.as_str()));
        // Keys are folded by the mapper; SQL LOWER only folds ASCII on SQLite.
        if let Some(category) = &filter.category {
            cond = cond.add(listing::Column::CategoryKey.eq(category.as_str()));
        }
        if let Some(location) = &filter.location {
            cond = cond.add(listing::Column::LocationKey.eq(location.as_str()));
        }
        if let Some(term) = &filter.search {
            cond = cond.add(listing::Column::SearchKey.like(like_pattern(term)));
        }

        let rows = listing::Entity::find()
            .find_also_related(account::Entity)
            .filter(cond)
            .order_by_desc(listing::Column::CreatedAt)
            .all(&self.conn)
            .await
            .context("listings.list_active failed")?;

        rows.into_iter()
            .map(|(l, seller)| {
                let seller_name = seller
                    .map(|a| display_name(a.first_name.as_deref(), a.last_name.as_deref(), &a.email))
                    .unwrap_or_default();
                Ok(ListingView {
                    listing: listing_from_model(l)?,
                    seller_name,
                })
            })
            .collect()
    }

    async fn update(&self, l: Listing, guard: OwnerGuard) -> anyhow::Result<bool> {
        let id = l.id;
        let res = listing::Entity::update_many()
            .set(listing_to_active(l)?)
            .filter(listing::Column::Id.eq(id))
            .filter(owner_condition(guard))
            .exec(&self.conn)
            .await
            .context("listings.update failed")?;
        Ok(res.rows_affected > 0)
    }

    async fn delete(&self, id: Uuid, guard: OwnerGuard) -> anyhow::Result<bool> {
        let txn = self
            .conn
            .begin()
            .await
            .context("listings.delete begin failed")?;

        let matched = listing::Entity::find()
            .filter(listing::Column::Id.eq(id))
            .filter(owner_condition(guard))
            .count(&txn)
            .await
            .context("listings.delete lookup failed")?;
        if matched == 0 {
            return Ok(false);
        }

        like::Entity::delete_many()
            .filter(like::Column::ListingId.eq(id))
            .exec(&txn)
            .await
            .context("listings.delete likes failed")?;
        let res = listing::Entity::delete_many()
            .filter(listing::Column::Id.eq(id))
            .filter(owner_condition(guard))
            .exec(&txn)
            .await
            .context("listings.delete failed")?;

        txn.commit().await.context("listings.delete commit failed")?;
        Ok(res.rows_affected > 0)
    }

    async fn increment_views(&self, id: Uuid) -> anyhow::Result<Option<Listing>> {
        let res = listing::Entity::update_many()
            .col_expr(
                listing::Column::ViewCount,
                Expr::col(listing::Column::ViewCount).add(1),
            )
            .filter(listing::Column::Id.eq(id))
            .exec(&self.conn)
            .await
            .context("listings.increment_views failed")?;
        if res.rows_affected == 0 {
            return Ok(None);
        }
        ListingsRepository::find_by_id(self, id).await
    }

    async fn global_stats(&self) -> anyhow::Result<GlobalStats> {
        let total_users = account::Entity::find()
            .count(&self.conn)
            .await
            .context("stats.total_users failed")?;
        let total_listings = listing::Entity::find()
            .count(&self.conn)
            .await
            .context("stats.total_listings failed")?;
        let views: Vec<i64> = listing::Entity::find()
            .select_only()
            .column(listing::Column::ViewCount)
            .into_tuple()
            .all(&self.conn)
            .await
            .context("stats.total_views failed")?;
        let locations: Vec<String> = listing::Entity::find()
            .select_only()
            .column(listing::Column::Location)
            .into_tuple()
            .all(&self.conn)
            .await
            .context("stats.locations failed")?;
        let locations_served = locations
            .iter()
            .map(|l| l.trim().to_lowercase())
            .collect::<HashSet<_>>()
            .len() as u64;

        Ok(GlobalStats {
            total_users,
            total_listings,
            total_views: views.iter().sum(),
            locations_served,
        })
    }

    async fn user_stats(&self, account_id: Uuid) -> anyhow::Result<UserStats> {
        let items_listed = listing::Entity::find()
            .filter(listing::Column::OwnerId.eq(account_id))
            .count(&self.conn)
            .await
            .context("stats.items_listed failed")?;
        let sold_prices: Vec<i64> = listing::Entity::find()
            .select_only()
            .column(listing::Column::PriceCents)
            .filter(listing::Column::OwnerId.eq(account_id))
            .filter(listing::Column::Status.eq(ListingStatus::Sold.as_str()))
            .into_tuple()
            .all(&self.conn)
            .await
            .context("stats.sold failed")?;
        let likes_given = like::Entity::find()
            .filter(like::Column::AccountId.eq(account_id))
            .count(&self.conn)
            .await
            .context("stats.likes_given failed")?;

        Ok(UserStats {
            items_listed,
            items_sold: sold_prices.len() as u64,
            total_earnings: cents_to_price(sold_prices.iter().sum()),
            likes_given,
        })
    }
}

#[async_trait]
impl<C> LikesRepository for SeaOrmMarketRepository<C>
where
    C: ConnectionTrait + TransactionTrait + Send + Sync + 'static,
{
    async fn toggle(&self, account_id: Uuid, listing_id: Uuid) -> anyhow::Result<(bool, u64)> {
        let txn = self.conn.begin().await.context("likes.toggle begin failed")?;

        let removed = like::Entity::delete_many()
            .filter(like::Column::AccountId.eq(account_id))
            .filter(like::Column::ListingId.eq(listing_id))
            .exec(&txn)
            .await
            .context("likes.toggle delete failed")?
            .rows_affected;

        let liked = removed == 0;
        if liked {
            like::Entity::insert(like::ActiveModel {
                account_id: Set(account_id),
                listing_id: Set(listing_id),
                created_at: Set(Utc::now()),
            })
            .on_conflict(
                OnConflict::columns([like::Column::AccountId, like::Column::ListingId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&txn)
            .await
            .or_else(|e| match e {
                DbErr::RecordNotInserted => Ok(0),
                other => Err(other),
            })
            .context("likes.toggle insert failed")?;
        }

        let count = like::Entity::find()
            .filter(like::Column::ListingId.eq(listing_id))
            .count(&txn)
            .await
            .context("likes.toggle count failed")?;

        txn.commit().await.context("likes.toggle commit failed")?;
        Ok((liked, count))
    }

    async fn count_for_listing(&self, listing_id: Uuid) -> anyhow::Result<u64> {
        like::Entity::find()
            .filter(like::Column::ListingId.eq(listing_id))
            .count(&self.conn)
            .await
            .context("likes.count_for_listing failed")
    }

    async fn liked_listing_ids(&self, account_id: Uuid) -> anyhow::Result<Vec<Uuid>> {
        like::Entity::find()
            .select_only()
            .column(like::Column::ListingId)
            .filter(like::Column::AccountId.eq(account_id))
            .order_by_desc(like::Column::CreatedAt)
            .into_tuple()
            .all(&self.conn)
            .await
            .context("likes.liked_listing_ids failed")
    }
}
