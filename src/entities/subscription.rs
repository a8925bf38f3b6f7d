//! Telegram bot control of seller shops
//!
//! Besides the generated CRUD hooks, subscriptions expose three ad-hoc
//! endpoints: stopping a shop's bot, starting it again, and asking which of a
//! set of shops currently run one. Both writes refresh the shop list and the
//! activity lookup.

use super::models::{Shop, Subscription};
use crate::cache::{Mutation, MutationFn, MutationOptions, QueryFn, SecondaryOptions, compose_options};
use crate::core::entity::Entity;
use crate::core::query::EntityId;
use crate::core::query_key::QueryKey;
use crate::hooks::{EntityHooks, MutationHandle, ReadHandle, ReadOptions};
use futures::FutureExt;
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::task::JoinHandle;

pub const STOP_BOT_PATH: &str = "/api/subscription/stop-bot";
pub const START_BOT_PATH: &str = "/api/subscription/start-bot";
pub const ACTIVE_BOTS_PATH: &str = "/api/subscription/is-active-bots";

/// Root of the activity lookup key
pub const ACTIVE_BOTS_KEY: &str = "is-active-bots";

pub const STOP_BOT_SUCCESS: &str = "Muvaffaqiyatli o'chirildi!";
pub const START_BOT_SUCCESS: &str = "Muvaffaqiyatli ishga tushirildi!";

/// Marker of the stop-bot action
#[derive(Debug)]
pub struct StopBot;

/// Marker of the start-bot action
#[derive(Debug)]
pub struct StartBot;

impl EntityHooks<Subscription> {
    /// `POST /api/subscription/stop-bot {shopId}`
    pub fn use_stop_bot(&self, options: MutationOptions) -> MutationHandle<EntityId, Subscription, StopBot> {
        self.bot_action("stopBot", STOP_BOT_PATH, STOP_BOT_SUCCESS, options)
    }

    /// `POST /api/subscription/start-bot {shopId}`
    pub fn use_start_bot(&self, options: MutationOptions) -> MutationHandle<EntityId, Subscription, StartBot> {
        self.bot_action("startBot", START_BOT_PATH, START_BOT_SUCCESS, options)
    }

    /// Which of `shop_ids` run a bot; key `[is-active-bots, shopIds]`
    ///
    /// Waits until the shop ids are known (`None` keeps the read idle).
    pub fn use_active_bots(
        &self,
        shop_ids: Option<Vec<EntityId>>,
        options: ReadOptions,
    ) -> ReadHandle<Value, Subscription> {
        let enabled = shop_ids.is_some() && options.enabled.unwrap_or(true);
        let ids: Vec<Value> = shop_ids
            .unwrap_or_default()
            .iter()
            .map(EntityId::to_value)
            .collect();
        let key = QueryKey::new(ACTIVE_BOTS_KEY).with(&ids);

        let service = self.context().service().clone();
        let fetcher: QueryFn = Arc::new(move || {
            let service = service.clone();
            let body = json!({ "shopIds": ids });
            async move { service.post(ACTIVE_BOTS_PATH, body).await }.boxed()
        });

        let observer = self
            .context()
            .client()
            .observe(key, fetcher, options.query_options(enabled));
        ReadHandle::new(observer)
    }

    fn bot_action<O>(
        &self,
        name: &str,
        path: &'static str,
        success: &str,
        options: MutationOptions,
    ) -> MutationHandle<EntityId, Subscription, O> {
        let service = self.context().service().clone();
        let run: MutationFn<EntityId> = Arc::new(move |shop_id: EntityId| {
            let service = service.clone();
            async move { service.post(path, json!({ "shopId": shop_id })).await }.boxed()
        });

        let secondary = SecondaryOptions::new()
            .invalidate(Shop::keys().list())
            .invalidate(ACTIVE_BOTS_KEY)
            .success_toast(success);
        let callbacks = compose_options(options, secondary, self.context().notifier().clone());
        let mutation = Mutation::new(
            format!("{}.{name}", Subscription::name()),
            self.context().client().clone(),
            run,
            callbacks,
        );
        MutationHandle::new(mutation)
    }
}

impl MutationHandle<EntityId, Subscription, StopBot> {
    pub fn stop_bot(&self, shop_id: impl Into<EntityId>) -> JoinHandle<()> {
        self.mutate(shop_id.into())
    }

    pub fn is_loading_stop_bot(&self) -> bool {
        self.is_pending()
    }
}

impl MutationHandle<EntityId, Subscription, StartBot> {
    pub fn start_bot(&self, shop_id: impl Into<EntityId>) -> JoinHandle<()> {
        self.mutate(shop_id.into())
    }

    pub fn is_loading_start_bot(&self) -> bool {
        self.is_pending()
    }
}
