use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::RwLock;
use uuid::Uuid;

use crate::contract::{
    client::MarketplaceApi,
    error::MarketError,
    model::{Caller, LikeState},
};
use crate::hooks::policy::{CallPolicy, FetchState};

/// The caller's liked listings as a set.
pub struct LikesHook {
    api: Arc<dyn MarketplaceApi>,
    caller: Caller,
    policy: CallPolicy,
    state: RwLock<FetchState<HashSet<Uuid>>>,
}

impl LikesHook {
    pub fn new(api: Arc<dyn MarketplaceApi>, caller: Caller) -> Self {
        Self {
            api,
            caller,
            policy: CallPolicy::default(),
            state: RwLock::new(FetchState::default()),
        }
    }

    pub fn with_policy(mut self, policy: CallPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn snapshot(&self) -> FetchState<HashSet<Uuid>> {
        self.state.read().clone()
    }

    pub fn is_liked(&self, listing_id: Uuid) -> bool {
        self.state.read().data.contains(&listing_id)
    }

    pub async fn load(&self) -> Result<(), MarketError> {
        self.state.write().loading = true;
        let (api, caller) = (&self.api, &self.caller);
        let result = self.policy.read(move || api.get_likes(caller)).await;

        let mut state = self.state.write();
        state.loading = false;
        match result {
            Ok(ids) => {
                state.data = ids.into_iter().collect();
                state.error = None;
                Ok(())
            }
            Err(e) => {
                state.error = Some(e.clone());
                Err(e)
            }
        }
    }

    pub async fn toggle(&self, listing_id: Uuid) -> Result<LikeState, MarketError> {
        let like = self
            .policy
            .mutate(self.api.toggle_like(&self.caller, listing_id))
            .await?;
        let mut state = self.state.write();
        if like.liked {
            state.data.insert(listing_id);
        } else {
            state.data.remove(&listing_id);
        }
        Ok(like)
    }
}
