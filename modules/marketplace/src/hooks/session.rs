//! Tracks who is signed in and what the Bridge thinks of them.

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::contract::{
    client::MarketplaceApi,
    error::MarketError,
    model::{Account, Caller, Role},
};
use crate::hooks::policy::CallPolicy;

/// What the identity provider currently reports.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum IdentityState {
    #[default]
    Loading,
    Anonymous,
    Authenticated(Caller),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionSnapshot {
    pub loaded: bool,
    pub is_authenticated: bool,
    pub role: Option<Role>,
    pub is_admin: bool,
    pub is_blocked: bool,
    pub error: Option<MarketError>,
    pub profile: Option<Account>,
}

#[derive(Default)]
struct Inner {
    identity: IdentityState,
    profile: Option<Account>,
    error: Option<MarketError>,
    loaded: bool,
    generation: u64,
}

pub struct SessionHook {
    api: Arc<dyn MarketplaceApi>,
    policy: CallPolicy,
    inner: RwLock<Inner>,
}

impl SessionHook {
    pub fn new(api: Arc<dyn MarketplaceApi>) -> Self {
        Self {
            api,
            policy: CallPolicy::default(),
            inner: RwLock::new(Inner::default()),
        }
    }

    pub fn with_policy(mut self, policy: CallPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn identity(&self) -> IdentityState {
        self.inner.read().identity.clone()
    }

    /// Adopt `identity`; queries the Bridge only when it differs from the
    /// one already held.
    pub async fn sync(&self, identity: IdentityState) -> Result<(), MarketError> {
        {
            let mut inner = self.inner.write();
            if inner.identity == identity {
                return Ok(());
            }
            inner.identity = identity;
            inner.profile = None;
            inner.error = None;
            inner.loaded = false;
        }
        self.refresh().await
    }

    /// Re-query the profile for the current identity.
    pub async fn refresh(&self) -> Result<(), MarketError> {
        let (generation, caller) = {
            let mut inner = self.inner.write();
            inner.generation += 1;
            match &inner.identity {
                IdentityState::Loading => return Ok(()),
                IdentityState::Anonymous => {
                    inner.profile = None;
                    inner.error = None;
                    inner.loaded = true;
                    return Ok(());
                }
                IdentityState::Authenticated(caller) => (inner.generation, caller.clone()),
            }
        };

        let api = &self.api;
        let caller = &caller;
        let result = self.policy.read(move || api.get_profile(caller)).await;

        let mut inner = self.inner.write();
        if inner.generation != generation {
            debug!("Identity changed while the profile was loading");
            return Ok(());
        }
        inner.loaded = true;
        match result {
            Ok(account) => {
                inner.profile = Some(account);
                inner.error = None;
                Ok(())
            }
            Err(e) => {
                inner.profile = None;
                inner.error = Some(e.clone());
                Err(e)
            }
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let inner = self.inner.read();
        let role = inner.profile.as_ref().map(|a| a.role);
        SessionSnapshot {
            loaded: inner.loaded,
            is_authenticated: matches!(inner.identity, IdentityState::Authenticated(_)),
            role,
            is_admin: role == Some(Role::Admin),
            is_blocked: role == Some(Role::Blocked),
            error: inner.error.clone(),
            profile: inner.profile.clone(),
        }
    }
}
