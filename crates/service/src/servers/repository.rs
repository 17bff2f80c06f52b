use async_trait::async_trait;
use rust_decimal::Decimal;
use sea_orm::prelude::DateTimeWithTimeZone;

use models::{hosting_plan, server};

use super::domain::{Attachments, NewServer, ServerFilter};
use crate::errors::ServiceError;

/// In-place change applied to a locked server row before it is written back.
pub type ServerChange = Box<dyn FnOnce(&mut server::Model) -> Result<(), ServiceError> + Send>;

/// Repository abstraction for server persistence.
///
/// `owner` narrows a lookup to servers of that user; `None` is the admin view.
#[async_trait]
pub trait ServerRepository: Send + Sync {
    async fn find_plan(&self, plan_id: i32) -> Result<Option<hosting_plan::Model>, ServiceError>;

    async fn find_server(&self, server_id: i32, owner: Option<i32>) -> Result<Option<server::Model>, ServiceError>;
    /// Ordered by id.
    async fn list_servers(&self, filter: ServerFilter) -> Result<Vec<server::Model>, ServiceError>;
    /// Newest first.
    async fn recent_servers(&self, user_id: i32, limit: u64) -> Result<Vec<server::Model>, ServiceError>;
    /// Active servers with an expiry at or before `threshold`.
    async fn expiring_before(&self, threshold: DateTimeWithTimeZone) -> Result<Vec<server::Model>, ServiceError>;

    /// Insert the row and its addon/service links atomically.
    ///
    /// An addon or service id missing from the catalog is a `Validation` error and nothing is written.
    async fn insert_server(&self, new: NewServer) -> Result<server::Model, ServiceError>;
    /// Load, change and save one row in a single transaction. `None` when no row matched.
    async fn modify_server(&self, server_id: i32, owner: Option<i32>, change: ServerChange) -> Result<Option<server::Model>, ServiceError>;
    async fn delete_server(&self, server_id: i32, owner: Option<i32>) -> Result<bool, ServiceError>;

    async fn attachments(&self, server_ids: &[i32]) -> Result<Attachments, ServiceError>;

    async fn count_servers(&self, filter: ServerFilter) -> Result<u64, ServiceError>;
    /// Mean over servers with a cost set; `None` when there are none.
    async fn average_monthly_cost(&self) -> Result<Option<Decimal>, ServiceError>;
    async fn total_monthly_cost(&self, filter: ServerFilter) -> Result<Option<Decimal>, ServiceError>;
}

/// Simple in-memory repository for tests and doc examples
pub mod mock {
    use super::*;
    use std::collections::{BTreeMap, HashMap};
    use std::sync::{Mutex, MutexGuard};

    use models::{addon, catalog_service};

    #[derive(Default)]
    struct State {
        next_id: i32,
        servers: BTreeMap<i32, server::Model>,
        plans: HashMap<i32, hosting_plan::Model>,
        addons: BTreeMap<i32, addon::Model>,
        services: BTreeMap<i32, catalog_service::Model>,
        server_addons: Vec<(i32, i32)>,   // (server_id, addon_id)
        server_services: Vec<(i32, i32)>, // (server_id, service_id)
    }

    #[derive(Default)]
    pub struct MockServerRepository {
        state: Mutex<State>,
    }

    impl MockServerRepository {
        pub fn new() -> Self { Self::default() }

        fn state(&self) -> Result<MutexGuard<'_, State>, ServiceError> {
            self.state.lock().map_err(|_| ServiceError::Db("mock repository lock poisoned".into()))
        }

        pub fn with_plan(self, plan: hosting_plan::Model) -> Self {
            if let Ok(mut s) = self.state.lock() {
                s.plans.insert(plan.id, plan);
            }
            self
        }

        pub fn with_addon(self, addon: addon::Model) -> Self {
            if let Ok(mut s) = self.state.lock() {
                s.addons.insert(addon.id, addon);
            }
            self
        }

        pub fn with_service(self, service: catalog_service::Model) -> Self {
            if let Ok(mut s) = self.state.lock() {
                s.services.insert(service.id, service);
            }
            self
        }

        fn owned(server: &server::Model, owner: Option<i32>) -> bool {
            owner.map_or(true, |u| server.user_id == u)
        }
    }

    #[async_trait]
    impl ServerRepository for MockServerRepository {
        async fn find_plan(&self, plan_id: i32) -> Result<Option<hosting_plan::Model>, ServiceError> {
            Ok(self.state()?.plans.get(&plan_id).cloned())
        }

        async fn find_server(&self, server_id: i32, owner: Option<i32>) -> Result<Option<server::Model>, ServiceError> {
            let s = self.state()?;
            Ok(s.servers.get(&server_id).filter(|m| Self::owned(m, owner)).cloned())
        }

        async fn list_servers(&self, filter: ServerFilter) -> Result<Vec<server::Model>, ServiceError> {
            let s = self.state()?;
            Ok(s.servers.values().filter(|m| filter.matches(m)).cloned().collect())
        }

        async fn recent_servers(&self, user_id: i32, limit: u64) -> Result<Vec<server::Model>, ServiceError> {
            let s = self.state()?;
            let mut rows: Vec<_> = s.servers.values().filter(|m| m.user_id == user_id).cloned().collect();
            rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
            rows.truncate(limit as usize);
            Ok(rows)
        }

        async fn expiring_before(&self, threshold: DateTimeWithTimeZone) -> Result<Vec<server::Model>, ServiceError> {
            let s = self.state()?;
            Ok(s.servers
                .values()
                .filter(|m| m.server_status == server::ServerStatus::Active)
                .filter(|m| m.expiry_date.map_or(false, |e| e <= threshold))
                .cloned()
                .collect())
        }

        async fn insert_server(&self, new: NewServer) -> Result<server::Model, ServiceError> {
            let mut s = self.state()?;
            if let Some(missing) = new.addon_ids.iter().find(|id| !s.addons.contains_key(*id)) {
                return Err(ServiceError::Validation(format!("addon {} does not exist", missing)));
            }
            if let Some(missing) = new.service_ids.iter().find(|id| !s.services.contains_key(*id)) {
                return Err(ServiceError::Validation(format!("service {} does not exist", missing)));
            }
            s.next_id += 1;
            let mut row = new.server;
            row.id = s.next_id;
            for addon_id in new.addon_ids {
                s.server_addons.push((row.id, addon_id));
            }
            for service_id in new.service_ids {
                s.server_services.push((row.id, service_id));
            }
            s.servers.insert(row.id, row.clone());
            Ok(row)
        }

        async fn modify_server(&self, server_id: i32, owner: Option<i32>, change: ServerChange) -> Result<Option<server::Model>, ServiceError> {
            let mut s = self.state()?;
            let Some(current) = s.servers.get(&server_id).filter(|m| Self::owned(m, owner)) else {
                return Ok(None);
            };
            // work on a copy so a failed change leaves the row untouched
            let mut row = current.clone();
            change(&mut row)?;
            s.servers.insert(server_id, row.clone());
            Ok(Some(row))
        }

        async fn delete_server(&self, server_id: i32, owner: Option<i32>) -> Result<bool, ServiceError> {
            let mut s = self.state()?;
            if !s.servers.get(&server_id).map_or(false, |m| Self::owned(m, owner)) {
                return Ok(false);
            }
            s.servers.remove(&server_id);
            s.server_addons.retain(|(sid, _)| *sid != server_id);
            s.server_services.retain(|(sid, _)| *sid != server_id);
            Ok(true)
        }

        async fn attachments(&self, server_ids: &[i32]) -> Result<Attachments, ServiceError> {
            let s = self.state()?;
            let mut out = Attachments::default();
            for (sid, aid) in s.server_addons.iter().filter(|(sid, _)| server_ids.contains(sid)) {
                if let Some(a) = s.addons.get(aid) {
                    out.addons.entry(*sid).or_default().push(a.clone());
                }
            }
            for (sid, cid) in s.server_services.iter().filter(|(sid, _)| server_ids.contains(sid)) {
                if let Some(c) = s.services.get(cid) {
                    out.services.entry(*sid).or_default().push(c.clone());
                }
            }
            for v in out.addons.values_mut() {
                v.sort_by_key(|a| a.id);
            }
            for v in out.services.values_mut() {
                v.sort_by_key(|c| c.id);
            }
            Ok(out)
        }

        async fn count_servers(&self, filter: ServerFilter) -> Result<u64, ServiceError> {
            let s = self.state()?;
            Ok(s.servers.values().filter(|m| filter.matches(m)).count() as u64)
        }

        async fn average_monthly_cost(&self) -> Result<Option<Decimal>, ServiceError> {
            let s = self.state()?;
            let costs: Vec<Decimal> = s.servers.values().filter_map(|m| m.monthly_cost).collect();
            if costs.is_empty() {
                return Ok(None);
            }
            let sum: Decimal = costs.iter().copied().sum();
            Ok(Some(sum / Decimal::from(costs.len() as u64)))
        }

        async fn total_monthly_cost(&self, filter: ServerFilter) -> Result<Option<Decimal>, ServiceError> {
            let s = self.state()?;
            let costs: Vec<Decimal> = s.servers.values().filter(|m| filter.matches(m)).filter_map(|m| m.monthly_cost).collect();
            if costs.is_empty() {
                return Ok(None);
            }
            Ok(Some(costs.into_iter().sum()))
        }
    }
}
