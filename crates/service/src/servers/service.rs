use std::sync::Arc;

use chrono::{TimeDelta, Utc};
use rust_decimal::Decimal;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde_json::json;
use tracing::{info, instrument, warn};

use models::billing::{self, RENEWAL_DAYS_PER_MONTH};
use models::errors::ModelError;
use models::server::{self, ServerStatus};
use models::status::ServerAction;

use super::domain::{
    NewServer, RecentServer, ServerCreate, ServerDetail, ServerFilter, ServerStats, ServerUpdate, UserServerStats,
};
use super::repository::ServerRepository;
use crate::errors::ServiceError;

/// Number of servers returned by [`ServerService::get_user_recent_servers`] by default.
pub const DEFAULT_RECENT_LIMIT: u64 = 5;
/// Upper bound on [`ServerService::get_user_recent_servers`]; larger limits are clamped.
pub const MAX_RECENT_LIMIT: u64 = 100;
/// Look-ahead window of [`ServerService::get_servers_expiring_soon`] by default.
pub const DEFAULT_EXPIRING_DAYS: i64 = 7;
pub const DEFAULT_SERVER_TYPE: &str = "vps";

/// Flat bandwidth figure reported per active server until real metering exists.
pub fn bandwidth_per_active_server() -> Decimal { Decimal::new(24, 1) }

fn now() -> DateTimeWithTimeZone { Utc::now().into() }

/// `base` moved by `days`, or a validation error when the date leaves chrono's range.
fn shift_days(base: DateTimeWithTimeZone, days: i64) -> Result<DateTimeWithTimeZone, ServiceError> {
    TimeDelta::try_days(days)
        .and_then(|delta| base.checked_add_signed(delta))
        .ok_or_else(|| ServiceError::Validation(format!("{} days from {} is out of range", days, base)))
}

/// Server lifecycle operations, independent of web framework.
pub struct ServerService<R: ServerRepository + ?Sized> {
    repo: Arc<R>,
}

impl<R: ServerRepository + ?Sized> ServerService<R> {
    pub fn new(repo: Arc<R>) -> Self { Self { repo } }

    async fn enrich(&self, servers: Vec<server::Model>) -> Result<Vec<ServerDetail>, ServiceError> {
        let ids: Vec<i32> = servers.iter().map(|s| s.id).collect();
        let mut attached = self.repo.attachments(&ids).await?;
        Ok(servers
            .into_iter()
            .map(|server| {
                let (addons, services) = attached.take(server.id);
                ServerDetail { server, addons, services }
            })
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn get_user_servers(&self, user_id: i32) -> Result<Vec<ServerDetail>, ServiceError> {
        let servers = self.repo.list_servers(ServerFilter::user(user_id)).await?;
        self.enrich(servers).await
    }

    #[instrument(skip(self))]
    pub async fn get_user_active_servers(&self, user_id: i32) -> Result<Vec<server::Model>, ServiceError> {
        self.repo.list_servers(ServerFilter::user(user_id).with_status(ServerStatus::Active)).await
    }

    #[instrument(skip(self))]
    pub async fn get_user_server(&self, user_id: i32, server_id: i32) -> Result<Option<ServerDetail>, ServiceError> {
        match self.repo.find_server(server_id, Some(user_id)).await? {
            Some(server) => Ok(self.enrich(vec![server]).await?.pop()),
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    pub async fn get_server_by_id(&self, server_id: i32) -> Result<Option<server::Model>, ServiceError> {
        self.repo.find_server(server_id, None).await
    }

    /// Every server with its linked addons and services.
    #[instrument(skip(self))]
    pub async fn get_all_servers(&self) -> Result<Vec<ServerDetail>, ServiceError> {
        let servers = self.repo.list_servers(ServerFilter::all()).await?;
        self.enrich(servers).await
    }

    /// Provision a server for `user_id` from a hosting plan.
    ///
    /// The server starts `active`; its expiry is derived from the billing cycle.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use chrono::Utc;
    /// use rust_decimal::Decimal;
    /// use service::servers::{ServerService, ServerCreate, repository::mock::MockServerRepository};
    /// use models::hosting_plan;
    ///
    /// let plan = hosting_plan::Model {
    ///     id: 1, name: "Starter".into(), vcpu: 1, ram_gb: 2, storage_gb: 40, bandwidth_gb: 1000,
    ///     monthly_price: Decimal::new(999, 2), is_active: true, created_at: Utc::now().into(),
    /// };
    /// let svc = ServerService::new(Arc::new(MockServerRepository::new().with_plan(plan)));
    /// let input = ServerCreate {
    ///     server_name: "web-01".into(), operating_system: "debian-12".into(), plan_id: 1, ..Default::default()
    /// };
    /// let server = tokio_test::block_on(svc.create_user_server(42, input, None)).unwrap();
    /// assert_eq!(server.user_id, 42);
    /// assert_eq!(server.ram_gb, 2);
    /// assert_eq!(server.billing_cycle.as_deref(), Some("monthly"));
    /// ```
    #[instrument(skip(self, input), fields(plan_id = input.plan_id))]
    pub async fn create_user_server(&self, user_id: i32, input: ServerCreate, order_id: Option<i32>) -> Result<server::Model, ServiceError> {
        server::validate_name(&input.server_name)?;
        let plan = self.repo
            .find_plan(input.plan_id)
            .await?
            .ok_or_else(|| ServiceError::Validation(format!("hosting plan {} not found", input.plan_id)))?;

        let ram_gb = input.ram_gb.unwrap_or(plan.ram_gb);
        let storage_gb = input.storage_gb.unwrap_or(plan.storage_gb);
        if ram_gb <= 0 || storage_gb <= 0 {
            return Err(ModelError::Validation("ram_gb and storage_gb must be > 0".into()).into());
        }
        let vcpu = input.vcpu.unwrap_or(plan.vcpu);
        let bandwidth_gb = input.bandwidth_gb.unwrap_or(plan.bandwidth_gb);

        let created = now();
        let expiry = shift_days(created, billing::cycle_days(input.billing_cycle.as_deref()))?;
        let specs = json!({
            "vcpu": vcpu,
            "ram_gb": ram_gb,
            "storage_gb": storage_gb,
            "bandwidth_gb": bandwidth_gb,
            "os": input.operating_system,
        });

        let mut addon_ids = input.addon_ids;
        addon_ids.sort_unstable();
        addon_ids.dedup();
        let mut service_ids = input.service_ids;
        service_ids.sort_unstable();
        service_ids.dedup();

        let row = server::Model {
            id: 0,
            user_id,
            order_id,
            server_name: input.server_name,
            hostname: input.hostname,
            ip_address: None,
            server_status: ServerStatus::Active,
            server_type: Some(input.server_type.unwrap_or_else(|| DEFAULT_SERVER_TYPE.to_string())),
            vcpu: Some(vcpu),
            ram_gb,
            storage_gb,
            bandwidth_gb: Some(bandwidth_gb),
            operating_system: input.operating_system,
            plan_id: Some(plan.id),
            plan_name: Some(plan.name),
            monthly_cost: Some(input.monthly_cost.unwrap_or(plan.monthly_price)),
            billing_cycle: Some(input.billing_cycle.unwrap_or_else(|| billing::BillingCycle::Monthly.as_str().to_string())),
            created_date: Some(created),
            expiry_date: Some(expiry),
            specs: Some(specs),
            notes: input.notes,
            created_at: created,
            updated_at: created,
        };

        let server = self.repo.insert_server(NewServer { server: row, addon_ids, service_ids }).await?;
        info!(server_id = server.id, user_id, expiry = %expiry, "server_created");
        Ok(server)
    }

    async fn apply_update(&self, server_id: i32, owner: Option<i32>, update: ServerUpdate) -> Result<Option<server::Model>, ServiceError> {
        let updated = self.repo
            .modify_server(server_id, owner, Box::new(move |s: &mut server::Model| -> Result<(), ServiceError> {
                update.apply_to(s)?;
                s.updated_at = now();
                Ok(())
            }))
            .await?;
        if let Some(s) = &updated {
            info!(server_id = s.id, "server_updated");
        }
        Ok(updated)
    }

    #[instrument(skip(self, update))]
    pub async fn update_server(&self, server_id: i32, update: ServerUpdate) -> Result<Option<server::Model>, ServiceError> {
        self.apply_update(server_id, None, update).await
    }

    #[instrument(skip(self, update))]
    pub async fn update_user_server(&self, user_id: i32, server_id: i32, update: ServerUpdate) -> Result<Option<server::Model>, ServiceError> {
        self.apply_update(server_id, Some(user_id), update).await
    }

    async fn apply_action(&self, server_id: i32, owner: Option<i32>, action: &str) -> Result<bool, ServiceError> {
        let action: ServerAction = match action.parse() {
            Ok(a) => a,
            Err(e) => {
                warn!(server_id, error = %e, "server_action_rejected");
                return Ok(false);
            }
        };
        let status = action.resulting_status();
        let updated = self.repo
            .modify_server(server_id, owner, Box::new(move |s: &mut server::Model| -> Result<(), ServiceError> {
                s.server_status = status;
                s.updated_at = now();
                Ok(())
            }))
            .await?;
        if updated.is_some() {
            info!(server_id, ?action, status = %status, "server_action_applied");
        }
        Ok(updated.is_some())
    }

    /// Apply `start`, `stop`, `restart` or `terminate`. Anything else is `false`.
    #[instrument(skip(self))]
    pub async fn perform_server_action(&self, server_id: i32, action: &str) -> Result<bool, ServiceError> {
        self.apply_action(server_id, None, action).await
    }

    #[instrument(skip(self))]
    pub async fn perform_user_server_action(&self, user_id: i32, server_id: i32, action: &str) -> Result<bool, ServiceError> {
        self.apply_action(server_id, Some(user_id), action).await
    }

    #[instrument(skip(self))]
    pub async fn delete_server(&self, server_id: i32) -> Result<bool, ServiceError> {
        let deleted = self.repo.delete_server(server_id, None).await?;
        if deleted {
            info!(server_id, "server_deleted");
        }
        Ok(deleted)
    }

    #[instrument(skip(self))]
    pub async fn delete_user_server(&self, user_id: i32, server_id: i32) -> Result<bool, ServiceError> {
        let deleted = self.repo.delete_server(server_id, Some(user_id)).await?;
        if deleted {
            info!(server_id, user_id, "server_deleted");
        }
        Ok(deleted)
    }

    /// Extend the expiry by 30 days per month, starting from now when no expiry is set.
    #[instrument(skip(self))]
    pub async fn renew_server(&self, server_id: i32, months: u32) -> Result<bool, ServiceError> {
        let days = RENEWAL_DAYS_PER_MONTH * i64::from(months);
        let renewed = self.repo
            .modify_server(server_id, None, Box::new(move |s: &mut server::Model| -> Result<(), ServiceError> {
                let at = now();
                s.expiry_date = Some(shift_days(s.expiry_date.unwrap_or(at), days)?);
                s.updated_at = at;
                Ok(())
            }))
            .await?;
        if let Some(s) = &renewed {
            info!(server_id, months, expiry = ?s.expiry_date, "server_renewed");
        }
        Ok(renewed.is_some())
    }

    pub async fn get_active_servers_count(&self) -> Result<u64, ServiceError> {
        self.repo.count_servers(ServerFilter::status(ServerStatus::Active)).await
    }

    pub async fn get_user_active_servers_count(&self, user_id: i32) -> Result<u64, ServiceError> {
        self.repo.count_servers(ServerFilter::user(user_id).with_status(ServerStatus::Active)).await
    }

    pub async fn get_user_bandwidth_used(&self, user_id: i32) -> Result<Decimal, ServiceError> {
        let active = self.get_user_active_servers_count(user_id).await?;
        Ok(Decimal::from(active) * bandwidth_per_active_server())
    }

    #[instrument(skip(self))]
    pub async fn get_user_recent_servers(&self, user_id: i32, limit: u64) -> Result<Vec<RecentServer>, ServiceError> {
        let rows = self.repo.recent_servers(user_id, limit.min(MAX_RECENT_LIMIT)).await?;
        Ok(rows.into_iter().map(RecentServer::from).collect())
    }

    #[instrument(skip(self))]
    pub async fn get_servers_expiring_soon(&self, days: i64) -> Result<Vec<server::Model>, ServiceError> {
        let threshold = shift_days(now(), days)?;
        self.repo.expiring_before(threshold).await
    }

    #[instrument(skip(self))]
    pub async fn get_server_stats(&self) -> Result<ServerStats, ServiceError> {
        let count = |status| self.repo.count_servers(ServerFilter::status(status));
        let total_servers = self.repo.count_servers(ServerFilter::all()).await?;
        let active_servers = count(ServerStatus::Active).await?;
        let stopped_servers = count(ServerStatus::Stopped).await?;
        let provisioning_servers = count(ServerStatus::Provisioning).await?;
        let terminated_servers = count(ServerStatus::Terminated).await?;
        let average_monthly_cost = self.repo
            .average_monthly_cost()
            .await?
            .map(|avg| avg.round_dp(2))
            .unwrap_or(Decimal::ZERO);

        Ok(ServerStats {
            total_servers,
            active_servers,
            stopped_servers,
            provisioning_servers,
            terminated_servers,
            total_bandwidth_used: Decimal::from(active_servers) * bandwidth_per_active_server(),
            average_monthly_cost,
        })
    }

    #[instrument(skip(self))]
    pub async fn get_user_server_stats(&self, user_id: i32) -> Result<UserServerStats, ServiceError> {
        let total_servers = self.repo.count_servers(ServerFilter::user(user_id)).await?;
        let active_servers = self.get_user_active_servers_count(user_id).await?;
        let total_monthly_cost = self.repo
            .total_monthly_cost(ServerFilter::user(user_id).with_status(ServerStatus::Active))
            .await?
            .unwrap_or(Decimal::ZERO);

        Ok(UserServerStats {
            total_servers,
            active_servers,
            total_monthly_cost,
            bandwidth_used: Decimal::from(active_servers) * bandwidth_per_active_server(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use crate::servers::repository::mock::MockServerRepository;
    use models::{addon, catalog_service, hosting_plan};

    fn plan() -> hosting_plan::Model {
        hosting_plan::Model {
            id: 1,
            name: "Starter".into(),
            vcpu: 2,
            ram_gb: 4,
            storage_gb: 80,
            bandwidth_gb: 2000,
            monthly_price: Decimal::new(1999, 2),
            is_active: true,
            created_at: now(),
        }
    }

    fn backup_addon() -> addon::Model {
        addon::Model {
            id: 10,
            name: "Daily backup".into(),
            category: addon::AddonCategory::Backup,
            price: Decimal::new(500, 2),
            description: None,
            is_active: true,
        }
    }

    fn monitoring() -> catalog_service::Model {
        catalog_service::Model {
            id: 20,
            name: "Monitoring".into(),
            price: Decimal::new(300, 2),
            description: Some("24/7 checks".into()),
            is_active: true,
        }
    }

    fn svc() -> ServerService<MockServerRepository> {
        let repo = MockServerRepository::new()
            .with_plan(plan())
            .with_addon(backup_addon())
            .with_service(monitoring());
        ServerService::new(Arc::new(repo))
    }

    fn input(name: &str) -> ServerCreate {
        ServerCreate {
            server_name: name.into(),
            operating_system: "ubuntu-24.04".into(),
            plan_id: 1,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_uses_plan_defaults_and_monthly_cycle() {
        let svc = svc();
        let s = svc.create_user_server(7, input("web-01"), Some(3)).await.unwrap();

        assert_eq!(s.user_id, 7);
        assert_eq!(s.order_id, Some(3));
        assert_eq!(s.server_status, ServerStatus::Active);
        assert_eq!(s.server_type.as_deref(), Some("vps"));
        assert_eq!((s.vcpu, s.ram_gb, s.storage_gb, s.bandwidth_gb), (Some(2), 4, 80, Some(2000)));
        assert_eq!(s.plan_name.as_deref(), Some("Starter"));
        assert_eq!(s.monthly_cost, Some(Decimal::new(1999, 2)));
        assert_eq!(s.billing_cycle.as_deref(), Some("monthly"));

        let created = s.created_date.unwrap();
        assert_eq!(s.expiry_date.unwrap() - created, Duration::days(30));

        let specs = s.specs.unwrap();
        assert_eq!(specs["ram_gb"], 4);
        assert_eq!(specs["os"], "ubuntu-24.04");
        assert!(specs.get("addons").is_none());
    }

    #[tokio::test]
    async fn annual_cycle_expires_after_365_days() {
        let svc = svc();
        let mut req = input("db-01");
        req.billing_cycle = Some("Annually".into());
        let s = svc.create_user_server(7, req, None).await.unwrap();
        assert_eq!(s.expiry_date.unwrap() - s.created_date.unwrap(), Duration::days(365));
        // stored as supplied
        assert_eq!(s.billing_cycle.as_deref(), Some("Annually"));
    }

    #[tokio::test]
    async fn unknown_cycle_falls_back_to_thirty_days() {
        let svc = svc();
        let mut req = input("db-02");
        req.billing_cycle = Some("fortnightly".into());
        let s = svc.create_user_server(7, req, None).await.unwrap();
        assert_eq!(s.expiry_date.unwrap() - s.created_date.unwrap(), Duration::days(30));
    }

    #[tokio::test]
    async fn explicit_capacity_overrides_plan() {
        let svc = svc();
        let mut req = input("big");
        req.ram_gb = Some(64);
        req.monthly_cost = Some(Decimal::new(9900, 2));
        let s = svc.create_user_server(7, req, None).await.unwrap();
        assert_eq!(s.ram_gb, 64);
        assert_eq!(s.storage_gb, 80);
        assert_eq!(s.monthly_cost, Some(Decimal::new(9900, 2)));
        assert_eq!(s.specs.unwrap()["ram_gb"], 64);
    }

    #[tokio::test]
    async fn missing_plan_is_a_validation_error() {
        let svc = svc();
        let mut req = input("web-01");
        req.plan_id = 99;
        let err = svc.create_user_server(7, req, None).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert!(svc.get_user_servers(7).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn blank_name_is_rejected() {
        let svc = svc();
        let err = svc.create_user_server(7, input("   "), None).await.unwrap_err();
        assert!(matches!(err, ServiceError::Model(ModelError::Validation(_))));
    }

    #[tokio::test]
    async fn user_and_admin_views_share_enrichment() {
        let svc = svc();
        let mut req = input("web-01");
        req.addon_ids = vec![10, 10];
        req.service_ids = vec![20];
        let s = svc.create_user_server(7, req, None).await.unwrap();

        let mine = svc.get_user_server(7, s.id).await.unwrap().unwrap();
        assert_eq!(mine.addons, vec![backup_addon()]);
        assert_eq!(mine.services, vec![monitoring()]);

        let all = svc.get_all_servers().await.unwrap();
        assert_eq!(all, vec![mine.clone()]);
        assert_eq!(svc.get_user_servers(7).await.unwrap(), vec![mine]);
    }

    #[tokio::test]
    async fn user_scope_hides_other_users_servers() {
        let svc = svc();
        let s = svc.create_user_server(7, input("web-01"), None).await.unwrap();

        assert!(svc.get_user_server(8, s.id).await.unwrap().is_none());
        assert!(svc.update_user_server(8, s.id, ServerUpdate { notes: Some(Some("x".into())), ..Default::default() }).await.unwrap().is_none());
        assert!(!svc.perform_user_server_action(8, s.id, "stop").await.unwrap());
        assert!(!svc.delete_user_server(8, s.id).await.unwrap());
        assert!(svc.get_user_servers(8).await.unwrap().is_empty());
        // the admin view still sees it
        assert!(svc.get_server_by_id(s.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn actions_move_status() {
        let svc = svc();
        let s = svc.create_user_server(7, input("web-01"), None).await.unwrap();

        assert!(svc.perform_user_server_action(7, s.id, "stop").await.unwrap());
        assert_eq!(svc.get_server_by_id(s.id).await.unwrap().unwrap().server_status, ServerStatus::Stopped);

        assert!(svc.perform_server_action(s.id, "restart").await.unwrap());
        assert_eq!(svc.get_server_by_id(s.id).await.unwrap().unwrap().server_status, ServerStatus::Active);

        assert!(svc.perform_server_action(s.id, "terminate").await.unwrap());
        assert_eq!(svc.get_server_by_id(s.id).await.unwrap().unwrap().server_status, ServerStatus::Terminated);
    }

    #[tokio::test]
    async fn unknown_action_or_server_returns_false() {
        let svc = svc();
        let s = svc.create_user_server(7, input("web-01"), None).await.unwrap();

        assert!(!svc.perform_server_action(s.id, "reboot").await.unwrap());
        assert_eq!(svc.get_server_by_id(s.id).await.unwrap().unwrap(), s);
        assert!(!svc.perform_server_action(999, "start").await.unwrap());
    }

    #[tokio::test]
    async fn update_leaves_absent_fields_alone() {
        let svc = svc();
        let mut req = input("web-01");
        req.notes = Some("original".into());
        let s = svc.create_user_server(7, req, None).await.unwrap();

        let upd = ServerUpdate { hostname: Some(Some("web-01.example.com".into())), ..Default::default() };
        let after = svc.update_user_server(7, s.id, upd).await.unwrap().unwrap();

        assert_eq!(after.hostname.as_deref(), Some("web-01.example.com"));
        assert_eq!(after.notes.as_deref(), Some("original"));
        assert_eq!(after.server_name, s.server_name);
        assert_eq!(after.expiry_date, s.expiry_date);
        assert!(after.updated_at >= s.updated_at);
    }

    #[tokio::test]
    async fn invalid_update_keeps_row() {
        let svc = svc();
        let s = svc.create_user_server(7, input("web-01"), None).await.unwrap();
        let upd = ServerUpdate { server_name: Some("".into()), notes: Some(Some("n".into())), ..Default::default() };
        assert!(svc.update_server(s.id, upd).await.is_err());
        assert_eq!(svc.get_server_by_id(s.id).await.unwrap().unwrap(), s);
    }

    #[tokio::test]
    async fn update_missing_server_is_none() {
        let svc = svc();
        assert!(svc.update_server(42, ServerUpdate::default()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn renew_extends_from_existing_expiry() {
        let svc = svc();
        let s = svc.create_user_server(7, input("web-01"), None).await.unwrap();
        let before = s.expiry_date.unwrap();

        assert!(svc.renew_server(s.id, 3).await.unwrap());
        let after = svc.get_server_by_id(s.id).await.unwrap().unwrap().expiry_date.unwrap();
        assert_eq!(after - before, Duration::days(90));
    }

    #[tokio::test]
    async fn renew_without_expiry_starts_from_now() {
        let svc = svc();
        let s = svc.create_user_server(7, input("web-01"), None).await.unwrap();
        svc.update_server(s.id, ServerUpdate { expiry_date: Some(None), ..Default::default() }).await.unwrap();

        let start = now();
        assert!(svc.renew_server(s.id, 1).await.unwrap());
        let expiry = svc.get_server_by_id(s.id).await.unwrap().unwrap().expiry_date.unwrap();
        assert!(expiry >= start + Duration::days(30));
        assert!(expiry <= now() + Duration::days(30));

        assert!(!svc.renew_server(999, 1).await.unwrap());
    }

    #[tokio::test]
    async fn delete_reports_whether_a_row_went_away() {
        let svc = svc();
        let mut req = input("web-01");
        req.addon_ids = vec![10];
        let s = svc.create_user_server(7, req, None).await.unwrap();

        assert!(svc.delete_user_server(7, s.id).await.unwrap());
        assert!(!svc.delete_user_server(7, s.id).await.unwrap());
        assert!(!svc.delete_server(12345).await.unwrap());
        assert!(svc.get_server_by_id(s.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn stats_count_by_status() {
        let svc = svc();
        let a = svc.create_user_server(7, input("a"), None).await.unwrap();
        let b = svc.create_user_server(7, input("b"), None).await.unwrap();
        let mut cheap = input("c");
        cheap.monthly_cost = Some(Decimal::new(1000, 2));
        let c = svc.create_user_server(8, cheap, None).await.unwrap();
        svc.perform_server_action(b.id, "stop").await.unwrap();
        svc.perform_server_action(c.id, "terminate").await.unwrap();

        let stats = svc.get_server_stats().await.unwrap();
        assert_eq!(stats.total_servers, 3);
        assert_eq!(stats.active_servers, 1);
        assert_eq!(stats.stopped_servers, 1);
        assert_eq!(stats.provisioning_servers, 0);
        assert_eq!(stats.terminated_servers, 1);
        assert_eq!(stats.total_bandwidth_used, Decimal::new(24, 1));
        // (19.99 * 2 + 10.00) / 3
        assert_eq!(stats.average_monthly_cost, Decimal::new(1666, 2));

        let mine = svc.get_user_server_stats(7).await.unwrap();
        assert_eq!(mine.total_servers, 2);
        assert_eq!(mine.active_servers, 1);
        assert_eq!(mine.total_monthly_cost, Decimal::new(1999, 2));
        assert_eq!(mine.bandwidth_used, Decimal::new(24, 1));

        assert_eq!(svc.get_active_servers_count().await.unwrap(), 1);
        assert_eq!(svc.get_user_active_servers_count(8).await.unwrap(), 0);
        assert_eq!(svc.get_user_bandwidth_used(7).await.unwrap(), Decimal::new(24, 1));
        assert_eq!(svc.get_user_active_servers(7).await.unwrap(), vec![svc.get_server_by_id(a.id).await.unwrap().unwrap()]);
    }

    #[tokio::test]
    async fn empty_fleet_has_zero_stats() {
        let svc = svc();
        let stats = svc.get_server_stats().await.unwrap();
        assert_eq!(stats.total_servers, 0);
        assert_eq!(stats.average_monthly_cost, Decimal::ZERO);
        assert_eq!(svc.get_user_server_stats(1).await.unwrap().total_monthly_cost, Decimal::ZERO);
    }

    #[tokio::test]
    async fn recent_servers_are_newest_first_and_limited() {
        let svc = svc();
        for name in ["a", "b", "c"] {
            svc.create_user_server(7, input(name), None).await.unwrap();
        }
        let recent = svc.get_user_recent_servers(7, 2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].name, "c");
        assert_eq!(recent[1].name, "b");
        assert_eq!(recent[0].plan.as_deref(), Some("Starter"));
        assert_eq!(recent[0].status, ServerStatus::Active);
    }

    #[tokio::test]
    async fn expiring_soon_only_lists_active_servers_in_window() {
        let svc = svc();
        let soon = svc.create_user_server(7, input("soon"), None).await.unwrap();
        let stopped = svc.create_user_server(7, input("stopped"), None).await.unwrap();
        let _later = svc.create_user_server(7, input("later"), None).await.unwrap();

        let in_three_days = Some(now() + Duration::days(3));
        for id in [soon.id, stopped.id] {
            svc.update_server(id, ServerUpdate { expiry_date: Some(in_three_days), ..Default::default() }).await.unwrap();
        }
        svc.perform_server_action(stopped.id, "stop").await.unwrap();

        let expiring = svc.get_servers_expiring_soon(DEFAULT_EXPIRING_DAYS).await.unwrap();
        assert_eq!(expiring.iter().map(|s| s.id).collect::<Vec<_>>(), vec![soon.id]);
    }

    #[tokio::test]
    async fn renew_past_calendar_range_is_rejected_and_row_kept() {
        let svc = svc();
        let s = svc.create_user_server(7, input("web-01"), None).await.unwrap();

        let err = svc.renew_server(s.id, 4_000_000).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(svc.get_server_by_id(s.id).await.unwrap().unwrap(), s);

        // the repository is still usable afterwards
        assert!(svc.renew_server(s.id, 1).await.unwrap());
        assert!(svc.renew_server(s.id, u32::MAX).await.is_err());
    }

    #[tokio::test]
    async fn expiring_window_out_of_range_is_rejected() {
        let svc = svc();
        for days in [i64::MAX / 1000, i64::MIN / 1000, 1_000_000_000] {
            let err = svc.get_servers_expiring_soon(days).await.unwrap_err();
            assert!(matches!(err, ServiceError::Validation(_)), "days = {}", days);
        }
        assert!(svc.get_servers_expiring_soon(0).await.unwrap().is_empty());
        assert!(svc.get_servers_expiring_soon(-30).await.is_ok());
    }

    #[tokio::test]
    async fn recent_limit_is_clamped() {
        let svc = svc();
        for i in 0..3 {
            svc.create_user_server(7, input(&format!("s{}", i)), None).await.unwrap();
        }
        assert_eq!(svc.get_user_recent_servers(7, u64::MAX).await.unwrap().len(), 3);
        assert!(svc.get_user_recent_servers(7, 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_link_ids_fail_validation_without_writing() {
        let svc = svc();
        let mut req = input("web-01");
        req.addon_ids = vec![10, 999];
        let err = svc.create_user_server(7, req, None).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ref m) if m.contains("999")));

        let mut req = input("web-02");
        req.service_ids = vec![404];
        assert!(matches!(svc.create_user_server(7, req, None).await, Err(ServiceError::Validation(_))));

        assert!(svc.get_user_servers(7).await.unwrap().is_empty());
    }
}
