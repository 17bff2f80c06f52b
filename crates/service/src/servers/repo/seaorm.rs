use rust_decimal::Decimal;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::{Expr, Func, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, NotSet, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Select, Set, TransactionTrait,
};

use models::{addon, catalog_service, hosting_plan, server, server_addon, server_service};

use crate::errors::ServiceError;
use crate::servers::domain::{Attachments, NewServer, ServerFilter};
use crate::servers::repository::{ServerChange, ServerRepository};

pub struct SeaOrmServerRepository {
    pub db: DatabaseConnection,
}

impl SeaOrmServerRepository {
    pub fn new(db: DatabaseConnection) -> Self { Self { db } }
}

/// First id of `wanted` that `known` does not contain.
fn first_missing(wanted: &[i32], known: &[i32]) -> Option<i32> {
    wanted.iter().copied().find(|id| !known.contains(id))
}

fn filtered(filter: ServerFilter) -> Select<server::Entity> {
    let mut q = server::Entity::find();
    if let Some(uid) = filter.user_id {
        q = q.filter(server::Column::UserId.eq(uid));
    }
    if let Some(status) = filter.status {
        q = q.filter(server::Column::ServerStatus.eq(status));
    }
    q
}

fn owned(server_id: i32, owner: Option<i32>) -> Select<server::Entity> {
    let q = server::Entity::find_by_id(server_id);
    match owner {
        Some(uid) => q.filter(server::Column::UserId.eq(uid)),
        None => q,
    }
}

/// Every column set from `m`; callers decide what to do with the key.
fn full_row(m: server::Model) -> server::ActiveModel {
    server::ActiveModel {
        id: Set(m.id),
        user_id: Set(m.user_id),
        order_id: Set(m.order_id),
        server_name: Set(m.server_name),
        hostname: Set(m.hostname),
        ip_address: Set(m.ip_address),
        server_status: Set(m.server_status),
        server_type: Set(m.server_type),
        vcpu: Set(m.vcpu),
        ram_gb: Set(m.ram_gb),
        storage_gb: Set(m.storage_gb),
        bandwidth_gb: Set(m.bandwidth_gb),
        operating_system: Set(m.operating_system),
        plan_id: Set(m.plan_id),
        plan_name: Set(m.plan_name),
        monthly_cost: Set(m.monthly_cost),
        billing_cycle: Set(m.billing_cycle),
        created_date: Set(m.created_date),
        expiry_date: Set(m.expiry_date),
        specs: Set(m.specs),
        notes: Set(m.notes),
        created_at: Set(m.created_at),
        updated_at: Set(m.updated_at),
    }
}

#[async_trait::async_trait]
impl ServerRepository for SeaOrmServerRepository {
    async fn find_plan(&self, plan_id: i32) -> Result<Option<hosting_plan::Model>, ServiceError> {
        hosting_plan::Entity::find_by_id(plan_id).one(&self.db).await.map_err(ServiceError::from)
    }

    async fn find_server(&self, server_id: i32, owner: Option<i32>) -> Result<Option<server::Model>, ServiceError> {
        owned(server_id, owner).one(&self.db).await.map_err(ServiceError::from)
    }

    async fn list_servers(&self, filter: ServerFilter) -> Result<Vec<server::Model>, ServiceError> {
        filtered(filter)
            .order_by_asc(server::Column::Id)
            .all(&self.db)
            .await
            .map_err(ServiceError::from)
    }

    async fn recent_servers(&self, user_id: i32, limit: u64) -> Result<Vec<server::Model>, ServiceError> {
        filtered(ServerFilter::user(user_id))
            .order_by_desc(server::Column::CreatedAt)
            .order_by_desc(server::Column::Id)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(ServiceError::from)
    }

    async fn expiring_before(&self, threshold: DateTimeWithTimeZone) -> Result<Vec<server::Model>, ServiceError> {
        filtered(ServerFilter::status(server::ServerStatus::Active))
            .filter(server::Column::ExpiryDate.lte(threshold))
            .order_by_asc(server::Column::ExpiryDate)
            .all(&self.db)
            .await
            .map_err(ServiceError::from)
    }

    async fn insert_server(&self, new: NewServer) -> Result<server::Model, ServiceError> {
        let txn = self.db.begin().await?;

        if !new.addon_ids.is_empty() {
            let known: Vec<i32> = addon::Entity::find()
                .select_only()
                .column(addon::Column::Id)
                .filter(addon::Column::Id.is_in(new.addon_ids.clone()))
                .into_tuple()
                .all(&txn)
                .await?;
            if let Some(missing) = first_missing(&new.addon_ids, &known) {
                txn.rollback().await?;
                return Err(ServiceError::Validation(format!("addon {} does not exist", missing)));
            }
        }
        if !new.service_ids.is_empty() {
            let known: Vec<i32> = catalog_service::Entity::find()
                .select_only()
                .column(catalog_service::Column::Id)
                .filter(catalog_service::Column::Id.is_in(new.service_ids.clone()))
                .into_tuple()
                .all(&txn)
                .await?;
            if let Some(missing) = first_missing(&new.service_ids, &known) {
                txn.rollback().await?;
                return Err(ServiceError::Validation(format!("service {} does not exist", missing)));
            }
        }

        let mut am = full_row(new.server);
        am.id = NotSet;
        let created = am.insert(&txn).await?;

        if !new.addon_ids.is_empty() {
            let links = new.addon_ids.iter().map(|&addon_id| server_addon::ActiveModel {
                server_id: Set(created.id),
                addon_id: Set(addon_id),
            });
            server_addon::Entity::insert_many(links)
                .exec_without_returning(&txn)
                .await?;
        }
        if !new.service_ids.is_empty() {
            let links = new.service_ids.iter().map(|&service_id| server_service::ActiveModel {
                server_id: Set(created.id),
                service_id: Set(service_id),
            });
            server_service::Entity::insert_many(links)
                .exec_without_returning(&txn)
                .await?;
        }

        txn.commit().await?;
        Ok(created)
    }

    async fn modify_server(&self, server_id: i32, owner: Option<i32>, change: ServerChange) -> Result<Option<server::Model>, ServiceError> {
        let txn = self.db.begin().await?;
        let Some(mut row) = owned(server_id, owner).lock_exclusive().one(&txn).await? else {
            txn.rollback().await?;
            return Ok(None);
        };
        // an Err here drops the transaction, which rolls it back
        change(&mut row)?;
        let saved = full_row(row).update(&txn).await?;
        txn.commit().await?;
        Ok(Some(saved))
    }

    async fn delete_server(&self, server_id: i32, owner: Option<i32>) -> Result<bool, ServiceError> {
        let mut q = server::Entity::delete_many().filter(server::Column::Id.eq(server_id));
        if let Some(uid) = owner {
            q = q.filter(server::Column::UserId.eq(uid));
        }
        let res = q.exec(&self.db).await?;
        Ok(res.rows_affected > 0)
    }

    async fn attachments(&self, server_ids: &[i32]) -> Result<Attachments, ServiceError> {
        let mut out = Attachments::default();
        if server_ids.is_empty() {
            return Ok(out);
        }

        let addon_rows = server_addon::Entity::find()
            .filter(server_addon::Column::ServerId.is_in(server_ids.to_vec()))
            .order_by_asc(server_addon::Column::AddonId)
            .find_also_related(addon::Entity)
            .all(&self.db)
            .await?;
        for (link, addon) in addon_rows {
            if let Some(addon) = addon {
                out.addons.entry(link.server_id).or_default().push(addon);
            }
        }

        let service_rows = server_service::Entity::find()
            .filter(server_service::Column::ServerId.is_in(server_ids.to_vec()))
            .order_by_asc(server_service::Column::ServiceId)
            .find_also_related(catalog_service::Entity)
            .all(&self.db)
            .await?;
        for (link, service) in service_rows {
            if let Some(service) = service {
                out.services.entry(link.server_id).or_default().push(service);
            }
        }

        Ok(out)
    }

    async fn count_servers(&self, filter: ServerFilter) -> Result<u64, ServiceError> {
        filtered(filter).count(&self.db).await.map_err(ServiceError::from)
    }

    async fn average_monthly_cost(&self) -> Result<Option<Decimal>, ServiceError> {
        let avg = server::Entity::find()
            .select_only()
            .column_as(SimpleExpr::from(Func::avg(Expr::col(server::Column::MonthlyCost))), "avg_cost")
            .into_tuple::<Option<Decimal>>()
            .one(&self.db)
            .await?;
        Ok(avg.flatten())
    }

    async fn total_monthly_cost(&self, filter: ServerFilter) -> Result<Option<Decimal>, ServiceError> {
        let total = filtered(filter)
            .select_only()
            .column_as(SimpleExpr::from(Func::sum(Expr::col(server::Column::MonthlyCost))), "total_cost")
            .into_tuple::<Option<Decimal>>()
            .one(&self.db)
            .await?;
        Ok(total.flatten())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Arc;

    use chrono::{Duration, Utc};
    use models::{addon::AddonCategory, hosting_plan::NewPlan};

    use crate::servers::{ServerCreate, ServerService, ServerUpdate};
    use crate::test_support::get_db;

    static NEXT_USER: AtomicI32 = AtomicI32::new(0);

    fn unique_user() -> i32 {
        1_000_000 + (std::process::id() % 10_000) as i32 * 100 + NEXT_USER.fetch_add(1, Ordering::Relaxed)
    }

    /// Catalog rows created by one test, removed again by [`Fixture::cleanup`].
    struct Fixture {
        user: i32,
        plan: hosting_plan::Model,
        addons: Vec<addon::Model>,
        services: Vec<catalog_service::Model>,
        orders: Vec<i32>,
    }

    impl Fixture {
        async fn new(db: &DatabaseConnection, tag: &str, price: Decimal) -> Self {
            let name = format!("repo-test-{}", tag);
            let plan = hosting_plan::create(db, NewPlan {
                name: &name,
                vcpu: 2,
                ram_gb: 4,
                storage_gb: 80,
                bandwidth_gb: 1000,
                monthly_price: price,
            })
            .await
            .unwrap();
            Self { user: unique_user(), plan, addons: vec![], services: vec![], orders: vec![] }
        }

        fn input(&self, name: &str) -> ServerCreate {
            ServerCreate {
                server_name: name.into(),
                operating_system: "debian-12".into(),
                plan_id: self.plan.id,
                ..Default::default()
            }
        }

        async fn cleanup(self, db: &DatabaseConnection) {
            server::Entity::delete_many().filter(server::Column::UserId.eq(self.user)).exec(db).await.unwrap();
            for a in self.addons {
                addon::Entity::delete_by_id(a.id).exec(db).await.unwrap();
            }
            for c in self.services {
                catalog_service::Entity::delete_by_id(c.id).exec(db).await.unwrap();
            }
            for id in self.orders {
                models::order::Entity::delete_by_id(id).exec(db).await.unwrap();
            }
            hosting_plan::Entity::delete_by_id(self.plan.id).exec(db).await.unwrap();
        }
    }

    fn service(db: &DatabaseConnection) -> ServerService<SeaOrmServerRepository> {
        ServerService::new(Arc::new(SeaOrmServerRepository::new(db.clone())))
    }

    #[tokio::test]
    async fn create_links_and_enriches_in_both_views() {
        let Some(db) = get_db().await else { return };
        let mut fx = Fixture::new(&db, "links", Decimal::new(1250, 2)).await;
        let backup = addon::create(&db, "repo-test-backup", AddonCategory::Backup, Decimal::new(300, 2)).await.unwrap();
        let cpu = addon::create(&db, "repo-test-cpu", AddonCategory::Cpu, Decimal::new(700, 2)).await.unwrap();
        let monitoring = catalog_service::create(&db, "repo-test-monitoring", Decimal::new(200, 2)).await.unwrap();
        let order = models::order::create(&db, fx.user, Decimal::new(2450, 2)).await.unwrap();
        fx.addons = vec![backup.clone(), cpu.clone()];
        fx.services = vec![monitoring.clone()];
        fx.orders = vec![order.id];

        let svc = service(&db);
        let mut input = fx.input("repo-web");
        input.billing_cycle = Some("quarterly".into());
        input.addon_ids = vec![backup.id, cpu.id];
        input.service_ids = vec![monitoring.id];
        let created = svc.create_user_server(fx.user, input, Some(order.id)).await.unwrap();
        assert_eq!(created.order_id, Some(order.id));
        assert_eq!(created.expiry_date.unwrap() - created.created_date.unwrap(), Duration::days(90));

        let mine = svc.get_user_server(fx.user, created.id).await.unwrap().unwrap();
        let ids: Vec<i32> = mine.addons.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![backup.id, cpu.id]);
        assert_eq!(mine.services, vec![monitoring.clone()]);

        let admin = svc.get_all_servers().await.unwrap();
        let seen = admin.into_iter().find(|d| d.server.id == created.id).unwrap();
        assert_eq!(seen.addons, mine.addons);
        assert_eq!(seen.services, mine.services);

        // link rows go with the server, catalog rows stay
        assert!(svc.delete_user_server(fx.user, created.id).await.unwrap());
        let links = server_addon::Entity::find()
            .filter(server_addon::Column::ServerId.eq(created.id))
            .count(&db)
            .await
            .unwrap();
        assert_eq!(links, 0);
        assert!(addon::Entity::find_by_id(backup.id).one(&db).await.unwrap().is_some());

        fx.cleanup(&db).await;
    }

    #[tokio::test]
    async fn unknown_link_ids_are_rejected_before_any_write() {
        let Some(db) = get_db().await else { return };
        let mut fx = Fixture::new(&db, "unknown-links", Decimal::new(500, 2)).await;
        let backup = addon::create(&db, "repo-test-known", AddonCategory::Backup, Decimal::new(300, 2)).await.unwrap();
        fx.addons = vec![backup.clone()];
        let svc = service(&db);

        let mut input = fx.input("repo-bad-addon");
        input.addon_ids = vec![backup.id, i32::MAX];
        let err = svc.create_user_server(fx.user, input, None).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(ref m) if m.contains(&i32::MAX.to_string())));

        let mut input = fx.input("repo-bad-service");
        input.service_ids = vec![i32::MAX];
        assert!(matches!(svc.create_user_server(fx.user, input, None).await, Err(ServiceError::Validation(_))));

        assert!(svc.get_user_servers(fx.user).await.unwrap().is_empty());
        fx.cleanup(&db).await;
    }

    #[tokio::test]
    async fn modify_is_scoped_and_persists() {
        let Some(db) = get_db().await else { return };
        let fx = Fixture::new(&db, "modify", Decimal::new(500, 2)).await;
        let svc = service(&db);
        let user = fx.user;
        let mut input = fx.input("repo-api");
        input.notes = Some("keep me".into());
        let s = svc.create_user_server(user, input, None).await.unwrap();

        assert!(!svc.perform_user_server_action(user + 1, s.id, "stop").await.unwrap());
        assert!(svc.perform_user_server_action(user, s.id, "stop").await.unwrap());

        let upd = ServerUpdate { ip_address: Some(Some("192.0.2.10".into())), ..Default::default() };
        let after = svc.update_user_server(user, s.id, upd).await.unwrap().unwrap();
        assert_eq!(after.server_status, server::ServerStatus::Stopped);
        assert_eq!(after.ip_address.as_deref(), Some("192.0.2.10"));
        assert_eq!(after.notes.as_deref(), Some("keep me"));

        assert!(svc.renew_server(s.id, 2).await.unwrap());
        let renewed = svc.get_server_by_id(s.id).await.unwrap().unwrap();
        assert_eq!(renewed.expiry_date.unwrap() - s.expiry_date.unwrap(), Duration::days(60));

        // an out-of-range renewal rolls back and leaves the row as it was
        assert!(matches!(svc.renew_server(s.id, 4_000_000).await, Err(ServiceError::Validation(_))));
        assert_eq!(svc.get_server_by_id(s.id).await.unwrap().unwrap().expiry_date, renewed.expiry_date);

        let stats = svc.get_user_server_stats(user).await.unwrap();
        assert_eq!(stats.total_servers, 1);
        assert_eq!(stats.active_servers, 0);
        assert_eq!(stats.total_monthly_cost, Decimal::ZERO);

        assert!(svc.delete_server(s.id).await.unwrap());
        assert!(!svc.delete_server(s.id).await.unwrap());
        fx.cleanup(&db).await;
    }

    #[tokio::test]
    async fn cost_aggregates_run_in_postgres() {
        let Some(db) = get_db().await else { return };
        let fx = Fixture::new(&db, "costs", Decimal::new(1000, 2)).await;
        let repo = SeaOrmServerRepository::new(db.clone());
        let svc = service(&db);

        let a = svc.create_user_server(fx.user, fx.input("repo-cost-a"), None).await.unwrap();
        let mut pricier = fx.input("repo-cost-b");
        pricier.monthly_cost = Some(Decimal::new(2550, 2));
        svc.create_user_server(fx.user, pricier, None).await.unwrap();
        let mut stopped = fx.input("repo-cost-c");
        stopped.monthly_cost = Some(Decimal::new(9900, 2));
        let c = svc.create_user_server(fx.user, stopped, None).await.unwrap();
        svc.perform_server_action(c.id, "stop").await.unwrap();

        let active_only = ServerFilter::user(fx.user).with_status(server::ServerStatus::Active);
        assert_eq!(repo.total_monthly_cost(active_only).await.unwrap(), Some(Decimal::new(3550, 2)));
        assert_eq!(repo.total_monthly_cost(ServerFilter::user(fx.user)).await.unwrap(), Some(Decimal::new(13450, 2)));
        assert_eq!(repo.total_monthly_cost(ServerFilter::user(fx.user + 1_000_000)).await.unwrap(), None);
        assert_eq!(repo.count_servers(ServerFilter::user(fx.user)).await.unwrap(), 3);

        // other tests share the table, so only the decode path and a sane range are checked
        let avg = repo.average_monthly_cost().await.unwrap().unwrap();
        assert!(avg > Decimal::ZERO);
        let stats = svc.get_server_stats().await.unwrap();
        assert!(stats.total_servers >= 3);
        assert_eq!(stats.average_monthly_cost, stats.average_monthly_cost.round_dp(2));

        let mine = svc.get_user_server_stats(fx.user).await.unwrap();
        assert_eq!(mine.active_servers, 2);
        assert_eq!(mine.total_monthly_cost, Decimal::new(3550, 2));
        assert_eq!(mine.bandwidth_used, Decimal::new(48, 1));
        assert!(svc.get_user_active_servers(fx.user).await.unwrap().iter().any(|s| s.id == a.id));

        fx.cleanup(&db).await;
    }

    #[tokio::test]
    async fn recent_and_expiring_queries() {
        let Some(db) = get_db().await else { return };
        let fx = Fixture::new(&db, "recent", Decimal::new(800, 2)).await;
        let svc = service(&db);

        let mut ids = vec![];
        for name in ["repo-r1", "repo-r2", "repo-r3"] {
            ids.push(svc.create_user_server(fx.user, fx.input(name), None).await.unwrap().id);
        }

        let recent = svc.get_user_recent_servers(fx.user, 2).await.unwrap();
        assert_eq!(recent.iter().map(|r| r.id).collect::<Vec<_>>(), vec![ids[2], ids[1]]);
        assert_eq!(recent[0].plan.as_deref(), Some("repo-test-recent"));
        // the limit is clamped before it reaches the query builder
        assert_eq!(svc.get_user_recent_servers(fx.user, u64::MAX).await.unwrap().len(), 3);

        let soon: Option<DateTimeWithTimeZone> = Some((Utc::now() + Duration::days(3)).into());
        for id in [ids[0], ids[1]] {
            svc.update_server(id, ServerUpdate { expiry_date: Some(soon), ..Default::default() }).await.unwrap();
        }
        svc.perform_server_action(ids[1], "stop").await.unwrap();

        let expiring: Vec<i32> = svc.get_servers_expiring_soon(7).await.unwrap().into_iter().map(|s| s.id).collect();
        assert!(expiring.contains(&ids[0]));
        assert!(!expiring.contains(&ids[1]));
        assert!(!expiring.contains(&ids[2]));
        let none_yet: Vec<i32> = svc.get_servers_expiring_soon(1).await.unwrap().into_iter().map(|s| s.id).collect();
        assert!(!none_yet.contains(&ids[0]));
        assert!(svc.get_servers_expiring_soon(i64::MAX / 1000).await.is_err());

        fx.cleanup(&db).await;
    }
}
