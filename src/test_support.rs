//! In-memory gateways for orchestrator, automation and HTTP tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;

use crate::error::AppError;
use crate::planning::{PendingFilter, PlanningDate, PlanningRecord};
use crate::sankhya::{OrderCreation, OrderService};
use crate::store::PlanningStore;

pub fn record(nuplan: i64, codprod: i64, qtdplan: f64) -> PlanningRecord {
    PlanningRecord {
        nuplan,
        codprod,
        qtdplan,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkBehavior {
    /// The update touches no row.
    NoRows,
    /// The store fails outside the database (e.g. connection lost).
    Fault,
}

/// Date and arm given to rows built with [`FakeStore::new`].
pub const DEFAULT_DATE: &str = "2025-06-02";
pub const DEFAULT_BRACO: i32 = 2;

struct Row {
    date: PlanningDate,
    braco: i32,
    round: i32,
    record: PlanningRecord,
    idiproc: Option<i64>,
}

impl Row {
    fn matches(&self, filter: &PendingFilter) -> bool {
        self.idiproc.is_none()
            && self.date == filter.date
            && self.braco == filter.braco
            && (filter.rounds.first..=filter.rounds.last).contains(&self.round)
    }
}

/// Planning table filtered like `AD_PLAN`; linked rows stop being pending.
pub struct FakeStore {
    rows: Mutex<Vec<Row>>,
    link_behavior: HashMap<i64, LinkBehavior>,
    connect_ok: bool,
    ping_ok: bool,
    batch_ok: bool,
    connected: bool,
    disconnects: usize,
    fetch_filters: Mutex<Vec<PendingFilter>>,
    linked: Mutex<Vec<(i64, i64)>>,
    batches: Mutex<Vec<(Vec<i64>, i32)>>,
}

impl FakeStore {
    /// Rows for `DEFAULT_DATE` and `DEFAULT_BRACO`, keyed by round.
    pub fn new(rows: Vec<(i32, PlanningRecord)>) -> Self {
        let date = PlanningDate::parse(DEFAULT_DATE).unwrap();
        Self {
            rows: Mutex::new(
                rows.into_iter()
                    .map(|(round, record)| Row {
                        date,
                        braco: DEFAULT_BRACO,
                        round,
                        record,
                        idiproc: None,
                    })
                    .collect(),
            ),
            link_behavior: HashMap::new(),
            connect_ok: true,
            ping_ok: true,
            batch_ok: true,
            connected: false,
            disconnects: 0,
            fetch_filters: Mutex::new(Vec::new()),
            linked: Mutex::new(Vec::new()),
            batches: Mutex::new(Vec::new()),
        }
    }

    /// Adds a row for another date or arm.
    pub fn row(self, date: &str, braco: i32, round: i32, record: PlanningRecord) -> Self {
        self.rows.lock().unwrap().push(Row {
            date: PlanningDate::parse(date).unwrap(),
            braco,
            round,
            record,
            idiproc: None,
        });
        self
    }

    pub fn link_behavior(mut self, nuplan: i64, behavior: LinkBehavior) -> Self {
        self.link_behavior.insert(nuplan, behavior);
        self
    }

    pub fn failing_batch(mut self) -> Self {
        self.batch_ok = false;
        self
    }

    pub fn failing_connect(mut self) -> Self {
        self.connect_ok = false;
        self
    }

    pub fn failing_ping(mut self) -> Self {
        self.ping_ok = false;
        self
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn disconnects(&self) -> usize {
        self.disconnects
    }

    pub fn fetch_filters(&self) -> Vec<PendingFilter> {
        self.fetch_filters.lock().unwrap().clone()
    }

    pub fn linked(&self) -> Vec<(i64, i64)> {
        self.linked.lock().unwrap().clone()
    }

    pub fn batches(&self) -> Vec<(Vec<i64>, i32)> {
        self.batches.lock().unwrap().clone()
    }

    fn pending(&self, filter: &PendingFilter) -> Vec<PlanningRecord> {
        let mut pending: Vec<PlanningRecord> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|row| row.matches(filter))
            .map(|row| row.record.clone())
            .collect();
        pending.sort_by_key(|rec| rec.nuplan);
        pending
    }
}

#[async_trait]
impl PlanningStore for FakeStore {
    async fn connect(&mut self) -> bool {
        self.connected = self.connect_ok;
        self.connect_ok
    }

    async fn disconnect(&mut self) {
        self.connected = false;
        self.disconnects += 1;
    }

    async fn test_connection(&self) -> bool {
        self.connected && self.ping_ok
    }

    async fn count_pending(&self, filter: &PendingFilter) -> Result<u64, AppError> {
        Ok(self.pending(filter).len() as u64)
    }

    async fn fetch_pending(&self, filter: &PendingFilter) -> Result<Vec<PlanningRecord>, AppError> {
        self.fetch_filters.lock().unwrap().push(*filter);
        Ok(self.pending(filter))
    }

    async fn link_order(&self, nuplan: i64, idiproc: i64) -> Result<bool, AppError> {
        match self.link_behavior.get(&nuplan) {
            Some(LinkBehavior::NoRows) => return Ok(false),
            Some(LinkBehavior::Fault) => {
                return Err(AppError::not_connected("conexão perdida"));
            }
            None => {}
        }
        let mut rows = self.rows.lock().unwrap();
        match rows.iter_mut().find(|row| row.record.nuplan == nuplan) {
            Some(row) => {
                row.idiproc = Some(idiproc);
                self.linked.lock().unwrap().push((nuplan, idiproc));
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn run_batch_procedure(&self, idiprocs: &[i64], braco: i32) -> Result<bool, AppError> {
        if idiprocs.is_empty() {
            return Ok(true);
        }
        self.batches.lock().unwrap().push((idiprocs.to_vec(), braco));
        Ok(self.batch_ok)
    }
}

/// Remote order service answering from a script keyed by product code.
/// Unscripted products get sequential identifiers starting at 1000.
pub struct FakeOrders {
    auth_ok: bool,
    auth_limit: Option<usize>,
    test_ok: bool,
    responses: HashMap<i64, OrderCreation>,
    next_id: AtomicI64,
    session_active: bool,
    authentications: usize,
    logouts: usize,
    submissions: Mutex<Vec<(i64, f64)>>,
}

impl FakeOrders {
    pub fn new() -> Self {
        Self {
            auth_ok: true,
            auth_limit: None,
            test_ok: true,
            responses: HashMap::new(),
            next_id: AtomicI64::new(1000),
            session_active: false,
            authentications: 0,
            logouts: 0,
            submissions: Mutex::new(Vec::new()),
        }
    }

    pub fn respond(mut self, product_code: i64, creation: OrderCreation) -> Self {
        self.responses.insert(product_code, creation);
        self
    }

    pub fn failing_auth(mut self) -> Self {
        self.auth_ok = false;
        self
    }

    /// Authentication succeeds only for the first `limit` attempts.
    pub fn auth_limit(mut self, limit: usize) -> Self {
        self.auth_limit = Some(limit);
        self
    }

    pub fn failing_test(mut self) -> Self {
        self.test_ok = false;
        self
    }

    pub fn authentications(&self) -> usize {
        self.authentications
    }

    pub fn logouts(&self) -> usize {
        self.logouts
    }

    pub fn has_session(&self) -> bool {
        self.session_active
    }

    pub fn submissions(&self) -> Vec<(i64, f64)> {
        self.submissions.lock().unwrap().clone()
    }
}

#[async_trait]
impl OrderService for FakeOrders {
    async fn authenticate(&mut self) -> bool {
        self.authentications += 1;
        let within_limit = self
            .auth_limit
            .is_none_or(|limit| self.authentications <= limit);
        self.session_active = self.auth_ok && within_limit;
        self.session_active
    }

    async fn test_connection(&mut self) -> bool {
        let ok = self.test_ok && self.authenticate().await;
        self.logout().await;
        ok
    }

    async fn create_production_order(&self, product_code: i64, lot_size: f64) -> OrderCreation {
        self.submissions.lock().unwrap().push((product_code, lot_size));
        if !self.session_active {
            return OrderCreation::failed("no active session");
        }
        self.responses.get(&product_code).cloned().unwrap_or_else(|| {
            OrderCreation::created(self.next_id.fetch_add(1, Ordering::SeqCst))
        })
    }

    async fn logout(&mut self) {
        if self.session_active {
            self.logouts += 1;
        }
        self.session_active = false;
    }
}
