use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rust_decimal::Decimal;

use appointpay::core::{AppError, Currency, Result};
use appointpay::modules::appointments::{
    AppointmentProjection, AppointmentRepository, AppointmentStatus,
};
use appointpay::modules::collaborators::{
    DepositRecharger, NotificationSender, PaymentNotification, RechargeRequest, ReceiptGenerator,
    ReceiptRequest,
};
use appointpay::modules::companies::CompanyLedger;
use appointpay::modules::gateways::{
    Authorization, AuthorizeRequest, Capture, CaptureRequest, PaymentGateway, Payout,
    PayoutNetwork, PayoutRequest, Transfer, TransferRequest,
};
use appointpay::modules::payments::{LedgerStore, LedgerTransaction, Payment, PaymentDirection};

#[derive(Debug, Clone, Default)]
struct LedgerState {
    payments: HashMap<String, Payment>,
    companies: HashMap<String, CompanyLedger>,
}

/// Ledger kept in memory; a transaction works on a copy that replaces the
/// shared state on commit and is discarded on drop
#[derive(Clone, Default)]
pub struct InMemoryLedger {
    state: Arc<Mutex<LedgerState>>,
    commits: Arc<AtomicUsize>,
    failing_commits: Arc<AtomicBool>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every commit fail, discarding the staged writes
    pub fn fail_commits(&self, fail: bool) {
        self.failing_commits.store(fail, Ordering::SeqCst);
    }

    pub fn insert_company(&self, company: CompanyLedger) {
        let mut state = self.state.lock().unwrap();
        state.companies.insert(company.id.clone(), company);
    }

    pub fn insert_payment(&self, payment: Payment) {
        let mut state = self.state.lock().unwrap();
        state.payments.insert(payment.id.clone(), payment);
    }

    pub fn company(&self, company_id: &str) -> CompanyLedger {
        self.state.lock().unwrap().companies[company_id].clone()
    }

    pub fn payment(&self, payment_id: &str) -> Payment {
        self.state.lock().unwrap().payments[payment_id].clone()
    }

    pub fn payment_for(&self, appointment_id: &str, direction: PaymentDirection) -> Option<Payment> {
        latest_payment(&self.state.lock().unwrap(), appointment_id, direction)
    }

    pub fn incoming(&self, appointment_id: &str) -> Payment {
        self.payment_for(appointment_id, PaymentDirection::Incoming)
            .expect("incoming payment")
    }

    pub fn outgoing(&self, appointment_id: &str) -> Payment {
        self.payment_for(appointment_id, PaymentDirection::Outcoming)
            .expect("outgoing payment")
    }

    pub fn payment_count(&self) -> usize {
        self.state.lock().unwrap().payments.len()
    }

    pub fn commits(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }
}

fn latest_payment(
    state: &LedgerState,
    appointment_id: &str,
    direction: PaymentDirection,
) -> Option<Payment> {
    state
        .payments
        .values()
        .filter(|payment| {
            payment.appointment_id.as_deref() == Some(appointment_id)
                && payment.direction == direction
        })
        .max_by_key(|payment| payment.created_at)
        .cloned()
}

#[async_trait]
impl LedgerStore for InMemoryLedger {
    async fn begin(&self) -> Result<Box<dyn LedgerTransaction>> {
        let staged = self.state.lock().unwrap().clone();
        Ok(Box::new(InMemoryTransaction {
            shared: Arc::clone(&self.state),
            commits: Arc::clone(&self.commits),
            failing_commits: Arc::clone(&self.failing_commits),
            staged,
        }))
    }
}

pub struct InMemoryTransaction {
    shared: Arc<Mutex<LedgerState>>,
    commits: Arc<AtomicUsize>,
    failing_commits: Arc<AtomicBool>,
    staged: LedgerState,
}

#[async_trait]
impl LedgerTransaction for InMemoryTransaction {
    async fn find_payment_by_appointment(
        &mut self,
        appointment_id: &str,
        direction: PaymentDirection,
    ) -> Result<Option<Payment>> {
        Ok(latest_payment(&self.staged, appointment_id, direction))
    }

    async fn find_company_for_update(&mut self, company_id: &str) -> Result<Option<CompanyLedger>> {
        Ok(self.staged.companies.get(company_id).cloned())
    }

    async fn update_company_balance(
        &mut self,
        company_id: &str,
        deposit_amount: Decimal,
    ) -> Result<()> {
        let company = self
            .staged
            .companies
            .get_mut(company_id)
            .ok_or_else(|| AppError::not_found(format!("Company '{}'", company_id)))?;
        company.deposit_amount = deposit_amount;
        Ok(())
    }

    async fn save_payment(&mut self, payment: &Payment) -> Result<()> {
        self.staged
            .payments
            .insert(payment.id.clone(), payment.clone());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        if self.failing_commits.load(Ordering::SeqCst) {
            return Err(AppError::internal("Failed to commit transaction: connection lost"));
        }
        *self.shared.lock().unwrap() = self.staged;
        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Write-back calls received by the appointment service
#[derive(Debug, Clone, PartialEq)]
pub enum AppointmentCall {
    CancelledPaymentFailed(String),
    PaidByClient {
        appointment_id: String,
        amount: Decimal,
    },
    ReceivedByInterpreter {
        appointment_id: String,
        amount: Decimal,
        gst_amount: Decimal,
    },
}

#[derive(Default)]
pub struct FakeAppointments {
    appointments: Mutex<HashMap<String, AppointmentProjection>>,
    calls: Mutex<Vec<AppointmentCall>>,
    fail_writes: AtomicBool,
}

impl FakeAppointments {
    pub fn insert(&self, appointment: AppointmentProjection) {
        self.appointments
            .lock()
            .unwrap()
            .insert(appointment.id.clone(), appointment);
    }

    pub fn update(&self, appointment_id: &str, change: impl FnOnce(&mut AppointmentProjection)) {
        let mut appointments = self.appointments.lock().unwrap();
        change(appointments.get_mut(appointment_id).expect("appointment"));
    }

    pub fn set_status(&self, appointment_id: &str, status: AppointmentStatus) {
        self.update(appointment_id, |appointment| appointment.status = status);
    }

    pub fn calls(&self) -> Vec<AppointmentCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn record(&self, call: AppointmentCall) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::internal("appointment service unavailable"));
        }
        self.calls.lock().unwrap().push(call);
        Ok(())
    }
}

#[async_trait]
impl AppointmentRepository for FakeAppointments {
    async fn find_projection(&self, appointment_id: &str) -> Result<Option<AppointmentProjection>> {
        Ok(self.appointments.lock().unwrap().get(appointment_id).cloned())
    }

    async fn cancel_appointment_payment_failed(&self, appointment_id: &str) -> Result<()> {
        self.record(AppointmentCall::CancelledPaymentFailed(
            appointment_id.to_string(),
        ))
    }

    async fn update_paid_by_client(
        &self,
        appointment_id: &str,
        amount: Decimal,
        _currency: Currency,
    ) -> Result<()> {
        self.record(AppointmentCall::PaidByClient {
            appointment_id: appointment_id.to_string(),
            amount,
        })
    }

    async fn update_received_by_interpreter(
        &self,
        appointment_id: &str,
        amount: Decimal,
        gst_amount: Decimal,
        _currency: Currency,
    ) -> Result<()> {
        self.record(AppointmentCall::ReceivedByInterpreter {
            appointment_id: appointment_id.to_string(),
            amount,
            gst_amount,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayOp {
    Authorize,
    Capture,
    Cancel,
    Transfer,
    Payout,
}

/// One recorded gateway call; `key` is the idempotency key, or the
/// authorization reference for cancellations
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayCall {
    pub op: GatewayOp,
    pub key: String,
    pub amount: Option<Decimal>,
}

/// Card gateway with scripted failures
#[derive(Default)]
pub struct FakeGateway {
    calls: Mutex<Vec<GatewayCall>>,
    failing: Mutex<Vec<GatewayOp>>,
    sequence: AtomicUsize,
}

impl FakeGateway {
    /// Make every call of `op` fail until [`FakeGateway::recover`]
    pub fn fail(&self, op: GatewayOp) {
        self.failing.lock().unwrap().push(op);
    }

    pub fn recover(&self, op: GatewayOp) {
        self.failing.lock().unwrap().retain(|failing| *failing != op);
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_of(&self, op: GatewayOp) -> Vec<GatewayCall> {
        self.calls()
            .into_iter()
            .filter(|call| call.op == op)
            .collect()
    }

    pub fn keys_of(&self, op: GatewayOp) -> Vec<String> {
        self.calls_of(op).into_iter().map(|call| call.key).collect()
    }

    fn call(&self, op: GatewayOp, key: &str, amount: Option<Decimal>, prefix: &str) -> Result<String> {
        self.calls.lock().unwrap().push(GatewayCall {
            op,
            key: key.to_string(),
            amount,
        });

        if self.failing.lock().unwrap().contains(&op) {
            return Err(AppError::gateway(match op {
                GatewayOp::Authorize => "card declined",
                GatewayOp::Capture => "authorization expired",
                GatewayOp::Cancel => "authorization already captured",
                GatewayOp::Transfer => "destination account restricted",
                GatewayOp::Payout => "instant payouts unavailable",
            }));
        }

        let n = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("{}_{}", prefix, n))
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn authorize(&self, request: AuthorizeRequest) -> Result<Authorization> {
        let external_id = self.call(
            GatewayOp::Authorize,
            &request.idempotency_key,
            Some(request.amount),
            "auth",
        )?;
        Ok(Authorization { external_id })
    }

    async fn capture(&self, request: CaptureRequest) -> Result<Capture> {
        let charge_ref = self.call(
            GatewayOp::Capture,
            &request.idempotency_key,
            Some(request.amount),
            "ch",
        )?;
        Ok(Capture { charge_ref })
    }

    async fn cancel_authorization(&self, external_id: &str) -> Result<()> {
        self.call(GatewayOp::Cancel, external_id, None, "cx")?;
        Ok(())
    }

    async fn transfer(&self, request: TransferRequest) -> Result<Transfer> {
        let transfer_id = self.call(
            GatewayOp::Transfer,
            &request.idempotency_key,
            Some(request.amount),
            "tr",
        )?;
        Ok(Transfer { transfer_id })
    }

    async fn payout(&self, request: PayoutRequest) -> Result<Payout> {
        let payout_id = self.call(
            GatewayOp::Payout,
            &request.idempotency_key,
            Some(request.amount),
            "po",
        )?;
        Ok(Payout { payout_id })
    }

    fn name(&self) -> &str {
        "fake-card-gateway"
    }
}

#[derive(Default)]
pub struct FakePayoutNetwork {
    requests: Mutex<Vec<PayoutRequest>>,
    failing: AtomicBool,
}

impl FakePayoutNetwork {
    pub fn fail(&self, fail: bool) {
        self.failing.store(fail, Ordering::SeqCst);
    }

    pub fn requests(&self) -> Vec<PayoutRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PayoutNetwork for FakePayoutNetwork {
    async fn payout(&self, request: PayoutRequest) -> Result<Payout> {
        let mut requests = self.requests.lock().unwrap();
        requests.push(request);
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::gateway("recipient account closed"));
        }
        Ok(Payout {
            payout_id: format!("net_{}", requests.len()),
        })
    }

    fn name(&self) -> &str {
        "fake-payout-network"
    }
}

/// Captures notifications and recharge requests
#[derive(Default)]
pub struct RecordingNotifications {
    sent: Mutex<Vec<PaymentNotification>>,
    recharges: Mutex<Vec<RechargeRequest>>,
}

impl RecordingNotifications {
    pub fn sent(&self) -> Vec<PaymentNotification> {
        self.sent.lock().unwrap().clone()
    }

    pub fn recharges(&self) -> Vec<RechargeRequest> {
        self.recharges.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSender for RecordingNotifications {
    async fn send(&self, notification: PaymentNotification) -> Result<()> {
        self.sent.lock().unwrap().push(notification);
        Ok(())
    }
}

#[async_trait]
impl DepositRecharger for RecordingNotifications {
    async fn request_recharge(&self, request: RechargeRequest) -> Result<()> {
        self.recharges.lock().unwrap().push(request);
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeReceipts {
    requests: Mutex<Vec<ReceiptRequest>>,
    failing: AtomicBool,
}

impl FakeReceipts {
    pub fn fail(&self, fail: bool) {
        self.failing.store(fail, Ordering::SeqCst);
    }

    pub fn requests(&self) -> Vec<ReceiptRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReceiptGenerator for FakeReceipts {
    async fn generate(&self, request: ReceiptRequest) -> Result<String> {
        let receipt = format!("receipt-{}", request.item_id);
        self.requests.lock().unwrap().push(request);
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::internal("receipt renderer offline"));
        }
        Ok(receipt)
    }
}
