//! Idempotency keys for gateway calls
//!
//! Keys are derived only from stable ids and attempt markers. A crashed job
//! that is re-run produces the same key and the gateway deduplicates it.

/// Hold for the main appointment item
pub fn authorization(appointment_id: &str, attempt: u32) -> String {
    format!("auth-{}-{}", appointment_id, attempt)
}

/// Hold for an extension block at item position `block`
pub fn additional_block(appointment_id: &str, block: u32, attempt: u32) -> String {
    format!("auth-{}-block{}-{}", appointment_id, block, attempt)
}

pub fn capture(item_id: &str, is_second_attempt: bool) -> String {
    format!("capture-{}-{}", item_id, if is_second_attempt { 2 } else { 1 })
}

pub fn cancel(external_id: &str) -> String {
    format!("cancel-{}", external_id)
}

pub fn transfer(appointment_id: &str, attempt: u32) -> String {
    format!("transfer-{}-{}", appointment_id, attempt)
}

/// Instant or payout-network payout of the interpreter's item
pub fn payout(appointment_id: &str, attempt: u32) -> String {
    format!("payout-{}-{}", appointment_id, attempt)
}
