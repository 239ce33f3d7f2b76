//! Order number generation
//!
//! Format: `ORD-<YYYYMMDDHHMMSS>-<4 random digits>`. The timestamp makes
//! numbers roughly sortable; the random suffix disambiguates same-second
//! checkouts. Uniqueness is ultimately enforced by the database index, and
//! the ledger retries on collision.

use chrono::Utc;
use rand::Rng;

/// Generate a candidate order number
pub fn generate_order_number() -> String {
    let timestamp = Utc::now().format("%Y%m%d%H%M%S");
    let suffix: u16 = rand::thread_rng().gen_range(0..10_000);
    format!("ORD-{}-{:04}", timestamp, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn has_expected_shape() {
        let number = generate_order_number();
        let parts: Vec<&str> = number.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "ORD");
        assert_eq!(parts[1].len(), 14);
        assert!(parts[1].chars().all(|c| c.is_ascii_digit()));
        assert_eq!(parts[2].len(), 4);
        assert!(parts[2].chars().all(|c| c.is_ascii_digit()));
    }
}
