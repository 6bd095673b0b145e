/// Hex MD5 digest of the raw SQL text. The one hashing routine for both
/// `AuditEvent.sql_id` (spec.md §3/§6) and the validation dedup cache key
/// (spec.md §4.3) — a single call-site means the two can never drift apart.
pub fn fingerprint(sql: &str) -> String {
    format!("{:x}", md5::compute(sql.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_sql_yields_same_fingerprint() {
        assert_eq!(fingerprint("SELECT 1"), fingerprint("SELECT 1"));
    }

    #[test]
    fn different_sql_yields_different_fingerprint() {
        assert_ne!(fingerprint("SELECT 1"), fingerprint("SELECT 2"));
    }

    #[test]
    fn fingerprint_is_32_hex_chars() {
        let fp = fingerprint("SELECT 1");
        assert_eq!(fp.len(), 32);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
