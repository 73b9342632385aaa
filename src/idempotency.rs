use crate::types::RateRecord;
use sha2::{Digest, Sha256};

/// Stable SHA-256 over a batch's records, independent of when it was taken.
/// Two runs against an unchanged page log the same fingerprint.
pub fn batch_fingerprint(vendor_id: &str, records: &[RateRecord]) -> String {
    // Simple canonical string; one line per record
    let mut s = String::new();
    s.push_str(vendor_id);
    for r in records {
        s.push('\n');
        s.push_str(r.category.as_str());
        s.push('|');
        s.push_str(&r.detail_name);
        s.push('|');
        s.push_str(&r.we_buy.normalize().to_string());
        s.push('|');
        if let Some(sell) = r.we_sell { s.push_str(&sell.normalize().to_string()); }
        s.push('|');
        if let Some(p) = &r.purity { s.push_str(p); }
    }

    let mut hasher = Sha256::new();
    hasher.update(s.as_bytes());
    let out = hasher.finalize();
    hex::encode(out)
}
