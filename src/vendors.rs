//! Built-in vendor profiles.
//!
//! Both vendors run through the same pipeline; everything that differs
//! between them lives in these profiles.

use crate::config::{CategoryProfile, HeaderSkipStrategy, LabelRule, TableSignature, VendorProfile};
use crate::constants::{MS_GOLD, TTT_BULLION};
use crate::types::{Category, Sides};

pub fn builtin_profiles() -> Vec<VendorProfile> {
    vec![ttt_bullion(), ms_gold()]
}

/// Single gold board; the silver board further down the page must not match.
pub fn ttt_bullion() -> VendorProfile {
    VendorProfile {
        vendor_id: TTT_BULLION.to_string(),
        display_name: "TTTBullion".to_string(),
        url: "https://www.tttbullion.com/".to_string(),
        header_skip: HeaderSkipStrategy::ByPosition,
        purity_tokens: Vec::new(),
        primary_category: Some(Category::OurRates),
        categories: vec![CategoryProfile {
            category: Category::OurRates,
            sides: Sides::TwoSided,
            signature: TableSignature::new(&["Gold"], &["Silver"]),
            fallback_signature: None,
            header_tokens: vec!["Gold".to_string(), "DETAILS".to_string()],
        }],
        label_rules: Vec::new(),
    }
}

/// Buy/sell board plus a buy-only board keyed by purity.
pub fn ms_gold() -> VendorProfile {
    let banner = vec!["DETAILS".to_string(), "WE BUY".to_string()];
    VendorProfile {
        vendor_id: MS_GOLD.to_string(),
        display_name: "MSGold".to_string(),
        url: "https://www.msgold.com.my/".to_string(),
        header_skip: HeaderSkipStrategy::ByContentFilter,
        purity_tokens: ["999.9", "999", "916", "835", "750", "375"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        primary_category: None,
        categories: vec![
            CategoryProfile {
                category: Category::OurRates,
                sides: Sides::TwoSided,
                signature: TableSignature::new(&["WE BUY", "WE SELL"], &[]),
                fallback_signature: None,
                header_tokens: banner.clone(),
            },
            CategoryProfile {
                category: Category::CustomerSell,
                sides: Sides::OneSided,
                signature: TableSignature::new(&["WE BUY"], &["WE SELL"]),
                fallback_signature: None,
                header_tokens: banner,
            },
        ],
        label_rules: vec![
            LabelRule::new(&["USD", "oz"], "999.9 Gold USD / Oz", Some(Category::OurRates)),
            LabelRule::new(&["MYR", "kg"], "999.9 Gold MYR / KG", Some(Category::OurRates)),
            LabelRule::new(&["MYR", "tael"], "999.9 Gold MYR / Tael", Some(Category::OurRates)),
            LabelRule::new(&["MYR", "g"], "999.9 Gold MYR / Gram", Some(Category::OurRates)),
            LabelRule::new(&["USD", "MYR"], "USD / MYR", Some(Category::OurRates)),
            LabelRule::new(&[], "{purity} MYR / Gram", Some(Category::CustomerSell)),
        ],
    }
}
