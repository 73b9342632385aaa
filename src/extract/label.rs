use crate::config::{LabelRule, VendorProfile};
use crate::constants::PURITY_PLACEHOLDER;
use crate::types::Category;
use tracing::debug;

/// Canonical name and purity for one raw row label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedLabel {
    pub detail_name: String,
    pub purity: Option<String>,
}

/// Maps vendor row labels onto the canonical naming scheme.
///
/// Rules are evaluated in order and the first whose tokens are all present
/// wins. Unmatched labels come back whitespace-normalized so new rows still
/// surface instead of being dropped.
pub struct LabelNormalizer<'a> {
    rules: &'a [LabelRule],
    /// Longest literal first; ties keep configured order.
    purity_tokens: Vec<&'a str>,
}

impl<'a> LabelNormalizer<'a> {
    pub fn for_vendor(profile: &'a VendorProfile) -> Self {
        let mut purity_tokens: Vec<&str> = profile.purity_tokens.iter().map(String::as_str).collect();
        // stable sort keeps "999.9" ahead of an equally long token listed later
        purity_tokens.sort_by(|a, b| b.len().cmp(&a.len()));
        Self {
            rules: &profile.label_rules,
            purity_tokens,
        }
    }

    pub fn normalize(&self, category: Category, raw_label: &str) -> NormalizedLabel {
        let label = collapse_whitespace(raw_label);
        let purity = self.purity_of(&label);

        for rule in self.rules {
            if rule.category.is_some_and(|c| c != category) {
                continue;
            }
            if !rule.tokens.iter().all(|t| label.contains(t.as_str())) {
                continue;
            }
            let templated = rule.output.contains(PURITY_PLACEHOLDER);
            match (&purity, templated) {
                (None, true) => continue,
                (Some(p), true) => {
                    return NormalizedLabel {
                        detail_name: rule.output.replace(PURITY_PLACEHOLDER, p),
                        purity,
                    };
                }
                (_, false) => {
                    return NormalizedLabel {
                        detail_name: rule.output.clone(),
                        purity,
                    };
                }
            }
        }

        debug!("No label rule matched '{}'; keeping it as is", label);
        NormalizedLabel { detail_name: label, purity }
    }

    /// The longest purity token found in the label.
    pub fn purity_of(&self, label: &str) -> Option<String> {
        self.purity_tokens
            .iter()
            .find(|token| label.contains(**token))
            .map(|token| token.to_string())
    }
}

/// Trims and folds every internal whitespace run into one space.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
