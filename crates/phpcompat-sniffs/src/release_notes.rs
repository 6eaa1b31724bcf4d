//! Functions with behavior changes noted in the PHP release notes

use crate::table::{CompatibilityTable, FunctionRule, TableBuilder};
use once_cell::sync::Lazy;
use phpcompat_core::PhpVersion;

const UPDATED_CONVENTION: &str = "the updated convention";

static RELEASE_NOTES: Lazy<CompatibilityTable> = Lazy::new(|| {
    TableBuilder::new()
        .rules(release_notes_rules())
        .build()
        .expect("built-in release notes rules are valid")
});

/// The built-in rules, for hosts that extend them with their own
pub fn release_notes_rules() -> Vec<FunctionRule> {
    ["ob_start", "array_combine"]
        .into_iter()
        .map(|name| {
            FunctionRule::function(name)
                .different_in(PhpVersion::new(5, 4))
                .different_in(PhpVersion::new(5, 5))
                .with_alternative(UPDATED_CONVENTION)
        })
        .collect()
}

/// Shared table of the built-in rules, built on first use
pub fn release_notes_table() -> &'static CompatibilityTable {
    &RELEASE_NOTES
}
