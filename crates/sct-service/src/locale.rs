//! Locale-driven preferred term resolution.
//!
//! An RFC 3066 language priority list (`"en-GB;q=0.9, en"`) resolves to
//! an ordered list of installed language reference sets. Preferred and
//! fully specified terms are then chosen by walking a concept's active
//! descriptions against the language refset acceptability items, in
//! refset priority order.

use sct_store::Store;
use sct_types::{well_known, Acceptability, Description, SctId};

use crate::error::ServiceResult;

/// Maps language tags to the language refsets that can satisfy them.
///
/// Lookup is case-insensitive. A bare `en` accepts either English
/// dialect, US first by distribution convention.
fn refsets_for_tag(tag: &str) -> Vec<SctId> {
    match tag.to_ascii_lowercase().as_str() {
        "en-gb" => vec![well_known::GB_ENGLISH_LANG_REFSET],
        "en-us" => vec![well_known::US_ENGLISH_LANG_REFSET],
        "en" => vec![
            well_known::US_ENGLISH_LANG_REFSET,
            well_known::GB_ENGLISH_LANG_REFSET,
        ],
        _ => Vec::new(),
    }
}

/// Resolves language ranges against the installed language refsets.
#[derive(Debug, Clone)]
pub struct LocaleResolver {
    installed: Vec<SctId>,
    default_refsets: Vec<SctId>,
}

impl LocaleResolver {
    /// Creates a resolver over the installed language refsets, with a
    /// default locale for fallback matching.
    pub fn new(installed: Vec<SctId>, default_locale: Option<&str>) -> Self {
        let mut resolver = Self {
            installed,
            default_refsets: Vec::new(),
        };
        resolver.default_refsets = default_locale
            .map(|locale| resolver.match_locale(locale, false))
            .filter(|refsets| !refsets.is_empty())
            .unwrap_or_else(|| resolver.installed.clone());
        resolver
    }

    /// The installed language refsets.
    pub fn installed(&self) -> &[SctId] {
        &self.installed
    }

    /// Matches an RFC 3066 priority list to installed language refsets,
    /// best first. No match yields an empty list unless `fallback` is
    /// set, in which case the configured default locale applies.
    pub fn match_locale(&self, language_range: &str, fallback: bool) -> Vec<SctId> {
        let mut weighted: Vec<(f64, usize, &str)> = Vec::new();
        for (position, entry) in language_range.split(',').enumerate() {
            let mut parts = entry.split(';');
            let tag = parts.next().unwrap_or_default().trim();
            if tag.is_empty() {
                continue;
            }
            let weight = parts
                .find_map(|p| p.trim().strip_prefix("q=").and_then(|q| q.parse::<f64>().ok()))
                .unwrap_or(1.0);
            weighted.push((weight, position, tag));
        }
        // Stable by weight descending, then source order.
        weighted.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal).then(a.1.cmp(&b.1)));

        let mut matched = Vec::new();
        for (_, _, tag) in weighted {
            for refset in refsets_for_tag(tag) {
                if self.installed.contains(&refset) && !matched.contains(&refset) {
                    matched.push(refset);
                }
            }
        }
        if matched.is_empty() && fallback {
            return self.default_refsets.clone();
        }
        matched
    }

    /// The refsets used when a match falls back.
    pub fn default_refsets(&self) -> &[SctId] {
        &self.default_refsets
    }

    /// The first active synonym preferred in any of the given language
    /// refsets, in refset priority order.
    pub fn preferred_synonym(
        &self,
        store: &Store,
        concept_id: SctId,
        language_refsets: &[SctId],
    ) -> ServiceResult<Option<Description>> {
        let descriptions: Vec<Description> = store
            .descriptions_for(concept_id)?
            .into_iter()
            .filter(|d| d.active && d.is_synonym())
            .collect();
        self.first_preferred(store, descriptions, language_refsets)
    }

    /// The fully specified name preferred in the given refsets, falling
    /// back to any active FSN.
    pub fn fully_specified_name(
        &self,
        store: &Store,
        concept_id: SctId,
        language_refsets: &[SctId],
    ) -> ServiceResult<Option<Description>> {
        let fsns: Vec<Description> = store
            .descriptions_for(concept_id)?
            .into_iter()
            .filter(|d| d.active && d.is_fsn())
            .collect();
        if let Some(preferred) = self.first_preferred(store, fsns.clone(), language_refsets)? {
            return Ok(Some(preferred));
        }
        Ok(fsns.into_iter().next())
    }

    fn first_preferred(
        &self,
        store: &Store,
        descriptions: Vec<Description>,
        language_refsets: &[SctId],
    ) -> ServiceResult<Option<Description>> {
        for refset in language_refsets {
            for description in &descriptions {
                for item in store.items_for_refset(description.id, *refset)? {
                    if item.acceptability_id() == Some(Acceptability::PREFERRED_ID) {
                        return Ok(Some(description.clone()));
                    }
                }
            }
        }
        Ok(None)
    }
}
