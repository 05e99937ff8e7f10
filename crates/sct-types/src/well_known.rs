//! Well-known SNOMED CT identifiers.
//!
//! Constants for commonly used concept identifiers: root concepts,
//! relationship types, modules, language reference sets, historical
//! association reference sets and metadata reference sets.
//!
//! # Examples
//!
//! ```
//! use sct_types::well_known;
//!
//! let type_id: u64 = 116680003;
//! assert_eq!(type_id, well_known::IS_A);
//! assert!(well_known::is_historical_association(well_known::SAME_AS_REFSET));
//! ```

use crate::SctId;

// =============================================================================
// Root and hierarchy concepts
// =============================================================================

/// SNOMED CT root concept (138875005).
pub const SNOMED_CT_ROOT: SctId = 138875005;

/// Clinical finding (finding) - 404684003.
pub const CLINICAL_FINDING: SctId = 404684003;

/// Procedure (procedure) - 71388002.
pub const PROCEDURE: SctId = 71388002;

/// Body structure (body structure) - 123037004.
pub const BODY_STRUCTURE: SctId = 123037004;

// =============================================================================
// Relationship types
// =============================================================================

/// IS_A relationship type - 116680003.
///
/// Defines the taxonomic (hierarchical) relationships between concepts.
pub const IS_A: SctId = 116680003;

/// Finding site attribute - 363698007.
pub const FINDING_SITE: SctId = 363698007;

/// Associated morphology attribute - 116676008.
pub const ASSOCIATED_MORPHOLOGY: SctId = 116676008;

// =============================================================================
// Modules
// =============================================================================

/// SNOMED CT core module - 900000000000207008.
pub const CORE_MODULE: SctId = 900000000000207008;

/// SNOMED CT model component module - 900000000000012004.
///
/// Distribution practice versions this module alongside the core module;
/// see the module dependency graph.
pub const MODEL_MODULE: SctId = 900000000000012004;

// =============================================================================
// Language reference sets
// =============================================================================

/// GB English language reference set - 900000000000508004.
pub const GB_ENGLISH_LANG_REFSET: SctId = 900000000000508004;

/// US English language reference set - 900000000000509007.
pub const US_ENGLISH_LANG_REFSET: SctId = 900000000000509007;

/// Returns true for the internationally distributed language refsets.
pub fn is_language_refset(refset_id: SctId) -> bool {
    matches!(
        refset_id,
        GB_ENGLISH_LANG_REFSET | US_ENGLISH_LANG_REFSET
    )
}

// =============================================================================
// Historical association reference sets
// =============================================================================

/// REPLACED BY association reference set.
pub const REPLACED_BY_REFSET: SctId = 900000000000526001;

/// SAME AS association reference set.
pub const SAME_AS_REFSET: SctId = 900000000000527005;

/// WAS A association reference set.
pub const WAS_A_REFSET: SctId = 900000000000528000;

/// POSSIBLY EQUIVALENT TO association reference set.
pub const POSSIBLY_EQUIVALENT_TO_REFSET: SctId = 900000000000523009;

/// MOVED TO association reference set.
pub const MOVED_TO_REFSET: SctId = 900000000000524003;

/// MOVED FROM association reference set.
pub const MOVED_FROM_REFSET: SctId = 900000000000525002;

/// ALTERNATIVE association reference set.
pub const ALTERNATIVE_REFSET: SctId = 900000000000530003;

/// REFERS TO association reference set.
pub const REFERS_TO_REFSET: SctId = 900000000000531004;

/// PARTIALLY EQUIVALENT TO association reference set.
pub const PARTIALLY_EQUIVALENT_TO_REFSET: SctId = 1186924009;

/// POSSIBLY REPLACED BY association reference set.
pub const POSSIBLY_REPLACED_BY_REFSET: SctId = 1186921001;

/// Returns true if the refset is one of the historical associations.
pub fn is_historical_association(refset_id: SctId) -> bool {
    matches!(
        refset_id,
        REPLACED_BY_REFSET
            | SAME_AS_REFSET
            | WAS_A_REFSET
            | POSSIBLY_EQUIVALENT_TO_REFSET
            | MOVED_TO_REFSET
            | MOVED_FROM_REFSET
            | ALTERNATIVE_REFSET
            | REFERS_TO_REFSET
            | PARTIALLY_EQUIVALENT_TO_REFSET
            | POSSIBLY_REPLACED_BY_REFSET
    )
}

// =============================================================================
// Metadata reference sets
// =============================================================================

/// Refset descriptor reference set - 900000000000456007.
///
/// Describes the extension columns of every other reference set; imported
/// in the first phase so dependent refsets can be reified.
pub const REFSET_DESCRIPTOR_REFSET: SctId = 900000000000456007;

/// Module dependency reference set - 900000000000534007.
pub const MODULE_DEPENDENCY_REFSET: SctId = 900000000000534007;

/// OWL axiom reference set - 733073007.
pub const OWL_AXIOM_REFSET: SctId = 733073007;

/// OWL ontology reference set - 762103008.
pub const OWL_ONTOLOGY_REFSET: SctId = 762103008;

// =============================================================================
// Map reference sets
// =============================================================================

/// ICD-10 complex map reference set - 447562003.
pub const ICD10_COMPLEX_MAP_REFSET: SctId = 447562003;

/// CTV3 simple map reference set - 900000000000497000.
pub const CTV3_SIMPLE_MAP_REFSET: SctId = 900000000000497000;

// =============================================================================
// MRCM reference sets
// =============================================================================

/// MRCM Domain reference set - 723589008.
///
/// Defines the semantic domains of the Machine Readable Concept Model.
pub const MRCM_DOMAIN_REFSET: SctId = 723589008;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_known_constants() {
        assert_eq!(SNOMED_CT_ROOT, 138875005);
        assert_eq!(IS_A, 116680003);
        assert_eq!(CORE_MODULE, 900000000000207008);
        assert_eq!(GB_ENGLISH_LANG_REFSET, 900000000000508004);
    }

    #[test]
    fn test_historical_association_membership() {
        assert!(is_historical_association(SAME_AS_REFSET));
        assert!(is_historical_association(REPLACED_BY_REFSET));
        assert!(!is_historical_association(ICD10_COMPLEX_MAP_REFSET));
        assert!(!is_historical_association(GB_ENGLISH_LANG_REFSET));
    }

    #[test]
    fn test_language_refset_membership() {
        assert!(is_language_refset(GB_ENGLISH_LANG_REFSET));
        assert!(is_language_refset(US_ENGLISH_LANG_REFSET));
        assert!(!is_language_refset(SAME_AS_REFSET));
    }
}
