/// Known truncated or misspelled site labels in the E. coli sheets, mapped to
/// the names used in the main readings workbook
const SITE_NAME_CORRECTIONS: &[(&str, &str)] = &[("Stratford St A", "Stratford St Andrew")];

/// Canonical form of a site label. Unknown labels are returned unchanged.
pub fn canonical_site_name(site: &str) -> &str {
    SITE_NAME_CORRECTIONS
        .iter()
        .find(|(label, _)| *label == site)
        .map(|(_, canonical)| *canonical)
        .unwrap_or(site)
}
