/// Nearest-date alignment of the main readings with the E. coli readings
///
/// Both series are sampled independently, so a main reading rarely has an
/// E. coli reading on exactly the same day. Per site, every main observation
/// takes the E. coli value closest in time. Equidistant candidates resolve to
/// the earlier date; several readings on that date resolve to the first one
/// in source order. The output is keyed on the main table: E. coli-only sites
/// are dropped and sites without E. coli data get a not-reported value.
use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::{debug, info, instrument};

use crate::readings::{CellValue, EcoliObservation, MainObservation, MergedRecord};

fn partition_by_site<T>(rows: Vec<T>, site: impl Fn(&T) -> &str) -> BTreeMap<String, Vec<T>> {
    let mut by_site: BTreeMap<String, Vec<T>> = BTreeMap::new();
    for row in rows {
        by_site.entry(site(&row).to_string()).or_default().push(row);
    }
    by_site
}

/// Index of the reading nearest to `date` in a date-sorted slice
fn nearest_index(sorted: &[EcoliObservation], date: NaiveDate) -> Option<usize> {
    if sorted.is_empty() {
        return None;
    }

    let after = sorted.partition_point(|e| e.date < date);
    let distance = |index: usize| (sorted[index].date - date).num_days().abs();

    let nearest_date = match (after.checked_sub(1), (after < sorted.len()).then_some(after)) {
        (Some(before), Some(after)) if distance(before) <= distance(after) => sorted[before].date,
        (_, Some(after)) => sorted[after].date,
        (Some(before), None) => sorted[before].date,
        (None, None) => return None,
    };

    // First reading on the winning date, in stable order
    Some(sorted.partition_point(|e| e.date < nearest_date))
}

/// Attach the nearest-date E. coli value to every main observation
#[instrument(skip_all, fields(main_rows = main.len(), ecoli_rows = ecoli.len()))]
pub fn merge_nearest(main: Vec<MainObservation>, ecoli: Vec<EcoliObservation>) -> Vec<MergedRecord> {
    let main_by_site = partition_by_site(main, |m| m.site.as_str());
    let mut ecoli_by_site = partition_by_site(ecoli, |e| e.site.as_str());

    let mut merged = Vec::new();
    let mut unmatched_sites = 0;

    for (site, mut observations) in main_by_site {
        let candidates = match ecoli_by_site.remove(&site) {
            Some(mut candidates) => {
                candidates.sort_by_key(|e| e.date);
                candidates
            }
            None => {
                debug!("No E. coli readings for site '{}'", site);
                unmatched_sites += 1;
                Vec::new()
            }
        };

        observations.sort_by_key(|m| m.date);
        for observation in observations {
            let ecoli = nearest_index(&candidates, observation.date)
                .map(|index| candidates[index].ecoli.clone())
                .unwrap_or(CellValue::Missing);
            merged.push(MergedRecord::from_main(observation, ecoli));
        }
    }

    if !ecoli_by_site.is_empty() {
        debug!(
            "Dropping E. coli readings for {} sites absent from the main table: {:?}",
            ecoli_by_site.len(),
            ecoli_by_site.keys().collect::<Vec<_>>()
        );
    }

    info!(
        "Merged {} records ({} sites without E. coli data)",
        merged.len(),
        unmatched_sites
    );
    merged
}
