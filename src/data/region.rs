//! Country → region code resolution for map rendering.

use log::{debug, warn};
use std::collections::HashMap;

/// Resolved codes keyed by country name. `None` marks a failed lookup.
pub type RegionMap = HashMap<String, Option<String>>;

/// Looks up a standardized region code (ISO 3166-1 alpha-3) for a country name.
pub trait RegionResolver {
    fn resolve(&self, country: &str) -> Option<String>;
}

impl<F> RegionResolver for F
where
    F: Fn(&str) -> Option<String>,
{
    fn resolve(&self, country: &str) -> Option<String> {
        self(country)
    }
}

/// Built-in alpha-3 table for ASEAN members and their common alternate names.
#[derive(Debug, Clone, Copy, Default)]
pub struct IsoRegionTable;

const ISO_ALPHA3: [(&str, &str); 16] = [
    ("brunei", "BRN"),
    ("brunei darussalam", "BRN"),
    ("cambodia", "KHM"),
    ("indonesia", "IDN"),
    ("laos", "LAO"),
    ("lao pdr", "LAO"),
    ("lao people's democratic republic", "LAO"),
    ("malaysia", "MYS"),
    ("myanmar", "MMR"),
    ("burma", "MMR"),
    ("philippines", "PHL"),
    ("singapore", "SGP"),
    ("thailand", "THA"),
    ("vietnam", "VNM"),
    ("viet nam", "VNM"),
    ("timor-leste", "TLS"),
];

impl RegionResolver for IsoRegionTable {
    fn resolve(&self, country: &str) -> Option<String> {
        let key = country.trim().to_lowercase();
        ISO_ALPHA3
            .iter()
            .find(|(name, _)| *name == key)
            .map(|(_, code)| code.to_string())
    }
}

/// Resolve every unique name once. Failures are logged and left as `None`.
pub fn resolve_regions<R: RegionResolver + ?Sized>(resolver: &R, countries: &[String]) -> RegionMap {
    let mut regions = RegionMap::with_capacity(countries.len());
    for country in countries {
        let name = country.trim();
        if regions.contains_key(name) {
            continue;
        }
        let code = resolver.resolve(name);
        match &code {
            Some(code) => debug!("Resolved {name} -> {code}"),
            None => warn!("No region code for {name}; it will be rendered ungeocoded"),
        }
        regions.insert(name.to_string(), code);
    }
    regions
}

/// Code for `country`, or `None` when it was never resolved or failed.
pub fn region_code(regions: &RegionMap, country: &str) -> Option<String> {
    regions.get(country).cloned().flatten()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_iso_table_handles_alternate_names() {
        let table = IsoRegionTable;
        assert_eq!(table.resolve("Cambodia").as_deref(), Some("KHM"));
        assert_eq!(table.resolve(" Lao PDR ").as_deref(), Some("LAO"));
        assert_eq!(table.resolve("Burma").as_deref(), Some("MMR"));
        assert_eq!(table.resolve("Atlantis"), None);
    }

    #[test]
    fn test_failed_lookup_leaves_code_absent() {
        let countries = vec!["Cambodia".to_string(), "Atlantis".to_string()];
        let regions = resolve_regions(&IsoRegionTable, &countries);
        assert_eq!(region_code(&regions, "Cambodia").as_deref(), Some("KHM"));
        assert_eq!(region_code(&regions, "Atlantis"), None);
        assert!(regions.contains_key("Atlantis"));
    }

    #[test]
    fn test_each_name_is_resolved_once() {
        let calls = Cell::new(0);
        let stub = |name: &str| {
            calls.set(calls.get() + 1);
            Some(format!("X{}", name.len()))
        };
        let countries = vec![
            "Laos".to_string(),
            "Laos".to_string(),
            "Thailand".to_string(),
        ];

        let regions = resolve_regions(&stub, &countries);
        assert_eq!(calls.get(), 2);
        assert_eq!(region_code(&regions, "Laos").as_deref(), Some("X4"));
        assert_eq!(region_code(&regions, "Thailand").as_deref(), Some("X8"));
    }
}
