use crate::farms::FarmStore;
use anyhow::Result;
use isoterma_core::farm::Farm;
use serde::Serialize;
use strsim::jaro_winkler;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FarmMatch {
    Exact,
    Fuzzy,
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}

fn fuzzy_search<'a>(search: &str, farms: &'a [Farm]) -> Option<&'a Farm> {
    const MIN_SCORE: f64 = 0.8;
    let search = normalize(search);
    farms
        .iter()
        .map(|farm| (farm, jaro_winkler(&search, &normalize(&farm.name))))
        .filter(|(_, score)| *score > MIN_SCORE)
        .max_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(farm, _)| farm)
}

fn match_farm(query: &str, farms: &[Farm]) -> Option<(Farm, FarmMatch)> {
    let query = query.trim();
    if query.is_empty() {
        return None;
    }
    if let Some(farm) = farms.iter().find(|farm| farm.id == query) {
        return Some((farm.clone(), FarmMatch::Exact));
    }
    let lowered = query.to_lowercase();
    if let Some(farm) = farms.iter().find(|farm| farm.name.to_lowercase() == lowered) {
        return Some((farm.clone(), FarmMatch::Exact));
    }
    fuzzy_search(query, farms).map(|farm| (farm.clone(), FarmMatch::Fuzzy))
}

/// Id first, then case-insensitive name, then the closest fuzzy name.
pub async fn find_farm(store: &FarmStore, query: &str) -> Result<Option<(Farm, FarmMatch)>> {
    let farms = store.list_farms().await?;
    Ok(match_farm(query, &farms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::farms::tests::farm;

    fn farms() -> Vec<Farm> {
        vec![
            farm("finca-rio-negro", "Finca Río Negro"),
            farm("chacra-143", "Chacra 143"),
        ]
    }

    #[test]
    fn id_match_is_exact() {
        let (found, kind) = match_farm("chacra-143", &farms()).unwrap();
        assert_eq!(found.id, "chacra-143");
        assert_eq!(kind, FarmMatch::Exact);
    }

    #[test]
    fn name_match_ignores_case() {
        let (found, kind) = match_farm("finca río negro", &farms()).unwrap();
        assert_eq!(found.id, "finca-rio-negro");
        assert_eq!(kind, FarmMatch::Exact);
    }

    #[test]
    fn typo_yields_fuzzy_match() {
        let (found, kind) = match_farm("chacra134", &farms()).unwrap();
        assert_eq!(found.id, "chacra-143");
        assert_eq!(kind, FarmMatch::Fuzzy);
    }

    #[test]
    fn unrelated_query_matches_nothing() {
        assert!(match_farm("thisdoesnotexist", &farms()).is_none());
        assert!(match_farm("   ", &farms()).is_none());
    }

    #[tokio::test]
    async fn find_farm_reads_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = FarmStore::new(dir.path().join("fincas.json"));
        for farm in farms() {
            store.upsert_farm(farm).await.unwrap();
        }
        let (found, kind) = find_farm(&store, "Finca Rio Negro").await.unwrap().unwrap();
        assert_eq!(found.id, "finca-rio-negro");
        assert_eq!(kind, FarmMatch::Fuzzy);
    }
}
