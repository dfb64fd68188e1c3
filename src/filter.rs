use crate::units::FetchUnit;
use anyhow::{anyhow, Result};

/// Parses `--only` unit names (as printed in a run summary) into fetch units.
///
/// Duplicates are dropped, order is kept. `None` means "everything".
pub fn resolve_units(only: Option<Vec<String>>) -> Result<Option<Vec<FetchUnit>>> {
    let Some(names) = only else {
        return Ok(None);
    };

    let mut units: Vec<FetchUnit> = Vec::with_capacity(names.len());
    for name in names.iter().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        let unit: FetchUnit = name
            .parse()
            .map_err(|e| anyhow!("invalid unit {:?}: {}", name, e))?;
        if !units.contains(&unit) {
            units.push(unit);
        }
    }

    if units.is_empty() {
        return Err(anyhow!("--only was given but names no units"));
    }

    tracing::info!(
        "Restricting run to {} units: {}",
        units.len(),
        units.iter().map(|u| u.to_string()).collect::<Vec<_>>().join(", ")
    );
    Ok(Some(units))
}
