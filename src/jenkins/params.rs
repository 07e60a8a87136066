use indexmap::IndexMap;

use super::types::ParameterDefinitions;
use crate::error::{LauncherError, Result};

/// Checks caller-supplied build parameters against the job's declared ones.
pub fn validate_params(
    definitions: &ParameterDefinitions,
    supplied: &IndexMap<String, String>,
) -> Result<()> {
    if supplied.is_empty() {
        return Ok(());
    }

    if definitions.is_empty() {
        return Err(LauncherError::Validation(
            "This build does not take any parameters".to_string(),
        ));
    }

    let unknown: Vec<&str> = supplied
        .keys()
        .filter(|key| !definitions.contains_key(*key))
        .map(String::as_str)
        .collect();
    if !unknown.is_empty() {
        return Err(LauncherError::Validation(format!(
            "These parameters do not exist: {}",
            unknown.join(", ")
        )));
    }

    for (key, value) in supplied {
        let Some(Some(choices)) = definitions.get(key) else {
            continue;
        };
        if !choices.contains(value) {
            return Err(LauncherError::Validation(format!(
                "Invalid choice '{value}' for parameter '{key}'. Valid choices are: {}",
                choices.join(", ")
            )));
        }
    }

    Ok(())
}
