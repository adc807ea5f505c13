//! Application environment from a dotenv style file and an explicit map

use std::collections::BTreeMap;

use cf_api::EnvironmentVariables;

/// Parse `KEY=VALUE` lines
///
/// Lines starting with `#` or without a `=` after the first character are
/// skipped. The key ends at the first `=`; the value is kept verbatim.
pub fn parse_env(content: &str) -> BTreeMap<String, String> {
    let mut env = BTreeMap::new();

    for line in content.lines() {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        // the key needs at least one character, which may itself be '='
        let first = line.chars().next().map(char::len_utf8).unwrap_or(0);
        if let Some(pos) = line[first..].find('=') {
            let split = first + pos;
            env.insert(line[..split].to_string(), line[split + 1..].to_string());
        }
    }

    env
}

/// File entries first, explicit entries second; empty values unset the variable
pub fn merge_env(file_content: &str, explicit: &BTreeMap<String, String>) -> EnvironmentVariables {
    let mut merged = parse_env(file_content);
    merged.extend(explicit.iter().map(|(k, v)| (k.clone(), v.clone())));

    EnvironmentVariables {
        var: merged
            .into_iter()
            .map(|(k, v)| {
                let value = (!v.is_empty()).then_some(v);
                (k, value)
            })
            .collect(),
    }
}
