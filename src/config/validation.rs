//! Config validation: unknown-key detection with Levenshtein suggestions
//! and physical range checks.
//!
//! Two-pass parse approach: first deserialize raw TOML into `toml::Value`,
//! walk the key tree, compare against known field names, and emit warnings
//! with "did you mean?" suggestions. Then proceed with normal serde
//! deserialization. Warnings never break existing configs.

use std::collections::HashSet;

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Returns the complete set of valid dotted key paths for `RunConfig`.
///
/// Any new field added to `RunConfig` must be added here too.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [data]
        "data",
        "data.crack_csv",
        "data.stress_csv",
        "data.precision",
        // [model]
        "model",
        "model.initial_crack_length",
        "model.paris_exponent",
        "model.paris_coefficient",
        "model.geometry_factor",
        "model.mlp_path",
        "model.checkpoint_dir",
        // [plot]
        "plot",
        "plot.lower_bound",
        "plot.upper_bound",
        "plot.font_size",
        "plot.output_path",
    ];
    keys.iter().copied().collect()
}

/// Collect every dotted key path present in a TOML value.
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() {
                keys.extend(walk_toml_keys(v, &path));
            }
        }
    }
    keys
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a_len = a.chars().count();
    let b_len = b.chars().count();
    if a_len == 0 {
        return b_len;
    }
    if b_len == 0 {
        return a_len;
    }

    let mut prev: Vec<usize> = (0..=b_len).collect();
    let mut curr = vec![0; b_len + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.chars().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_len]
}

/// Closest known key within edit distance 3, if any.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    let mut best: Option<(&str, usize)> = None;
    for &k in known {
        let dist = levenshtein(unknown, k);
        if dist > 3 {
            continue;
        }
        // Ties broken alphabetically so suggestions are stable across runs
        let better = match best {
            None => true,
            Some((best_key, best_dist)) => dist < best_dist || (dist == best_dist && k < best_key),
        };
        if better {
            best = Some((k, dist));
        }
    }
    best.map(|(k, _)| k.to_string())
}

/// Warn about every key in `raw_toml` that `RunConfig` does not recognise.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let value: toml::Value = match raw_toml.parse() {
        Ok(v) => v,
        Err(_) => return Vec::new(), // parse errors are handled by serde later
    };

    let known = known_config_keys();
    let mut warnings = Vec::new();

    for key in walk_toml_keys(&value, "") {
        if !known.contains(key.as_str()) {
            let suggestion = suggest_correction(&key, &known);
            warnings.push(ValidationWarning {
                message: format!("Unknown config key '{key}'"),
                field: key,
                suggestion,
            });
        }
    }

    warnings
}

// ============================================================================
// Physical Ranges
// ============================================================================

/// Range checks beyond simple positivity.
///
/// Returns hard errors and soft warnings separately.
pub fn validate_physical_ranges(
    config: &super::RunConfig,
) -> (Vec<String>, Vec<ValidationWarning>) {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let m = &config.model;

    // A crack longer than a metre is not a fatigue crack in an airframe part
    if m.initial_crack_length > 1.0 {
        errors.push(format!(
            "model.initial_crack_length = {:.4} m is outside physical range (0-1 m)",
            m.initial_crack_length
        ));
    }

    // Paris exponents for structural metals sit roughly between 2 and 6
    if m.paris_exponent.is_finite() && !(2.0..=6.0).contains(&m.paris_exponent) {
        warnings.push(ValidationWarning {
            field: "model.paris_exponent".to_string(),
            message: format!(
                "paris_exponent = {:.2} is outside typical range (2-6)",
                m.paris_exponent
            ),
            suggestion: None,
        });
    }

    if m.paris_coefficient.is_finite() && m.paris_coefficient > 1e-6 {
        warnings.push(ValidationWarning {
            field: "model.paris_coefficient".to_string(),
            message: format!(
                "paris_coefficient = {:.3e} is unusually large for MPa·sqrt(m) units",
                m.paris_coefficient
            ),
            suggestion: None,
        });
    }

    let p = &config.plot;
    if m.initial_crack_length.is_finite()
        && p.upper_bound.is_finite()
        && m.initial_crack_length >= p.upper_bound
    {
        warnings.push(ValidationWarning {
            field: "plot.upper_bound".to_string(),
            message: format!(
                "plot.upper_bound = {:.4} does not exceed the initial crack length {:.4}; every point will be clipped",
                p.upper_bound, m.initial_crack_length
            ),
            suggestion: None,
        });
    }

    (errors, warnings)
}

// ============================================================================
// Tests
// ============================================================================
