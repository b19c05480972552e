// raycar_sim/src/simulation/config/resolver.rs

use super::catalog::PrefabCatalog;
use super::ConfigError;
use figment::value::{Dict, Tag, Value};

/// Resolves every `{ from = "<key>", ... }` table inside `value` against the
/// catalog. The referenced prefab is resolved first, then the sibling keys are
/// deep-merged over it and the `from` key is dropped.
pub fn resolve_value(value: &Value, catalog: &PrefabCatalog) -> Result<Value, ConfigError> {
    let mut chain = Vec::new();
    resolve_recursively(value, catalog, &mut chain)
}

/// Merges `overrides` into `base`. Nested tables merge key by key; a nested
/// table carrying its own `from` replaces the base entry outright.
fn deep_merge(base: &mut Dict, overrides: &Dict) {
    for (key, override_val) in overrides {
        if key == "from" {
            continue;
        }

        if let Some(d) = override_val.as_dict() {
            if d.contains_key("from") {
                base.insert(key.clone(), override_val.clone());
                continue;
            }
        }

        if let Some(base_val) = base.get_mut(key) {
            if let (Some(base_sub), Some(override_sub)) =
                (base_val.as_dict(), override_val.as_dict())
            {
                let mut merged = base_sub.clone();
                deep_merge(&mut merged, override_sub);
                *base_val = Value::Dict(Tag::Default, merged);
                continue;
            }
        }
        base.insert(key.clone(), override_val.clone());
    }
}

fn resolve_recursively(
    value: &Value,
    catalog: &PrefabCatalog,
    chain: &mut Vec<String>,
) -> Result<Value, ConfigError> {
    // Pre-order: resolve this node, then its children.
    let current = match value.as_dict() {
        Some(dict) => match dict.get("from").and_then(|v| v.as_str()) {
            Some(from_key) => {
                if chain.iter().any(|k| k == from_key) {
                    return Err(ConfigError::CyclicPrefab(from_key.to_string()));
                }
                let base = catalog
                    .get(from_key)
                    .ok_or_else(|| ConfigError::MissingPrefab(from_key.to_string()))?;

                chain.push(from_key.to_string());
                let resolved_base = resolve_recursively(base, catalog, chain)?;
                chain.pop();

                let mut merged = resolved_base
                    .into_dict()
                    .ok_or_else(|| ConfigError::PrefabNotATable(from_key.to_string()))?;
                deep_merge(&mut merged, dict);
                Value::Dict(Tag::Default, merged)
            }
            None => value.clone(),
        },
        None => value.clone(),
    };

    match &current {
        Value::Dict(tag, dict) => {
            let mut out = Dict::new();
            for (key, val) in dict.iter() {
                if key == "from" {
                    continue;
                }
                out.insert(key.clone(), resolve_recursively(val, catalog, chain)?);
            }
            Ok(Value::Dict(*tag, out))
        }
        Value::Array(tag, items) => {
            let resolved = items
                .iter()
                .map(|item| resolve_recursively(item, catalog, chain))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::Array(*tag, resolved))
        }
        _ => Ok(current),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::{
        providers::{Format, Toml},
        Figment,
    };

    fn toml(s: &str) -> Value {
        Figment::from(Toml::string(s)).extract::<Value>().unwrap()
    }

    fn catalog(items: &[(&str, &str)]) -> PrefabCatalog {
        PrefabCatalog(items.iter().map(|(k, v)| (k.to_string(), toml(v))).collect())
    }

    fn number(value: &Value, key: &str) -> f64 {
        value
            .as_dict()
            .and_then(|d| d.get(key))
            .and_then(|v| v.deserialize::<f64>().ok())
            .unwrap()
    }

    #[test]
    fn overrides_win_over_the_prefab() {
        let cat = catalog(&[("vehicles.base", "chassis_mass = 1.0\nwheel_radius = 0.25\n")]);
        let vehicle = toml("from = \"vehicles.base\"\nchassis_mass = 3.0\n");
        let out = resolve_value(&vehicle, &cat).unwrap();

        assert_eq!(number(&out, "chassis_mass"), 3.0);
        assert_eq!(number(&out, "wheel_radius"), 0.25);
        assert!(!out.as_dict().unwrap().contains_key("from"));
    }

    #[test]
    fn prefabs_chain_through_the_catalog() {
        let cat = catalog(&[
            ("vehicles.base", "chassis_mass = 1.0\nwheel_radius = 0.25\n"),
            ("vehicles.heavy", "from = \"vehicles.base\"\nchassis_mass = 2.0\n"),
        ]);
        let vehicle = toml("from = \"vehicles.heavy\"\nwheel_radius = 0.3\n");
        let out = resolve_value(&vehicle, &cat).unwrap();

        assert_eq!(number(&out, "chassis_mass"), 2.0);
        assert_eq!(number(&out, "wheel_radius"), 0.3);
    }

    #[test]
    fn nested_tables_merge_key_by_key() {
        let cat = catalog(&[("base", "[inner]\na = 1.0\nb = 2.0\n")]);
        let out = resolve_value(&toml("from = \"base\"\n[inner]\nb = 5.0\n"), &cat).unwrap();
        let inner = out.as_dict().and_then(|d| d.get("inner")).unwrap();

        assert_eq!(number(inner, "a"), 1.0);
        assert_eq!(number(inner, "b"), 5.0);
    }

    #[test]
    fn plain_values_pass_through() {
        let value = toml("chassis_mass = 4.0\n");
        let out = resolve_value(&value, &PrefabCatalog::default()).unwrap();
        assert_eq!(number(&out, "chassis_mass"), 4.0);
    }

    #[test]
    fn reports_missing_prefabs() {
        let vehicle = toml("from = \"vehicles.ghost\"\n");
        let err = resolve_value(&vehicle, &PrefabCatalog::default()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingPrefab(key) if key == "vehicles.ghost"));
    }

    #[test]
    fn reports_prefabs_that_are_not_tables() {
        let mut cat = PrefabCatalog::default();
        cat.0.insert("scalar".to_string(), Value::String(Tag::Default, "not a table".to_string()));
        let err = resolve_value(&toml("from = \"scalar\"\n"), &cat).unwrap_err();
        assert!(matches!(err, ConfigError::PrefabNotATable(key) if key == "scalar"));
    }

    #[test]
    fn reports_inheritance_cycles() {
        let cat = catalog(&[("a", "from = \"b\"\n"), ("b", "from = \"a\"\n")]);
        let err = resolve_value(&toml("from = \"a\"\n"), &cat).unwrap_err();
        assert!(matches!(err, ConfigError::CyclicPrefab(_)));
    }
}
