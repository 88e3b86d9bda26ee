//! Opérations sur l'arbre YAML de la configuration
//!
//! Toutes les clés sont stockées en minuscules : les chemins passés aux
//! fonctions de lecture et d'écriture sont normalisés de la même façon.

use anyhow::{Result, anyhow};
use serde_yaml::{Mapping, Value};

fn key(name: &str) -> Value {
    Value::String(name.to_lowercase())
}

fn dotted(path: &[&str]) -> String {
    if path.is_empty() {
        "<root>".to_string()
    } else {
        path.join(".")
    }
}

/// Lit le nœud situé à `path`
pub(crate) fn lookup<'a>(root: &'a Value, path: &[&str]) -> Result<&'a Value> {
    path.iter().enumerate().try_fold(root, |node, (depth, name)| {
        let map = node
            .as_mapping()
            .ok_or_else(|| anyhow!("Path {} is not a mapping", dotted(&path[..depth])))?;
        map.get(&key(name))
            .ok_or_else(|| anyhow!("Path {} does not exist", dotted(&path[..=depth])))
    })
}

/// Écrit `value` à `path`, en créant les sections intermédiaires manquantes
pub(crate) fn assign(root: &mut Value, path: &[&str], value: Value) -> Result<()> {
    let Some((last, parents)) = path.split_last() else {
        *root = value;
        return Ok(());
    };

    let mut node = root;
    for (depth, name) in parents.iter().enumerate() {
        let map = node
            .as_mapping_mut()
            .ok_or_else(|| anyhow!("Path {} is not a mapping", dotted(&path[..depth])))?;
        node = map
            .entry(key(name))
            .or_insert_with(|| Value::Mapping(Mapping::new()));
    }

    node.as_mapping_mut()
        .ok_or_else(|| anyhow!("Path {} is not a mapping", dotted(parents)))?
        .insert(key(last), value);
    Ok(())
}

/// Fusionne `overlay` dans `base`
///
/// Les sections sont fusionnées récursivement, toute autre valeur
/// (scalaire ou séquence) de `overlay` remplace celle de `base`.
pub(crate) fn merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Mapping(base), Value::Mapping(overlay)) => {
            for (name, value) in overlay {
                match base.get_mut(&name) {
                    Some(slot) => merge(slot, value),
                    None => {
                        base.insert(name, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

/// Met en minuscules toutes les clés de l'arbre
pub(crate) fn lowercase_keys(value: Value) -> Value {
    match value {
        Value::Mapping(map) => Value::Mapping(
            map.into_iter()
                .map(|(name, child)| {
                    let name = match name {
                        Value::String(s) => Value::String(s.to_lowercase()),
                        other => other,
                    };
                    (name, lowercase_keys(child))
                })
                .collect(),
        ),
        Value::Sequence(items) => Value::Sequence(items.into_iter().map(lowercase_keys).collect()),
        other => other,
    }
}

/// Applique les variables `{prefix}SECTION__KEY=valeur` et retourne leur nombre
///
/// Les valeurs sont lues comme du YAML pour conserver nombres et booléens.
pub(crate) fn apply_env<I>(root: &mut Value, prefix: &str, vars: I) -> usize
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut applied = 0;
    for (variable, raw) in vars {
        let Some(stripped) = variable.strip_prefix(prefix) else {
            continue;
        };

        let path: Vec<&str> = stripped.split("__").collect();
        let value = serde_yaml::from_str::<Value>(&raw).unwrap_or(Value::String(raw));
        match assign(root, &path, value) {
            Ok(()) => applied += 1,
            Err(e) => tracing::warn!(variable = %variable, "Ignoring config override: {}", e),
        }
    }
    applied
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_yaml::Number;

    fn yaml(text: &str) -> Value {
        serde_yaml::from_str(text).unwrap()
    }

    #[test]
    fn test_merge_keeps_siblings() {
        let mut base = yaml("a: {b: 1, c: 2}\nd: [1, 2]");
        merge(&mut base, yaml("a: {b: 10}\nd: [3]"));

        assert_eq!(lookup(&base, &["a", "b"]).unwrap(), &Value::Number(Number::from(10u64)));
        assert_eq!(lookup(&base, &["a", "c"]).unwrap(), &Value::Number(Number::from(2u64)));
        assert_eq!(lookup(&base, &["d"]).unwrap(), &yaml("[3]"));
    }

    #[test]
    fn test_env_values_are_typed() {
        let mut root = yaml("media_cache: {size: 512}\nstorage: {public: true}");
        let applied = apply_env(
            &mut root,
            "PFX__",
            vec![
                ("PFX__MEDIA_CACHE__SIZE".to_string(), "42".to_string()),
                ("PFX__STORAGE__PUBLIC".to_string(), "false".to_string()),
                ("PFX__STORAGE__BUCKET".to_string(), "avatars".to_string()),
                ("UNRELATED".to_string(), "x".to_string()),
            ],
        );

        assert_eq!(applied, 3);
        assert_eq!(
            lookup(&root, &["media_cache", "size"]).unwrap(),
            &Value::Number(Number::from(42u64))
        );
        assert_eq!(lookup(&root, &["storage", "public"]).unwrap(), &Value::Bool(false));
        assert_eq!(
            lookup(&root, &["storage", "bucket"]).unwrap(),
            &Value::String("avatars".into())
        );
    }

    #[test]
    fn test_assign_through_scalar_fails() {
        let mut root = yaml("host: info");
        assert!(assign(&mut root, &["host", "log_level"], Value::Null).is_err());
        assert!(assign(&mut root, &["New", "Key"], Value::Bool(true)).is_ok());
        assert_eq!(lookup(&root, &["new", "key"]).unwrap(), &Value::Bool(true));
    }

    #[test]
    fn test_lowercase_keys() {
        let lowered = lowercase_keys(yaml("Host: {Log_Level: debug}\nList: [{Key: A}]"));
        assert_eq!(
            lookup(&lowered, &["host", "log_level"]).unwrap(),
            &Value::String("debug".into())
        );
        // Les valeurs ne sont pas modifiées
        assert_eq!(lowered["list"][0]["key"], Value::String("A".into()));
    }

    #[test]
    fn test_missing_path() {
        let root = yaml("a: {b: 1}");
        assert!(lookup(&root, &["a", "x"]).is_err());
        assert!(lookup(&root, &["a", "b", "c"]).is_err());
    }
}
