use std::fmt;

use serde_json::{Map, Value};
use tracing::warn;

use crate::manifest::Manifest;
use crate::package_manager::PackageManager;

/// Vue packages and the canary aliases they are redirected to.
pub const CANARY_OVERRIDES: &[(&str, &str)] = &[
    ("vue", "npm:@vue/canary"),
    ("@vue/compiler-core", "npm:@vue/compiler-core-canary"),
    ("@vue/compiler-dom", "npm:@vue/compiler-dom-canary"),
    ("@vue/compiler-sfc", "npm:@vue/compiler-sfc-canary"),
    ("@vue/compiler-ssr", "npm:@vue/compiler-ssr-canary"),
    ("@vue/reactivity", "npm:@vue/reactivity-canary"),
    (
        "@vue/reactivity-transform",
        "npm:@vue/reactivity-transform-canary",
    ),
    ("@vue/runtime-core", "npm:@vue/runtime-core-canary"),
    ("@vue/runtime-dom", "npm:@vue/runtime-dom-canary"),
    ("@vue/server-renderer", "npm:@vue/server-renderer-canary"),
    ("@vue/shared", "npm:@vue/shared-canary"),
    ("@vue/compat", "npm:@vue/compat-canary"),
];

/// Where a package manager reads forced versions from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideField {
    /// `overrides`
    Overrides,
    /// `resolutions`
    Resolutions,
    /// `pnpm.overrides`
    PnpmOverrides,
}

impl OverrideField {
    pub fn for_manager(manager: PackageManager) -> Self {
        match manager {
            PackageManager::Npm => OverrideField::Overrides,
            PackageManager::Yarn | PackageManager::Cnpm => OverrideField::Resolutions,
            PackageManager::Pnpm => OverrideField::PnpmOverrides,
        }
    }
}

impl fmt::Display for OverrideField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OverrideField::Overrides => "overrides",
            OverrideField::Resolutions => "resolutions",
            OverrideField::PnpmOverrides => "pnpm.overrides",
        })
    }
}

/// Merges [`CANARY_OVERRIDES`] into the field `manager` reads. Existing
/// entries stay; entries with the same package name are replaced.
pub fn apply_canary_overrides(manifest: &mut Manifest, manager: PackageManager) -> OverrideField {
    let field = OverrideField::for_manager(manager);
    let document = manifest.document_mut();

    let target = match field {
        OverrideField::Overrides => object_entry(document, "overrides"),
        OverrideField::Resolutions => object_entry(document, "resolutions"),
        OverrideField::PnpmOverrides => {
            let pnpm = object_entry(document, "pnpm");
            object_entry(pnpm, "overrides")
        }
    };

    for (package, specifier) in CANARY_OVERRIDES {
        target.insert((*package).to_string(), Value::String((*specifier).to_string()));
    }

    field
}

fn object_entry<'a>(parent: &'a mut Map<String, Value>, key: &str) -> &'a mut Map<String, Value> {
    let slot = parent
        .entry(key)
        .or_insert_with(|| Value::Object(Map::new()));
    if !slot.is_object() {
        warn!("replacing non-object `{key}` field with an object");
        *slot = Value::Object(Map::new());
    }
    slot.as_object_mut().expect("slot holds an object")
}

#[cfg(test)]
mod tests {
    use serde_json::{Value, json};

    use super::{CANARY_OVERRIDES, OverrideField, apply_canary_overrides};
    use crate::manifest::{MANIFEST_FILE, Manifest};
    use crate::package_manager::PackageManager;

    fn manifest_from(value: Value) -> (tempfile::TempDir, Manifest) {
        let dir = tempfile::tempdir().expect("tempdir should be created");
        std::fs::write(dir.path().join(MANIFEST_FILE), value.to_string()).unwrap();
        let manifest = Manifest::load(dir.path()).unwrap();
        (dir, manifest)
    }

    fn canary_map() -> Value {
        Value::Object(
            CANARY_OVERRIDES
                .iter()
                .map(|(k, v)| ((*k).to_string(), Value::String((*v).to_string())))
                .collect(),
        )
    }

    #[test]
    fn covers_vue_and_every_sub_package() {
        assert_eq!(CANARY_OVERRIDES.len(), 12);
        for (package, specifier) in CANARY_OVERRIDES {
            assert!(*package == "vue" || package.starts_with("@vue/"));
            assert!(specifier.starts_with("npm:@vue/"));
        }
    }

    #[test]
    fn each_manager_writes_only_its_field() {
        let cases = [
            (PackageManager::Npm, "/overrides"),
            (PackageManager::Yarn, "/resolutions"),
            (PackageManager::Cnpm, "/resolutions"),
            (PackageManager::Pnpm, "/pnpm/overrides"),
        ];

        for (manager, pointer) in cases {
            let (_dir, mut manifest) = manifest_from(json!({ "name": "demo" }));
            let field = apply_canary_overrides(&mut manifest, manager);
            assert_eq!(field, OverrideField::for_manager(manager));

            let doc = Value::Object(manifest.document().clone());
            assert_eq!(doc.pointer(pointer), Some(&canary_map()), "{manager}");
            for other in ["/overrides", "/resolutions", "/pnpm/overrides"] {
                if other != pointer {
                    assert!(doc.pointer(other).is_none(), "{manager} touched {other}");
                }
            }
        }
    }

    #[test]
    fn keeps_existing_entries() {
        let (_dir, mut manifest) = manifest_from(json!({
            "pnpm": {
                "overrides": { "lodash": "4.17.21", "vue": "3.3.0" },
                "neverBuiltDependencies": ["fsevents"]
            }
        }));

        apply_canary_overrides(&mut manifest, PackageManager::Pnpm);

        let pnpm = &manifest.document()["pnpm"];
        assert_eq!(pnpm["overrides"]["lodash"], json!("4.17.21"));
        assert_eq!(pnpm["overrides"]["vue"], json!("npm:@vue/canary"));
        assert_eq!(pnpm["neverBuiltDependencies"], json!(["fsevents"]));
    }

    #[test]
    fn applying_twice_changes_nothing() {
        let (_dir, mut manifest) =
            manifest_from(json!({ "resolutions": { "left-pad": "1.3.0" } }));

        apply_canary_overrides(&mut manifest, PackageManager::Yarn);
        let first = manifest.render().unwrap();
        apply_canary_overrides(&mut manifest, PackageManager::Yarn);
        assert_eq!(manifest.render().unwrap(), first);
    }

    #[test]
    fn replaces_non_object_field() {
        let (_dir, mut manifest) = manifest_from(json!({ "overrides": "oops" }));

        apply_canary_overrides(&mut manifest, PackageManager::Npm);
        assert_eq!(manifest.document()["overrides"], canary_map());
    }

    #[test]
    fn replaces_non_object_pnpm_container_in_place() {
        let (_dir, mut manifest) =
            manifest_from(json!({ "name": "demo", "pnpm": true, "version": "1.0.0" }));

        apply_canary_overrides(&mut manifest, PackageManager::Pnpm);
        let keys: Vec<&str> = manifest.document().keys().map(String::as_str).collect();
        assert_eq!(keys, ["name", "pnpm", "version"]);
        assert_eq!(manifest.document()["pnpm"]["overrides"], canary_map());
    }

    #[test]
    fn field_names_render_with_nesting() {
        assert_eq!(OverrideField::PnpmOverrides.to_string(), "pnpm.overrides");
        assert_eq!(OverrideField::Resolutions.to_string(), "resolutions");
    }
}
