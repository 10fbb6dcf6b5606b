// build.rs
//
// Generates the `t!` macro used for user-facing CLI messages. Each key in
// `locales/<lang>.toml` becomes a macro arm expanding to a string literal, so a
// missing key is a compile error instead of a runtime surprise.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;

const FALLBACK_LANG: &str = "en";

fn selected_language() -> String {
    // `lang_*` features win over the environment.
    let mut from_features: Vec<String> = env::vars()
        .filter_map(|(key, _)| {
            key.strip_prefix("CARGO_FEATURE_LANG_")
                .map(str::to_lowercase)
        })
        .collect();
    from_features.sort();

    match from_features.first() {
        Some(lang) => {
            if from_features.len() > 1 {
                println!(
                    "cargo:warning=Several language features enabled ({:?}); using '{}'.",
                    from_features, lang
                );
            }
            lang.clone()
        }
        None => env::var("QUIVER_LANG").unwrap_or_else(|_| FALLBACK_LANG.to_string()),
    }
}

fn read_locale(lang: &str) -> Option<BTreeMap<String, String>> {
    let path = format!("locales/{}.toml", lang);
    let content = fs::read_to_string(&path).ok()?;
    let table = toml::from_str(&content).unwrap_or_else(|e| panic!("Failed to parse {}: {}", path, e));
    Some(table)
}

fn main() {
    let lang = selected_language();
    println!("cargo:rustc-env=QUIVER_LANG_EFFECTIVE={}", lang);
    println!("cargo:rerun-if-env-changed=QUIVER_LANG");
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=locales/");

    let mut messages = read_locale(FALLBACK_LANG).expect("locales/en.toml is required");
    if lang != FALLBACK_LANG {
        match read_locale(&lang) {
            Some(overrides) => messages.extend(overrides),
            None => println!(
                "cargo:warning=No locale file for '{}'; falling back to '{}'.",
                lang, FALLBACK_LANG
            ),
        }
    }

    let mut code = String::from("#[macro_export]\nmacro_rules! t {\n");
    for (key, text) in &messages {
        let literal = text.replace('\\', "\\\\").replace('"', "\\\"");
        code.push_str(&format!("    (\"{}\") => {{ \"{}\" }};\n", key, literal));
    }
    code.push_str(
        "    ($key:expr) => {{ compile_error!(concat!(\"Missing translation key: \", $key)) }};\n}\n",
    );

    let out_dir = env::var("OUT_DIR").expect("OUT_DIR is set by cargo");
    fs::write(Path::new(&out_dir).join("translations.rs"), code)
        .expect("Failed to write translations.rs");
}
