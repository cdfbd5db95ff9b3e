//! Project fact detection from `package.json`, lockfiles, and marker files.

use super::{DEFAULT_DOMAIN, DOCS_URL, RSE_PACKAGE};
use crate::definition::ProjectDetector;
use crate::store::{normalize_repo_url, parse_json5};
use log::{debug, warn};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use std::fs;
use std::path::Path;

/// Lockfiles checked in order; the first match names the package manager.
const LOCKFILES: &[(&str, &str)] = &[
    ("bun.lock", "bun"),
    ("bun.lockb", "bun"),
    ("pnpm-lock.yaml", "pnpm"),
    ("yarn.lock", "yarn"),
    ("package-lock.json", "npm"),
];

/// Marker files identifying a project framework; the first match wins.
const FRAMEWORK_FILES: &[(&str, &[&str])] = &[
    (
        "nextjs",
        &["next.config.js", "next.config.ts", "next.config.mjs"],
    ),
    ("astro", &["astro.config.js", "astro.config.ts", "astro.config.mjs"]),
    ("svelte", &["svelte.config.js", "svelte.config.ts"]),
    ("remix", &["remix.config.js", "remix.config.ts"]),
    ("nuxt", &["nuxt.config.js", "nuxt.config.ts"]),
    ("wxt", &["wxt.config.ts"]),
    ("tauri", &["src-tauri/tauri.conf.json"]),
    ("electron", &["electron-builder.json", "electron-builder.yml"]),
    ("vite", &["vite.config.js", "vite.config.ts", "vite.config.mjs"]),
    ("vscode", &[".vscode-test.mjs", "vsc-extension-quickstart.md"]),
];

/// Formatter config read for code style widths.
const BIOME_CONFIG: &str = "biome.jsonc";

/// Scripts that are not reported as custom commands.
const STANDARD_SCRIPTS: &[&str] = &["start", "build", "dev", "test"];

/// Derives project identity and feature flags from the project directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct PackageJsonDetector;

/// `package.json` fields the detector reads.
///
/// Fields stay untyped so one oddly shaped entry (an object `license`, a
/// numeric `author`) does not discard the rest of the manifest.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PackageJson {
    name: Option<Value>,
    author: Option<Value>,
    description: Option<Value>,
    version: Option<Value>,
    license: Option<Value>,
    repository: Option<Value>,
    dependencies: Option<Value>,
    #[serde(rename = "devDependencies")]
    dev_dependencies: Option<Value>,
    scripts: Option<Value>,
}

impl PackageJson {
    fn scripts(&self) -> Option<&Map<String, Value>> {
        self.scripts.as_ref().and_then(Value::as_object)
    }
}

/// Text of a manifest field given as a string or as an object with `key`.
fn field_text<'a>(field: Option<&'a Value>, key: &str) -> Option<&'a str> {
    let text = match field? {
        Value::String(text) => Some(text.as_str()),
        Value::Object(map) => map.get(key).and_then(Value::as_str),
        _ => None,
    };
    text.filter(|text| !text.is_empty())
}

impl ProjectDetector for PackageJsonDetector {
    fn detect(&self, project_root: &Path) -> Value {
        let mut facts = Map::new();

        if let Some(manager) = detect_package_manager(project_root) {
            facts.insert("projectPackageManager".to_string(), json!(manager));
        }
        if let Some(framework) = detect_framework(project_root) {
            facts.insert("projectFramework".to_string(), json!(framework));
        }

        if let Some(code_style) = detect_code_style(project_root) {
            facts.insert("codeStyle".to_string(), code_style);
        }

        if let Some(package) = read_package_json(project_root) {
            insert_identity(&mut facts, &package);
            facts.insert(
                "features".to_string(),
                detect_features(project_root, &package),
            );
            let libraries = detect_libraries(&package);
            if !libraries.is_empty() {
                facts.insert("preferredLibraries".to_string(), Value::Object(libraries));
            }
        }

        if !facts.contains_key("projectName") {
            if let Some(name) = directory_name(project_root) {
                facts.insert("projectName".to_string(), json!(name));
            }
        }

        debug!(
            "detected project facts (root={}, keys={})",
            project_root.display(),
            facts.len()
        );
        Value::Object(facts)
    }
}

fn read_package_json(project_root: &Path) -> Option<PackageJson> {
    let path = project_root.join("package.json");
    let contents = fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&contents) {
        Ok(package) => Some(package),
        Err(err) => {
            warn!(
                "could not read package.json (path={}, err={err})",
                path.display()
            );
            None
        }
    }
}

fn insert_identity(facts: &mut Map<String, Value>, package: &PackageJson) {
    if let Some(name) = field_text(package.name.as_ref(), "name") {
        facts.insert("projectName".to_string(), json!(name));
        let domain = if name == RSE_PACKAGE {
            DOCS_URL
        } else {
            DEFAULT_DOMAIN
        };
        facts.insert("projectDomain".to_string(), json!(domain));
    }
    if let Some(author) = field_text(package.author.as_ref(), "name") {
        facts.insert("projectAuthor".to_string(), json!(author));
    }
    if let Some(description) = package.description.as_ref().and_then(Value::as_str) {
        facts.insert("projectDescription".to_string(), json!(description));
    }
    if let Some(version) = field_text(package.version.as_ref(), "version") {
        facts.insert("version".to_string(), json!(version));
    }
    if let Some(license) = field_text(package.license.as_ref(), "type") {
        facts.insert("projectLicense".to_string(), json!(license));
    }
    if let Some(url) = field_text(package.repository.as_ref(), "url") {
        facts.insert(
            "projectRepository".to_string(),
            json!(normalize_repo_url(url)),
        );
    }
}

/// Base name of the project directory, used when no manifest names the project.
fn directory_name(project_root: &Path) -> Option<String> {
    let root = fs::canonicalize(project_root).unwrap_or_else(|_| project_root.to_path_buf());
    root.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
}

/// Formatter widths from `biome.jsonc`, mapped onto `codeStyle`.
fn detect_code_style(project_root: &Path) -> Option<Value> {
    let path = project_root.join(BIOME_CONFIG);
    let contents = fs::read_to_string(&path).ok()?;
    let biome = match parse_json5(&contents) {
        Ok(biome) => biome,
        Err(err) => {
            warn!(
                "could not read biome config (path={}, err={err})",
                path.display()
            );
            return None;
        }
    };

    let formatter = biome.get("formatter");
    let width = |key: &str| {
        formatter
            .and_then(|formatter| formatter.get(key))
            .and_then(Value::as_u64)
    };
    let mut style = Map::new();
    if let Some(line_width) = width("lineWidth") {
        style.insert("lineWidth".to_string(), json!(line_width));
    }
    if let Some(indent_width) = width("indentWidth") {
        style.insert("indentSize".to_string(), json!(indent_width));
        style.insert("tabWidth".to_string(), json!(indent_width));
    }
    (!style.is_empty()).then_some(Value::Object(style))
}

fn detect_package_manager(project_root: &Path) -> Option<&'static str> {
    LOCKFILES
        .iter()
        .find(|(file, _)| project_root.join(file).exists())
        .map(|(_, manager)| *manager)
}

fn detect_framework(project_root: &Path) -> Option<&'static str> {
    FRAMEWORK_FILES
        .iter()
        .find(|(_, files)| files.iter().any(|file| project_root.join(file).exists()))
        .map(|(framework, _)| *framework)
}

struct Deps<'a>(&'a PackageJson);

impl Deps<'_> {
    fn has(&self, name: &str) -> bool {
        [&self.0.dependencies, &self.0.dev_dependencies]
            .into_iter()
            .filter_map(|table| table.as_ref().and_then(Value::as_object))
            .any(|table| table.contains_key(name))
    }

    fn any(&self, names: &[&str]) -> bool {
        names.iter().any(|name| self.has(name))
    }
}

fn detect_features(project_root: &Path, package: &PackageJson) -> Value {
    let deps = Deps(package);
    let exists = |relative: &str| project_root.join(relative).exists();

    let has_bun_test = package
        .scripts()
        .into_iter()
        .flat_map(Map::values)
        .any(|script| script.as_str().is_some_and(|text| text.contains("bun test")));
    let testing = has_bun_test || deps.any(&["jest", "vitest", "@playwright/test", "cypress"]);

    let mut language = vec!["typescript"];
    if deps.has("python") || exists("requirements.txt") {
        language.push("python");
    }
    if exists("go.mod") {
        language.push("go");
    }
    if exists("Cargo.toml") {
        language.push("rust");
    }

    let webview: Vec<&str> = ["electron", "tauri", "capacitor", "react-native"]
        .into_iter()
        .filter(|name| deps.has(name))
        .collect();

    let commands: Vec<&str> = package
        .scripts()
        .into_iter()
        .flat_map(Map::keys)
        .map(String::as_str)
        .filter(|name| !STANDARD_SCRIPTS.contains(name))
        .collect();

    json!({
        "i18n": deps.any(&["next-intl", "i18next", "react-i18next", "rosetta"]),
        "analytics": deps.any(&[
            "@vercel/analytics",
            "@segment/analytics-next",
            "ga-4-react",
            "react-ga",
            "next-plausible",
            "fathom-client",
        ]),
        "authentication": deps.any(&[
            "next-auth",
            "@clerk/nextjs",
            "better-auth",
            "@auth0/nextjs-auth0",
            "@supabase/supabase-js",
        ]),
        "api": deps.any(&["hono", "@trpc/server", "graphql", "apollo-server"])
            || exists("src/api")
            || exists("src/app/api"),
        "database": deps.any(&[
            "@prisma/client",
            "drizzle-orm",
            "@supabase/supabase-js",
            "mongoose",
            "pg",
            "@neondatabase/serverless",
            "mysql",
            "mysql2",
            "sqlite",
            "sqlite3",
            "better-sqlite3",
            "mongodb",
        ]),
        "testing": testing,
        "docker": exists("Dockerfile"),
        "ci": exists(".github/workflows") || exists(".gitlab-ci.yml"),
        "commands": commands,
        "webview": webview,
        "language": language,
    })
}

/// Pick the first matching library for each preferred-library slot.
fn detect_libraries(package: &PackageJson) -> Map<String, Value> {
    let deps = Deps(package);
    let slots: &[(&str, &[(&str, &[&str])])] = &[
        (
            "databaseLibrary",
            &[
                ("drizzle", &["drizzle-orm"]),
                ("prisma", &["@prisma/client"]),
                ("supabase", &["@supabase/supabase-js"]),
            ],
        ),
        (
            "authentication",
            &[
                ("next-auth", &["next-auth"]),
                ("clerk", &["@clerk/nextjs"]),
                ("better-auth", &["better-auth"]),
                ("auth0", &["@auth0/nextjs-auth0"]),
            ],
        ),
        (
            "stateManagement",
            &[
                ("zustand", &["zustand"]),
                ("jotai", &["jotai"]),
                ("redux-toolkit", &["@reduxjs/toolkit", "redux"]),
            ],
        ),
        (
            "styling",
            &[
                ("tailwind", &["tailwindcss"]),
                ("styled-components", &["styled-components"]),
                ("sass", &["sass", "node-sass"]),
            ],
        ),
        (
            "testing",
            &[
                ("vitest", &["vitest"]),
                ("jest", &["jest"]),
                ("playwright", &["@playwright/test"]),
                ("cypress", &["cypress"]),
            ],
        ),
        (
            "api",
            &[
                ("hono", &["hono"]),
                ("trpc", &["@trpc/server"]),
                ("graphql", &["graphql", "apollo-server"]),
            ],
        ),
        (
            "validation",
            &[
                ("zod", &["zod"]),
                ("typebox", &["@sinclair/typebox"]),
                ("valibot", &["valibot"]),
            ],
        ),
    ];

    slots
        .iter()
        .filter_map(|(slot, candidates)| {
            candidates
                .iter()
                .find(|(_, packages)| deps.any(packages))
                .map(|(choice, _)| (slot.to_string(), json!(choice)))
        })
        .collect()
}
