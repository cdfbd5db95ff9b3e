//! Built-in definition of the `rse` project config (`.config/rse.{ts,jsonc}`).

mod detect;

pub use detect::PackageJsonDetector;

use crate::definition::{ConfigDefinition, ModuleTemplate, SchemaRefs, SectionComment};
use crate::schema::{ObjectSchema, SchemaNode};
use serde_json::{Map, Value, json};

/// Placeholder for values nobody has filled in yet.
pub const UNKNOWN_VALUE: &str = "unknown";
/// Placeholder project domain.
pub const DEFAULT_DOMAIN: &str = "https://example.com";
/// Documentation site referenced from the config header.
pub const DOCS_URL: &str = "https://docs.reliverse.org/cli";
/// Published JSON Schema location.
pub const SCHEMA_URL: &str = "https://reliverse.org/schema.json";
/// JSON Schema location inside the tool's own repository.
pub const SCHEMA_DEV: &str = "./schema.json";
/// Package name of the tool itself.
pub const RSE_PACKAGE: &str = "@reliverse/rse";

const BEHAVIOR: &[&str] = &["prompt", "autoYes", "autoNo"];

const FRAMEWORKS: &[&str] = &[
    UNKNOWN_VALUE,
    "nextjs",
    "vite",
    "svelte",
    "remix",
    "astro",
    "nuxt",
    "solid",
    "qwik",
    "vue",
    "wxt",
    "lynx",
    "react-native",
    "expo",
    "capacitor",
    "ionic",
    "electron",
    "tauri",
    "neutralino",
    "rempts",
    "citty",
    "commander",
    "cac",
    "meow",
    "yargs",
    "vscode",
    "webextension",
    "browser-extension",
    "npm-jsr",
];

const TEMPLATES: &[&str] = &[
    UNKNOWN_VALUE,
    "blefnk/relivator-nextjs-template",
    "blefnk/relivator-docker-template",
    "blefnk/next-react-ts-src-minimal",
    "blefnk/all-in-one-nextjs-template",
    "blefnk/create-t3-app",
    "blefnk/create-next-app",
    "blefnk/astro-starlight-template",
    "blefnk/versator-nextjs-template",
    "blefnk/relivator-lynxjs-template",
    "blefnk/relivator-react-native-template",
    "reliverse/template-browser-extension",
    "microsoft/vscode-extension-samples",
    "microsoft/vscode-extension-template",
    "rsetarter-template",
    "blefnk/deno-cli-tutorial",
];

/// Preferred library slots and their known choices (`unknown` is always allowed).
const PREFERRED_LIBRARIES: &[(&str, &[&str])] = &[
    ("stateManagement", &["zustand", "jotai", "redux-toolkit"]),
    ("formManagement", &["react-hook-form", "formik"]),
    ("styling", &["tailwind", "styled-components", "css-modules", "sass"]),
    ("uiComponents", &["shadcn-ui", "chakra-ui", "material-ui"]),
    ("testing", &["bun", "vitest", "jest", "playwright", "cypress"]),
    (
        "authentication",
        &["better-auth", "clerk", "next-auth", "supabase-auth", "auth0"],
    ),
    ("databaseLibrary", &["drizzle", "prisma", "supabase"]),
    ("databaseProvider", &["pg", "mysql", "sqlite", "mongodb"]),
    ("api", &["hono", "trpc", "graphql", "rest"]),
    ("linting", &["eslint"]),
    ("formatting", &["biome"]),
    ("payment", &["stripe"]),
    ("analytics", &["vercel"]),
    ("monitoring", &["sentry"]),
    ("logging", &["axiom"]),
    ("forms", &["react-hook-form"]),
    ("notifications", &["sonner"]),
    ("search", &["algolia"]),
    ("uploads", &["uploadthing"]),
    ("validation", &["zod", "typebox", "valibot"]),
    ("documentation", &["starlight", "nextra"]),
    ("icons", &["lucide"]),
    ("mail", &["resend"]),
    ("cache", &["redis"]),
    ("storage", &["cloudflare"]),
    ("cdn", &["cloudflare"]),
    ("cms", &["contentlayer"]),
    ("i18n", &["next-intl"]),
    ("seo", &["next-seo"]),
    ("motion", &["framer"]),
    ("charts", &["recharts"]),
    ("dates", &["dayjs"]),
    ("markdown", &["mdx"]),
    ("security", &["auth"]),
    ("routing", &["next", "react-router", "tanstack-router"]),
];

/// Keys copied from an external config by [`crate::ConfigStore::migrate_from`].
const MIGRATABLE_KEYS: &[&str] = &[
    "projectDescription",
    "version",
    "projectLicense",
    "projectRepository",
    "projectCategory",
    "projectSubcategory",
    "projectFramework",
    "projectTemplate",
    "projectArchitecture",
    "deployBehavior",
    "depsBehavior",
    "gitBehavior",
    "i18nBehavior",
    "scriptsBehavior",
    "existingRepoBehavior",
    "repoPrivacy",
    "features",
    "preferredLibraries",
    "codeStyle",
    "monorepo",
    "ignoreDependencies",
    "customRules",
    "skipPromptsUseAutoBehavior",
    "relinterConfirm",
];

/// Full definition of the `rse` config document.
pub fn definition() -> ConfigDefinition {
    ConfigDefinition {
        file_stem: "rse".to_string(),
        schema: schema(),
        defaults: defaults(),
        section_comments: section_comments(),
        module: ModuleTemplate {
            factory: "defineConfig".to_string(),
            library_import: "@reliverse/rse-cfg".to_string(),
            dev_import: "~/libs/cfg/cfg-impl/cfg-define".to_string(),
        },
        schema_refs: SchemaRefs {
            published: SCHEMA_URL.to_string(),
            development: SCHEMA_DEV.to_string(),
        },
        reference_file: "tsconfig.json".to_string(),
        migratable_keys: MIGRATABLE_KEYS.iter().map(|key| key.to_string()).collect(),
    }
}

/// Schema tree of the `rse` document.
pub fn schema() -> SchemaNode {
    SchemaNode::object(
        ObjectSchema::new()
            .property("$schema", SchemaNode::one_of(&[SCHEMA_URL, SCHEMA_DEV]))
            .property("projectName", SchemaNode::non_empty_string())
            .property("projectAuthor", SchemaNode::non_empty_string())
            .property("projectDescription", SchemaNode::string())
            .property("version", SchemaNode::string())
            .property("projectLicense", SchemaNode::string())
            .property("projectRepository", SchemaNode::string())
            .property("projectDomain", SchemaNode::string())
            .property(
                "projectGitService",
                SchemaNode::one_of(&["github", "gitlab", "bitbucket", "none"]),
            )
            .property(
                "projectDeployService",
                SchemaNode::one_of(&["vercel", "netlify", "railway", "deno", "none"]),
            )
            .property(
                "projectPackageManager",
                SchemaNode::one_of(&["npm", "pnpm", "yarn", "bun"]),
            )
            .property("projectState", SchemaNode::one_of(&["creating", "created"]))
            .property(
                "projectCategory",
                SchemaNode::one_of(&[
                    UNKNOWN_VALUE,
                    "website",
                    "vscode",
                    "browser",
                    "cli",
                    "library",
                    "mobile",
                ]),
            )
            .property(
                "projectSubcategory",
                SchemaNode::one_of(&[UNKNOWN_VALUE, "e-commerce", "tool"]),
            )
            .property("projectFramework", SchemaNode::one_of(FRAMEWORKS))
            .property("projectTemplate", SchemaNode::one_of(TEMPLATES))
            .property("projectTemplateDate", SchemaNode::string())
            .property("features", SchemaNode::object(features_schema()))
            .property(
                "preferredLibraries",
                SchemaNode::object(preferred_libraries_schema()),
            )
            .property("codeStyle", SchemaNode::object(code_style_schema()))
            .property(
                "monorepo",
                SchemaNode::object(
                    ObjectSchema::new()
                        .property(
                            "type",
                            SchemaNode::one_of(&["none", "turborepo", "nx", "pnpm", "bun"]),
                        )
                        .property("packages", SchemaNode::string_array())
                        .property("sharedPackages", SchemaNode::string_array()),
                ),
            )
            .property("ignoreDependencies", SchemaNode::string_array())
            .property("customRules", SchemaNode::any())
            .property("multipleRepoCloneMode", SchemaNode::boolean())
            .property("customUserFocusedRepos", SchemaNode::repo_list())
            .property("customDevsFocusedRepos", SchemaNode::repo_list())
            .property("hideRepoSuggestions", SchemaNode::boolean())
            .property("customReposOnNewProject", SchemaNode::boolean())
            .property("envComposerOpenBrowser", SchemaNode::boolean())
            .property("repoBranch", SchemaNode::string())
            .property(
                "repoPrivacy",
                SchemaNode::one_of(&[UNKNOWN_VALUE, "public", "private"]),
            )
            .property(
                "projectArchitecture",
                SchemaNode::one_of(&[UNKNOWN_VALUE, "fullstack", "separated"]),
            )
            .property("projectRuntime", SchemaNode::one_of(&["node", "deno", "bun"]))
            .property("skipPromptsUseAutoBehavior", SchemaNode::boolean())
            .property("deployBehavior", SchemaNode::one_of(BEHAVIOR))
            .property("depsBehavior", SchemaNode::one_of(BEHAVIOR))
            .property("gitBehavior", SchemaNode::one_of(BEHAVIOR))
            .property("i18nBehavior", SchemaNode::one_of(BEHAVIOR))
            .property("scriptsBehavior", SchemaNode::one_of(BEHAVIOR))
            .property(
                "existingRepoBehavior",
                SchemaNode::one_of(&["prompt", "autoYes", "autoYesSkipCommit", "autoNo"]),
            )
            .property(
                "relinterConfirm",
                SchemaNode::one_of(&["promptOnce", "promptEachFile", "autoYes"]),
            ),
    )
}

fn features_schema() -> ObjectSchema {
    ObjectSchema::new()
        .property("i18n", SchemaNode::boolean())
        .property("analytics", SchemaNode::boolean())
        .property(
            "themeMode",
            SchemaNode::one_of(&["light", "dark", "dark-light"]),
        )
        .property("authentication", SchemaNode::boolean())
        .property("api", SchemaNode::boolean())
        .property("database", SchemaNode::boolean())
        .property("testing", SchemaNode::boolean())
        .property("docker", SchemaNode::boolean())
        .property("ci", SchemaNode::boolean())
        .property("commands", SchemaNode::string_array())
        .property("webview", SchemaNode::string_array())
        .property("language", SchemaNode::string_array())
        .property("themes", SchemaNode::string_array())
}

fn preferred_libraries_schema() -> ObjectSchema {
    PREFERRED_LIBRARIES
        .iter()
        .fold(ObjectSchema::new(), |schema, (name, choices)| {
            let mut literals = vec![UNKNOWN_VALUE];
            literals.extend_from_slice(choices);
            schema.property(name, SchemaNode::one_of(&literals))
        })
}

fn code_style_schema() -> ObjectSchema {
    let modernize = [
        "replaceFs",
        "replacePath",
        "replaceHttp",
        "replaceProcess",
        "replaceConsole",
        "replaceEvents",
    ]
    .iter()
    .fold(ObjectSchema::new(), |schema, name| {
        schema.property(name, SchemaNode::boolean())
    });

    ObjectSchema::new()
        .property("lineWidth", SchemaNode::number())
        .property("indentSize", SchemaNode::number())
        .property("indentStyle", SchemaNode::one_of(&["space", "tab"]))
        .property("quoteMark", SchemaNode::one_of(&["single", "double"]))
        .property("semicolons", SchemaNode::boolean())
        .property("trailingComma", SchemaNode::one_of(&["none", "es5", "all"]))
        .property("bracketSpacing", SchemaNode::boolean())
        .property("arrowParens", SchemaNode::one_of(&["always", "avoid"]))
        .property("tabWidth", SchemaNode::number())
        .property("jsToTs", SchemaNode::boolean())
        .property("dontRemoveComments", SchemaNode::boolean())
        .property("shouldAddComments", SchemaNode::boolean())
        .property(
            "typeOrInterface",
            SchemaNode::one_of(&["type", "interface", "mixed"]),
        )
        .property(
            "importOrRequire",
            SchemaNode::one_of(&["import", "require", "mixed"]),
        )
        .property("cjsToEsm", SchemaNode::boolean())
        .property("modernize", SchemaNode::object(modernize))
        .property("importSymbol", SchemaNode::string())
}

/// Always schema-valid fallback document.
pub fn defaults() -> Value {
    let preferred_libraries: Map<String, Value> = PREFERRED_LIBRARIES
        .iter()
        .map(|(name, _)| (name.to_string(), json!(UNKNOWN_VALUE)))
        .collect();

    let entries = [
        ("$schema", json!(SCHEMA_URL)),
        ("projectName", json!(UNKNOWN_VALUE)),
        ("projectAuthor", json!(UNKNOWN_VALUE)),
        ("projectDescription", json!("")),
        ("version", json!("0.1.0")),
        ("projectLicense", json!("MIT")),
        ("projectRepository", json!(DEFAULT_DOMAIN)),
        ("projectDomain", json!(DEFAULT_DOMAIN)),
        ("projectGitService", json!("github")),
        ("projectDeployService", json!("vercel")),
        ("projectPackageManager", json!("npm")),
        ("projectState", json!("creating")),
        ("projectCategory", json!(UNKNOWN_VALUE)),
        ("projectSubcategory", json!(UNKNOWN_VALUE)),
        ("projectFramework", json!(UNKNOWN_VALUE)),
        ("projectTemplate", json!(UNKNOWN_VALUE)),
        ("projectTemplateDate", json!(UNKNOWN_VALUE)),
        ("projectArchitecture", json!(UNKNOWN_VALUE)),
        ("repoPrivacy", json!(UNKNOWN_VALUE)),
        ("projectRuntime", json!("node")),
        ("repoBranch", json!("main")),
        ("skipPromptsUseAutoBehavior", json!(false)),
        ("deployBehavior", json!("prompt")),
        ("depsBehavior", json!("prompt")),
        ("gitBehavior", json!("prompt")),
        ("i18nBehavior", json!("prompt")),
        ("scriptsBehavior", json!("prompt")),
        ("existingRepoBehavior", json!("prompt")),
        ("relinterConfirm", json!("promptOnce")),
        (
            "features",
            json!({
                "i18n": false,
                "analytics": false,
                "themeMode": "dark-light",
                "authentication": false,
                "api": false,
                "database": false,
                "testing": false,
                "docker": false,
                "ci": false,
                "commands": [],
                "webview": [],
                "language": ["typescript"],
                "themes": ["default"]
            }),
        ),
        ("preferredLibraries", Value::Object(preferred_libraries)),
        (
            "codeStyle",
            json!({
                "lineWidth": 80,
                "indentSize": 2,
                "indentStyle": "space",
                "quoteMark": "double",
                "semicolons": true,
                "trailingComma": "all",
                "bracketSpacing": true,
                "arrowParens": "always",
                "tabWidth": 2,
                "jsToTs": false,
                "dontRemoveComments": true,
                "shouldAddComments": true,
                "typeOrInterface": "type",
                "importOrRequire": "import",
                "cjsToEsm": false,
                "modernize": {
                    "replaceFs": false,
                    "replacePath": false,
                    "replaceHttp": false,
                    "replaceProcess": false,
                    "replaceConsole": false,
                    "replaceEvents": false
                },
                "importSymbol": ""
            }),
        ),
        (
            "monorepo",
            json!({ "type": "none", "packages": [], "sharedPackages": [] }),
        ),
        ("ignoreDependencies", json!([])),
        ("customRules", json!({})),
        ("multipleRepoCloneMode", json!(false)),
        ("customUserFocusedRepos", json!([])),
        ("customDevsFocusedRepos", json!([])),
        ("hideRepoSuggestions", json!(false)),
        ("customReposOnNewProject", json!(false)),
        ("envComposerOpenBrowser", json!(true)),
    ];

    Value::Object(
        entries
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect(),
    )
}

fn section_comments() -> Vec<SectionComment> {
    let header = format!("RSE CONFIG ({DOCS_URL})");
    vec![
        SectionComment::new(
            "$schema",
            &[header.as_str(), "Restart the CLI to apply your config changes"],
        ),
        SectionComment::new("projectName", &["General project information"]),
        SectionComment::new(
            "skipPromptsUseAutoBehavior",
            &[
                "Enable auto-answering for prompts to skip manual confirmations.",
                "Make sure you have unknown values configured above.",
            ],
        ),
        SectionComment::new("features", &["Project features"]),
        SectionComment::new("projectFramework", &["Primary tech stack/framework"]),
        SectionComment::new("codeStyle", &["Code style preferences"]),
        SectionComment::new(
            "multipleRepoCloneMode",
            &["Settings for cloning an existing repo"],
        ),
        SectionComment::new(
            "envComposerOpenBrowser",
            &["Set to false to disable opening the browser during env composing"],
        ),
        SectionComment::new(
            "ignoreDependencies",
            &["List dependencies to exclude from checks"],
        ),
        SectionComment::new(
            "customRules",
            &[
                "Provide custom rules for Reliverse AI",
                "You can use any json type here in {}",
            ],
        ),
        SectionComment::new(
            "deployBehavior",
            &[
                "Prompt behavior for deployment",
                "Options: prompt | autoYes | autoNo",
            ],
        ),
        SectionComment::new(
            "existingRepoBehavior",
            &[
                "Behavior for existing GitHub repos during project creation",
                "Options: prompt | autoYes | autoYesSkipCommit | autoNo",
            ],
        ),
        SectionComment::new(
            "relinterConfirm",
            &[
                "Behavior for Reliverse AI chat and agent mode",
                "Options: promptOnce | promptEachFile | autoYes",
            ],
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::validate;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_satisfy_schema() {
        assert_eq!(validate(&defaults(), &schema()), Ok(()));
    }

    #[test]
    fn defaults_cover_every_declared_property() {
        let defaults = defaults();
        let schema = schema();
        let object = schema.as_object().expect("object schema");
        for name in object.property_names() {
            assert!(defaults.get(name).is_some(), "missing default for {name}");
        }
    }

    #[test]
    fn section_comments_reference_declared_keys() {
        let definition = definition();
        for section in &definition.section_comments {
            assert!(definition.is_known_key(&section.key), "{}", section.key);
        }
        for key in &definition.migratable_keys {
            assert!(definition.is_known_key(key), "{key}");
        }
    }

    #[test]
    fn file_names_follow_encoding() {
        let definition = definition();
        assert_eq!(definition.file_name(crate::Encoding::Module), "rse.ts");
        assert_eq!(definition.file_name(crate::Encoding::Jsonc), "rse.jsonc");
    }

    #[test]
    fn json_schema_is_draft_07() {
        let rendered = definition().json_schema("rse configuration schema", DOCS_URL);
        assert_eq!(
            rendered["$schema"],
            json!("http://json-schema.org/draft-07/schema#")
        );
        assert_eq!(
            rendered["properties"]["deployBehavior"]["enum"],
            json!(["prompt", "autoYes", "autoNo"])
        );
        assert_eq!(
            rendered["properties"]["codeStyle"]["properties"]["modernize"]["type"],
            json!("object")
        );
    }
}
