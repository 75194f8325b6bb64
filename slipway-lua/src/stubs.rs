//! Editor stubs for the `slipway` helper table
//!
//! Lua language servers pick these annotations up so definition files get
//! completion for parameter names and application types.

use slipway_core::domain::ApplicationType;

/// Parameter fields of a definition table with their Lua types
const DEFINITION_FIELDS: &[(&str, &str, &str)] = &[
    ("appName", "string", "Workload name, also the container and service name"),
    ("appType", "slipway.AppType", "Application type"),
    ("environment", "string?", "Target environment (default: stg)"),
    ("namespace", "string?", "Target namespace (default: intsys)"),
    ("exposePort", "integer?", "Container and service port"),
    ("harbourSecret", "string?", "Image pull secret name"),
    ("project", "string?", "Registry project (default: intsys)"),
    ("registryHost", "string?", "Registry host template, `{environment}` is substituted"),
    ("memoryLimit", "string?", "Container memory limit (default: 512Mi)"),
    ("cpuLimit", "string?", "Container CPU limit, omitted when unset"),
    ("sonarEnabled", "boolean?", "Run static analysis"),
    ("sonarProjectKey", "string?", "Analysis project key (default: appName)"),
    ("sonarProjectName", "string?", "Analysis project name (default: appName)"),
    ("successEmail", "string?", "Success notification recipients"),
    ("failureEmail", "string?", "Failure notification recipients"),
    ("failureCC", "string?", "Failure notification CC list"),
    ("buildToolImage", "string?", "Image running the build and analysis"),
    ("scanToolImage", "string?", "Image running the vulnerability scan"),
    ("deployToolImage", "string?", "Image running kubectl"),
];

/// Generates the LuaLS stub file for the `slipway` global
pub fn stubs() -> String {
    let app_types = ApplicationType::ALL
        .iter()
        .map(|t| format!("\"{}\"", t))
        .collect::<Vec<_>>()
        .join("|");

    let mut out = String::from("---@meta\n\n");
    out.push_str(&format!("---@alias slipway.AppType {}\n\n", app_types));

    out.push_str("---Pipeline definition parameters\n---@class slipway.Definition\n");
    for (name, ty, description) in DEFINITION_FIELDS {
        out.push_str(&format!("---@field {} {} {}\n", name, ty, description));
    }

    out.push_str(
        r#"
---@class slipway.Builder
local Builder = {}

---Set a definition parameter
---@param key string
---@param value string|number|boolean
---@return slipway.Builder
function Builder:set(key, value) end

---Finish the definition
---@return slipway.Definition
function Builder:build() end

---Helpers for pipeline definition files
---@class slipway
slipway = {}

---Return a definition table unchanged
---@param definition slipway.Definition
---@return slipway.Definition
function slipway.define(definition) end

---Start a definition for an application
---@param name string
---@param app_type slipway.AppType
---@return slipway.Builder
function slipway.app(name, app_type) end
"#,
    );

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use slipway_core::resolve::RECOGNIZED_KEYS;

    #[test]
    fn test_stubs_cover_every_parameter() {
        let stubs = stubs();
        for key in RECOGNIZED_KEYS {
            assert!(
                stubs.contains(&format!("---@field {} ", key)),
                "missing field {}",
                key
            );
        }
        assert_eq!(DEFINITION_FIELDS.len(), RECOGNIZED_KEYS.len());
    }

    #[test]
    fn test_stubs_list_app_types() {
        let stubs = stubs();
        assert!(stubs.starts_with("---@meta"));
        assert!(stubs.contains(r#""angular-nginx"|"react-nginx""#));
        assert!(stubs.contains("function slipway.app(name, app_type) end"));
    }

    #[test]
    fn test_stubs_are_valid_lua() {
        let lua = mlua::Lua::new();
        lua.load(stubs()).exec().unwrap();
    }
}
