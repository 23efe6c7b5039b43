use super::config::ProjectConfig;
use crate::errors::ConfigError;
use crate::fs::ttcn3_files;
use serde::Serialize;
use serde_json::Value;
use std::fmt::Write as _;
use std::path::Path;

/// Snapshot of a project's configuration as shown to users and scripts.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigReport {
    pub args: Vec<String>,
    #[serde(flatten)]
    pub config: ProjectConfig,
    pub env: Vec<String>,
    pub files: Vec<String>,
    /// First problem met while collecting the report. Rendered into the
    /// shell script; not part of the JSON form.
    #[serde(skip)]
    pub error: Option<String>,
}

impl ConfigReport {
    /// Collects the TTCN-3 files of sources and imports. Missing entries are
    /// recorded in `error` and the others are still listed.
    pub fn new(args: Vec<String>, config: ProjectConfig) -> Self {
        let entries: Vec<_> = config
            .sources
            .iter()
            .chain(config.imports.iter())
            .cloned()
            .collect();
        let (files, errors) = ttcn3_files(&entries);
        let error = errors
            .first()
            .map(|(path, e)| format!("{}: {}", path.display(), e));

        ConfigReport {
            args,
            env: config.environ(),
            files: files.iter().map(|f| display(f)).collect(),
            config,
            error,
        }
    }

    /// Shell script exporting the configuration as `K3_*` variables.
    pub fn to_shell_script(&self) -> String {
        let config = &self.config;
        let mut out = String::new();
        let _ = writeln!(
            out,
            "# This is a generated output of ttcn3 show. Args: {:?}",
            self.args
        );
        out.push_str(
            r#"
# k3-hook calls the K3 test hook (if defined) with action passed by $1.
function k3-hook()
{
    if [ -n "$K3_HOOKS_FILE" ]; then
        K3_SOURCES="${K3_SOURCES[*]}" \
        K3_IMPORTS="${K3_IMPORTS[*]}" \
        K3_TTCN3_FILES="${K3_TTCN3_FILES[*]}" \
            "$K3_HOOKS_FILE" "$@" 1>&2
    fi
}

"#,
        );

        if !config.name.is_empty() {
            let _ = writeln!(out, "export K3_NAME='{}'", config.name);
        }
        if let Some(hooks) = &config.hooks_file {
            let _ = writeln!(out, "export K3_HOOKS_FILE='{}'", display(hooks));
        }
        if !config.root.as_os_str().is_empty() {
            let _ = writeln!(out, "export K3_SOURCE_DIR='{}'", display(&config.root));
        }
        out.push('\n');
        for var in &self.env {
            let _ = writeln!(out, "export '{}'", var);
        }
        out.push('\n');

        let sources: Vec<String> = config.sources.iter().map(|p| display(p)).collect();
        let imports: Vec<String> = config.imports.iter().map(|p| display(p)).collect();
        write_array(&mut out, "K3_SOURCES", &sources);
        write_array(&mut out, "K3_IMPORTS", &imports);
        write_array(&mut out, "K3_TTCN3_FILES", &self.files);

        if let Some(error) = &self.error {
            let _ = write!(
                out,
                r#"
# ERROR
#
# Output might not be complete, because some errors have occurred during
# execution. We return "false", to give you the chance to detect this
# situation
read -r -d '' K3_ERROR <<'EOF'
{}
EOF
false
"#,
                error
            );
        }
        out
    }
}

fn write_array(out: &mut String, name: &str, values: &[String]) {
    let _ = writeln!(out, "{}=(", name);
    for value in values {
        let _ = writeln!(out, "\t{}", value);
    }
    out.push_str(")\n\n");
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

/// Values of a dotted configuration key. Lists yield one value per
/// element, string maps yield sorted `'key=value'` entries and scalars a
/// single value.
pub fn lookup(config: &ProjectConfig, key: &str) -> Result<Vec<String>, ConfigError> {
    let mut current = serde_json::to_value(config)?;
    for part in key.split('.') {
        let next = match &current {
            Value::Object(map) => map.get(part).cloned(),
            _ => None,
        };
        current = next.ok_or_else(|| ConfigError::KeyNotFound(part.to_string()))?;
    }

    match current {
        Value::Array(items) => Ok(items.iter().map(scalar).collect()),
        Value::Object(map) if map.values().all(Value::is_string) => {
            let mut entries: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("'{}={}'", k, scalar(v)))
                .collect();
            entries.sort();
            Ok(entries)
        }
        Value::Object(_) => Err(ConfigError::NotAValue(key.to_string())),
        Value::Null => Ok(Vec::new()),
        other => Ok(vec![scalar(&other)]),
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
