use std::collections::BTreeMap;

use anyhow::Context as _;

pub(crate) type EnvVars = BTreeMap<String, String>;

pub(crate) fn merged_env(overrides: &[String]) -> anyhow::Result<EnvVars> {
    let mut map: EnvVars = std::env::vars().collect();

    for raw in overrides {
        let (k, v) = parse_env_override(raw)?;
        map.insert(k, v);
    }

    Ok(map)
}

fn parse_env_override(s: &str) -> anyhow::Result<(String, String)> {
    let (k, v) = s
        .split_once('=')
        .with_context(|| format!("invalid --env (expected KEY=VALUE): {s}"))?;
    if k.is_empty() {
        anyhow::bail!("invalid --env (empty KEY): {s}");
    }
    Ok((k.to_string(), v.to_string()))
}

/// Replace every `${NAME}` in `input` with its value from `env`.
pub(crate) fn expand_env(input: &str, env: &EnvVars) -> anyhow::Result<String> {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after
            .find('}')
            .with_context(|| format!("unterminated `${{` in: {input}"))?;
        let name = &after[..end];
        if name.is_empty() {
            anyhow::bail!("empty variable name `${{}}` in: {input}");
        }
        let value = env
            .get(name)
            .with_context(|| {
                format!("environment variable `{name}` is not set (used in: {input})")
            })?;
        out.push_str(value);
        rest = &after[end + 1..];
    }
    out.push_str(rest);

    Ok(out)
}
