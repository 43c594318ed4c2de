use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use anyhow::Context as _;
use serde::Deserialize;
use volley_core::{
    Bytes, CheckKind, HttpRequest, Method, RequestPlan, RequestStep, RunConfig, StepCheck,
};

use crate::run_support::{EnvVars, expand_env};

/// A scenario file: run shape plus the requests every iteration performs.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub(crate) struct ScenarioFile {
    pub name: Option<String>,
    pub vus: Option<u64>,
    #[serde(default)]
    pub duration: Option<YamlDuration>,
    #[serde(default)]
    pub pacing: Option<YamlDuration>,
    pub requests: Vec<RequestYaml>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub(crate) struct RequestYaml {
    pub name: Option<String>,
    pub url: String,
    pub method: Option<String>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    pub body: Option<String>,
    #[serde(default)]
    pub timeout: Option<YamlDuration>,
    #[serde(default)]
    pub checks: Vec<CheckYaml>,
}

/// Exactly one of the check kinds must be set.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub(crate) struct CheckYaml {
    pub name: Option<String>,
    pub status: Option<u16>,
    pub status_in: Option<Vec<u16>>,
    pub body_contains: Option<String>,
    #[serde(default)]
    pub max_latency: Option<YamlDuration>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct YamlDuration(Duration);

impl YamlDuration {
    fn into_inner(self) -> Duration {
        self.0
    }
}

impl<'de> Deserialize<'de> for YamlDuration {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct V;

        impl serde::de::Visitor<'_> for V {
            type Value = YamlDuration;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("duration as string (e.g. 10s), integer seconds, or float seconds")
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(YamlDuration(Duration::from_secs(v)))
            }

            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                let secs =
                    u64::try_from(v).map_err(|_| E::custom("duration must not be negative"))?;
                Ok(YamlDuration(Duration::from_secs(secs)))
            }

            fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                if !v.is_finite() || v < 0.0 {
                    return Err(E::custom("duration must be a non-negative, finite number"));
                }
                Duration::try_from_secs_f64(v)
                    .map(YamlDuration)
                    .map_err(E::custom)
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                let d = humantime::parse_duration(v.trim()).map_err(E::custom)?;
                Ok(YamlDuration(d))
            }
        }

        deserializer.deserialize_any(V)
    }
}

pub(crate) async fn load(path: &Path) -> anyhow::Result<ScenarioFile> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read scenario file: {}", path.display()))?;
    parse(&raw).with_context(|| format!("invalid scenario file: {}", path.display()))
}

pub(crate) fn parse(raw: &str) -> anyhow::Result<ScenarioFile> {
    Ok(serde_yaml::from_str(raw)?)
}

impl ScenarioFile {
    pub(crate) fn run_config(&self) -> RunConfig {
        RunConfig {
            vus: self.vus,
            duration: self.duration.map(YamlDuration::into_inner),
            pacing: self.pacing.map(YamlDuration::into_inner),
        }
    }

    pub(crate) fn to_plan(&self, env: &EnvVars) -> anyhow::Result<RequestPlan> {
        let steps = self
            .requests
            .iter()
            .enumerate()
            .map(|(i, r)| r.to_step(env).with_context(|| format!("requests[{i}]")))
            .collect::<anyhow::Result<Vec<_>>>()?;
        Ok(RequestPlan::new(steps)?)
    }
}

impl RequestYaml {
    fn to_step(&self, env: &EnvVars) -> anyhow::Result<RequestStep> {
        let method = match &self.method {
            Some(m) => Method::from_bytes(m.trim().to_ascii_uppercase().as_bytes())
                .with_context(|| format!("invalid method: {m}"))?,
            None => Method::GET,
        };

        let mut request = HttpRequest::new(method, expand_env(&self.url, env)?);
        for (k, v) in &self.headers {
            request = request.with_header(k.clone(), expand_env(v, env)?);
        }
        if let Some(body) = &self.body {
            request = request.with_body(Bytes::from(expand_env(body, env)?));
        }
        if let Some(timeout) = self.timeout {
            request = request.with_timeout(timeout.into_inner());
        }

        let mut step = RequestStep::new(request);
        step.name = self.name.clone();
        for (i, c) in self.checks.iter().enumerate() {
            step = step.check(c.to_check().with_context(|| format!("checks[{i}]"))?);
        }
        Ok(step)
    }
}

impl CheckYaml {
    fn to_check(&self) -> anyhow::Result<StepCheck> {
        let mut kinds = Vec::new();
        if let Some(code) = self.status {
            kinds.push(CheckKind::Status(code));
        }
        if let Some(codes) = &self.status_in {
            if codes.is_empty() {
                anyhow::bail!("`statusIn` must list at least one status");
            }
            kinds.push(CheckKind::StatusIn(codes.clone()));
        }
        if let Some(needle) = &self.body_contains {
            kinds.push(CheckKind::BodyContains(needle.clone()));
        }
        if let Some(max) = self.max_latency {
            kinds.push(CheckKind::MaxLatency(max.into_inner()));
        }

        let kind = match kinds.len() {
            1 => kinds.remove(0),
            0 => anyhow::bail!(
                "check needs one of `status`, `statusIn`, `bodyContains`, `maxLatency`"
            ),
            _ => anyhow::bail!(
                "check sets more than one of `status`, `statusIn`, `bodyContains`, `maxLatency`"
            ),
        };

        Ok(StepCheck {
            name: self.name.clone(),
            kind,
        })
    }
}
