//! Budget declarations: per-test ceilings on measured metrics.
//!
//! A budget file maps test names (or the `*` wildcard / `defaults` section) to
//! an ordered set of `max_*` axes plus optional `forbid` / `ignore` lists.
//! Axis order is the order of declaration and drives violation ordering.

use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use crate::errors::{CoreError, Result};
use crate::report::{Metric, Problem};

mod evaluate;

pub use evaluate::{check_test, evaluate};

/// Budget key that applies to every test without an exact entry.
pub const WILDCARD: &str = "*";

/// One declared ceiling, e.g. `max_queries: 10`.
#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    /// Key as declared; doubles as the violation type.
    pub key: String,
    pub metric: Metric,
    pub max: f64,
}

impl Axis {
    pub fn new(key: impl Into<String>, max: f64) -> Self {
        let key = key.into();
        let metric = metric_for_key(&key);
        Self { key, metric, max }
    }
}

fn metric_for_key(key: &str) -> Metric {
    match key {
        "max_queries" | "max_queries_total" => Metric::QueriesTotal,
        "max_duration_ms" => Metric::DurationMs,
        "max_p95_ms" | "max_queries_p95_ms" => Metric::QueriesP95Ms,
        "max_problems" => Metric::Problems,
        other => Metric::Custom(other.trim_start_matches("max_").to_string()),
    }
}

/// Forbids problems by type and/or id pattern.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForbidRule {
    pub problem_type: Option<String>,
    /// Glob over problem ids (`n+1:app/views.py:*`).
    pub id: Option<String>,
}

impl ForbidRule {
    pub fn problem_type(ty: impl Into<String>) -> Self {
        Self {
            problem_type: Some(ty.into()),
            id: None,
        }
    }

    pub fn matches(&self, problem: &Problem) -> bool {
        let type_ok = self
            .problem_type
            .as_deref()
            .map_or(true, |ty| ty == problem.problem_type.as_str());
        let id_ok = self
            .id
            .as_deref()
            .map_or(true, |pattern| id_matches(pattern, &problem.id));
        type_ok && id_ok && (self.problem_type.is_some() || self.id.is_some())
    }

    /// Suffix used in the violation type, `forbidden:<label>`.
    pub fn label(&self) -> String {
        match (&self.problem_type, &self.id) {
            (Some(ty), None) => ty.clone(),
            (Some(ty), Some(id)) => format!("{ty}[{id}]"),
            (None, Some(id)) => format!("id={id}"),
            (None, None) => String::new(),
        }
    }
}

impl<'de> Deserialize<'de> for ForbidRule {
    fn deserialize<D: Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Type(String),
            Rule {
                #[serde(rename = "type", default)]
                problem_type: Option<String>,
                #[serde(default)]
                id: Option<String>,
            },
        }

        Ok(match Raw::deserialize(d)? {
            Raw::Type(ty) => Self::problem_type(ty),
            Raw::Rule { problem_type, id } => Self { problem_type, id },
        })
    }
}

/// Declared ceilings for one test (or for the wildcard).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Budget {
    pub axes: Vec<Axis>,
    pub forbid: Vec<ForbidRule>,
    /// Problem types or id globs exempt from `forbid`.
    pub ignore: Vec<String>,
}

impl Budget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare (or redeclare in place) a `max_*` axis.
    pub fn with_max(mut self, key: impl Into<String>, max: f64) -> Self {
        self.set_axis(Axis::new(key, max));
        self
    }

    pub fn with_forbid(mut self, rule: ForbidRule) -> Self {
        self.forbid.push(rule);
        self
    }

    pub fn with_ignore(mut self, entry: impl Into<String>) -> Self {
        self.ignore.push(entry.into());
        self
    }

    pub fn axis(&self, key: &str) -> Option<&Axis> {
        self.axes.iter().find(|a| a.key == key)
    }

    /// Number of independent checks this budget declares.
    pub fn declared_checks(&self) -> usize {
        self.axes.len() + self.forbid.len()
    }

    fn set_axis(&mut self, axis: Axis) {
        match self.axes.iter_mut().find(|a| a.key == axis.key) {
            Some(existing) => *existing = axis,
            None => self.axes.push(axis),
        }
    }

    pub fn is_ignored(&self, problem: &Problem) -> bool {
        self.ignore.iter().any(|entry| {
            entry == problem.problem_type.as_str() || id_matches(entry, &problem.id)
        })
    }

    /// Overlay `self` on `defaults`: own axes first in declaration order, then
    /// default axes not redeclared here. Forbid and ignore lists are unioned.
    pub fn merged_over(&self, defaults: &Budget) -> Budget {
        let mut merged = self.clone();
        for axis in &defaults.axes {
            if merged.axis(&axis.key).is_none() {
                merged.axes.push(axis.clone());
            }
        }
        for rule in &defaults.forbid {
            if !merged.forbid.contains(rule) {
                merged.forbid.push(rule.clone());
            }
        }
        for entry in &defaults.ignore {
            if !merged.ignore.contains(entry) {
                merged.ignore.push(entry.clone());
            }
        }
        merged
    }

    fn check_patterns(&self) -> Result<()> {
        let patterns = self
            .ignore
            .iter()
            .chain(self.forbid.iter().filter_map(|r| r.id.as_ref()));
        for pattern in patterns {
            if is_glob(pattern) {
                globset::Glob::new(pattern).map_err(|e| {
                    CoreError::invalid_budgets(format!("invalid pattern {pattern:?}: {e}"))
                })?;
            }
        }
        Ok(())
    }
}

impl<'de> Deserialize<'de> for Budget {
    fn deserialize<D: Deserializer<'de>>(d: D) -> std::result::Result<Self, D::Error> {
        struct BudgetVisitor;

        impl<'de> Visitor<'de> for BudgetVisitor {
            type Value = Budget;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a budget mapping such as {max_queries: 10}")
            }

            fn visit_unit<E: de::Error>(self) -> std::result::Result<Budget, E> {
                Ok(Budget::default())
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Budget, A::Error> {
                let mut budget = Budget::default();
                while let Some(key) = map.next_key::<String>()? {
                    match key.as_str() {
                        "forbid" => {
                            budget.forbid = map
                                .next_value::<Option<Vec<ForbidRule>>>()?
                                .unwrap_or_default();
                        }
                        "ignore" => {
                            budget.ignore =
                                map.next_value::<Option<Vec<String>>>()?.unwrap_or_default();
                        }
                        k if k.starts_with("max_") => {
                            let Some(max) = map.next_value::<Option<f64>>()? else {
                                continue;
                            };
                            if !max.is_finite() || max < 0.0 {
                                return Err(de::Error::custom(format!(
                                    "{k} must be a non-negative number, got {max}"
                                )));
                            }
                            budget.set_axis(Axis::new(k, max));
                        }
                        _ => {
                            map.next_value::<de::IgnoredAny>()?;
                        }
                    }
                }
                Ok(budget)
            }
        }

        d.deserialize_any(BudgetVisitor)
    }
}

/// Budgets keyed by test name, with an optional wildcard default.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Budgets {
    default: Option<Budget>,
    tests: BTreeMap<String, Budget>,
}

#[derive(Deserialize)]
struct StructuredBudgets {
    #[serde(default)]
    defaults: Option<Budget>,
    #[serde(default)]
    tests: Option<BTreeMap<String, Budget>>,
}

impl Budgets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_default(mut self, budget: Budget) -> Self {
        self.default = Some(budget);
        self
    }

    pub fn with_test(mut self, name: impl Into<String>, budget: Budget) -> Self {
        self.insert(name, budget);
        self
    }

    /// Insert a budget; the `*` key sets the default.
    pub fn insert(&mut self, name: impl Into<String>, budget: Budget) {
        let name = name.into();
        if name == WILDCARD {
            self.default = Some(budget);
        } else {
            self.tests.insert(name, budget);
        }
    }

    pub fn default_budget(&self) -> Option<&Budget> {
        self.default.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.default.is_none() && self.tests.is_empty()
    }

    /// Budget governing `test`: the exact entry merged over the default, the
    /// exact entry alone, the default alone, or nothing.
    pub fn resolve(&self, test: &str) -> Option<Cow<'_, Budget>> {
        match (self.tests.get(test), &self.default) {
            (Some(own), Some(defaults)) => Some(Cow::Owned(own.merged_over(defaults))),
            (Some(own), None) => Some(Cow::Borrowed(own)),
            (None, Some(defaults)) => Some(Cow::Borrowed(defaults)),
            (None, None) => None,
        }
    }

    /// Parse a YAML (or JSON) budget declaration.
    ///
    /// Two shapes are accepted: `{defaults: .., tests: {name: ..}}` and a flat
    /// `{name: .., "*": ..}` mapping.
    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        let doc: serde_yaml::Value = serde_yaml::from_str(raw)
            .map_err(|e| CoreError::invalid_budgets(format!("failed to parse YAML: {e}")))?;

        let mapping = match &doc {
            serde_yaml::Value::Null => return Ok(Self::default()),
            serde_yaml::Value::Mapping(m) => m,
            _ => {
                return Err(CoreError::invalid_budgets(
                    "budget declaration must be a mapping",
                ))
            }
        };

        let structured = mapping
            .keys()
            .any(|k| matches!(k.as_str(), Some("defaults" | "tests")));
        if structured {
            for key in mapping.keys() {
                match key.as_str() {
                    Some("defaults" | "tests" | "version") => {}
                    other => tracing::warn!(
                        key = other.unwrap_or("<non-string>"),
                        "ignoring unknown top-level budget key"
                    ),
                }
            }
        }

        let budgets = if structured {
            let parsed: StructuredBudgets = serde_yaml::from_value(doc)
                .map_err(|e| CoreError::invalid_budgets(e.to_string()))?;
            let mut budgets = Self {
                default: parsed.defaults,
                tests: BTreeMap::new(),
            };
            for (name, budget) in parsed.tests.unwrap_or_default() {
                budgets.insert(name, budget);
            }
            budgets
        } else {
            let flat: BTreeMap<String, Budget> = serde_yaml::from_value(doc)
                .map_err(|e| CoreError::invalid_budgets(e.to_string()))?;
            flat.into_iter().collect()
        };

        for budget in budgets.default.iter().chain(budgets.tests.values()) {
            budget.check_patterns()?;
        }
        tracing::debug!(
            tests = budgets.tests.len(),
            has_default = budgets.default.is_some(),
            "parsed budgets"
        );
        Ok(budgets)
    }
}

impl FromIterator<(String, Budget)> for Budgets {
    fn from_iter<I: IntoIterator<Item = (String, Budget)>>(iter: I) -> Self {
        let mut budgets = Self::default();
        for (name, budget) in iter {
            budgets.insert(name, budget);
        }
        budgets
    }
}

fn is_glob(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}

fn id_matches(pattern: &str, id: &str) -> bool {
    if !is_glob(pattern) {
        return pattern == id;
    }
    globset::Glob::new(pattern)
        .map(|g| g.compile_matcher().is_match(id))
        .unwrap_or(false)
}
