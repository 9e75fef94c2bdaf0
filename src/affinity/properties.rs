//! Affinity request properties and their conversion into directives.
//!
//! Two schemas are accepted inside the `affinity` container property:
//! the namespaced pair `affinity::exec_directive_class` /
//! `affinity::exec_directive_value`, and the flat keys `nic`, `socket`,
//! `cpu`, `cpuset`, `cgroup`. Each schema has its own strategy function and
//! the results are merged, namespaced entries first.

use serde::Serialize;
use std::fmt;

use tracing::{debug, trace};

use crate::error::{AffinityError, AffinityResult};

/// Container property id holding the affinity request.
pub const AFFINITY_ID: &str = "affinity";
pub const EXEC_DIRECTIVE_CLASS: &str = "affinity::exec_directive_class";
pub const EXEC_DIRECTIVE_VALUE: &str = "affinity::exec_directive_value";

/// Flat keys recognised for older requesters, in merge order.
pub const LEGACY_KEYS: [&str; 5] = ["nic", "socket", "cpu", "cpuset", "cgroup"];

const AFFINITY_PROPS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE properties PUBLIC "-//JTRS//DTD SCA V2.2.2 PRF//EN" "properties.dtd">
<properties>
    <simple id="affinity::exec_directive_class" mode="readwrite" name="exec_directive_class" type="string" optional="false">
      <enumerations>
        <enumeration label="socket" value="socket"/>
        <enumeration label="nic" value="nic"/>
        <enumeration label="cpu" value="cpu"/>
        <enumeration label="cgroup" value="cgroup"/>
      </enumerations>
      <kind kindtype="property"/>
      <kind kindtype="configure"/>
      <action type="external"/>
    </simple>
    <simple id="affinity::exec_directive_value" mode="readwrite" name="exec_directive_value" type="string" optional="false">
      <description>The context specification for the exec_directive_class.   See numa library manpage for node (socket) and cpu list specifications.  For cgroup option then a pre-existing cgroup name is required.</description>
      <kind kindtype="property"/>
      <kind kindtype="configure"/>
      <action type="external"/>
    </simple>
</properties>
"#;

/// XML property definitions surfaced to operators for affinity requests.
pub fn get_property_definitions() -> &'static str {
    AFFINITY_PROPS
}

/// One (class, value) affinity request, e.g. `("nic", "eth0")`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AffinityDirective {
    pub class: String,
    pub value: String,
}

impl AffinityDirective {
    pub fn new(class: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for AffinityDirective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.class, self.value)
    }
}

/// Ordered directives; one process may combine e.g. a cgroup and a cpuset.
pub type AffinityDirectives = Vec<AffinityDirective>;

/// Property value as delivered by the framework layer.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Text(String),
    Integer(i64),
    Nested(PropertySet),
}

impl PropertyValue {
    /// String form of a simple value; nested sets have none.
    pub fn to_text(&self) -> Result<String, String> {
        match self {
            PropertyValue::Text(s) => Ok(s.clone()),
            PropertyValue::Integer(i) => Ok(i.to_string()),
            PropertyValue::Nested(_) => Err("nested property has no string form".to_string()),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Text(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::Text(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Integer(value)
    }
}

impl From<PropertySet> for PropertyValue {
    fn from(value: PropertySet) -> Self {
        PropertyValue::Nested(value)
    }
}

/// Ordered id/value pairs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertySet {
    entries: Vec<(String, PropertyValue)>,
}

impl PropertySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, id: impl Into<String>, value: impl Into<PropertyValue>) {
        self.entries.push((id.into(), value.into()));
    }

    pub fn with(mut self, id: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.push(id, value);
        self
    }

    /// First value stored under `id`.
    pub fn get(&self, id: &str) -> Option<&PropertyValue> {
        self.entries.iter().find(|(k, _)| k == id).map(|(_, v)| v)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Wraps directives in the namespaced schema under the `affinity` container.
    pub fn from_directives(directives: &[AffinityDirective]) -> Self {
        let mut inner = PropertySet::new();
        for directive in directives {
            inner.push(EXEC_DIRECTIVE_CLASS, directive.class.as_str());
            inner.push(EXEC_DIRECTIVE_VALUE, directive.value.as_str());
        }
        PropertySet::new().with(AFFINITY_ID, inner)
    }
}

/// True when any top-level id starts with `affinity` (case-insensitive).
pub fn has_affinity(options: &PropertySet) -> bool {
    options.iter().any(|(id, _)| {
        trace!("Affinity option: {}", id);
        id.len() >= AFFINITY_ID.len()
            && id.is_char_boundary(AFFINITY_ID.len())
            && id[..AFFINITY_ID.len()].eq_ignore_ascii_case(AFFINITY_ID)
    })
}

/// Returns the `affinity` (or `AFFINITY`) container, if present and nested.
fn affinity_container(options: &PropertySet) -> Option<&PropertySet> {
    let value = options
        .get(AFFINITY_ID)
        .or_else(|| options.get(&AFFINITY_ID.to_uppercase()))?;
    match value {
        PropertyValue::Nested(set) => Some(set),
        _ => None,
    }
}

/// True when the request carries a `nic` directive in either schema.
pub fn has_nic_affinity(options: &PropertySet) -> bool {
    let Some(map) = affinity_container(options) else {
        return false;
    };
    namespaced_directives(map)
        .iter()
        .chain(legacy_directives(map).iter())
        .any(|d| d.class == "nic")
}

/// Namespaced strategy: pairs the n-th class entry with the n-th value entry.
fn namespaced_directives(map: &PropertySet) -> AffinityDirectives {
    let classes = map.iter().filter(|(id, _)| *id == EXEC_DIRECTIVE_CLASS);
    let values = map.iter().filter(|(id, _)| *id == EXEC_DIRECTIVE_VALUE);

    let mut directives = AffinityDirectives::new();
    for ((_, class), (_, value)) in classes.zip(values) {
        match (class.to_text(), value.to_text()) {
            (Ok(class), Ok(value)) => {
                trace!("exec_directive_class/value: {}/{}", class, value);
                directives.push(AffinityDirective::new(class, value));
            }
            (Err(e), _) | (_, Err(e)) => {
                trace!("Skipping unparsable affinity directive: {}", e);
            }
        }
    }
    directives
}

/// Flat key strategy for older requesters.
fn legacy_directives(map: &PropertySet) -> AffinityDirectives {
    let mut directives = AffinityDirectives::new();
    for key in LEGACY_KEYS {
        let Some(value) = map.get(key) else {
            continue;
        };
        match value.to_text() {
            Ok(value) => {
                debug!("Affinity (legacy) {}: {}", key, value);
                directives.push(AffinityDirective::new(key, value));
            }
            Err(e) => trace!("Skipping unparsable legacy affinity key {}: {}", key, e),
        }
    }
    directives
}

/// Extracts every directive from the `affinity` container.
///
/// Fails when the container is absent or holds no recognised directive.
pub fn convert_properties(options: &PropertySet) -> AffinityResult<AffinityDirectives> {
    let map = affinity_container(options)
        .ok_or_else(|| AffinityError::failed("No Affinity property provided"))?;

    let mut directives = namespaced_directives(map);
    directives.extend(legacy_directives(map));

    if directives.is_empty() {
        return Err(AffinityError::failed(
            "No recognized affinity directive in affinity property",
        ));
    }
    Ok(directives)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn namespaced(class: &str, value: &str) -> PropertySet {
        PropertySet::new().with(
            AFFINITY_ID,
            PropertySet::new()
                .with(EXEC_DIRECTIVE_CLASS, class)
                .with(EXEC_DIRECTIVE_VALUE, value),
        )
    }

    #[test]
    fn test_has_affinity_prefix_case_insensitive() {
        assert!(has_affinity(&PropertySet::new().with("AFFINITY", "x")));
        assert!(has_affinity(
            &PropertySet::new().with(EXEC_DIRECTIVE_CLASS, "cpu")
        ));
        assert!(!has_affinity(&PropertySet::new().with("priority", "x")));
        assert!(!has_affinity(&PropertySet::new()));
    }

    #[test]
    fn test_convert_namespaced() {
        let directives = convert_properties(&namespaced("cpu", "0,2")).unwrap();
        assert_eq!(directives, vec![AffinityDirective::new("cpu", "0,2")]);
    }

    #[test]
    fn test_convert_legacy_and_namespaced_coexist() {
        let options = PropertySet::new().with(
            AFFINITY_ID,
            PropertySet::new()
                .with("cgroup", "rt")
                .with(EXEC_DIRECTIVE_CLASS, "socket")
                .with(EXEC_DIRECTIVE_VALUE, "0")
                .with("cpuset", "fast"),
        );

        let directives = convert_properties(&options).unwrap();
        assert_eq!(
            directives,
            vec![
                AffinityDirective::new("socket", "0"),
                AffinityDirective::new("cpuset", "fast"),
                AffinityDirective::new("cgroup", "rt"),
            ]
        );
    }

    #[test]
    fn test_uppercase_container_is_accepted() {
        let options = PropertySet::new().with("AFFINITY", PropertySet::new().with("nic", "eth0"));
        assert!(has_nic_affinity(&options));
        assert_eq!(
            convert_properties(&options).unwrap(),
            vec![AffinityDirective::new("nic", "eth0")]
        );
    }

    #[test]
    fn test_missing_container_fails() {
        let err = convert_properties(&PropertySet::new().with("cpu", "0")).unwrap_err();
        assert!(err.explanation().contains("No Affinity property provided"));
    }

    #[test]
    fn test_empty_container_fails() {
        let options = PropertySet::new().with(AFFINITY_ID, PropertySet::new().with("other", "x"));
        assert!(convert_properties(&options).is_err());
    }

    #[test]
    fn test_unparsable_entry_is_skipped() {
        let options = PropertySet::new().with(
            AFFINITY_ID,
            PropertySet::new()
                .with("socket", PropertySet::new())
                .with("cpu", 3i64),
        );
        assert_eq!(
            convert_properties(&options).unwrap(),
            vec![AffinityDirective::new("cpu", "3")]
        );
    }

    #[test]
    fn test_has_nic_affinity() {
        assert!(has_nic_affinity(&namespaced("nic", "eth0")));
        assert!(!has_nic_affinity(&namespaced("cpu", "1")));
        assert!(!has_nic_affinity(&PropertySet::new()));
    }

    #[test]
    fn test_from_directives_round_trips() {
        let directives = vec![
            AffinityDirective::new("cgroup", "a"),
            AffinityDirective::new("cpu", "1"),
        ];
        let options = PropertySet::from_directives(&directives);
        assert_eq!(convert_properties(&options).unwrap(), directives);
    }

    #[test]
    fn test_property_definitions_list_both_ids() {
        let xml = get_property_definitions();
        assert!(xml.contains(EXEC_DIRECTIVE_CLASS));
        assert!(xml.contains(EXEC_DIRECTIVE_VALUE));
    }
}
