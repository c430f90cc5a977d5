//! Platform Schema
//! Component prototypes offered by a target platform, and the typed
//! capability interface the validator and controller query them through

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fsm::SYSTEM_COMPONENT;


/// Parameters every component accepts regardless of its prototype
pub const UNIVERSAL_PARAMETERS: [&str; 4] = ["label", "labelColor", "name", "description"];

#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("Platform JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Could not read platform file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Platform has an empty id")]
    EmptyId,
    #[error("Platform '{platform}' declares reserved component '{component}'")]
    ReservedComponent { platform: String, component: String },
    #[error("Component '{component}' member '{member}' declares parameter '{parameter}' twice")]
    DuplicateParameter {
        component: String,
        member: String,
        parameter: String,
    },
    #[error("Platform '{0}' is registered twice")]
    DuplicatePlatform(String),
}

pub type PlatformResult<T> = Result<T, PlatformError>;

// ============================================================================
// SCHEMA
// ============================================================================

/// One argument of a method or signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArgProto {
    pub name: String,
    #[serde(rename = "type", default)]
    pub value_type: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParameterProto {
    #[serde(rename = "type", default)]
    pub value_type: String,
    #[serde(default)]
    pub description: String,
}

/// A callable method or an emitted signal
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MethodProto {
    #[serde(default)]
    pub parameters: Vec<ArgProto>,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VariableProto {
    #[serde(rename = "type", default)]
    pub value_type: String,
    #[serde(default)]
    pub description: String,
}

/// A component type offered by the platform
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ComponentProto {
    #[serde(default)]
    pub description: String,
    /// At most one instance per machine
    #[serde(default)]
    pub singletone: bool,
    #[serde(default)]
    pub parameters: BTreeMap<String, ParameterProto>,
    #[serde(default)]
    pub signals: BTreeMap<String, MethodProto>,
    #[serde(default)]
    pub methods: BTreeMap<String, MethodProto>,
    #[serde(default)]
    pub variables: BTreeMap<String, VariableProto>,
}

/// A target platform schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Platform {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub components: BTreeMap<String, ComponentProto>,
}

impl Platform {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            description: String::new(),
            components: BTreeMap::new(),
        }
    }

    pub fn with_component(mut self, name: impl Into<String>, proto: ComponentProto) -> Self {
        self.components.insert(name.into(), proto);
        self
    }

    /// Parse and check a platform schema
    pub fn from_json(source: &str) -> PlatformResult<Self> {
        let platform: Platform = serde_json::from_str(source)?;
        platform.check()?;
        Ok(platform)
    }

    /// Reject schemas the rest of the editor cannot address unambiguously
    pub fn check(&self) -> PlatformResult<()> {
        if self.id.trim().is_empty() {
            return Err(PlatformError::EmptyId);
        }
        if self.components.contains_key(SYSTEM_COMPONENT) {
            return Err(PlatformError::ReservedComponent {
                platform: self.id.clone(),
                component: SYSTEM_COMPONENT.to_string(),
            });
        }
        for (component, proto) in &self.components {
            for (member, method) in proto.methods.iter().chain(proto.signals.iter()) {
                let mut seen = BTreeSet::new();
                for arg in &method.parameters {
                    if !seen.insert(arg.name.as_str()) {
                        return Err(PlatformError::DuplicateParameter {
                            component: component.clone(),
                            member: member.clone(),
                            parameter: arg.name.clone(),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

// ============================================================================
// CAPABILITY INTERFACE
// ============================================================================

/// Name and ordered parameter names of a method or signal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSignature {
    pub name: String,
    pub params: Vec<String>,
}

impl MethodSignature {
    fn from_proto(name: &str, proto: &MethodProto) -> Self {
        Self {
            name: name.to_string(),
            params: proto.parameters.iter().map(|p| p.name.clone()).collect(),
        }
    }
}

/// Typed queries over a platform. `None` means the component type is unknown.
pub trait PlatformCapabilities {
    fn platform_id(&self) -> &str;

    fn has_component(&self, component_type: &str) -> bool;

    fn list_parameters(&self, component_type: &str) -> Option<Vec<String>>;

    fn list_methods(&self, component_type: &str) -> Option<Vec<MethodSignature>>;

    fn list_signals(&self, component_type: &str) -> Option<Vec<MethodSignature>>;

    fn list_variables(&self, component_type: &str) -> Option<Vec<String>>;

    /// At most one instance of the type may exist per machine
    fn is_singleton(&self, component_type: &str) -> bool;

    fn method(&self, component_type: &str, name: &str) -> Option<MethodSignature> {
        self.list_methods(component_type)?
            .into_iter()
            .find(|m| m.name == name)
    }

    fn signal(&self, component_type: &str, name: &str) -> Option<MethodSignature> {
        self.list_signals(component_type)?
            .into_iter()
            .find(|m| m.name == name)
    }

    fn has_variable(&self, component_type: &str, name: &str) -> bool {
        self.list_variables(component_type)
            .is_some_and(|vars| vars.iter().any(|v| v == name))
    }
}

impl PlatformCapabilities for Platform {
    fn platform_id(&self) -> &str {
        &self.id
    }

    fn has_component(&self, component_type: &str) -> bool {
        self.components.contains_key(component_type)
    }

    fn list_parameters(&self, component_type: &str) -> Option<Vec<String>> {
        let proto = self.components.get(component_type)?;
        Some(proto.parameters.keys().cloned().collect())
    }

    fn list_methods(&self, component_type: &str) -> Option<Vec<MethodSignature>> {
        let proto = self.components.get(component_type)?;
        Some(
            proto
                .methods
                .iter()
                .map(|(name, m)| MethodSignature::from_proto(name, m))
                .collect(),
        )
    }

    fn list_signals(&self, component_type: &str) -> Option<Vec<MethodSignature>> {
        let proto = self.components.get(component_type)?;
        Some(
            proto
                .signals
                .iter()
                .map(|(name, m)| MethodSignature::from_proto(name, m))
                .collect(),
        )
    }

    fn list_variables(&self, component_type: &str) -> Option<Vec<String>> {
        let proto = self.components.get(component_type)?;
        Some(proto.variables.keys().cloned().collect())
    }

    fn is_singleton(&self, component_type: &str) -> bool {
        self.components
            .get(component_type)
            .is_some_and(|proto| proto.singletone)
    }
}

// ============================================================================
// REGISTRY
// ============================================================================

/// Every platform known to the editor, keyed by id
#[derive(Debug, Clone, Default)]
pub struct PlatformRegistry {
    platforms: BTreeMap<String, Platform>,
}

impl PlatformRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, platform: Platform) -> PlatformResult<()> {
        platform.check()?;
        if self.platforms.contains_key(&platform.id) {
            return Err(PlatformError::DuplicatePlatform(platform.id));
        }
        log::debug!("Registered platform '{}'", platform.id);
        self.platforms.insert(platform.id.clone(), platform);
        Ok(())
    }

    /// Load a JSON array of platform schemas
    pub fn from_json(source: &str) -> PlatformResult<Self> {
        let platforms: Vec<Platform> = serde_json::from_str(source)?;
        let mut registry = Self::new();
        for platform in platforms {
            registry.register(platform)?;
        }
        Ok(registry)
    }

    pub fn from_file(path: impl AsRef<Path>) -> PlatformResult<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_json(&source)
    }

    pub fn get(&self, id: &str) -> Option<&Platform> {
        self.platforms.get(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.platforms.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.platforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.platforms.is_empty()
    }
}
