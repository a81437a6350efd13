// SPDX-License-Identifier: MIT OR Apache-2.0
//! Registry of semantic types, with RON definitions for custom types.

use crate::error::ConfigError;
use crate::semantics::{
    CompositeSemantics, PropertyDescriptor, ScalarSemantics, TypeSemantics, VectorSemantics,
};
use crate::value::SlotValue;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Field of a composite type definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// Field name
    pub name: String,
    /// Registered type of the field
    pub type_id: String,
}

/// Declarative semantic type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypeDefinition {
    /// Single value with a default
    Scalar {
        /// Type identifier
        id: String,
        /// Default value, also fixes the value type
        default: SlotValue,
    },
    /// Float vector with named components
    Vector {
        /// Type identifier
        id: String,
        /// Component names, 2 to 4
        components: Vec<String>,
        /// Default per component
        default: Vec<f32>,
    },
    /// Named fields without a value of their own
    Composite {
        /// Type identifier
        id: String,
        /// Fields in order
        fields: Vec<FieldDefinition>,
    },
}

impl TypeDefinition {
    /// Type identifier
    pub fn id(&self) -> &str {
        match self {
            Self::Scalar { id, .. } | Self::Vector { id, .. } | Self::Composite { id, .. } => id,
        }
    }
}

/// Set of type definitions loaded from RON
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SemanticsConfig {
    /// Definitions, each may reference built-in types and earlier definitions
    pub types: Vec<TypeDefinition>,
}

impl SemanticsConfig {
    /// Parse from RON
    pub fn from_ron(source: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(source)?)
    }

    /// Write as pretty RON
    pub fn to_ron(&self) -> Result<String, ConfigError> {
        let config = ron::ser::PrettyConfig::default().depth_limit(4);
        Ok(ron::ser::to_string_pretty(self, config)?)
    }
}

/// Registry of available semantic types
#[derive(Debug)]
pub struct SemanticsRegistry {
    /// Registered types by ID
    types: IndexMap<String, Arc<dyn TypeSemantics>>,
}

impl SemanticsRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            types: IndexMap::new(),
        }
    }

    /// Registry with the built-in effect property types
    pub fn builtin() -> Self {
        let mut registry = Self::new();

        registry.register(Arc::new(ScalarSemantics::float(0.0)));
        registry.register(Arc::new(ScalarSemantics::int(0)));
        registry.register(Arc::new(ScalarSemantics::uint(0)));
        registry.register(Arc::new(ScalarSemantics::bool(false)));

        registry.register(Arc::new(VectorSemantics::float2([0.0; 2])));
        registry.register(Arc::new(VectorSemantics::float3([0.0; 3])));
        registry.register(Arc::new(VectorSemantics::float4([0.0; 4])));
        registry.register(Arc::new(VectorSemantics::color([1.0; 4])));

        registry.register(Arc::new(CompositeSemantics::sphere()));
        registry.register(Arc::new(CompositeSemantics::aabox()));

        registry
    }

    /// Built-in types extended with the definitions of a config
    pub fn from_config(config: &SemanticsConfig) -> Result<Self, ConfigError> {
        let mut registry = Self::builtin();
        for definition in &config.types {
            registry.define(definition)?;
        }
        Ok(registry)
    }

    /// Built-in types extended with RON definitions
    pub fn from_ron(source: &str) -> Result<Self, ConfigError> {
        Self::from_config(&SemanticsConfig::from_ron(source)?)
    }

    /// Register a semantic type, replacing any type with the same ID
    pub fn register(&mut self, semantics: Arc<dyn TypeSemantics>) {
        self.types.insert(semantics.id().to_string(), semantics);
    }

    /// Register a type from its definition
    pub fn define(&mut self, definition: &TypeDefinition) -> Result<(), ConfigError> {
        let semantics: Arc<dyn TypeSemantics> = match definition {
            TypeDefinition::Scalar { id, default } => {
                Arc::new(ScalarSemantics::new(id.clone(), default.clone()))
            }
            TypeDefinition::Vector {
                id,
                components,
                default,
            } => {
                let vector = VectorSemantics::new(id.clone(), components.clone(), default.clone())
                    .ok_or_else(|| ConfigError::InvalidDefinition {
                        id: id.clone(),
                        reason: "vectors need 2 to 4 components and one default each".to_string(),
                    })?;
                Arc::new(vector)
            }
            TypeDefinition::Composite { id, fields } => {
                if fields.is_empty() {
                    return Err(ConfigError::InvalidDefinition {
                        id: id.clone(),
                        reason: "composites need at least one field".to_string(),
                    });
                }
                let fields = fields
                    .iter()
                    .map(|field| self.descriptor(field.name.clone(), &field.type_id))
                    .collect::<Result<Vec<_>, _>>()?;
                Arc::new(CompositeSemantics::new(id.clone(), fields))
            }
        };
        tracing::debug!(id = definition.id(), "Registered semantic type");
        self.register(semantics);
        Ok(())
    }

    /// Get a type by ID
    pub fn get(&self, id: &str) -> Option<&Arc<dyn TypeSemantics>> {
        self.types.get(id)
    }

    /// Get all registered types
    pub fn types(&self) -> impl Iterator<Item = &Arc<dyn TypeSemantics>> {
        self.types.values()
    }

    /// Create a property descriptor of a registered type
    pub fn descriptor(
        &self,
        name: impl Into<String>,
        type_id: &str,
    ) -> Result<PropertyDescriptor, ConfigError> {
        let semantics = self
            .get(type_id)
            .ok_or_else(|| ConfigError::UnknownType(type_id.to_string()))?;
        Ok(PropertyDescriptor::new(name, Arc::clone(semantics)))
    }
}

impl Default for SemanticsRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
