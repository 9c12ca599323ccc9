//! Archetype component + registry.

use bevy::prelude::*;
use std::collections::HashMap;
use std::ops::Deref;
use std::sync::Arc;

use super::{CombatantConfig, ConfigError};

/// Shared archetype config attached to every agent of that archetype.
#[derive(Component, Debug, Clone)]
pub struct Archetype {
    pub name: String,
    config: Arc<CombatantConfig>,
}

impl Archetype {
    pub fn new(name: impl Into<String>, config: CombatantConfig) -> Self {
        Self {
            name: name.into(),
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &CombatantConfig {
        &self.config
    }

    /// Two handles point at the very same record.
    pub fn shares_config_with(&self, other: &Archetype) -> bool {
        Arc::ptr_eq(&self.config, &other.config)
    }
}

impl Deref for Archetype {
    type Target = CombatantConfig;

    fn deref(&self) -> &Self::Target {
        &self.config
    }
}

/// Named archetype records (scout, heavy, caster, ...).
#[derive(Resource, Debug)]
pub struct ArchetypeRegistry {
    archetypes: HashMap<String, Archetype>,
}

impl Default for ArchetypeRegistry {
    fn default() -> Self {
        Self::with_presets()
    }
}

impl ArchetypeRegistry {
    pub fn empty() -> Self {
        Self {
            archetypes: HashMap::new(),
        }
    }

    pub fn with_presets() -> Self {
        let mut registry = Self::empty();
        registry.register("scout", CombatantConfig::scout());
        registry.register("heavy", CombatantConfig::heavy());
        registry.register("caster", CombatantConfig::caster());
        registry
    }

    pub fn register(&mut self, name: &str, config: CombatantConfig) -> Archetype {
        let archetype = Archetype::new(name, config);
        self.archetypes.insert(name.to_string(), archetype.clone());
        archetype
    }

    pub fn load_json(&mut self, name: &str, json: &str) -> Result<Archetype, ConfigError> {
        let config = CombatantConfig::from_json(json)?;
        crate::log_info(&format!("📋 Archetype '{}' loaded from JSON", name));
        Ok(self.register(name, config))
    }

    pub fn get(&self, name: &str) -> Option<&Archetype> {
        self.archetypes.get(name)
    }

    /// Unknown names fall back to default tuning (agent keeps working).
    pub fn resolve(&mut self, name: &str) -> Archetype {
        if let Some(archetype) = self.archetypes.get(name) {
            return archetype.clone();
        }

        crate::log_warning(&format!(
            "⚠️ Archetype '{}' not configured, falling back to defaults",
            name
        ));
        self.register(name, CombatantConfig::default())
    }
}
