//! JSON profile of a layer

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use super::{Layer, LayerKind};
use crate::error::Result;
use crate::options::LayerOptions;

/// Serializable description of a layer: its kind name, id and options
///
/// The mask travels in serialized form inside the options; rebuilding the
/// live geometry is up to the geometry subsystem.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayerProfile {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub options: LayerOptions,
}

impl Layer {
    pub fn to_profile(&self) -> LayerProfile {
        let state = self.state();
        LayerProfile {
            kind: self.inner.kind.name().to_string(),
            id: state.id.clone(),
            options: state.options.clone(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.to_profile())?)
    }

    /// Rebuild a detached layer; the profile's type name is informational
    pub fn from_profile(profile: LayerProfile, kind: impl LayerKind + 'static) -> Self {
        if profile.kind != kind.name() {
            tracing::debug!(
                profile = %profile.kind,
                kind = kind.name(),
                "restoring profile with a different layer kind"
            );
        }
        Self::with_kind(profile.id, profile.options, Rc::new(kind))
    }

    pub fn from_json(json: &str, kind: impl LayerKind + 'static) -> Result<Self> {
        let profile: LayerProfile = serde_json::from_str(json)?;
        Ok(Self::from_profile(profile, kind))
    }
}
