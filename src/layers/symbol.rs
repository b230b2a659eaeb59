use crate::{MapError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerType {
    Symbol,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SymbolLayout {
    pub icon_image: String,
    pub icon_size: f64,
}

/// A symbol layer drawing one registered image at every feature of a source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolLayerSpec {
    pub id: String,
    #[serde(rename = "type")]
    pub layer_type: LayerType,
    pub source: String,
    pub layout: SymbolLayout,
}

impl SymbolLayerSpec {
    /// Layer `id` drawing the image registered under `id` from `source`
    pub fn new(id: impl Into<String>, source: impl Into<String>, icon_size: f64) -> Result<Self> {
        let id = id.into();
        let source = source.into();

        if id.is_empty() || source.is_empty() {
            return Err(MapError::Layer(
                "symbol layer needs a layer id and a source id".to_string(),
            ));
        }
        if icon_size.is_nan() || icon_size <= 0.0 {
            return Err(MapError::Layer(format!(
                "icon size must be positive, got {}",
                icon_size
            )));
        }

        Ok(Self {
            layout: SymbolLayout {
                icon_image: id.clone(),
                icon_size,
            },
            id,
            layer_type: LayerType::Symbol,
            source,
        })
    }
}
