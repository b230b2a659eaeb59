pub mod marker;
pub mod symbol;

pub use marker::{MarkerId, MarkerRegistry, MarkerSpec};
pub use symbol::{LayerType, SymbolLayerSpec};
