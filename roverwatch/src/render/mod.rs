//! Map rendering: the surface contract and the driver that reconciles
//! engine state onto it.
//!
//! # Module Structure
//!
//! - `surface` - [`RenderSurface`] trait, events, and errors
//! - `style` - base map style descriptors and attribution
//! - `overlay` - overlay ids, icons, GeoJSON and layer builders
//! - `sync` - [`MapSync`], the reconcile driver
//! - `memory` - [`MemorySurface`], an in-memory surface

pub mod memory;
pub mod overlay;
pub mod style;
mod surface;
mod sync;

pub use memory::{MemorySurface, SurfaceCall, SurfaceModel};
pub use style::{aggregate_attribution, BaseSource, BaseSourceKind, StyleDescriptor};
pub use surface::{
    ImageData, LayerDescriptor, LayerKind, RenderSurface, SurfaceError, SurfaceEvent,
    SurfaceOptions,
};
pub use sync::{MapSync, DEFAULT_PAN_DURATION};
