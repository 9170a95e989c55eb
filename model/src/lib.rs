#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod animator;
mod coordinate;
mod densify;
mod map;
mod route;
mod scheduler;

pub use self::animator::{AnimationPhase, AnimatorConfig, NavigationAnimator};
pub use self::coordinate::{Coordinate, Polyline};
pub use self::densify::densify;
pub use self::map::{
    clear_route_layers, Camera, CameraOptions, Layer, LayerKind, MapState, MapView, MarkerHandle,
};
pub use self::route::{Route, RouteStyle};
pub use self::scheduler::{FrameQueue, FrameRequest, FrameScheduler};
