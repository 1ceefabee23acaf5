//! Simulation core for the driveable portfolio.
//!
//! Everything in here is engine-agnostic: the vehicle, chase camera, orbit
//! controller, zone detector and UI session are plain data updated by plain
//! functions once per frame. The viewer crate adapts a real renderer and
//! rigid-body engine to the small traits exposed here ([`RigidBodyHandle`],
//! [`UiSink`], [`ListenerRegistry`]).

pub mod camera;
pub mod config;
pub mod drive;
pub mod error;
pub mod input;
pub mod orbit;
pub mod portfolio;
pub mod session;
pub mod vehicle;
pub mod zones;

pub use camera::{CameraEffects, CameraFrame, CameraInput, CameraRig, CameraTuning};
pub use config::DriveConfig;
pub use drive::{
    DriveFrame, DriveSession, EventDisposition, InputEvent, ListenerId, ListenerKind,
    ListenerRegistry, MouseButton,
};
pub use error::ConfigError;
pub use input::{
    ControlAction, ControlIntent, InputAggregator, InputTuning, TouchButton, TouchId, TouchMotion,
    TouchRole,
};
pub use orbit::{OrbitController, OrbitOffset, OrbitTuning, PointerKind};
pub use session::{UiSession, UiSink, is_mobile_viewport};
pub use vehicle::{RigidBodyHandle, VehicleSimulator, VehicleState, VehicleTick, VehicleTuning};
pub use zones::{Zone, ZoneDetector, ZoneEvent, ZoneId, ZoneLayout, ZoneTransition};
