pub mod body;
pub mod clock;
pub mod config;
pub mod error;
pub mod frame;
pub mod pointer;
pub mod selection;
pub mod session;
pub mod trail;

pub use body::{BodyId, BodyRegistry, OrbitalBody, PERIOD_SCALE_FACTOR};
pub use clock::{SimulationClock, TickResult};
pub use config::{BodyDescriptor, MotionPreset, PointerConfig, SessionConfig};
pub use error::{ConfigError, ConfigResult};
pub use frame::{rotate, MotionVariant, ReferenceBody, ReferenceFrameModel};
pub use pointer::{CameraRotation, PointerTracker, ScreenPos};
pub use selection::{SelectionController, SelectionLabel, SelectionPolicy, SelectionState};
pub use session::{BodyFrame, FrameInstructions, Intent, RenderSink, SimulationSession};
pub use trail::TrailGate;
