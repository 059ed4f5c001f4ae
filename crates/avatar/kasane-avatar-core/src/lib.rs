//! Kasane Avatar Core (renderer-agnostic)
//!
//! Per-frame animation-to-mesh synchronization for layered 2D character
//! models: an ordered modulator pipeline over a shared parameter store,
//! keyform mesh deformation behind a backend trait, persistent vertex-buffer
//! sync against an abstract renderer, stable draw ordering, and stencil clip
//! compositing with nested masks.

pub mod backend;
pub mod breath;
pub mod clip;
pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod expression;
pub mod eye_blink;
pub mod ids;
pub mod interp;
pub mod keyform;
pub mod mesh;
pub mod motion;
pub mod order;
pub mod param;
pub mod physics;
pub mod pose;
pub mod renderer;
pub mod sampling;
pub mod stored_model;

// Re-exports for consumers (hosts)
pub use backend::{DrawableStatic, ModelBackend};
pub use config::{Config, MaskCombine};
pub use data::{
    DrawableDef, ExpressionData, ExpressionEntry, Keypoint, ModelData, MotionData, MotionTrack,
    ParameterDef, PartDef, PhysicsData, PhysicsInput, PhysicsOutput, PhysicsSetting, PoseData,
    PosePart, ScalarCurve, Transitions, Vec2, VertexDeform,
};
pub use engine::{Avatar, Stage, EVAL_ORDER};
pub use error::{AvatarError, RendererError};
pub use ids::{MeshId, TextureHandle};
pub use keyform::KeyformBackend;
pub use mesh::MeshSync;
pub use motion::PlayMode;
pub use param::ParamStore;
pub use renderer::{BlendFactor, BlendMode, Renderer, StencilTest, Transform2D, Vertex};
pub use stored_model::{
    parse_expression_json, parse_model_json, parse_motion_json, parse_physics_json,
    parse_pose_json,
};
