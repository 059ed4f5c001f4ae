use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use serde::Deserialize;

pub mod recording;

pub use recording::{RecordingRenderer, RenderEvent};

static MANIFEST: Lazy<Manifest> = Lazy::new(|| {
    let raw = include_str!("../../../../fixtures/manifest.json");
    serde_json::from_str(raw).expect("fixtures manifest should parse")
});

#[derive(Debug, Deserialize)]
struct Manifest {
    models: HashMap<String, String>,
    motions: HashMap<String, String>,
    expressions: HashMap<String, String>,
    physics: HashMap<String, String>,
    poses: HashMap<String, String>,
}

fn fixtures_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../fixtures")
}

fn read_to_string(rel: &str) -> Result<String> {
    let path = fixtures_root().join(rel);
    fs::read_to_string(&path)
        .with_context(|| format!("failed to read fixture at {}", path.display()))
}

fn lookup<'a>(map: &'a HashMap<String, String>, kind: &str, name: &str) -> Result<&'a String> {
    map.get(name)
        .ok_or_else(|| anyhow!("unknown {kind} fixture '{name}'"))
}

pub mod models {
    use super::*;
    use kasane_avatar_core::{parse_model_json, ModelData};

    pub fn keys() -> Vec<String> {
        MANIFEST.models.keys().cloned().collect()
    }

    pub fn json(name: &str) -> Result<String> {
        read_to_string(lookup(&MANIFEST.models, "model", name)?)
    }

    pub fn data(name: &str) -> Result<ModelData> {
        parse_model_json(&json(name)?).map_err(|e| anyhow!("model fixture '{name}': {e}"))
    }
}

pub mod motions {
    use super::*;
    use kasane_avatar_core::{parse_motion_json, MotionData};

    pub fn keys() -> Vec<String> {
        MANIFEST.motions.keys().cloned().collect()
    }

    pub fn json(name: &str) -> Result<String> {
        read_to_string(lookup(&MANIFEST.motions, "motion", name)?)
    }

    pub fn data(name: &str) -> Result<MotionData> {
        parse_motion_json(&json(name)?).map_err(|e| anyhow!("motion fixture '{name}': {e}"))
    }
}

pub mod expressions {
    use super::*;
    use kasane_avatar_core::{parse_expression_json, ExpressionData};

    pub fn json(name: &str) -> Result<String> {
        read_to_string(lookup(&MANIFEST.expressions, "expression", name)?)
    }

    pub fn data(name: &str) -> Result<ExpressionData> {
        parse_expression_json(&json(name)?).map_err(|e| anyhow!("expression fixture '{name}': {e}"))
    }
}

pub mod physics {
    use super::*;
    use kasane_avatar_core::{parse_physics_json, PhysicsData};

    pub fn json(name: &str) -> Result<String> {
        read_to_string(lookup(&MANIFEST.physics, "physics", name)?)
    }

    pub fn data(name: &str) -> Result<PhysicsData> {
        parse_physics_json(&json(name)?).map_err(|e| anyhow!("physics fixture '{name}': {e}"))
    }
}

pub mod poses {
    use super::*;
    use kasane_avatar_core::{parse_pose_json, PoseData};

    pub fn json(name: &str) -> Result<String> {
        read_to_string(lookup(&MANIFEST.poses, "pose", name)?)
    }

    pub fn data(name: &str) -> Result<PoseData> {
        parse_pose_json(&json(name)?).map_err(|e| anyhow!("pose fixture '{name}': {e}"))
    }
}
