//! Canonical JSON decoding helpers.
//!
//! Hosts with their own asset pipelines construct the `data` types directly;
//! these helpers decode the canonical JSON shape (the one the fixtures use)
//! and run basic validation. Failures surface as `AssetLoad` and leave no
//! partial state behind.

use crate::data::{ExpressionData, ModelData, MotionData, PhysicsData, PoseData};
use crate::error::AvatarError;

fn parse<T: serde::de::DeserializeOwned>(s: &str, what: &str) -> Result<T, AvatarError> {
    serde_json::from_str(s).map_err(|e| AvatarError::AssetLoad(format!("{what} parse error: {e}")))
}

pub fn parse_model_json(s: &str) -> Result<ModelData, AvatarError> {
    let data: ModelData = parse(s, "model")?;
    data.validate_basic().map_err(AvatarError::AssetLoad)?;
    Ok(data)
}

pub fn parse_motion_json(s: &str) -> Result<MotionData, AvatarError> {
    let data: MotionData = parse(s, "motion")?;
    data.validate_basic().map_err(AvatarError::AssetLoad)?;
    Ok(data)
}

pub fn parse_expression_json(s: &str) -> Result<ExpressionData, AvatarError> {
    let data: ExpressionData = parse(s, "expression")?;
    data.validate_basic().map_err(AvatarError::AssetLoad)?;
    Ok(data)
}

pub fn parse_physics_json(s: &str) -> Result<PhysicsData, AvatarError> {
    let data: PhysicsData = parse(s, "physics")?;
    data.validate_basic().map_err(AvatarError::AssetLoad)?;
    Ok(data)
}

pub fn parse_pose_json(s: &str) -> Result<PoseData, AvatarError> {
    let data: PoseData = parse(s, "pose")?;
    data.validate_basic().map_err(AvatarError::AssetLoad)?;
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_json_is_asset_load_error() {
        assert!(matches!(
            parse_model_json("{not json"),
            Err(AvatarError::AssetLoad(_))
        ));
    }

    #[test]
    fn minimal_motion_round_trips() {
        let json = r#"{
            "name": "nod",
            "duration": 1200,
            "tracks": [
                { "param": "ParamAngleY", "points": [
                    { "stamp": 0.0, "value": 0.0 },
                    { "stamp": 0.5, "value": -10.0 },
                    { "stamp": 1.0, "value": 0.0 }
                ]}
            ]
        }"#;
        let motion = parse_motion_json(json).unwrap();
        assert_eq!(motion.duration_ms, 1200);
        assert_eq!(motion.tracks.len(), 1);
    }

    #[test]
    fn invalid_stamp_order_is_rejected() {
        let json = r#"{
            "name": "bad",
            "duration": 1000,
            "tracks": [
                { "param": "P", "points": [
                    { "stamp": 0.8, "value": 0.0 },
                    { "stamp": 0.2, "value": 1.0 }
                ]}
            ]
        }"#;
        assert!(matches!(
            parse_motion_json(json),
            Err(AvatarError::AssetLoad(_))
        ));
    }
}
