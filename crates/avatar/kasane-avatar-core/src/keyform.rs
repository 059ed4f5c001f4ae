//! Keyform deformation backend over the canonical model data.
//!
//! Vertex deforms and scalar curves are bound to dense parameter indices at
//! construction so the per-frame update never does string lookups. Unknown
//! parameter ids in a binding are a load error.

use hashbrown::HashMap;

use crate::backend::{DrawableStatic, ModelBackend};
use crate::data::{ModelData, ParameterDef, ScalarCurve, VertexDeform};
use crate::error::AvatarError;
use crate::interp::{lerp_f32, piecewise_linear, piecewise_segment};

#[derive(Debug)]
struct BoundDeform {
    param: usize,
    keys: Vec<f32>,
    deltas: Vec<Vec<[f32; 2]>>,
}

#[derive(Debug)]
struct BoundCurve {
    param: usize,
    keys: Vec<f32>,
    values: Vec<f32>,
}

#[derive(Debug)]
struct KeyformDrawable {
    base: Vec<[f32; 2]>,
    base_order: i32,
    base_opacity: f32,
    part: Option<usize>,
    deforms: Vec<BoundDeform>,
    opacity: Option<BoundCurve>,
    visibility: Option<BoundCurve>,
    order_shift: Option<BoundCurve>,
}

#[derive(Debug, Default)]
struct DrawableState {
    positions: Vec<[f32; 2]>,
    opacity: f32,
    order: i32,
}

/// The canonical `ModelBackend` implementation: summed piecewise-linear
/// keyform interpolation over the parameter vector.
#[derive(Debug)]
pub struct KeyformBackend {
    canvas: [f32; 2],
    parameters: Vec<ParameterDef>,
    part_ids: Vec<String>,
    part_opacities: Vec<f32>,
    statics: Vec<DrawableStatic>,
    drawables: Vec<KeyformDrawable>,
    states: Vec<DrawableState>,
}

fn bind_curve(
    curve: &ScalarCurve,
    index: &HashMap<&str, usize>,
    owner: &str,
) -> Result<BoundCurve, AvatarError> {
    let param = *index.get(curve.param.as_str()).ok_or_else(|| {
        AvatarError::AssetLoad(format!(
            "curve on '{owner}' targets unknown parameter '{}'",
            curve.param
        ))
    })?;
    Ok(BoundCurve {
        param,
        keys: curve.keys.clone(),
        values: curve.values.clone(),
    })
}

fn bind_deform(
    deform: &VertexDeform,
    index: &HashMap<&str, usize>,
    owner: &str,
) -> Result<BoundDeform, AvatarError> {
    let param = *index.get(deform.param.as_str()).ok_or_else(|| {
        AvatarError::AssetLoad(format!(
            "deform on '{owner}' targets unknown parameter '{}'",
            deform.param
        ))
    })?;
    Ok(BoundDeform {
        param,
        keys: deform.keys.clone(),
        deltas: deform.deltas.clone(),
    })
}

impl KeyformBackend {
    pub fn new(data: ModelData) -> Result<Self, AvatarError> {
        data.validate_basic().map_err(AvatarError::AssetLoad)?;

        let index: HashMap<&str, usize> = data
            .parameters
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id.as_str(), i))
            .collect();

        let mut statics = Vec::with_capacity(data.drawables.len());
        let mut drawables = Vec::with_capacity(data.drawables.len());
        let mut states = Vec::with_capacity(data.drawables.len());
        for d in &data.drawables {
            statics.push(DrawableStatic {
                id: d.id.clone(),
                part: d.part,
                texture_slot: d.texture_slot,
                blend_mode: d.blend_mode,
                uvs: d.uvs.clone(),
                indices: d.indices.clone(),
                masks: d.masks.clone(),
            });
            let deforms = d
                .deforms
                .iter()
                .map(|df| bind_deform(df, &index, &d.id))
                .collect::<Result<Vec<_>, _>>()?;
            drawables.push(KeyformDrawable {
                base: d.positions.clone(),
                base_order: d.render_order,
                base_opacity: d.base_opacity,
                part: d.part,
                deforms,
                opacity: d.opacity.as_ref().map(|c| bind_curve(c, &index, &d.id)).transpose()?,
                visibility: d
                    .visibility
                    .as_ref()
                    .map(|c| bind_curve(c, &index, &d.id))
                    .transpose()?,
                order_shift: d
                    .order_shift
                    .as_ref()
                    .map(|c| bind_curve(c, &index, &d.id))
                    .transpose()?,
            });
            states.push(DrawableState {
                positions: d.positions.clone(),
                opacity: d.base_opacity,
                order: d.render_order,
            });
        }

        drop(index);

        log::debug!(
            "keyform backend built: {} drawables, {} parameters, {} parts",
            statics.len(),
            data.parameters.len(),
            data.parts.len()
        );

        Ok(Self {
            canvas: data.canvas,
            parameters: data.parameters,
            part_ids: data.parts.iter().map(|p| p.id.clone()).collect(),
            part_opacities: data.parts.iter().map(|p| p.opacity).collect(),
            statics,
            drawables,
            states,
        })
    }
}

fn eval_curve(curve: &Option<BoundCurve>, values: &[f32], default: f32) -> f32 {
    match curve {
        Some(c) => piecewise_linear(&c.keys, &c.values, values[c.param]),
        None => default,
    }
}

impl ModelBackend for KeyformBackend {
    fn canvas_size(&self) -> [f32; 2] {
        self.canvas
    }

    fn parameters(&self) -> &[ParameterDef] {
        &self.parameters
    }

    fn part_count(&self) -> usize {
        self.part_ids.len()
    }

    fn part_id(&self, part: usize) -> &str {
        &self.part_ids[part]
    }

    fn part_opacity(&self, part: usize) -> f32 {
        self.part_opacities[part]
    }

    fn set_part_opacity(&mut self, part: usize, opacity: f32) {
        self.part_opacities[part] = opacity.clamp(0.0, 1.0);
    }

    fn drawable_count(&self) -> usize {
        self.statics.len()
    }

    fn drawable(&self, index: usize) -> &DrawableStatic {
        &self.statics[index]
    }

    fn update(&mut self, values: &[f32]) {
        for (d, state) in self.drawables.iter().zip(self.states.iter_mut()) {
            state.positions.copy_from_slice(&d.base);
            for deform in &d.deforms {
                let x = values[deform.param];
                let (i0, i1, t) = piecewise_segment(&deform.keys, x);
                let from = &deform.deltas[i0];
                let to = &deform.deltas[i1];
                for (p, (a, b)) in state.positions.iter_mut().zip(from.iter().zip(to.iter())) {
                    p[0] += lerp_f32(a[0], b[0], t);
                    p[1] += lerp_f32(a[1], b[1], t);
                }
            }

            let visible = eval_curve(&d.visibility, values, 1.0) >= 0.5;
            state.opacity = if visible {
                let part = d.part.map(|p| self.part_opacities[p]).unwrap_or(1.0);
                let own = eval_curve(&d.opacity, values, 1.0).clamp(0.0, 1.0);
                own * part * d.base_opacity
            } else {
                0.0
            };

            let shift = eval_curve(&d.order_shift, values, 0.0);
            state.order = d.base_order + shift.round() as i32;
        }
    }

    fn positions(&self, index: usize) -> &[[f32; 2]] {
        &self.states[index].positions
    }

    fn opacity(&self, index: usize) -> f32 {
        self.states[index].opacity
    }

    fn render_order(&self, index: usize) -> i32 {
        self.states[index].order
    }
}
