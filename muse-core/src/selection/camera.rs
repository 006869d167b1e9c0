//! Camera instruction builder.
//!
//! Derives concrete camera directives from a pose's camera spec. Each
//! list-valued sub-field round-robins under its own `camera:<pose_id>`
//! scoped key, so different poses keep independent rotation state.

use super::catalog::{CameraKind, PoseOption};
use super::select_cyclic;
use crate::variation::VariationState;

/// Build the camera directive line for a chosen pose.
pub fn camera_instructions(state: &mut VariationState, pose: &PoseOption) -> String {
    let spec = &pose.camera;
    let base_key = format!("camera:{}", pose.id);
    let mut lines: Vec<String> = Vec::new();

    match spec.kind {
        CameraKind::Selfie { distance_cm } => {
            lines.push(format!("Camera distance: {distance_cm} cm (selfie)."));
        }
        CameraKind::FriendShot { distance_m } => {
            lines.push(format!("Camera distance: {distance_m} meters (friend-taken)."));
        }
    }

    let angle = select_cyclic(state, &format!("{base_key}:angle"), spec.angles);
    if !angle.is_empty() {
        lines.push(format!("Angle: {angle}."));
    }

    if !spec.framing.is_empty() {
        lines.push(format!("Framing: {}.", spec.framing));
    }

    let expression = select_cyclic(state, &format!("{base_key}:expression"), spec.expressions);
    if !expression.is_empty() {
        lines.push(format!("Expression: {expression}."));
    }

    if let Some(hands) = spec.hands {
        lines.push(format!("Hands: {hands}."));
    }

    let motion = select_cyclic(state, &format!("{base_key}:motion"), spec.motion);
    if !motion.is_empty() {
        lines.push(format!("Motion cues: {motion}."));
    }

    let clip = select_cyclic(state, &format!("{base_key}:clip"), spec.clip_pacing);
    if !clip.is_empty() {
        lines.push(format!("Clip pacing: {clip}."));
    }

    lines.join(" ")
}
