use crate::mesh::domain::face_mesh::{FaceMesh, Landmark};
use crate::mesh::domain::mesh_network::MeshOutput;
use crate::shared::constants::MESH_SIZE;
use crate::shared::error::TrackingError;
use crate::shared::rect::Rect;

/// Maps mesh-local landmarks back into source-image space.
///
/// `crop` is the rect the mesh input was cut from. `x`/`y` scale from
/// `[0, MESH_SIZE)` to the crop's size and shift by its origin; `z` is
/// passed through. The landmarks' bounding box, tagged with the mesh
/// confidence, becomes the approximate rect.
pub fn decode_mesh(output: MeshOutput, crop: Rect) -> Result<FaceMesh, TrackingError> {
    let MeshOutput {
        confidence,
        landmarks: raw,
    } = output;

    if raw.is_empty() || raw.len() % 3 != 0 {
        return Err(TrackingError::inference(
            "mesh",
            format!("landmark output length {} is not a positive multiple of 3", raw.len()),
        ));
    }

    let sx = crop.width() / MESH_SIZE as f32;
    let sy = crop.height() / MESH_SIZE as f32;
    let landmarks: Vec<Landmark> = raw
        .chunks_exact(3)
        .map(|p| Landmark::new(p[0] * sx + crop.left, p[1] * sy + crop.top, p[2]))
        .collect();

    let approximate_rect = Rect::bounding(confidence, landmarks.iter().map(|l| (l.x, l.y)))
        .ok_or_else(|| TrackingError::inference("mesh", "no landmarks"))?;

    Ok(FaceMesh {
        probability: confidence,
        landmarks,
        approximate_rect,
        crop_rect: crop,
    })
}
