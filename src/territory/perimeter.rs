use bevy::prelude::*;
use rand::Rng;
use std::collections::HashSet;
use std::f32::consts::TAU;

/// Column reached by walking `radius` blocks from `center` along `angle`
fn from_angle(center: IVec2, angle: f32, radius: f32) -> IVec2 {
    let offset = Vec2::from_angle(angle) * radius;
    center + offset.floor().as_ivec2()
}

fn ray_angles<R: Rng + ?Sized>(rng: &mut R, count: u32) -> impl Iterator<Item = f32> {
    let angle_offset = rng.gen_range(0.0..TAU);
    (0..count).map(move |i| i as f32 * TAU / count as f32 + angle_offset)
}

/// `count` points evenly spaced on a circle, rotated by a random offset
pub fn circle_around<R: Rng + ?Sized>(
    rng: &mut R,
    center: IVec2,
    radius: f32,
    count: u32,
) -> Vec<IVec2> {
    ray_angles(rng, count)
        .map(|angle| from_angle(center, angle, radius))
        .collect()
}

/// Cast `count` rays outward from `center` and keep, for each, the last
/// column still inside `footprint`
pub fn border_points<R: Rng + ?Sized>(
    rng: &mut R,
    footprint: &HashSet<IVec2>,
    center: IVec2,
    count: u32,
    max_radius: u32,
) -> Vec<IVec2> {
    ray_angles(rng, count)
        .map(|angle| {
            let mut coord = from_angle(center, angle, 0.0);
            let mut radius = 1;
            let mut next = from_angle(center, angle, radius as f32);
            while footprint.contains(&next) && radius <= max_radius {
                radius += 1;
                coord = next;
                next = from_angle(center, angle, radius as f32);
            }
            coord
        })
        .collect()
}

/// Cast `count` rays inward from `max_radius` and keep, for each, the first
/// column found inside `footprint` (the center when none is)
pub fn border_points_from_outside<R: Rng + ?Sized>(
    rng: &mut R,
    footprint: &HashSet<IVec2>,
    center: IVec2,
    count: u32,
    max_radius: u32,
) -> Vec<IVec2> {
    ray_angles(rng, count)
        .map(|angle| {
            let mut radius = max_radius;
            let mut coord = from_angle(center, angle, radius as f32);
            while !footprint.contains(&coord) && radius > 0 {
                radius -= 1;
                coord = from_angle(center, angle, radius as f32);
            }
            coord
        })
        .collect()
}
