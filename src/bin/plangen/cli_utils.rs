use bevy::prelude::*;
use settlement_planner::config::DistrictSpec;
use settlement_planner::config::range_types::MinScore;
use settlement_planner::errors::{PlannerError, PlannerResult};
use std::path::Path;
use std::str::FromStr;

fn invalid(reason: String) -> PlannerError {
    PlannerError::InvalidConfig { reason }
}

/// Generic parser for delimited strings of `N` values
pub fn parse_delimited<T, const N: usize>(
    input: &str,
    delimiter: char,
    type_name: &str,
) -> PlannerResult<[T; N]>
where
    T: Copy + Default + FromStr,
{
    let parts: Vec<&str> = input.split(delimiter).collect();
    if parts.len() != N {
        return Err(invalid(format!(
            "Invalid {type_name} format '{input}'. Expected {N} {delimiter}-separated values"
        )));
    }

    let mut result = [T::default(); N];
    for (i, part) in parts.iter().enumerate() {
        result[i] = part
            .trim()
            .parse()
            .map_err(|_| invalid(format!("Invalid {type_name} value: '{part}'")))?;
    }

    Ok(result)
}

/// Parse size string "WIDTHxDEPTH" with validation
pub fn parse_size(size_str: &str) -> PlannerResult<(u32, u32)> {
    let [width, depth] = parse_delimited::<u32, 2>(size_str, 'x', "size")?;

    if width == 0 || depth == 0 {
        return Err(invalid(
            "Width and depth must be greater than 0".to_string(),
        ));
    }

    if width > 4096 || depth > 4096 {
        return Err(invalid("Width and depth must not exceed 4096".to_string()));
    }

    Ok((width, depth))
}

/// Parse origin string "X,Z"
pub fn parse_origin(origin_str: &str) -> PlannerResult<IVec2> {
    let [x, z] = parse_delimited::<i32, 2>(origin_str, ',', "origin")?;
    Ok(IVec2::new(x, z))
}

/// Parse a comma-separated list of "RADIUS:MIN_SCORE" district requests
pub fn parse_districts(districts_str: &str) -> PlannerResult<Vec<DistrictSpec>> {
    let specs = districts_str
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|entry| {
            let [radius, min_score] = parse_delimited::<f32, 2>(entry, ':', "district")?;
            if radius < 1.0 {
                return Err(invalid(format!(
                    "District radius must be at least 1, got '{entry}'"
                )));
            }
            Ok(DistrictSpec {
                radius: radius as u32,
                min_score: MinScore::new(min_score),
            })
        })
        .collect::<PlannerResult<Vec<_>>>()?;

    if specs.is_empty() {
        return Err(invalid("At least one district must be requested".to_string()));
    }
    Ok(specs)
}

/// Validate tree density and clamp to valid range
pub fn validate_density(density: f32) -> f32 {
    if !(0.0..=1.0).contains(&density) {
        println!(
            "Warning: Tree density {density} is out of range [0.0, 1.0], clamping to valid range"
        );
        density.clamp(0.0, 1.0)
    } else {
        density
    }
}

/// Reject output names the plans directory would refuse, before any work is done
pub fn validate_output_path(filename: &str) -> PlannerResult<()> {
    if Path::new(filename).is_absolute() {
        return Err(PlannerError::InvalidPlanData {
            reason: format!(
                "Output path must be relative to the plans/ directory, got absolute path: {filename}"
            ),
        });
    }

    if filename.contains("..") {
        return Err(PlannerError::InvalidPlanData {
            reason: "Output path cannot contain '..'".to_string(),
        });
    }

    Ok(())
}
