//! Member-axis identification across heterogeneous naming conventions.

use crate::cube::Cube;
use crate::error::EnsembleError;

/// Canonical member-axis names, highest priority first.
pub const MEMBER_AXIS_ALIASES: &[&str] = &["formulation_id", "member", "ensemble", "run"];

/// Find the member axis of `cube`.
///
/// Two passes over [`MEMBER_AXIS_ALIASES`]: first an exact, case-sensitive
/// match, then a case-insensitive one. Within each pass the alias order
/// decides, not the order in which the cube declares its dimensions. The
/// returned name is the cube's own spelling (e.g. `Formulation_ID`).
///
/// # Errors
///
/// Returns [`EnsembleError::AxisNotFound`] if no dimension matches in either pass.
pub fn identify_member_axis(cube: &Cube) -> Result<&str, EnsembleError> {
    identify_in(&cube.dim_names())
}

/// Same search as [`identify_member_axis`], over bare dimension names.
pub fn identify_in<'a>(dims: &[&'a str]) -> Result<&'a str, EnsembleError> {
    if let Some(found) = MEMBER_AXIS_ALIASES
        .iter()
        .find_map(|alias| dims.iter().find(|d| *d == alias).copied())
    {
        return Ok(found);
    }

    if let Some(found) = MEMBER_AXIS_ALIASES
        .iter()
        .find_map(|alias| dims.iter().find(|d| d.eq_ignore_ascii_case(alias)).copied())
    {
        return Ok(found);
    }

    Err(EnsembleError::AxisNotFound {
        dims: dims.iter().map(|d| d.to_string()).collect(),
        aliases: MEMBER_AXIS_ALIASES.iter().map(|a| a.to_string()).collect(),
    })
}
