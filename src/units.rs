//! # Unit Conversion
//!
//! Every height in the engine is eventually compared against a page budget in
//! millimeters, but the inputs arrive in three different units: layout margins
//! in mm, font sizes in typographic points, and the preview surface in CSS
//! pixels at 96 DPI. These helpers are the only place the conversion factors
//! live, so the preview, the measurement strategies and the PDF renderer all
//! agree on what "10 mm" means.
//!
//! The constants are part of the public contract. Anything performing manual
//! conversions must use these exact values.

/// Pixels per millimeter at 96 DPI.
pub const PX_PER_MM: f64 = 3.7795275591;
/// Millimeters per typographic point (1/72 inch).
pub const MM_PER_PT: f64 = 0.352778;
/// Points per millimeter.
pub const PT_PER_MM: f64 = 2.834645;
/// Pixels per point at 96 DPI.
pub const PX_PER_PT: f64 = 1.333333;

#[inline]
pub fn mm_to_px(mm: f64) -> f64 {
    mm * PX_PER_MM
}

#[inline]
pub fn px_to_mm(px: f64) -> f64 {
    px / PX_PER_MM
}

#[inline]
pub fn pt_to_mm(pt: f64) -> f64 {
    pt * MM_PER_PT
}

#[inline]
pub fn mm_to_pt(mm: f64) -> f64 {
    mm * PT_PER_MM
}

#[inline]
pub fn pt_to_px(pt: f64) -> f64 {
    pt * PX_PER_PT
}

#[inline]
pub fn px_to_pt(px: f64) -> f64 {
    px / PX_PER_PT
}
