//! WGS84 latitude/longitude to UTM easting/northing.
//!
//! The zone is chosen from the coordinate itself (including the Norway and
//! Svalbard exceptions), never fixed by the caller.

use crate::prelude::{SurveyError, SurveyResult};
use serde::Serialize;
use std::f64::consts::PI;

const K0: f64 = 0.9996;
const R: f64 = 6_378_137.0;
const E: f64 = 0.006_694_38;
const E2: f64 = E * E;
const E3: f64 = E2 * E;
const E_P2: f64 = E / (1.0 - E);

const M1: f64 = 1.0 - E / 4.0 - 3.0 * E2 / 64.0 - 5.0 * E3 / 256.0;
const M2: f64 = 3.0 * E / 8.0 + 3.0 * E2 / 32.0 + 45.0 * E3 / 1024.0;
const M3: f64 = 15.0 * E2 / 256.0 + 45.0 * E3 / 1024.0;
const M4: f64 = 35.0 * E3 / 3072.0;

const FALSE_EASTING: f64 = 500_000.0;
const FALSE_NORTHING_SOUTH: f64 = 10_000_000.0;

const ZONE_LETTERS: &[u8] = b"CDEFGHJKLMNPQRSTUVWXX";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UtmCoordinate {
    pub easting: f64,
    pub northing: f64,
    pub zone_number: u8,
    pub zone_letter: char,
}

pub fn from_latlon(latitude: f64, longitude: f64) -> SurveyResult<UtmCoordinate> {
    if !(-80.0..=84.0).contains(&latitude) {
        return Err(SurveyError::CoordinateOutOfRange(format!(
            "latitude {} outside [-80, 84]",
            latitude
        )));
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(SurveyError::CoordinateOutOfRange(format!(
            "longitude {} outside [-180, 180]",
            longitude
        )));
    }

    let lat_rad = latitude.to_radians();
    let lat_sin = lat_rad.sin();
    let lat_cos = lat_rad.cos();
    let lat_tan = lat_sin / lat_cos;
    let lat_tan2 = lat_tan * lat_tan;
    let lat_tan4 = lat_tan2 * lat_tan2;

    let zone_number = zone_number(latitude, longitude);
    let zone_letter = zone_letter(latitude);
    let central_lon_rad = central_longitude(zone_number).to_radians();

    let n = R / (1.0 - E * lat_sin * lat_sin).sqrt();
    let c = E_P2 * lat_cos * lat_cos;

    let a = lat_cos * wrap_angle(longitude.to_radians() - central_lon_rad);
    let m = R
        * (M1 * lat_rad - M2 * (2.0 * lat_rad).sin() + M3 * (4.0 * lat_rad).sin()
            - M4 * (6.0 * lat_rad).sin());

    let easting = K0
        * n
        * (a + a.powi(3) / 6.0 * (1.0 - lat_tan2 + c)
            + a.powi(5) / 120.0 * (5.0 - 18.0 * lat_tan2 + lat_tan4 + 72.0 * c - 58.0 * E_P2))
        + FALSE_EASTING;

    let mut northing = K0
        * (m + n
            * lat_tan
            * (a * a / 2.0
                + a.powi(4) / 24.0 * (5.0 - lat_tan2 + 9.0 * c + 4.0 * c * c)
                + a.powi(6) / 720.0
                    * (61.0 - 58.0 * lat_tan2 + lat_tan4 + 600.0 * c - 330.0 * E_P2)));
    if latitude < 0.0 {
        northing += FALSE_NORTHING_SOUTH;
    }

    Ok(UtmCoordinate {
        easting,
        northing,
        zone_number,
        zone_letter,
    })
}

pub fn zone_number(latitude: f64, longitude: f64) -> u8 {
    let longitude = (longitude + 180.0).rem_euclid(360.0) - 180.0;

    if (56.0..64.0).contains(&latitude) && (3.0..12.0).contains(&longitude) {
        return 32;
    }
    if (72.0..=84.0).contains(&latitude) && longitude >= 0.0 {
        if longitude < 9.0 {
            return 31;
        } else if longitude < 21.0 {
            return 33;
        } else if longitude < 33.0 {
            return 35;
        } else if longitude < 42.0 {
            return 37;
        }
    }
    ((longitude + 180.0) / 6.0) as u8 + 1
}

/// Latitude band letter; callers have already checked the [-80, 84] range.
pub fn zone_letter(latitude: f64) -> char {
    let band = ((latitude + 80.0) as usize) >> 3;
    ZONE_LETTERS[band.min(ZONE_LETTERS.len() - 1)] as char
}

pub fn central_longitude(zone_number: u8) -> f64 {
    (zone_number as f64 - 1.0) * 6.0 - 180.0 + 3.0
}

fn wrap_angle(value: f64) -> f64 {
    (value + PI).rem_euclid(2.0 * PI) - PI
}
