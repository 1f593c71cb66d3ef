//! Preset star systems.
//!
//! Angles in this catalog are stored in degrees where that is how they are
//! conventionally published (inclination, node, argument of periapsis) and
//! converted to radians on construction; mean anomalies at epoch are
//! already radians.

use std::sync::Arc;

use crate::body::{CelestialBody, StarSystem};
use crate::orbit::{Orbit, TimeReference};

fn elements(
    primary: &Arc<CelestialBody>,
    semi_major_axis: f64,
    eccentricity: f64,
    inclination_deg: f64,
    long_asc_node_deg: f64,
    arg_pe_deg: f64,
    mean_anomaly_at_epoch: f64,
) -> Orbit {
    Orbit::from_elements(
        primary.clone(),
        semi_major_axis,
        eccentricity,
        inclination_deg.to_radians(),
        long_asc_node_deg.to_radians(),
        arg_pe_deg.to_radians(),
        TimeReference::MeanAnomalyAtEpoch(mean_anomaly_at_epoch),
    )
}

/// Builds the Kerbol system with its star, planets, and moons.
///
/// Element values match the stock Kerbal Space Program solar system.
pub fn kerbol_system() -> StarSystem {
    let kerbol = Arc::new(CelestialBody::new(
        "Kerbol", 1.756_545_9e28, 2.616e8, 432_000.0, None,
    ));

    let moho = Arc::new(CelestialBody::new(
        "Moho",
        2.526_331_4e21,
        250_000.0,
        1_210_000.0,
        Some(elements(&kerbol, 5_263_138_304.0, 0.2, 7.0, 70.0, 15.0, 3.14)),
    ));

    let eve = Arc::new(CelestialBody::new(
        "Eve",
        1.224_398_0e23,
        700_000.0,
        80_500.0,
        Some(elements(&kerbol, 9_832_684_544.0, 0.01, 2.1, 15.0, 0.0, 3.14)),
    ));
    let gilly = Arc::new(CelestialBody::new(
        "Gilly",
        1.242_036_3e17,
        13_000.0,
        28_255.0,
        Some(elements(&eve, 31_500_000.0, 0.55, 12.0, 80.0, 10.0, 0.9)),
    ));

    let kerbin = Arc::new(CelestialBody::new(
        "Kerbin",
        5.291_515_8e22,
        600_000.0,
        21_549.425,
        Some(elements(&kerbol, 13_599_840_256.0, 0.0, 0.0, 0.0, 0.0, 3.14)),
    ));
    let mun = Arc::new(CelestialBody::new(
        "Mun",
        9.759_906_6e20,
        200_000.0,
        138_984.38,
        Some(elements(&kerbin, 12_000_000.0, 0.0, 0.0, 0.0, 0.0, 1.7)),
    ));
    let minmus = Arc::new(CelestialBody::new(
        "Minmus",
        2.645_758_0e19,
        60_000.0,
        40_400.0,
        Some(elements(&kerbin, 47_000_000.0, 0.0, 6.0, 78.0, 38.0, 0.9)),
    ));

    let duna = Arc::new(CelestialBody::new(
        "Duna",
        4.515_427_0e21,
        320_000.0,
        65_517.859,
        Some(elements(&kerbol, 20_726_155_264.0, 0.051, 0.06, 135.5, 0.0, 3.14)),
    ));
    let ike = Arc::new(CelestialBody::new(
        "Ike",
        2.782_161_5e20,
        130_000.0,
        65_517.862,
        Some(elements(&duna, 3_200_000.0, 0.03, 0.2, 0.0, 0.0, 1.7)),
    ));

    let dres = Arc::new(CelestialBody::new(
        "Dres",
        3.219_093_7e20,
        138_000.0,
        34_800.0,
        Some(elements(&kerbol, 40_839_348_203.0, 0.145, 5.0, 280.0, 90.0, 3.14)),
    ));

    let jool = Arc::new(CelestialBody::new(
        "Jool",
        4.233_212_7e24,
        6_000_000.0,
        36_000.0,
        Some(elements(&kerbol, 68_773_560_320.0, 0.05, 1.304, 52.0, 0.0, 0.1)),
    ));
    let laythe = Arc::new(CelestialBody::new(
        "Laythe",
        2.939_731_1e22,
        500_000.0,
        52_980.879,
        Some(elements(&jool, 27_184_000.0, 0.0, 0.0, 0.0, 0.0, 3.14)),
    ));
    let vall = Arc::new(CelestialBody::new(
        "Vall",
        3.108_765_5e21,
        300_000.0,
        105_962.09,
        Some(elements(&jool, 43_152_000.0, 0.0, 0.0, 0.0, 0.0, 0.9)),
    ));
    let tylo = Arc::new(CelestialBody::new(
        "Tylo",
        4.233_212_7e22,
        600_000.0,
        211_926.36,
        Some(elements(&jool, 68_500_000.0, 0.0, 0.025, 0.0, 0.0, 3.14)),
    ));
    let bop = Arc::new(CelestialBody::new(
        "Bop",
        3.726_109_0e19,
        65_000.0,
        544_507.4,
        Some(elements(&jool, 128_500_000.0, 0.235, 15.0, 10.0, 25.0, 0.9)),
    ));
    let pol = Arc::new(CelestialBody::new(
        "Pol",
        1.081_350_7e19,
        44_000.0,
        901_902.62,
        Some(elements(&jool, 179_890_000.0, 0.17085, 4.25, 2.0, 15.0, 0.9)),
    ));

    let eeloo = Arc::new(CelestialBody::new(
        "Eeloo",
        1.114_922_4e21,
        210_000.0,
        19_460.0,
        Some(elements(&kerbol, 90_118_820_000.0, 0.26, 6.15, 50.0, 260.0, 3.14)),
    ));

    StarSystem::new(vec![
        kerbol, moho, eve, gilly, kerbin, mun, minmus, duna, ike, dres, jool, laythe, vall,
        tylo, bop, pol, eeloo,
    ])
}
