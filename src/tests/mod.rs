use std::f64::consts::{FRAC_PI_2, PI, TAU};
use std::sync::Arc;

use glam::DVec3;

use crate::{
    body_presets, cheapest_correction, course_correction, orbit_intersections, solve_flyby,
    CorrectionError, FlybyError, IntersectError, Orbit, StarSystem, TimeReference,
};

const RANDOM_ORBIT_SAMPLES: usize = 256;


use assertions::*;
use seeders::*;

/// A heliocentric transfer with periapsis at Kerbin's orbit and apoapsis
/// just past Duna's.
fn kerbin_duna_transfer(system: &StarSystem) -> Orbit {
    let kerbol = system.get("Kerbol").unwrap().clone();
    Orbit::from_elements(
        kerbol,
        17_300_000_000.0,
        0.23,
        0.0,
        0.0,
        0.0,
        TimeReference::TimeOfPeriapsisPassage(0.0),
    )
}

#[test]
fn circular_orbit_positions() {
    let star = test_star();
    let radius = 1e9;
    let orbit = Orbit::from_elements(
        star,
        radius,
        0.0,
        0.0,
        0.0,
        0.0,
        TimeReference::MeanAnomalyAtEpoch(0.0),
    );
    let quarter = orbit.period().unwrap() / 4.0;

    let expected = [
        (0.0, DVec3::new(radius, 0.0, 0.0)),
        (quarter, DVec3::new(0.0, radius, 0.0)),
        (2.0 * quarter, DVec3::new(-radius, 0.0, 0.0)),
        (3.0 * quarter, DVec3::new(0.0, -radius, 0.0)),
    ];
    for (time, position) in expected {
        assert_almost_eq_vec3(
            orbit.position_at(time).unwrap(),
            position,
            &format!("circular position at t = {time}"),
        );
    }
}

#[test]
fn period_matches_kepler_third_law() {
    let star = test_star();
    for _ in 0..RANDOM_ORBIT_SAMPLES {
        let orbit = random_elliptic(&star);
        let expected = TAU
            * (orbit.semi_major_axis().powi(3) / orbit.gravitational_parameter()).sqrt();
        assert_almost_eq(
            orbit.period().unwrap() / expected,
            1.0,
            1e-12,
            "period against Kepler's third law",
        );
    }
}

#[test]
fn hyperbolic_orbit_has_no_period() {
    let star = test_star();
    assert_eq!(random_hyperbolic(&star).period(), None);
}

#[test]
fn elliptic_orbit_is_periodic() {
    let star = test_star();
    for _ in 0..16 {
        let orbit = random_elliptic(&star);
        let period = orbit.period().unwrap();
        let time = rand::random_range(0.0..period);
        assert_almost_eq_vec3(
            orbit.position_at(time).unwrap(),
            orbit.position_at(time + period).unwrap(),
            "position one period apart",
        );
    }
}

#[test]
fn anomaly_time_round_trip_elliptic() {
    let star = test_star();
    for _ in 0..RANDOM_ORBIT_SAMPLES {
        let orbit = random_elliptic(&star);
        let true_anomaly = rand::random_range(-PI..PI);
        let time = orbit.time_at_true_anomaly(true_anomaly).unwrap();
        assert!(
            (0.0..orbit.period().unwrap()).contains(&time),
            "time {time} out of the first period"
        );
        assert_angle_eq(
            orbit.true_anomaly_at(time).unwrap(),
            true_anomaly,
            1e-6,
            &format!("elliptic anomaly round trip (e = {})", orbit.eccentricity()),
        );
    }
}

#[test]
fn anomaly_time_round_trip_hyperbolic() {
    let star = test_star();
    for _ in 0..RANDOM_ORBIT_SAMPLES {
        let orbit = random_hyperbolic(&star);
        let asymptote = (-1.0 / orbit.eccentricity()).acos();
        let true_anomaly = rand::random_range(-0.9 * asymptote..0.9 * asymptote);
        let time = orbit.time_at_true_anomaly(true_anomaly).unwrap();
        assert_angle_eq(
            orbit.true_anomaly_at(time).unwrap(),
            true_anomaly,
            1e-6,
            &format!(
                "hyperbolic anomaly round trip (e = {})",
                orbit.eccentricity()
            ),
        );
    }
}

#[test]
fn apsis_radii() {
    let star = test_star();
    for _ in 0..RANDOM_ORBIT_SAMPLES {
        let orbit = random_elliptic(&star);
        assert_almost_eq(
            orbit.radius_at_true_anomaly(0.0) / orbit.periapsis(),
            1.0,
            1e-12,
            "radius at periapsis",
        );
        assert_almost_eq(
            orbit.radius_at_true_anomaly(PI) / orbit.apoapsis(),
            1.0,
            1e-12,
            "radius at apoapsis",
        );
    }
}

#[test]
fn true_anomaly_at_radius_saturates() {
    let star = test_star();
    let orbit = Orbit::from_elements(
        star,
        1e10,
        0.3,
        0.0,
        0.0,
        0.0,
        TimeReference::MeanAnomalyAtEpoch(0.0),
    );
    assert_almost_eq(
        orbit.true_anomaly_at_radius(orbit.periapsis()),
        0.0,
        1e-6,
        "anomaly at periapsis",
    );
    assert_almost_eq(
        orbit.true_anomaly_at_radius(orbit.apoapsis()),
        PI,
        1e-6,
        "anomaly at apoapsis",
    );
    assert_eq!(orbit.true_anomaly_at_radius(orbit.periapsis() * 0.5), 0.0);
    assert_eq!(orbit.true_anomaly_at_radius(orbit.apoapsis() * 2.0), PI);
    // In range, it inverts the radius function.
    let radius = orbit.semi_latus_rectum();
    assert_almost_eq(
        orbit.radius_at_true_anomaly(orbit.true_anomaly_at_radius(radius)) / radius,
        1.0,
        1e-12,
        "anomaly-radius inversion",
    );
}

#[test]
fn vis_viva_holds() {
    let star = test_star();
    for _ in 0..RANDOM_ORBIT_SAMPLES {
        let orbit = if rand::random_bool(0.5) {
            random_elliptic(&star)
        } else {
            random_hyperbolic(&star)
        };
        let true_anomaly = if orbit.eccentricity() < 1.0 {
            rand::random_range(-PI..PI)
        } else {
            0.5 * (-1.0 / orbit.eccentricity()).acos()
        };
        let speed_sq = orbit.velocity_at_true_anomaly(true_anomaly).length_squared();
        let radius = orbit.radius_at_true_anomaly(true_anomaly);
        let expected = orbit.gravitational_parameter()
            * (2.0 / radius - 1.0 / orbit.semi_major_axis());
        assert_almost_eq(speed_sq / expected, 1.0, 1e-9, "vis-viva");
    }
}

#[test]
fn state_vectors_round_trip() {
    let star = test_star();
    for _ in 0..RANDOM_ORBIT_SAMPLES {
        let orbit = random_elliptic(&star);
        let time = rand::random_range(0.0..orbit.period().unwrap());
        let state = orbit.state_vectors_at(time).unwrap();

        let rebuilt =
            Orbit::from_position_and_velocity(star.clone(), state.position, state.velocity, time)
                .unwrap();
        let rebuilt_state = rebuilt.state_vectors_at(time).unwrap();

        assert_almost_eq_vec3(rebuilt_state.position, state.position, "rebuilt position");
        assert_almost_eq_vec3(rebuilt_state.velocity, state.velocity, "rebuilt velocity");
    }
}

#[test]
fn elements_from_retrograde_planar_state() {
    let star = test_star();
    let radius = 1e9;
    let speed = (star.gravitational_parameter() / radius).sqrt();
    // Circular, equatorial, clockwise when seen from +Z.
    let orbit = Orbit::from_position_and_velocity(
        star.clone(),
        DVec3::new(radius, 0.0, 0.0),
        DVec3::new(0.0, -speed, 0.0),
        0.0,
    )
    .unwrap();
    assert_almost_eq(orbit.inclination(), PI, 1e-9, "retrograde inclination");
    assert_almost_eq_vec3(
        orbit.position_at(0.0).unwrap(),
        DVec3::new(radius, 0.0, 0.0),
        "retrograde position at epoch",
    );
    assert_almost_eq_vec3(
        orbit.velocity_at(0.0).unwrap(),
        DVec3::new(0.0, -speed, 0.0),
        "retrograde velocity at epoch",
    );
}

#[test]
fn parabolic_state_is_rejected() {
    let star = test_star();
    let radius = 1e9;
    let escape_speed = (2.0 * star.gravitational_parameter() / radius).sqrt();
    let result = Orbit::from_position_and_velocity(
        star,
        DVec3::new(radius, 0.0, 0.0),
        DVec3::new(0.0, escape_speed, 0.0),
        0.0,
    );
    assert!(matches!(
        result,
        Err(crate::OrbitError::ParabolicUnsupported(_))
    ));
}

#[test]
fn parabolic_elements_are_rejected_in_the_time_domain() {
    // from_elements does not validate, so an exactly-parabolic orbit can
    // exist; anything that touches Kepler's equation must refuse it
    // rather than answer from the wrong conic branch.
    let star = test_star();
    let orbit = Orbit::from_elements(
        star,
        -1e10,
        1.0,
        0.0,
        0.0,
        0.0,
        TimeReference::TimeOfPeriapsisPassage(0.0),
    );
    assert!(matches!(
        orbit.true_anomaly_at(1e6),
        Err(crate::OrbitError::ParabolicUnsupported(_))
    ));
    assert!(matches!(
        orbit.mean_anomaly_at_true_anomaly(1.0),
        Err(crate::OrbitError::ParabolicUnsupported(_))
    ));
    assert!(matches!(
        orbit.time_at_true_anomaly(1.0),
        Err(crate::OrbitError::ParabolicUnsupported(_))
    ));
}

#[test]
fn snap_timing_places_orbit_at_encounter() {
    let system = body_presets::kerbol_system();
    let duna = system.get("Duna").unwrap();
    let mut transfer = kerbin_duna_transfer(&system);

    let crossing_time = 1e7;
    transfer.snap_timing_to_encounter(duna, crossing_time).unwrap();

    let duna_position = duna.orbit.as_ref().unwrap().position_at(crossing_time).unwrap();
    assert_angle_eq(
        transfer.true_anomaly_at(crossing_time).unwrap(),
        transfer.true_anomaly_at_position(duna_position),
        1e-6,
        "true anomaly after timing snap",
    );
}

#[test]
fn flyby_preserves_excess_speed() {
    let system = body_presets::kerbol_system();
    let duna = system.get("Duna").unwrap();
    let transfer = kerbin_duna_transfer(&system);

    let flyby = solve_flyby(&transfer, duna, 1e7, 50_000.0, true).unwrap();
    let encounter = &flyby.encounter;

    assert_almost_eq(
        encounter.ejection_velocity.length() / encounter.relative_velocity.length(),
        1.0,
        1e-9,
        "excess speed across the assist",
    );
    assert!(flyby.hyperbola.eccentricity() > 1.0);
    assert_almost_eq(
        flyby.hyperbola.periapsis().log10(),
        (50_000.0 + duna.radius).log10(),
        1e-6,
        "hyperbola periapsis radius",
    );
    assert_almost_eq(
        encounter.turning_angle,
        2.0 * (1.0 / flyby.hyperbola.eccentricity()).asin(),
        1e-6,
        "turning angle",
    );
}

#[test]
fn flyby_outbound_passes_through_encounter() {
    let system = body_presets::kerbol_system();
    let duna = system.get("Duna").unwrap();
    let transfer = kerbin_duna_transfer(&system);
    let approach_time = 1e7;

    let flyby = solve_flyby(&transfer, duna, approach_time, 50_000.0, true).unwrap();
    let duna_position = duna
        .orbit
        .as_ref()
        .unwrap()
        .position_at(approach_time)
        .unwrap();
    assert_almost_eq_vec3(
        flyby.outbound.position_at(approach_time).unwrap(),
        duna_position,
        "outbound orbit at the encounter",
    );
}

#[test]
fn flyby_side_flips_impact_parameter() {
    let system = body_presets::kerbol_system();
    let duna = system.get("Duna").unwrap();
    let transfer = kerbin_duna_transfer(&system);

    let ahead = solve_flyby(&transfer, duna, 1e7, 50_000.0, true).unwrap();
    let behind = solve_flyby(&transfer, duna, 1e7, 50_000.0, false).unwrap();
    assert!(ahead.encounter.impact_parameter * behind.encounter.impact_parameter < 0.0);
    assert_eq!(
        ahead.encounter.impact_parameter,
        -behind.encounter.impact_parameter
    );
}

#[test]
fn flyby_asymptotes_reach_sphere_of_influence() {
    let system = body_presets::kerbol_system();
    let duna = system.get("Duna").unwrap();
    let transfer = kerbin_duna_transfer(&system);

    let flyby = solve_flyby(&transfer, duna, 1e7, 50_000.0, true).unwrap();
    let soi = duna.sphere_of_influence().unwrap();
    assert_almost_eq(
        flyby.encounter.soi_entry.length().log10(),
        soi.log10(),
        1e-9,
        "entry point on the sphere of influence",
    );
    assert_almost_eq(
        flyby.encounter.soi_exit.length().log10(),
        soi.log10(),
        1e-9,
        "exit point on the sphere of influence",
    );
}

#[test]
fn flyby_rejects_orbitless_body() {
    let system = body_presets::kerbol_system();
    let kerbol = system.get("Kerbol").unwrap();
    let transfer = kerbin_duna_transfer(&system);
    let result = solve_flyby(&transfer, kerbol, 1e7, 50_000.0, true);
    assert!(matches!(result, Err(FlybyError::BodyWithoutOrbit(_))));
}

#[test]
fn intersections_of_disjoint_annuli() {
    let star = test_star();
    let inner = Orbit::from_elements(
        star.clone(),
        1e9,
        0.05,
        0.0,
        0.0,
        0.0,
        TimeReference::MeanAnomalyAtEpoch(0.0),
    );
    let outer = Orbit::from_elements(
        star,
        2e9,
        0.05,
        0.0,
        0.0,
        0.0,
        TimeReference::MeanAnomalyAtEpoch(0.0),
    );
    assert!(orbit_intersections(&inner, &outer).unwrap().is_empty());
}

#[test]
fn intersections_of_crossing_orbits() {
    let star = test_star();
    let a = Orbit::from_elements(
        star.clone(),
        1.5e9,
        0.3,
        0.0,
        0.0,
        0.0,
        TimeReference::MeanAnomalyAtEpoch(0.0),
    );
    let b = Orbit::from_elements(
        star,
        1.55e9,
        0.1,
        0.0,
        0.0,
        1.0,
        TimeReference::MeanAnomalyAtEpoch(0.0),
    );

    let crossings = orbit_intersections(&a, &b).unwrap();
    assert_eq!(crossings.len(), 2);
    for (index, crossing) in crossings.iter().enumerate() {
        // Radii agree to the angular tolerance of the search.
        assert_almost_eq(
            a.radius_at_true_anomaly(crossing.true_anomalies[0])
                / b.radius_at_true_anomaly(crossing.true_anomalies[1]),
            1.0,
            1e-4,
            &format!("crossing {index} radius match"),
        );
        // Coplanar orbits cross at a shared point.
        let distance = crossing.positions[0].distance(crossing.positions[1]);
        assert!(
            distance < 1e-3 * crossing.positions[0].length(),
            "crossing {index} positions {distance} m apart"
        );
    }
}

#[test]
fn intersections_of_identical_orbits_degenerate() {
    // Identical ellipses touch everywhere; the search collapses to its
    // bracket boundary instead of failing.
    let star = test_star();
    let orbit = Orbit::from_elements(
        star,
        1.5e9,
        0.3,
        0.0,
        0.0,
        0.0,
        TimeReference::MeanAnomalyAtEpoch(0.0),
    );
    let crossings = orbit_intersections(&orbit, &orbit.clone()).unwrap();
    assert!(!crossings.is_empty());
    for crossing in &crossings {
        assert_angle_eq(
            crossing.true_anomalies[0],
            crossing.true_anomalies[1],
            1e-9,
            "identical orbits share the crossing anomaly",
        );
        assert_almost_eq_vec3(
            crossing.positions[0],
            crossing.positions[1],
            "identical orbits share the crossing point",
        );
    }
}

#[test]
fn intersections_reject_mismatched_primaries() {
    let star_a = test_star();
    let star_b = test_star();
    let a = random_elliptic(&star_a);
    let b = random_elliptic(&star_b);
    assert_eq!(
        orbit_intersections(&a, &b),
        Err(IntersectError::MismatchedPrimaries)
    );
}

#[test]
fn find_crossings_scans_siblings() {
    let system = body_presets::kerbol_system();
    let transfer = kerbin_duna_transfer(&system);

    let crossings = system.find_crossings(&transfer);
    assert!(crossings
        .iter()
        .any(|(body, found)| body.name == "Duna" && !found.is_empty()));
    // Jool is far outside the transfer's apoapsis.
    assert!(!crossings.iter().any(|(body, _)| body.name == "Jool"));
}

#[test]
fn course_correction_reaches_target() {
    let system = body_presets::kerbol_system();
    let duna = system.get("Duna").unwrap();
    let duna_orbit = duna.orbit.as_ref().unwrap();
    let transfer = kerbin_duna_transfer(&system);

    let burn_time = 1e6;
    let arrival_time = 8e6;
    let burn = course_correction(&transfer, duna_orbit, burn_time, arrival_time).unwrap();

    let corrected = Orbit::from_position_and_velocity(
        transfer.primary().clone(),
        transfer.position_at(burn_time).unwrap(),
        burn.corrected_velocity,
        burn_time,
    )
    .unwrap();
    assert_almost_eq_vec3(
        corrected.position_at(arrival_time).unwrap(),
        duna_orbit.position_at(arrival_time).unwrap(),
        "corrected orbit at arrival",
    );
}

#[test]
fn lambert_recovers_unperturbed_orbit() {
    // Asking to arrive where the craft would arrive anyway costs nothing.
    let system = body_presets::kerbol_system();
    let transfer = kerbin_duna_transfer(&system);
    let target = transfer.clone();
    let burn_time = 1e6;
    let arrival_time = burn_time + 0.3 * transfer.period().unwrap();

    let burn = course_correction(&transfer, &target, burn_time, arrival_time).unwrap();
    assert!(
        burn.delta_v_mag < 1e-3,
        "unnecessary burn of {} m/s",
        burn.delta_v_mag
    );
}

#[test]
fn course_correction_rejects_reversed_times() {
    let system = body_presets::kerbol_system();
    let transfer = kerbin_duna_transfer(&system);
    let result = course_correction(&transfer, &transfer.clone(), 2e6, 1e6);
    assert!(matches!(
        result,
        Err(CorrectionError::NonPositiveFlightTime { .. })
    ));
}

#[test]
fn cheapest_correction_finds_a_burn() {
    let system = body_presets::kerbol_system();
    let duna = system.get("Duna").unwrap();
    let transfer = kerbin_duna_transfer(&system);

    let burn = cheapest_correction(&transfer, duna, 1e7, 0).unwrap();
    assert!(burn.delta_v_mag.is_finite());
    assert!(burn.arrival_time > burn.burn_time);

    // Phasing the burn by whole revolutions moves it by whole periods.
    let later = cheapest_correction(&transfer, duna, 1e7, 3).unwrap();
    assert!(later.arrival_time > later.burn_time);
    assert_almost_eq(
        later.burn_time,
        burn.burn_time + 3.0 * transfer.period().unwrap(),
        1e-3,
        "burn phased by whole revolutions",
    );
}

#[test]
fn kerbol_system_relations() {
    let system = body_presets::kerbol_system();
    assert_eq!(system.bodies().len(), 17);

    let kerbol = system.get("Kerbol").unwrap();
    let kerbin = system.get("Kerbin").unwrap();
    let mun = system.get("Mun").unwrap();

    assert_eq!(kerbol.sphere_of_influence(), None);
    assert_eq!(system.children_of(kerbol).count(), 7);
    assert_eq!(system.children_of(kerbin).count(), 2);
    assert!(Arc::ptr_eq(mun.orbit.as_ref().unwrap().primary(), kerbin));

    // Stock value for Kerbin's sphere of influence.
    let soi = kerbin.sphere_of_influence().unwrap();
    assert!(
        (soi - 84_159_286.0).abs() / 84_159_286.0 < 0.01,
        "Kerbin SOI {soi}"
    );
}

#[test]
fn circular_orbit_velocity_matches_vis_viva() {
    let system = body_presets::kerbol_system();
    let kerbin = system.get("Kerbin").unwrap();
    let altitude = 100_000.0;
    let speed = kerbin.circular_orbit_velocity(altitude);
    let expected = (kerbin.gravitational_parameter() / (kerbin.radius + altitude)).sqrt();
    assert_almost_eq(speed, expected, 1e-9, "circular orbit speed");
    assert_almost_eq(speed, 2246.1, 0.5, "Kerbin 100 km orbital speed");
}

#[test]
fn sidereal_time_wraps() {
    let system = body_presets::kerbol_system();
    let kerbin = system.get("Kerbin").unwrap();
    assert_almost_eq(
        kerbin.sidereal_time_at(0.0, 0.0),
        FRAC_PI_2,
        1e-12,
        "sidereal time at epoch",
    );
    assert_almost_eq(
        kerbin.sidereal_time_at(1.0, kerbin.sidereal_rotation_period),
        kerbin.sidereal_time_at(1.0, 0.0),
        1e-6,
        "sidereal time one rotation later",
    );
}
